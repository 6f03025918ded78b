// q_shared.rs -- types and helpers shared between the platform layer and the engine

pub type Vec3 = [f32; 3];

pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

/// Per-frame movement command built by the client and adjusted by the mouse.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UserCmd {
    pub viewangles: Vec3,
    pub forwardmove: f32,
    pub sidemove: f32,
    pub upmove: f32,
}

/// Engine-style integer parse: optional sign, `0x` hex, `'c'` character
/// literal, or leading decimal digits. Stops at the first invalid character.
pub fn q_atoi(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let (sign, rest) = match bytes.first() {
        Some(b'-') => (-1i32, &bytes[1..]),
        _ => (1i32, bytes),
    };

    if rest.len() >= 2 && rest[0] == b'0' && (rest[1] == b'x' || rest[1] == b'X') {
        let mut val: i32 = 0;
        for &c in &rest[2..] {
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => break,
            };
            val = val.wrapping_mul(16).wrapping_add(digit as i32);
        }
        return val.wrapping_mul(sign);
    }

    if rest.first() == Some(&b'\'') {
        return rest.get(1).map_or(0, |&c| sign * c as i32);
    }

    let mut val: i32 = 0;
    for &c in rest {
        if !c.is_ascii_digit() {
            break;
        }
        val = val.wrapping_mul(10).wrapping_add((c - b'0') as i32);
    }
    val.wrapping_mul(sign)
}

/// Float counterpart of [`q_atoi`]; accepts one decimal point.
pub fn q_atof(s: &str) -> f32 {
    let bytes = s.as_bytes();
    let (sign, rest) = match bytes.first() {
        Some(b'-') => (-1.0f64, &bytes[1..]),
        _ => (1.0f64, bytes),
    };

    if rest.len() >= 2 && rest[0] == b'0' && (rest[1] == b'x' || rest[1] == b'X') {
        return (q_atoi(s) as f64) as f32;
    }

    if rest.first() == Some(&b'\'') {
        return rest.get(1).map_or(0.0, |&c| (sign * c as f64) as f32);
    }

    let mut val: f64 = 0.0;
    let mut decimal: Option<i32> = None;
    let mut total = 0;
    for &c in rest {
        if c == b'.' && decimal.is_none() {
            decimal = Some(total);
            continue;
        }
        if !c.is_ascii_digit() {
            break;
        }
        val = val * 10.0 + (c - b'0') as f64;
        total += 1;
    }

    if let Some(point) = decimal {
        val /= 10f64.powi(total - point);
    }
    (val * sign) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q_atoi_decimal() {
        assert_eq!(q_atoi("640"), 640);
        assert_eq!(q_atoi("-12"), -12);
        assert_eq!(q_atoi("32mb"), 32);
        assert_eq!(q_atoi(""), 0);
        assert_eq!(q_atoi("abc"), 0);
    }

    #[test]
    fn test_q_atoi_hex_and_char() {
        assert_eq!(q_atoi("0x1F"), 31);
        assert_eq!(q_atoi("-0x10"), -16);
        assert_eq!(q_atoi("'A"), 65);
    }

    #[test]
    fn test_q_atof() {
        assert!((q_atof("0.6") - 0.6).abs() < 1e-6);
        assert!((q_atof("-1.25") + 1.25).abs() < 1e-6);
        assert_eq!(q_atof("3"), 3.0);
        assert!((q_atof("2.5x") - 2.5).abs() < 1e-6);
        assert_eq!(q_atof("junk"), 0.0);
    }
}
