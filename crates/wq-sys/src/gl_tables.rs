// gl_tables.rs -- palette lookup tables for a hardware renderer
//
// A GL renderer uploads 32-bit textures, so it needs the palette expanded
// to RGBA, plus a reverse table to quantise 15-bit colours back to palette
// indices for 8-bit paletted texture uploads.

use wq_common::common::ComArgs;
use wq_common::q_shared::q_atof;

use crate::compositor::PALETTE_BYTES;

pub const TABLE_15TO8_SIZE: usize = 1 << 15;

/// Palette index 255 is the transparent colour.
pub const TRANSPARENT_INDEX: usize = 255;

/// Expand the 768-byte palette to little-endian RGBA words (`0xAABBGGRR`).
pub fn build_8to24(palette: &[u8]) -> [u32; 256] {
    let mut table = [0u32; 256];
    for (entry, rgb) in table.iter_mut().zip(palette.chunks_exact(3)) {
        let (r, g, b) = (rgb[0] as u32, rgb[1] as u32, rgb[2] as u32);
        *entry = (255 << 24) | r | (g << 8) | (b << 16);
    }
    table[TRANSPARENT_INDEX] &= 0x00ff_ffff;
    table
}

/// Nearest palette index for every 5:5:5 colour.
///
/// Red occupies the low five bits, green the middle and blue the high five.
/// Each channel is widened to 8 bits and centred in its step (`<< 3 + 4`).
/// Ties go to the lowest index.
pub fn build_15to8(table8to24: &[u32; 256]) -> Vec<u8> {
    let mut table = vec![0u8; TABLE_15TO8_SIZE];

    for (i, slot) in table.iter_mut().enumerate() {
        let r = (((i & 0x001f) << 3) + 4) as i32;
        let g = (((i & 0x03e0) >> 2) + 4) as i32;
        let b = (((i & 0x7c00) >> 7) + 4) as i32;

        let mut best = 0usize;
        let mut bestdist = i32::MAX;
        for (v, &rgba) in table8to24.iter().enumerate() {
            let dr = r - (rgba & 0xff) as i32;
            let dg = g - ((rgba >> 8) & 0xff) as i32;
            let db = b - ((rgba >> 16) & 0xff) as i32;
            let dist = dr * dr + dg * dg + db * db;
            if dist < bestdist {
                best = v;
                bestdist = dist;
            }
        }
        *slot = best as u8;
    }

    table
}

/// Gamma-correct a palette in place.
pub fn apply_gamma(palette: &mut [u8], gamma: f32) {
    for p in palette.iter_mut().take(PALETTE_BYTES) {
        let f = ((*p as f64 + 1.0) / 256.0).powf(gamma as f64);
        let inf = (f * 255.0 + 0.5).clamp(0.0, 255.0);
        *p = inf as u8;
    }
}

/// `-gamma <g>` if given; otherwise 1.0 on 3Dfx hardware, which applies its
/// own gamma ramp, and 0.6 everywhere else.
pub fn gamma_from_args(args: &ComArgs, renderer: Option<&str>, vendor: Option<&str>) -> f32 {
    if let Some(pnum) = args.check_parm("-gamma") {
        return q_atof(args.argv(pnum + 1));
    }

    let voodoo = renderer.is_some_and(|r| r.contains("Voodoo"));
    let tdfx = vendor.is_some_and(|v| v.contains("3Dfx"));
    if voodoo || tdfx {
        1.0
    } else {
        0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> ComArgs {
        let owned: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        ComArgs::new(&owned)
    }

    fn test_palette() -> Vec<u8> {
        let mut pal = vec![0u8; PALETTE_BYTES];
        for i in 0..256 {
            pal[i * 3] = i as u8;
            pal[i * 3 + 1] = (255 - i) as u8;
            pal[i * 3 + 2] = (i / 2) as u8;
        }
        pal
    }

    #[test]
    fn test_8to24_layout() {
        let table = build_8to24(&test_palette());
        assert_eq!(table[0], 0xff00_ff00);
        // r=16, g=239, b=8
        assert_eq!(table[16], 0xff00_0000 | 16 | (239 << 8) | (8 << 16));
        assert_eq!(table[255] >> 24, 0);
        assert_eq!(table[255] & 0x00ff_ffff, 255 | (127 << 16));
    }

    #[test]
    fn test_15to8_exact_colours() {
        let mut pal = vec![0u8; PALETTE_BYTES];
        // index 1: pure red at the centre of the top 5-bit step
        pal[3..6].copy_from_slice(&[252, 4, 4]);
        // index 2: pure blue
        pal[6..9].copy_from_slice(&[4, 4, 252]);
        let table = build_15to8(&build_8to24(&pal));
        assert_eq!(table.len(), TABLE_15TO8_SIZE);

        assert_eq!(table[0x001f], 1);
        assert_eq!(table[0x7c00], 2);
        assert_eq!(table[0x0000], 0);
    }

    #[test]
    fn test_15to8_ties_pick_lowest_index() {
        // every entry is black, so every colour ties
        let table = build_15to8(&build_8to24(&[0u8; PALETTE_BYTES]));
        assert!(table.iter().all(|&i| i == 0));
    }

    #[test]
    fn test_apply_gamma() {
        let mut pal = vec![255u8; PALETTE_BYTES];
        pal[0] = 0;
        pal[1] = 127;
        apply_gamma(&mut pal, 1.0);
        // ((0+1)/256)*255 + 0.5 = 1.496
        assert_eq!(pal[0], 1);
        // (128/256)*255 + 0.5 = 128
        assert_eq!(pal[1], 128);
        assert_eq!(pal[2], 255);

        let mut pal = vec![63u8; PALETTE_BYTES];
        apply_gamma(&mut pal, 0.6);
        // (64/256)^0.6 * 255 + 0.5 = 111.49
        assert_eq!(pal[0], 111);
    }

    #[test]
    fn test_gamma_from_args() {
        assert_eq!(gamma_from_args(&args(&["winquake"]), None, None), 0.6);
        assert_eq!(
            gamma_from_args(&args(&["winquake"]), Some("Voodoo2"), None),
            1.0
        );
        assert_eq!(
            gamma_from_args(&args(&["winquake"]), None, Some("3Dfx Interactive")),
            1.0
        );
        assert_eq!(
            gamma_from_args(&args(&["winquake", "-gamma", "0.5"]), Some("Voodoo2"), None),
            0.5
        );
    }
}
