// common.rs -- console print, command-line arguments, version strings

pub const MAX_NUM_ARGVS: usize = 50;

/// Distribution name and version (window title, startup banner).
pub const DISTNAME: &str = "WinQuake-RS";
pub const DISTVER: f32 = 1.09;

// ============================================================
// Com_Printf / Com_DPrintf
// ============================================================

/// Console print.
pub fn com_printf(msg: &str) {
    print!("{}", msg);
}

/// Developer-only print, gated on the "developer" cvar.
pub fn com_dprintf(msg: &str) {
    if crate::cvar::cvar_variable_value("developer") == 0.0 {
        return;
    }
    com_printf(msg);
}

// ============================================================
// COM argument handling
// ============================================================

/// Command-line arguments as the engine sees them. `argv[0]` is the program.
#[derive(Clone, Debug, Default)]
pub struct ComArgs {
    argv: Vec<String>,
}

impl ComArgs {
    pub fn new(args: &[String]) -> Self {
        let argc = args.len().min(MAX_NUM_ARGVS);
        Self {
            argv: args[..argc].to_vec(),
        }
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    pub fn argv(&self, arg: usize) -> &str {
        self.argv.get(arg).map_or("", String::as_str)
    }

    pub fn all(&self) -> &[String] {
        &self.argv
    }

    /// Index of `parm` in argv (never 0), or `None` if it is absent.
    pub fn check_parm(&self, parm: &str) -> Option<usize> {
        self.argv
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, a)| !a.is_empty() && a.as_str() == parm)
            .map(|(i, _)| i)
    }

    /// The argument following `parm`, if both are present.
    pub fn parm_value(&self, parm: &str) -> Option<&str> {
        let i = self.check_parm(parm)?;
        self.argv.get(i + 1).map(String::as_str)
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> ComArgs {
        let owned: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        ComArgs::new(&owned)
    }

    #[test]
    fn test_check_parm_skips_program_name() {
        let a = args(&["-fullscreen", "-fullscreen"]);
        assert_eq!(a.check_parm("-fullscreen"), Some(1));
    }

    #[test]
    fn test_check_parm_missing() {
        let a = args(&["winquake", "-nomouse"]);
        assert_eq!(a.check_parm("-fullscreen"), None);
        assert_eq!(a.check_parm("-nomouse"), Some(1));
    }

    #[test]
    fn test_parm_value() {
        let a = args(&["winquake", "-mem", "32", "-heapsize"]);
        assert_eq!(a.parm_value("-mem"), Some("32"));
        assert_eq!(a.parm_value("-heapsize"), None);
        assert_eq!(a.parm_value("-gamma"), None);
    }

    #[test]
    fn test_argv_out_of_range_is_empty() {
        let a = args(&["winquake"]);
        assert_eq!(a.argv(5), "");
        assert_eq!(a.argc(), 1);
    }

    #[test]
    fn test_argc_capped() {
        let many: Vec<String> = (0..80).map(|i| i.to_string()).collect();
        assert_eq!(ComArgs::new(&many).argc(), MAX_NUM_ARGVS);
    }
}
