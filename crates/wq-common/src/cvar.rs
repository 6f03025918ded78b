// cvar.rs -- dynamic variable tracking

use crate::common::com_printf;
use crate::q_shared::q_atof;

use parking_lot::Mutex;
use std::collections::HashMap;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CvarFlags: u32 {
        /// Written to config.cfg.
        const ARCHIVE = 0x01;
        /// Changes are broadcast to clients.
        const SERVER  = 0x02;
    }
}

/// A console variable.
#[derive(Clone, Debug)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub flags: CvarFlags,
    pub modified: bool,
    pub value: f32,
}

/// The full cvar system context.
#[derive(Default)]
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    /// Float value of a cvar, 0 if it does not exist.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find_var(name).map_or(0.0, |v| v.value)
    }

    /// String value of a cvar, "" if it does not exist.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |v| v.string.as_str())
    }

    /// Register a new variable.
    ///
    /// Registering a name twice is reported on the console and leaves the first definition.
    pub fn register(&mut self, name: &str, value: &str, flags: CvarFlags) -> Option<usize> {
        if self.cvar_index.contains_key(name) {
            com_printf(&format!("Can't register variable {}, already defined\n", name));
            return None;
        }
        Some(self.insert(name, value, flags))
    }

    /// Get or create a cvar. An existing value is kept; flags are OR'd in.
    pub fn get_or_create(&mut self, name: &str, value: &str, flags: CvarFlags) -> usize {
        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            return idx;
        }
        self.insert(name, value, flags)
    }

    fn insert(&mut self, name: &str, value: &str, flags: CvarFlags) -> usize {
        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            flags,
            modified: true,
            value: q_atof(value),
        });
        self.cvar_index.insert(name.to_string(), idx);
        idx
    }

    /// Set a cvar value. Unknown names are reported and ignored.
    pub fn set(&mut self, name: &str, value: &str) -> Option<usize> {
        let Some(idx) = self.find_var_index(name) else {
            com_printf(&format!("Cvar_Set: variable {} not found\n", name));
            return None;
        };

        let var = &mut self.cvar_vars[idx];
        if var.string != value {
            var.modified = true;
            var.string = value.to_string();
            var.value = q_atof(value);
        }
        Some(idx)
    }

    /// Set a cvar from a float value.
    pub fn set_value(&mut self, name: &str, value: f32) -> Option<usize> {
        let val_str = if value == (value as i32) as f32 {
            format!("{}", value as i32)
        } else {
            format!("{}", value)
        };
        self.set(name, &val_str)
    }

    /// Write all archived cvars to a writer.
    pub fn write_variables(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        for var in &self.cvar_vars {
            if var.flags.contains(CvarFlags::ARCHIVE) {
                writeln!(writer, "{} \"{}\"", var.name, var.string)?;
            }
        }
        Ok(())
    }
}

// ============================================================
// Global singleton and free-function wrappers
// ============================================================

static CVAR_CTX: Mutex<Option<CvarContext>> = parking_lot::const_mutex(None);

/// Create the global cvar context if it does not exist yet.
pub fn cvar_init() {
    let mut g = CVAR_CTX.lock();
    if g.is_none() {
        *g = Some(CvarContext::new());
    }
}

pub fn cvar_get(name: &str, value: &str, flags: CvarFlags) -> Option<usize> {
    CVAR_CTX.lock().as_mut().map(|c| c.get_or_create(name, value, flags))
}

pub fn cvar_variable_value(name: &str) -> f32 {
    CVAR_CTX.lock().as_ref().map_or(0.0, |c| c.variable_value(name))
}

pub fn cvar_variable_string(name: &str) -> String {
    CVAR_CTX
        .lock()
        .as_ref()
        .map_or(String::new(), |c| c.variable_string(name).to_string())
}

/// Access the global context with a closure. Returns None if not initialized.
pub fn with_cvar_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut CvarContext) -> R,
{
    CVAR_CTX.lock().as_mut().map(f)
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvar_register_and_find() {
        let mut ctx = CvarContext::new();
        ctx.register("sys_ticrate", "0.05", CvarFlags::empty());
        assert!((ctx.variable_value("sys_ticrate") - 0.05).abs() < 1e-6);
        assert_eq!(ctx.variable_string("sys_ticrate"), "0.05");
    }

    #[test]
    fn test_cvar_register_twice_keeps_first() {
        let mut ctx = CvarContext::new();
        assert!(ctx.register("sensitivity", "3", CvarFlags::ARCHIVE).is_some());
        assert!(ctx.register("sensitivity", "9", CvarFlags::empty()).is_none());
        assert_eq!(ctx.variable_value("sensitivity"), 3.0);
    }

    #[test]
    fn test_cvar_get_or_create_merges_flags() {
        let mut ctx = CvarContext::new();
        let a = ctx.get_or_create("m_yaw", "0.022", CvarFlags::empty());
        let b = ctx.get_or_create("m_yaw", "1", CvarFlags::ARCHIVE);
        assert_eq!(a, b);
        assert_eq!(ctx.variable_string("m_yaw"), "0.022");
        assert!(ctx.cvar_vars[a].flags.contains(CvarFlags::ARCHIVE));
    }

    #[test]
    fn test_cvar_set_marks_modified() {
        let mut ctx = CvarContext::new();
        let idx = ctx.get_or_create("sys_nostdout", "0", CvarFlags::empty());
        ctx.cvar_vars[idx].modified = false;
        ctx.set("sys_nostdout", "0");
        assert!(!ctx.cvar_vars[idx].modified);
        ctx.set("sys_nostdout", "1");
        assert!(ctx.cvar_vars[idx].modified);
        assert_eq!(ctx.variable_value("sys_nostdout"), 1.0);
    }

    #[test]
    fn test_cvar_set_unknown_is_ignored() {
        let mut ctx = CvarContext::new();
        assert!(ctx.set("nope", "1").is_none());
        assert_eq!(ctx.variable_value("nope"), 0.0);
    }

    #[test]
    fn test_cvar_set_value_formats_integers() {
        let mut ctx = CvarContext::new();
        ctx.get_or_create("lookstrafe", "0", CvarFlags::empty());
        ctx.set_value("lookstrafe", 1.0);
        assert_eq!(ctx.variable_string("lookstrafe"), "1");
        ctx.set_value("lookstrafe", 0.5);
        assert_eq!(ctx.variable_string("lookstrafe"), "0.5");
    }

    #[test]
    fn test_write_variables_only_archived() {
        let mut ctx = CvarContext::new();
        ctx.register("sensitivity", "3", CvarFlags::ARCHIVE);
        ctx.register("sys_linerefresh", "0", CvarFlags::empty());
        let mut buf = Vec::new();
        ctx.write_variables(&mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("sensitivity \"3\""));
        assert!(!output.contains("sys_linerefresh"));
    }
}
