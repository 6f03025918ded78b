// sys.rs -- process-level services: printing, fatal errors, time, memory
//
// Uses winit for the window and `pixels` for presentation instead of SDL.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::process;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use thiserror::Error;

use wq_common::common::{self, ComArgs};
use wq_common::cvar::{self, CvarFlags};
use wq_common::q_shared::{q_atof, q_atoi};

use crate::host::Host;
use crate::vid_soft::VidError;

// ============================================================
// Constants
// ============================================================

pub const DEFAULT_MEMSIZE: usize = 16 * 1024 * 1024;
pub const DEFAULT_ZONE_SIZE: usize = 0xc00000;
pub const DEFAULT_TICRATE: &str = "0.05";

// ============================================================
// Errors
// ============================================================

#[derive(Error, Debug)]
pub enum SysError {
    #[error(transparent)]
    Vid(#[from] VidError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("out of handles")]
    OutOfHandles,
    #[error("Error opening {path}: {source}")]
    OpenWrite {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("video is not initialised")]
    NoVideo,
    #[error("{0}")]
    Host(String),
}

// ============================================================
// SYSTEM IO
// ============================================================

/// Print to stdout unless `sys_nostdout` is set.
///
/// Engine: `Sys_Printf`
pub fn sys_printf(msg: &str) {
    if cvar::cvar_variable_value("sys_nostdout") != 0.0 {
        return;
    }
    let mut out = io::stdout().lock();
    let _ = out.write_all(msg.as_bytes());
    let _ = out.flush();
}

fn write_warning(out: &mut impl Write, warning: &str) -> io::Result<()> {
    write!(out, "Warning: {}", warning)?;
    out.flush()
}

/// Engine: `Sys_Warn`
pub fn sys_warn(warning: &str) {
    let _ = write_warning(&mut io::stdout().lock(), warning);
}

/// Fatal error handler. Shuts the engine down and exits with status 1.
///
/// Engine: `Sys_Error`
pub fn sys_error(host: &mut dyn Host, error: &str) -> ! {
    println!("Error: {}", error);
    log::error!("{}", error);

    host.shutdown();
    process::exit(1);
}

/// Clean shutdown.
///
/// Engine: `Sys_Quit`
pub fn sys_quit(host: &mut dyn Host) -> ! {
    host.shutdown();
    process::exit(0);
}

// ============================================================
// Timing
// ============================================================

static BASE_TIME: OnceLock<Instant> = OnceLock::new();

/// Seconds since the first call.
///
/// Engine: `Sys_FloatTime`
pub fn sys_float_time() -> f64 {
    BASE_TIME.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Engine: `Sys_Sleep`
pub fn sys_sleep() {
    std::thread::sleep(Duration::from_millis(1));
}

// ============================================================
// Filesystem helpers
// ============================================================

/// Engine: `Sys_mkdir`
pub fn sys_mkdir(path: &str) {
    if let Err(e) = fs::create_dir_all(path) {
        log::debug!("sys_mkdir {}: {}", path, e);
    }
}

/// 1 if the file exists and can be read, -1 otherwise.
///
/// Engine: `Sys_FileTime`
pub fn sys_file_time(path: &str) -> i32 {
    match fs::File::open(path) {
        Ok(_) => 1,
        Err(_) => -1,
    }
}

/// Append `data` to `file`.
///
/// Engine: `Sys_DebugLog`
pub fn sys_debug_log(file: &str, data: &str) -> Result<(), SysError> {
    let mut f = OpenOptions::new().create(true).append(true).open(file)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

/// There is no stdin console; dedicated servers are driven by rcon.
///
/// Engine: `Sys_ConsoleInput`
pub fn sys_console_input() -> Option<String> {
    None
}

/// Graphic debugging aid, run after each frame while `sys_linerefresh` is set.
///
/// Engine: `Sys_LineRefresh`
pub fn sys_line_refresh() {}

// ============================================================
// Memory
// ============================================================

/// Zone size from the `QUAKEOPT` environment value: the first `m` (either
/// case) is followed by a size in MiB.
///
/// Engine: `Sys_ZoneBase`
pub fn zone_size(quakeopt: Option<&str>) -> usize {
    let Some(opt) = quakeopt else {
        return DEFAULT_ZONE_SIZE;
    };
    match opt.char_indices().find(|(_, c)| c.eq_ignore_ascii_case(&'m')) {
        Some((i, _)) => (q_atof(&opt[i + 1..]).max(0.0) * 1024.0 * 1024.0) as usize,
        None => DEFAULT_ZONE_SIZE,
    }
}

/// Startup parameters handed to the engine.
pub struct QuakeParms {
    pub basedir: String,
    pub cachedir: Option<String>,
    pub args: ComArgs,
    pub memsize: usize,
    pub membase: Vec<u8>,
    pub zonesize: usize,
}

impl QuakeParms {
    /// `-mem <MiB>` then `-heapsize <KiB>`; the latter wins when both are given.
    pub fn memsize_from_args(args: &ComArgs) -> usize {
        let mut memsize = DEFAULT_MEMSIZE;
        if let Some(mb) = args.parm_value("-mem") {
            memsize = q_atoi(mb).max(0) as usize * 1024 * 1024;
        }
        if let Some(kb) = args.parm_value("-heapsize") {
            memsize = q_atoi(kb).max(0) as usize * 1024;
        }
        memsize
    }

    pub fn from_args(args: ComArgs) -> Self {
        let memsize = Self::memsize_from_args(&args);
        Self {
            basedir: ".".to_string(),
            // a cachedir stops standalone .cfg files from being exec'd
            cachedir: None,
            args,
            memsize,
            membase: vec![0; memsize],
            zonesize: zone_size(std::env::var("QUAKEOPT").ok().as_deref()),
        }
    }
}

// ============================================================
// System Init
// ============================================================

/// Engine: `Sys_Init`
pub fn sys_init() {
    let _ = sys_float_time();

    cvar::cvar_init();
    cvar::cvar_get("developer", "0", CvarFlags::empty());
    cvar::cvar_get("sys_nostdout", "0", CvarFlags::empty());
    cvar::cvar_get("sys_linerefresh", "0", CvarFlags::empty());
    cvar::cvar_get("sys_ticrate", DEFAULT_TICRATE, CvarFlags::empty());
}

/// Version banner and startup arguments, printed after the engine is up.
pub fn print_banner(args: &ComArgs) {
    common::com_printf(&format!(
        "\n{} version {:.2}\n\n",
        common::DISTNAME,
        common::DISTVER
    ));
    common::com_printf("Based on the SDL port of WinQuake\n\n");

    if args.argc() > 1 {
        let mut line = String::from("Startup args:");
        for arg in &args.all()[1..] {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str("\n\n");
        common::com_printf(&line);
    }
}

// ============================================================
// Tests
// ============================================================
