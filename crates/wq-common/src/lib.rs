#![allow(clippy::manual_range_contains, clippy::float_cmp, clippy::needless_range_loop)]

// Engine-facing shared code: console print, command line, cvars, key codes.

pub mod q_shared;
pub mod common;
pub mod cvar;
pub mod keys;
