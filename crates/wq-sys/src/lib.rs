#![allow(clippy::manual_range_contains, clippy::float_cmp, clippy::identity_op,
         clippy::too_many_arguments, clippy::needless_range_loop)]

// Platform layer for the software-rendered engine: window, video, input,
// timing and file handles.

pub mod compositor;
pub mod present;
pub mod vid_soft;
pub mod gl_tables;

pub mod sys;
pub mod sys_files;
pub mod frame;
pub mod in_winit;
pub mod host;
pub mod test_card;
