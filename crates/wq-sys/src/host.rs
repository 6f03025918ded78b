// host.rs -- the contract between the platform layer and the engine
//
// The engine is handed a `Platform` each frame and reaches video, input and
// file services through it. The platform calls back into the engine only
// through `Host`.

use wq_common::common::ComArgs;

use crate::in_winit::InputState;
use crate::sys::{QuakeParms, SysError};
use crate::sys_files::FileHandles;
use crate::vid_soft::Video;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostStatus {
    Running,
    Quit,
}

pub trait Host {
    /// Engine: `Host_Init`
    fn init(&mut self, parms: &QuakeParms) -> Result<(), SysError>;

    /// Run one engine frame of `time` seconds.
    ///
    /// Engine: `Host_Frame`
    fn frame(&mut self, time: f64, platform: &mut Platform) -> Result<HostStatus, SysError>;

    /// Engine: `Host_Shutdown`
    fn shutdown(&mut self);

    /// Engine: `Key_Event`
    fn key_event(&mut self, key: i32, down: bool);

    /// Engine: `CL_Disconnect`
    fn disconnect(&mut self) {}

    /// Engine: `Host_ShutdownServer`
    fn shutdown_server(&mut self) {}

    /// `cls.state == ca_dedicated`
    fn is_dedicated(&self) -> bool;

    /// A demo file is being played back at full speed.
    fn vcr_playback(&self) -> bool {
        false
    }

    /// The 768-byte base palette (`gfx/palette.lmp`).
    fn palette(&self) -> &[u8];

    /// The lighting colormap (`gfx/colormap.lmp`).
    fn colormap(&self) -> &[u8];
}

/// Platform services lent to the engine for the duration of a frame.
pub struct Platform {
    pub args: ComArgs,
    pub files: FileHandles,
    pub input: InputState,
    pub vid: Option<Video>,
}

impl Platform {
    pub fn new(args: ComArgs) -> Self {
        Self {
            args,
            files: FileHandles::new(),
            input: InputState::default(),
            vid: None,
        }
    }

    pub fn vid_mut(&mut self) -> Result<&mut Video, SysError> {
        self.vid.as_mut().ok_or(SysError::NoVideo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_without_video() {
        let mut p = Platform::new(ComArgs::new(&["winquake".to_string()]));
        assert!(matches!(p.vid_mut(), Err(SysError::NoVideo)));
        assert_eq!(p.files.open_count(), 0);
    }
}
