// Entry point: startup, the window event pump and the main loop.
//
// Startup follows the engine order: parse the command line, build the
// startup parameters, Sys_Init, Host_Init, then the banner. With winit the
// event loop drives both input and frames; each `about_to_wait` runs one
// pass of the main loop. Dedicated servers never open a window and run the
// loop directly.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use wq_common::common::{ComArgs, DISTNAME};
use wq_common::cvar::cvar_variable_value;

use wq_sys::frame::{FrameClock, FrameStep};
use wq_sys::host::{Host, HostStatus, Platform};
use wq_sys::in_winit::{in_grab_mouse, num_lock_from_logical, translate_key, wheel_key};
use wq_sys::present::PixelsPresenter;
use wq_sys::sys::{
    print_banner, sys_error, sys_float_time, sys_init, sys_line_refresh, sys_quit, sys_sleep,
    sys_warn, QuakeParms,
};
use wq_sys::test_card::TestCardHost;
use wq_sys::vid_soft::{VidConfig, VidError, Video};

/// Engine, platform services and frame timing: one pass of the main loop.
struct Runner {
    host: Box<dyn Host>,
    platform: Platform,
    clock: FrameClock,
}

impl Runner {
    fn run_frame(&mut self) -> HostStatus {
        for (key, down) in self.platform.input.in_commands() {
            self.host.key_event(key, down);
        }

        let ticrate = cvar_variable_value("sys_ticrate") as f64;
        let step = self.clock.step(
            sys_float_time(),
            self.host.is_dedicated(),
            ticrate,
            self.host.vcr_playback(),
        );

        let time = match step {
            FrameStep::Sleep => {
                sys_sleep();
                return HostStatus::Running;
            }
            FrameStep::Run(time) => time,
        };

        let status = match self.host.frame(time, &mut self.platform) {
            Ok(status) => status,
            Err(e) => sys_error(self.host.as_mut(), &e.to_string()),
        };

        // graphic debugging aids
        if cvar_variable_value("sys_linerefresh") != 0.0 {
            sys_line_refresh();
        }
        status
    }

    fn fatal(&mut self, error: &str) -> ! {
        sys_error(self.host.as_mut(), error)
    }
}

/// Send one keyboard event to the engine. Auto-repeat arrives as further
/// presses; the engine decides which repeats it honours.
fn key_input(host: &mut dyn Host, physical: PhysicalKey, logical: &Key, pressed: bool) {
    if let PhysicalKey::Code(kc) = physical {
        let num_lock = num_lock_from_logical(logical);
        if let Some(key) = translate_key(kc, num_lock) {
            host.key_event(key, pressed);
        }
    }
}

/// Application state for the winit event loop.
struct WqApp {
    runner: Runner,
    config: VidConfig,
    window: Option<Arc<Window>>,
    focused: bool,
}

impl WqApp {
    fn vid_init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), VidError> {
        let mut attrs = WindowAttributes::default()
            .with_title(DISTNAME)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(attrs)?);
        log::info!("window created: {}x{}", self.config.width, self.config.height);

        let presenter = PixelsPresenter::new(Arc::clone(&window), self.config.width, self.config.height)?;
        let vid = Video::new(
            self.config,
            &self.runner.platform.args,
            self.runner.host.palette(),
            self.runner.host.colormap(),
            Box::new(presenter),
        )?;

        self.runner.platform.vid = Some(vid);
        self.runner.platform.input.in_init(&self.runner.platform.args);
        if self.runner.platform.input.mouse_avail {
            in_grab_mouse(&window, true);
        }
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for WqApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.vid_init(event_loop) {
            self.runner.fatal(&e.to_string());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let input = &mut self.runner.platform.input;

        match event {
            WindowEvent::CloseRequested => {
                self.runner.host.disconnect();
                self.runner.host.shutdown_server();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                key_input(
                    self.runner.host.as_mut(),
                    event.physical_key,
                    &event.logical_key,
                    event.state == ElementState::Pressed,
                );
            }

            WindowEvent::MouseInput { state, button, .. } => {
                input.mouse_button(button, state == ElementState::Pressed);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(key) = wheel_key(delta) {
                    self.runner.host.key_event(key, true);
                    self.runner.host.key_event(key, false);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let size = window.inner_size();
                if let Some((x, y)) = input.cursor_moved(position.x, position.y, size.width, size.height) {
                    // not every platform can warp; motion still comes from the device
                    let _ = window.set_cursor_position(PhysicalPosition::new(x, y));
                }
            }

            WindowEvent::Focused(focused) => {
                if input.mouse_avail {
                    in_grab_mouse(&window, focused);
                }
                self.focused = focused;
            }

            WindowEvent::Resized(size) => {
                if let Some(vid) = self.runner.platform.vid.as_mut() {
                    if let Err(e) = vid.resize_surface(size.width, size.height) {
                        sys_warn(&format!("{}\n", e));
                    }
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if !self.focused {
            return;
        }
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.runner.platform.input.mouse_motion(dx, dy);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            return;
        }
        if self.runner.run_frame() == HostStatus::Quit {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.runner.platform.input.in_shutdown();
        if let Some(window) = &self.window {
            in_grab_mouse(window, false);
        }
        if let Some(vid) = self.runner.platform.vid.take() {
            vid.shutdown();
        }
        self.runner.host.shutdown();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().collect();
    let args = ComArgs::new(&argv);
    let parms = QuakeParms::from_args(args.clone());

    sys_init();

    let mut host: Box<dyn Host> = Box::new(TestCardHost::new());
    if let Err(e) = host.init(&parms) {
        sys_error(host.as_mut(), &e.to_string());
    }

    print_banner(&args);

    let mut runner = Runner {
        host,
        platform: Platform::new(args),
        clock: FrameClock::new(sys_float_time()),
    };

    if runner.host.is_dedicated() {
        loop {
            if runner.run_frame() == HostStatus::Quit {
                sys_quit(runner.host.as_mut());
            }
        }
    }

    let config = match VidConfig::from_args(&runner.platform.args) {
        Ok(config) => config,
        Err(e) => runner.fatal(&e.to_string()),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => runner.fatal(&format!("VID: couldn't create event loop: {}", e)),
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = WqApp {
        runner,
        config,
        window: None,
        focused: true,
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        app.runner.fatal(&e.to_string());
    }
}
