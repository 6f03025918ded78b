// in_winit.rs -- keyboard and mouse translation
//
// Window events arrive from winit; the engine only sees its own key codes,
// a per-frame mouse delta and the resulting changes to the usercmd.

use bitflags::bitflags;
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{Key, KeyCode};
use winit::window::{CursorGrabMode, Window};

use wq_common::common::ComArgs;
use wq_common::cvar::{CvarContext, CvarFlags};
use wq_common::keys::*;
use wq_common::q_shared::{UserCmd, Vec3, PITCH, YAW};

// ============================================================
// Keyboard
// ============================================================

/// Numpad keys report a character while num-lock is on and a named
/// navigation key while it is off.
pub fn num_lock_from_logical(logical: &Key) -> bool {
    matches!(logical, Key::Character(_))
}

/// Keypad key: navigation code with num-lock, ASCII without.
fn keypad(num_lock: bool, nav: i32, ascii: u8) -> i32 {
    if num_lock {
        nav
    } else {
        ascii as i32
    }
}

/// Map a physical key to an engine key code. `None` for keys the engine has
/// no code for.
pub fn translate_key(kc: KeyCode, num_lock: bool) -> Option<i32> {
    let key = match kc {
        KeyCode::Tab => K_TAB,
        KeyCode::Enter => K_ENTER,
        KeyCode::Escape => K_ESCAPE,
        KeyCode::Space => K_SPACE,
        KeyCode::Backspace => K_BACKSPACE,
        KeyCode::Delete => K_DEL,
        KeyCode::ArrowUp => K_UPARROW,
        KeyCode::ArrowDown => K_DOWNARROW,
        KeyCode::ArrowLeft => K_LEFTARROW,
        KeyCode::ArrowRight => K_RIGHTARROW,
        KeyCode::AltLeft | KeyCode::AltRight => K_ALT,
        KeyCode::ControlLeft | KeyCode::ControlRight => K_CTRL,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => K_SHIFT,
        KeyCode::F1 => K_F1,
        KeyCode::F2 => K_F2,
        KeyCode::F3 => K_F3,
        KeyCode::F4 => K_F4,
        KeyCode::F5 => K_F5,
        KeyCode::F6 => K_F6,
        KeyCode::F7 => K_F7,
        KeyCode::F8 => K_F8,
        KeyCode::F9 => K_F9,
        KeyCode::F10 => K_F10,
        KeyCode::F11 => K_F11,
        KeyCode::F12 => K_F12,
        KeyCode::Insert => K_INS,
        KeyCode::Home => K_HOME,
        KeyCode::End => K_END,
        KeyCode::PageUp => K_PGUP,
        KeyCode::PageDown => K_PGDN,
        KeyCode::Pause => K_PAUSE,

        KeyCode::Numpad0 => keypad(num_lock, K_INS, b'0'),
        KeyCode::Numpad1 => keypad(num_lock, K_END, b'1'),
        KeyCode::Numpad2 => keypad(num_lock, K_DOWNARROW, b'2'),
        KeyCode::Numpad3 => keypad(num_lock, K_PGDN, b'3'),
        KeyCode::Numpad4 => keypad(num_lock, K_LEFTARROW, b'4'),
        KeyCode::Numpad5 => b'5' as i32,
        KeyCode::Numpad6 => keypad(num_lock, K_RIGHTARROW, b'6'),
        KeyCode::Numpad7 => keypad(num_lock, K_HOME, b'7'),
        KeyCode::Numpad8 => keypad(num_lock, K_UPARROW, b'8'),
        KeyCode::Numpad9 => keypad(num_lock, K_PGUP, b'9'),
        KeyCode::NumpadDecimal => keypad(num_lock, K_DEL, b'.'),
        KeyCode::NumpadDivide => b'/' as i32,
        KeyCode::NumpadMultiply => b'*' as i32,
        KeyCode::NumpadSubtract => b'-' as i32,
        KeyCode::NumpadAdd => b'+' as i32,
        KeyCode::NumpadEnter => K_ENTER,
        KeyCode::NumpadEqual => b'=' as i32,

        // the context-menu key opens the console
        KeyCode::ContextMenu => 0x60,

        KeyCode::KeyA => b'a' as i32,
        KeyCode::KeyB => b'b' as i32,
        KeyCode::KeyC => b'c' as i32,
        KeyCode::KeyD => b'd' as i32,
        KeyCode::KeyE => b'e' as i32,
        KeyCode::KeyF => b'f' as i32,
        KeyCode::KeyG => b'g' as i32,
        KeyCode::KeyH => b'h' as i32,
        KeyCode::KeyI => b'i' as i32,
        KeyCode::KeyJ => b'j' as i32,
        KeyCode::KeyK => b'k' as i32,
        KeyCode::KeyL => b'l' as i32,
        KeyCode::KeyM => b'm' as i32,
        KeyCode::KeyN => b'n' as i32,
        KeyCode::KeyO => b'o' as i32,
        KeyCode::KeyP => b'p' as i32,
        KeyCode::KeyQ => b'q' as i32,
        KeyCode::KeyR => b'r' as i32,
        KeyCode::KeyS => b's' as i32,
        KeyCode::KeyT => b't' as i32,
        KeyCode::KeyU => b'u' as i32,
        KeyCode::KeyV => b'v' as i32,
        KeyCode::KeyW => b'w' as i32,
        KeyCode::KeyX => b'x' as i32,
        KeyCode::KeyY => b'y' as i32,
        KeyCode::KeyZ => b'z' as i32,

        KeyCode::Digit0 => b'0' as i32,
        KeyCode::Digit1 => b'1' as i32,
        KeyCode::Digit2 => b'2' as i32,
        KeyCode::Digit3 => b'3' as i32,
        KeyCode::Digit4 => b'4' as i32,
        KeyCode::Digit5 => b'5' as i32,
        KeyCode::Digit6 => b'6' as i32,
        KeyCode::Digit7 => b'7' as i32,
        KeyCode::Digit8 => b'8' as i32,
        KeyCode::Digit9 => b'9' as i32,

        KeyCode::Minus => b'-' as i32,
        KeyCode::Equal => b'=' as i32,
        KeyCode::BracketLeft => b'[' as i32,
        KeyCode::BracketRight => b']' as i32,
        KeyCode::Backslash => b'\\' as i32,
        KeyCode::Semicolon => b';' as i32,
        KeyCode::Quote => b'\'' as i32,
        KeyCode::Backquote => b'`' as i32,
        KeyCode::Comma => b',' as i32,
        KeyCode::Period => b'.' as i32,
        KeyCode::Slash => b'/' as i32,

        _ => return None,
    };

    Some(if key > K_MAX { 0 } else { key })
}

// ============================================================
// Mouse
// ============================================================

bitflags! {
    /// Window-library button order.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MouseButtons: u32 {
        const LEFT = 1;
        const MIDDLE = 2;
        const RIGHT = 4;
    }
}

/// Engine button order is left, right, middle.
fn swap_middle_right(state: u32) -> u32 {
    (state & !0x06) | ((state & 0x02) << 1) | ((state & 0x04) >> 1)
}

pub fn wheel_key(delta: MouseScrollDelta) -> Option<i32> {
    let dy = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(pos) => pos.y,
    };
    if dy > 0.0 {
        Some(K_MWHEELUP)
    } else if dy < 0.0 {
        Some(K_MWHEELDOWN)
    } else {
        None
    }
}

/// Mouse cvars read by `in_move`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseCvars {
    pub sensitivity: f32,
    pub m_yaw: f32,
    pub m_pitch: f32,
    pub m_forward: f32,
    pub m_side: f32,
    pub lookstrafe: f32,
}

impl Default for MouseCvars {
    fn default() -> Self {
        Self {
            sensitivity: 3.0,
            m_yaw: 0.022,
            m_pitch: 0.022,
            m_forward: 1.0,
            m_side: 0.8,
            lookstrafe: 0.0,
        }
    }
}

impl MouseCvars {
    pub fn register(ctx: &mut CvarContext) {
        ctx.get_or_create("sensitivity", "3", CvarFlags::ARCHIVE);
        ctx.get_or_create("m_yaw", "0.022", CvarFlags::ARCHIVE);
        ctx.get_or_create("m_pitch", "0.022", CvarFlags::ARCHIVE);
        ctx.get_or_create("m_forward", "1", CvarFlags::ARCHIVE);
        ctx.get_or_create("m_side", "0.8", CvarFlags::ARCHIVE);
        ctx.get_or_create("lookstrafe", "0", CvarFlags::ARCHIVE);
    }

    pub fn from_ctx(ctx: &CvarContext) -> Self {
        Self {
            sensitivity: ctx.variable_value("sensitivity"),
            m_yaw: ctx.variable_value("m_yaw"),
            m_pitch: ctx.variable_value("m_pitch"),
            m_forward: ctx.variable_value("m_forward"),
            m_side: ctx.variable_value("m_side"),
            lookstrafe: ctx.variable_value("lookstrafe"),
        }
    }
}

/// Button state the client tracks for `+strafe` / `+mlook`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveButtons {
    pub strafe: bool,
    pub mlook: bool,
    pub noclip_anglehack: bool,
}

#[derive(Debug, Default)]
pub struct InputState {
    pub mouse_avail: bool,
    pub mouse_x: f32,
    pub mouse_y: f32,
    buttons: MouseButtons,
    old_buttonstate: u32,
}

impl InputState {
    pub fn in_init(&mut self, args: &ComArgs) {
        if args.check_parm("-nomouse").is_some() {
            return;
        }
        self.mouse_x = 0.0;
        self.mouse_y = 0.0;
        self.mouse_avail = true;
    }

    pub fn in_shutdown(&mut self) {
        self.mouse_avail = false;
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        let bit = match button {
            MouseButton::Left => MouseButtons::LEFT,
            MouseButton::Middle => MouseButtons::MIDDLE,
            MouseButton::Right => MouseButtons::RIGHT,
            _ => return,
        };
        self.buttons.set(bit, pressed);
    }

    /// Key events for mouse buttons that changed since the last call.
    pub fn in_commands(&mut self) -> Vec<(i32, bool)> {
        let mut events = Vec::new();
        if !self.mouse_avail {
            return events;
        }

        let state = swap_middle_right(self.buttons.bits());
        for i in 0..3 {
            let now = state & (1 << i) != 0;
            let before = self.old_buttonstate & (1 << i) != 0;
            if now && !before {
                events.push((K_MOUSE1 + i, true));
            }
            if !now && before {
                events.push((K_MOUSE1 + i, false));
            }
        }
        self.old_buttonstate = state;
        events
    }

    /// Raw relative motion from the mouse device. Several events can
    /// arrive between frames; they add up until `in_move` consumes them.
    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        if !self.mouse_avail {
            return;
        }
        self.mouse_x += (dx * 10.0) as f32;
        self.mouse_y += (dy * 10.0) as f32;
    }

    /// Where to warp the cursor once it strays out of the middle half of
    /// the window. A cursor resting on the centre is the warp itself.
    pub fn cursor_moved(&self, x: f64, y: f64, width: u32, height: u32) -> Option<(f64, f64)> {
        let (x, y) = (x as i32, y as i32);
        let (cx, cy) = ((width / 2) as i32, (height / 2) as i32);
        let (qx, qy) = ((width / 4) as i32, (height / 4) as i32);

        if !self.mouse_avail || (x == cx && y == cy) {
            return None;
        }
        if x < cx - qx || x > cx + qx || y < cy - qy || y > cy + qy {
            return Some((cx as f64, cy as f64));
        }
        None
    }

    /// Apply the pending mouse delta to the view angles and movement.
    /// Returns true when pitch drift should stop.
    pub fn in_move(
        &mut self,
        cmd: &mut UserCmd,
        viewangles: &mut Vec3,
        buttons: MoveButtons,
        cvars: &MouseCvars,
    ) -> bool {
        if !self.mouse_avail {
            return false;
        }

        let mouse_x = self.mouse_x * cvars.sensitivity;
        let mouse_y = self.mouse_y * cvars.sensitivity;

        if buttons.strafe || (cvars.lookstrafe != 0.0 && buttons.mlook) {
            cmd.sidemove += cvars.m_side * mouse_x;
        } else {
            viewangles[YAW] -= cvars.m_yaw * mouse_x;
        }

        if buttons.mlook && !buttons.strafe {
            viewangles[PITCH] = (viewangles[PITCH] + cvars.m_pitch * mouse_y).clamp(-70.0, 80.0);
        } else if buttons.strafe && buttons.noclip_anglehack {
            cmd.upmove -= cvars.m_forward * mouse_y;
        } else {
            cmd.forwardmove -= cvars.m_forward * mouse_y;
        }

        self.mouse_x = 0.0;
        self.mouse_y = 0.0;
        buttons.mlook
    }
}

/// Confine and hide the cursor while the window has focus.
pub fn in_grab_mouse(window: &Window, grab: bool) {
    if grab {
        if window.set_cursor_grab(CursorGrabMode::Confined).is_err() {
            let _ = window.set_cursor_grab(CursorGrabMode::Locked);
        }
        window.set_cursor_visible(false);
    } else {
        let _ = window.set_cursor_grab(CursorGrabMode::None);
        window.set_cursor_visible(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey;

    fn active() -> InputState {
        let mut input = InputState::default();
        input.in_init(&ComArgs::new(&["winquake".to_string()]));
        input
    }

    #[test]
    fn test_translate_named_keys() {
        assert_eq!(translate_key(KeyCode::Escape, false), Some(K_ESCAPE));
        assert_eq!(translate_key(KeyCode::ShiftRight, false), Some(K_SHIFT));
        assert_eq!(translate_key(KeyCode::F12, false), Some(K_F12));
        assert_eq!(translate_key(KeyCode::Pause, false), Some(K_PAUSE));
        assert_eq!(translate_key(KeyCode::KeyQ, false), Some(b'q' as i32));
        assert_eq!(translate_key(KeyCode::Backquote, false), Some(b'`' as i32));
    }

    #[test]
    fn test_translate_keypad_num_lock() {
        assert_eq!(translate_key(KeyCode::Numpad8, true), Some(K_UPARROW));
        assert_eq!(translate_key(KeyCode::Numpad8, false), Some(b'8' as i32));
        assert_eq!(translate_key(KeyCode::Numpad0, true), Some(K_INS));
        assert_eq!(translate_key(KeyCode::NumpadDecimal, true), Some(K_DEL));
        assert_eq!(translate_key(KeyCode::NumpadDecimal, false), Some(b'.' as i32));
        assert_eq!(translate_key(KeyCode::Numpad5, true), Some(b'5' as i32));
        assert_eq!(translate_key(KeyCode::Numpad5, false), Some(b'5' as i32));
    }

    #[test]
    fn test_translate_keypad_operators() {
        assert_eq!(translate_key(KeyCode::NumpadDivide, true), Some(b'/' as i32));
        assert_eq!(translate_key(KeyCode::NumpadMultiply, true), Some(b'*' as i32));
        assert_eq!(translate_key(KeyCode::NumpadSubtract, false), Some(b'-' as i32));
        assert_eq!(translate_key(KeyCode::NumpadAdd, false), Some(b'+' as i32));
        assert_eq!(translate_key(KeyCode::NumpadEnter, false), Some(K_ENTER));
        assert_eq!(translate_key(KeyCode::NumpadEqual, false), Some(b'=' as i32));
    }

    #[test]
    fn test_translate_context_menu_opens_console() {
        assert_eq!(translate_key(KeyCode::ContextMenu, false), Some(0x60));
    }

    #[test]
    fn test_translate_unmapped() {
        assert_eq!(translate_key(KeyCode::CapsLock, false), None);
        assert_eq!(translate_key(KeyCode::SuperLeft, false), None);
    }

    #[test]
    fn test_num_lock_from_logical() {
        assert!(num_lock_from_logical(&Key::Character("8".into())));
        assert!(!num_lock_from_logical(&Key::Named(NamedKey::ArrowUp)));
    }

    #[test]
    fn test_nomouse() {
        let mut input = InputState::default();
        input.in_init(&ComArgs::new(&["winquake".to_string(), "-nomouse".to_string()]));
        assert!(!input.mouse_avail);
        input.mouse_button(MouseButton::Left, true);
        assert!(input.in_commands().is_empty());
    }

    #[test]
    fn test_in_commands_edges_and_swap() {
        let mut input = active();
        input.mouse_button(MouseButton::Left, true);
        input.mouse_button(MouseButton::Right, true);
        assert_eq!(input.in_commands(), vec![(K_MOUSE1, true), (K_MOUSE2, true)]);
        assert!(input.in_commands().is_empty());

        input.mouse_button(MouseButton::Right, false);
        input.mouse_button(MouseButton::Middle, true);
        assert_eq!(input.in_commands(), vec![(K_MOUSE2, false), (K_MOUSE3, true)]);

        input.in_shutdown();
        assert!(input.in_commands().is_empty());
    }

    #[test]
    fn test_wheel_key() {
        assert_eq!(wheel_key(MouseScrollDelta::LineDelta(0.0, 1.0)), Some(K_MWHEELUP));
        assert_eq!(wheel_key(MouseScrollDelta::LineDelta(0.0, -2.0)), Some(K_MWHEELDOWN));
        assert_eq!(wheel_key(MouseScrollDelta::LineDelta(1.0, 0.0)), None);
    }

    #[test]
    fn test_mouse_motion_accumulates() {
        let mut input = active();
        input.mouse_motion(5.0, 0.0);
        input.mouse_motion(1.0, -2.0);
        assert_eq!((input.mouse_x, input.mouse_y), (60.0, -20.0));

        let mut off = InputState::default();
        off.mouse_motion(5.0, 5.0);
        assert_eq!((off.mouse_x, off.mouse_y), (0.0, 0.0));
    }

    #[test]
    fn test_cursor_moved_warp() {
        let input = active();
        assert_eq!(input.cursor_moved(405.0, 301.0, 800, 600), None);
        assert_eq!(input.cursor_moved(650.0, 301.0, 800, 600), Some((400.0, 300.0)));
        assert_eq!(input.cursor_moved(400.0, 100.0, 800, 600), Some((400.0, 300.0)));
        // the warp lands on the centre and is ignored
        assert_eq!(input.cursor_moved(400.0, 300.0, 800, 600), None);
        // the position never feeds the delta
        assert_eq!((input.mouse_x, input.mouse_y), (0.0, 0.0));
    }

    #[test]
    fn test_motion_turns_view_with_cursor_pinned_at_edge() {
        let mut input = active();
        // the warp cannot happen, so the cursor stays on the right edge
        assert!(input.cursor_moved(799.0, 300.0, 800, 600).is_some());
        assert!(input.cursor_moved(799.0, 300.0, 800, 600).is_some());

        input.mouse_motion(4.0, 0.0);
        let mut cmd = UserCmd::default();
        let mut view: Vec3 = [0.0; 3];
        input.in_move(&mut cmd, &mut view, MoveButtons::default(), &MouseCvars::default());
        assert!((view[YAW] + 0.022 * 3.0 * 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_in_move_turns() {
        let mut input = active();
        input.mouse_x = 10.0;
        input.mouse_y = 5.0;
        let mut cmd = UserCmd::default();
        let mut view: Vec3 = [0.0; 3];
        let cvars = MouseCvars::default();

        let stop = input.in_move(&mut cmd, &mut view, MoveButtons::default(), &cvars);
        assert!(!stop);
        assert!((view[YAW] + 0.022 * 30.0).abs() < 1e-5);
        assert!((cmd.forwardmove + 15.0).abs() < 1e-5);
        assert_eq!((input.mouse_x, input.mouse_y), (0.0, 0.0));
    }

    #[test]
    fn test_in_move_strafe() {
        let mut input = active();
        input.mouse_x = 10.0;
        let mut cmd = UserCmd::default();
        let mut view: Vec3 = [0.0; 3];
        let buttons = MoveButtons { strafe: true, ..Default::default() };
        input.in_move(&mut cmd, &mut view, buttons, &MouseCvars::default());
        assert!((cmd.sidemove - 0.8 * 30.0).abs() < 1e-5);
        assert_eq!(view[YAW], 0.0);
    }

    #[test]
    fn test_in_move_mlook_clamps_pitch() {
        let mut input = active();
        input.mouse_y = 10_000.0;
        let mut cmd = UserCmd::default();
        let mut view: Vec3 = [0.0; 3];
        let buttons = MoveButtons { mlook: true, ..Default::default() };
        let stop = input.in_move(&mut cmd, &mut view, buttons, &MouseCvars::default());
        assert!(stop);
        assert_eq!(view[PITCH], 80.0);
        assert_eq!(cmd.forwardmove, 0.0);

        input.mouse_y = -10_000.0;
        input.in_move(&mut cmd, &mut view, buttons, &MouseCvars::default());
        assert_eq!(view[PITCH], -70.0);
    }

    #[test]
    fn test_in_move_lookstrafe_and_noclip() {
        let mut input = active();
        input.mouse_x = 1.0;
        input.mouse_y = 1.0;
        let mut cmd = UserCmd::default();
        let mut view: Vec3 = [0.0; 3];
        let cvars = MouseCvars { lookstrafe: 1.0, ..Default::default() };
        let buttons = MoveButtons { mlook: true, ..Default::default() };
        input.in_move(&mut cmd, &mut view, buttons, &cvars);
        assert!((cmd.sidemove - 0.8 * 3.0).abs() < 1e-5);

        input.mouse_y = 1.0;
        let buttons = MoveButtons { strafe: true, noclip_anglehack: true, ..Default::default() };
        input.in_move(&mut cmd, &mut view, buttons, &cvars);
        assert!((cmd.upmove + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_mouse_cvars_register() {
        let mut ctx = CvarContext::new();
        MouseCvars::register(&mut ctx);
        let cvars = MouseCvars::from_ctx(&ctx);
        let defaults = MouseCvars::default();
        assert_eq!(cvars.sensitivity, defaults.sensitivity);
        assert!((cvars.m_yaw - defaults.m_yaw).abs() < 1e-6);
        assert!((cvars.m_pitch - defaults.m_pitch).abs() < 1e-6);
        assert!((cvars.m_side - defaults.m_side).abs() < 1e-6);
        assert_eq!(cvars.m_forward, 1.0);
        assert_eq!(cvars.lookstrafe, 0.0);
        assert!(ctx.find_var("sensitivity").unwrap().flags.contains(CvarFlags::ARCHIVE));
    }
}
