// keys.rs -- engine key codes
//
// Printable keys use their lowercase ASCII value; everything else is above 127.

pub const K_TAB: i32 = 9;
pub const K_ENTER: i32 = 13;
pub const K_ESCAPE: i32 = 27;
pub const K_SPACE: i32 = 32;

// normal keys should be passed as lowercased ascii

pub const K_BACKSPACE: i32 = 127;
pub const K_UPARROW: i32 = 128;
pub const K_DOWNARROW: i32 = 129;
pub const K_LEFTARROW: i32 = 130;
pub const K_RIGHTARROW: i32 = 131;

pub const K_ALT: i32 = 132;
pub const K_CTRL: i32 = 133;
pub const K_SHIFT: i32 = 134;
pub const K_F1: i32 = 135;
pub const K_F2: i32 = 136;
pub const K_F3: i32 = 137;
pub const K_F4: i32 = 138;
pub const K_F5: i32 = 139;
pub const K_F6: i32 = 140;
pub const K_F7: i32 = 141;
pub const K_F8: i32 = 142;
pub const K_F9: i32 = 143;
pub const K_F10: i32 = 144;
pub const K_F11: i32 = 145;
pub const K_F12: i32 = 146;
pub const K_INS: i32 = 147;
pub const K_DEL: i32 = 148;
pub const K_PGDN: i32 = 149;
pub const K_PGUP: i32 = 150;
pub const K_HOME: i32 = 151;
pub const K_END: i32 = 152;

pub const K_PAUSE: i32 = 255;

// mouse buttons generate virtual keys
pub const K_MOUSE1: i32 = 200;
pub const K_MOUSE2: i32 = 201;
pub const K_MOUSE3: i32 = 202;

pub const K_MWHEELUP: i32 = 239;
pub const K_MWHEELDOWN: i32 = 240;

/// Highest key code the engine's key tables accept.
pub const K_MAX: i32 = 255;
