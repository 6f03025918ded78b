// test_card.rs -- stand-in engine for running the platform layer on its own
//
// Draws a 16x16 palette grid with a bouncing marker, cycles the palette
// every couple of seconds and quits on ESC. Mouse motion nudges the marker.

use wq_common::common::{com_dprintf, com_printf};
use wq_common::cvar::with_cvar_ctx;
use wq_common::keys::{K_ESCAPE, K_SHIFT};
use wq_common::q_shared::{UserCmd, Vec3, YAW};

use crate::compositor::{Framebuffer, VRect, PALETTE_BYTES};
use crate::host::{Host, HostStatus, Platform};
use crate::in_winit::{MouseCvars, MoveButtons};
use crate::sys::{sys_printf, QuakeParms, SysError};
use crate::vid_soft::COLORMAP_FULLBRIGHT_OFFSET;

const MARKER_SIZE: i32 = 16;
const MARKER_COLOR: u8 = 15;
const MARKER_SPEED: f32 = 120.0;

const PALETTE_SHIFT_INTERVAL: f64 = 2.0;
const DEDICATED_STATUS_FRAMES: u64 = 200;

const COLORMAP_SIZE: usize = 64 * 256 + 1;

const RAMP_HUES: [[u8; 3]; 16] = [
    [255, 255, 255],
    [255, 0, 0],
    [255, 128, 0],
    [255, 255, 0],
    [128, 255, 0],
    [0, 255, 0],
    [0, 255, 128],
    [0, 255, 255],
    [0, 128, 255],
    [0, 0, 255],
    [128, 0, 255],
    [255, 0, 255],
    [255, 0, 128],
    [160, 96, 48],
    [96, 128, 96],
    [128, 96, 128],
];

/// 16 ramps of 16 shades, darkest first.
fn ramp_palette() -> Vec<u8> {
    let mut pal = Vec::with_capacity(PALETTE_BYTES);
    for hue in RAMP_HUES {
        for shade in 0..16u32 {
            for c in hue {
                pal.push((c as u32 * (shade + 1) / 16) as u8);
            }
        }
    }
    pal
}

fn identity_colormap() -> Vec<u8> {
    let mut map: Vec<u8> = (0..COLORMAP_SIZE).map(|i| (i % 256) as u8).collect();
    map[COLORMAP_FULLBRIGHT_OFFSET..COLORMAP_FULLBRIGHT_OFFSET + 4]
        .copy_from_slice(&224i32.to_le_bytes());
    map
}

/// Palette index of the grid cell under (x, y).
fn card_index(x: usize, y: usize, width: usize, height: usize) -> u8 {
    let cx = x * 16 / width;
    let cy = y * 16 / height;
    (cy * 16 + cx) as u8
}

/// Repaint the grid inside `rect`.
fn draw_card(fb: &mut Framebuffer, rect: VRect) {
    let (width, height) = (fb.width(), fb.height());
    let Some((x, y, w, h)) = rect.clip(width, height) else {
        return;
    };
    let pixels = fb.pixels_mut();
    for row in y..y + h {
        for col in x..x + w {
            pixels[row * width + col] = card_index(col, row, width, height);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Marker {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

impl Marker {
    fn rect(&self) -> VRect {
        VRect::new(self.x as i32, self.y as i32, MARKER_SIZE, MARKER_SIZE)
    }

    fn advance(&mut self, time: f32, nudge: f32, width: i32, height: i32) {
        let max_x = (width - MARKER_SIZE).max(0) as f32;
        let max_y = (height - MARKER_SIZE).max(0) as f32;

        self.x += self.dx * time + nudge;
        self.y += self.dy * time;

        if self.x < 0.0 || self.x > max_x {
            self.dx = -self.dx;
            self.x = self.x.clamp(0.0, max_x);
        }
        if self.y < 0.0 || self.y > max_y {
            self.dy = -self.dy;
            self.y = self.y.clamp(0.0, max_y);
        }
    }
}

pub struct TestCardHost {
    dedicated: bool,
    palette: Vec<u8>,
    colormap: Vec<u8>,
    status: HostStatus,
    realtime: f64,
    framecount: u64,
    next_shift: f64,
    shift: usize,
    card_drawn: bool,
    marker: Marker,
    viewangles: Vec3,
    buttons: MoveButtons,
}

impl Default for TestCardHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCardHost {
    pub fn new() -> Self {
        Self {
            dedicated: false,
            palette: ramp_palette(),
            colormap: identity_colormap(),
            status: HostStatus::Running,
            realtime: 0.0,
            framecount: 0,
            next_shift: PALETTE_SHIFT_INTERVAL,
            shift: 0,
            card_drawn: false,
            marker: Marker {
                x: 0.0,
                y: 0.0,
                dx: MARKER_SPEED,
                dy: MARKER_SPEED * 0.75,
            },
            viewangles: [0.0; 3],
            buttons: MoveButtons::default(),
        }
    }

    pub fn framecount(&self) -> u64 {
        self.framecount
    }

    /// The base palette rotated by `shift` ramps.
    fn shifted_palette(&self) -> Vec<u8> {
        let mut pal = self.palette.clone();
        pal.rotate_left((self.shift % 16) * 16 * 3);
        pal
    }

    fn dedicated_frame(&mut self) -> HostStatus {
        if self.framecount % DEDICATED_STATUS_FRAMES == 0 {
            sys_printf(&format!(
                "{} frames, {:.1} seconds\n",
                self.framecount, self.realtime
            ));
        }
        self.status
    }
}

impl Host for TestCardHost {
    fn init(&mut self, parms: &QuakeParms) -> Result<(), SysError> {
        self.dedicated = parms.args.check_parm("-dedicated").is_some();
        with_cvar_ctx(MouseCvars::register);

        log::info!(
            "test card: {} KiB heap, {} KiB zone, basedir {}",
            parms.memsize / 1024,
            parms.zonesize / 1024,
            parms.basedir
        );
        com_printf(&format!(
            "Test card host ({})\n",
            if self.dedicated { "dedicated" } else { "video" }
        ));
        Ok(())
    }

    fn frame(&mut self, time: f64, platform: &mut Platform) -> Result<HostStatus, SysError> {
        self.realtime += time;
        self.framecount += 1;

        if self.status == HostStatus::Quit {
            return Ok(HostStatus::Quit);
        }
        if self.dedicated {
            return Ok(self.dedicated_frame());
        }

        let cvars = with_cvar_ctx(|ctx| MouseCvars::from_ctx(ctx)).unwrap_or_default();
        let mut cmd = UserCmd::default();
        let yaw_before = self.viewangles[YAW];
        platform
            .input
            .in_move(&mut cmd, &mut self.viewangles, self.buttons, &cvars);
        let nudge = (yaw_before - self.viewangles[YAW]) + cmd.sidemove * 0.1;

        let vid = platform.vid_mut()?;
        let width = vid.framebuffer().width() as i32;
        let height = vid.framebuffer().height() as i32;
        let mut rects = Vec::with_capacity(2);

        if !self.card_drawn {
            let all = VRect::new(0, 0, width, height);
            draw_card(vid.framebuffer_mut(), all);
            rects.push(all);
            self.card_drawn = true;
        }

        let old = self.marker.rect();
        draw_card(vid.framebuffer_mut(), old);
        self.marker.advance(time as f32, nudge, width, height);
        let new = self.marker.rect();
        vid.framebuffer_mut().fill_rect(new, MARKER_COLOR);
        rects.push(old);
        rects.push(new);

        if self.realtime >= self.next_shift {
            self.shift = (self.shift + 1) % 16;
            self.next_shift = self.realtime + PALETTE_SHIFT_INTERVAL;
            let pal = self.shifted_palette();
            vid.shift_palette(&pal)?;
            com_dprintf(&format!("palette shift {}\n", self.shift));
        }

        vid.update(&rects)?;
        Ok(self.status)
    }

    fn shutdown(&mut self) {
        log::info!(
            "test card: shutdown after {} frames, {:.1} seconds",
            self.framecount,
            self.realtime
        );
    }

    fn key_event(&mut self, key: i32, down: bool) {
        log::debug!("key {} {}", key, if down { "down" } else { "up" });
        match key {
            K_ESCAPE if down => self.status = HostStatus::Quit,
            K_SHIFT => self.buttons.strafe = down,
            _ => {}
        }
    }

    fn disconnect(&mut self) {
        log::info!("test card: disconnect");
    }

    fn shutdown_server(&mut self) {
        log::info!("test card: server shut down");
    }

    fn is_dedicated(&self) -> bool {
        self.dedicated
    }

    fn palette(&self) -> &[u8] {
        &self.palette
    }

    fn colormap(&self) -> &[u8] {
        &self.colormap
    }
}
