// vid_soft.rs -- software video driver
//
// Owns the 8-bit framebuffer the renderer draws into, the z-buffer and
// surface cache sized for the mode, and the compositor/presenter pair that
// turns the indexed frame into pixels on screen.

use thiserror::Error;

use wq_common::common::ComArgs;
use wq_common::q_shared::q_atoi;

use crate::compositor::{Compositor, Framebuffer, PaletteTable, Rgba8, VRect};
use crate::present::Presenter;

// ============================================================
// Constants
// ============================================================

pub const BASEWIDTH: u32 = 800;
pub const BASEHEIGHT: u32 = 600;

pub const WARP_WIDTH: u32 = 320;
pub const WARP_HEIGHT: u32 = 200;

/// Surface cache needed for a 320x200 frame.
pub const SURFCACHE_SIZE_AT_320X200: usize = 600 * 1024;

/// Byte offset of the int the fullbright count is derived from (int #2048).
pub(crate) const COLORMAP_FULLBRIGHT_OFFSET: usize = 2048 * 4;

// ============================================================
// Errors
// ============================================================

#[derive(Error, Debug)]
pub enum VidError {
    #[error("VID: -winsize <width> <height>")]
    WinsizeUsage,
    #[error("VID: Bad window width/height")]
    BadWinsize,
    #[error("VID: palette needs 768 bytes, got {0}")]
    Palette(usize),
    #[error("VID: colormap too short ({0} bytes)")]
    Colormap(usize),
    #[error("VID: Couldn't lock texture: {0}")]
    Lock(String),
    #[error("VID: Couldn't create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("VID: Couldn't create renderer: {0}")]
    CreateRenderer(#[source] pixels::Error),
    #[error("VID: Couldn't render texture: {0}")]
    Render(#[from] pixels::Error),
    #[error("VID: Couldn't resize surface: {0}")]
    Resize(#[from] pixels::TextureError),
}

// ============================================================
// Mode selection
// ============================================================

/// Window size and flags requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VidConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for VidConfig {
    fn default() -> Self {
        Self {
            width: BASEWIDTH,
            height: BASEHEIGHT,
            fullscreen: false,
        }
    }
}

impl VidConfig {
    /// `-winsize <w> <h>` and `-fullscreen`.
    pub fn from_args(args: &ComArgs) -> Result<Self, VidError> {
        let mut config = Self::default();

        if let Some(pnum) = args.check_parm("-winsize") {
            if pnum + 2 >= args.argc() {
                return Err(VidError::WinsizeUsage);
            }
            let w = q_atoi(args.argv(pnum + 1));
            let h = q_atoi(args.argv(pnum + 2));
            if w <= 0 || h <= 0 {
                return Err(VidError::BadWinsize);
            }
            config.width = w as u32;
            config.height = h as u32;
        }

        config.fullscreen = args.check_parm("-fullscreen").is_some();
        Ok(config)
    }
}

/// Surface cache bytes for a mode. `-surfcachesize <kb>` overrides.
pub fn surface_cache_for_res(args: &ComArgs, width: u32, height: u32) -> usize {
    if let Some(kb) = args.parm_value("-surfcachesize") {
        return (q_atoi(kb).max(0) as usize) * 1024;
    }

    let pixels = width as usize * height as usize;
    let mut size = SURFCACHE_SIZE_AT_320X200;
    if pixels > 64000 {
        size += (pixels - 64000) * 3;
    }
    size
}

/// Number of colormap columns that are not affected by lighting.
pub fn fullbright_from_colormap(colormap: &[u8]) -> Result<i32, VidError> {
    let bytes = colormap
        .get(COLORMAP_FULLBRIGHT_OFFSET..COLORMAP_FULLBRIGHT_OFFSET + 4)
        .ok_or(VidError::Colormap(colormap.len()))?;
    let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Ok(256 - raw)
}

// ============================================================
// Video state
// ============================================================

/// The video description the renderer reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VidDef {
    pub width: u32,
    pub height: u32,
    pub rowbytes: usize,
    pub conwidth: u32,
    pub conheight: u32,
    pub conrowbytes: usize,
    pub maxwarpwidth: u32,
    pub maxwarpheight: u32,
    pub numpages: u32,
    pub aspect: f32,
    pub fullbright: i32,
}

pub struct Video {
    pub viddef: VidDef,
    framebuffer: Framebuffer,
    zbuffer: Vec<i16>,
    surface_cache: Vec<u8>,
    compositor: Compositor<Rgba8>,
    presenter: Box<dyn Presenter>,
}

impl Video {
    /// Bring up the software video mode.
    pub fn new(
        config: VidConfig,
        args: &ComArgs,
        palette: &[u8],
        colormap: &[u8],
        presenter: Box<dyn Presenter>,
    ) -> Result<Self, VidError> {
        let palette = PaletteTable::from_bytes(palette)?;
        let fullbright = fullbright_from_colormap(colormap)?;

        let width = config.width;
        let height = config.height;
        let framebuffer = Framebuffer::new(width as usize, height as usize);
        let rowbytes = framebuffer.rowbytes();

        let viddef = VidDef {
            width,
            height,
            rowbytes,
            conwidth: width,
            conheight: height,
            conrowbytes: rowbytes,
            maxwarpwidth: WARP_WIDTH,
            maxwarpheight: WARP_HEIGHT,
            numpages: 1,
            aspect: (height as f32 / width as f32) * (320.0 / 240.0),
            fullbright,
        };

        let cachesize = surface_cache_for_res(args, width, height);
        log::info!(
            "VID: {}x{}{}, surface cache {} KiB",
            width,
            height,
            if config.fullscreen { " fullscreen" } else { "" },
            cachesize / 1024
        );

        Ok(Self {
            viddef,
            framebuffer,
            zbuffer: vec![0; width as usize * height as usize],
            surface_cache: vec![0; cachesize],
            compositor: Compositor::new(palette),
            presenter,
        })
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    pub fn zbuffer_mut(&mut self) -> &mut [i16] {
        &mut self.zbuffer
    }

    pub fn surface_cache_mut(&mut self) -> &mut [u8] {
        &mut self.surface_cache
    }

    pub fn palette(&self) -> &PaletteTable {
        self.compositor.palette()
    }

    pub fn set_palette(&mut self, palette: &[u8]) -> Result<(), VidError> {
        self.compositor.set_palette(PaletteTable::from_bytes(palette)?);
        Ok(())
    }

    /// Palette flashes (damage, powerups) are full palette replacements.
    pub fn shift_palette(&mut self, palette: &[u8]) -> Result<(), VidError> {
        self.set_palette(palette)
    }

    /// Copy a bitmap (the disc-access icon) straight into the framebuffer.
    /// A negative `x` counts from the right edge.
    pub fn begin_direct_rect(&mut self, x: i32, y: i32, bitmap: &[u8], width: usize, height: usize) {
        let fbw = self.framebuffer.width() as i32;
        let x = if x < 0 { fbw + x - 1 } else { x };
        if x < 0 || y < 0 || width == 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let fb_width = self.framebuffer.width();
        let fb_height = self.framebuffer.height();
        let pixels = self.framebuffer.pixels_mut();

        for (row, src) in bitmap.chunks(width).take(height).enumerate() {
            let dy = y + row;
            if dy >= fb_height || x >= fb_width {
                break;
            }
            let n = src.len().min(fb_width - x);
            let start = dy * fb_width + x;
            pixels[start..start + n].copy_from_slice(&src[..n]);
        }
    }

    /// The icon is picked up by the next regular update, which redraws the
    /// whole frame; presenting it here would stall every file read.
    pub fn end_direct_rect(&mut self, _x: i32, _y: i32, _width: usize, _height: usize) {
        self.compositor.force_entire_redraw();
    }

    /// Composite the dirty rectangles and present the frame.
    pub fn update(&mut self, rects: &[VRect]) -> Result<(), VidError> {
        let cells = self.presenter.lock()?;
        self.compositor.composite(&self.framebuffer, rects, cells)?;
        self.presenter.present()
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), VidError> {
        self.presenter.resize_surface(width, height)
    }

    pub fn shutdown(self) {
        log::info!("VID: shutdown {}x{}", self.viddef.width, self.viddef.height);
    }
}

// ============================================================
// Tests
// ============================================================
