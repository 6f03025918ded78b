// compositor.rs -- 8-bit indexed framebuffer to RGB presentation buffer
//
// The software renderer writes palette indices; once per presented frame the
// compositor expands the dirty rectangles (or the whole frame after a palette
// change) into the output cells handed over by the presenter.

use std::marker::PhantomData;

use crate::vid_soft::VidError;

/// Bytes in an engine palette: 256 `r, g, b` triples.
pub const PALETTE_BYTES: usize = 768;

// ============================================================
// Pixel formats
// ============================================================

/// Maps an RGB triple to one output cell.
pub trait PixelFormat {
    type Cell: Copy + Default;

    fn map_rgb(r: u8, g: u8, b: u8) -> Self::Cell;
}

/// Packed `0x00RRGGBB`, the layout of a 32-bit RGB888 streaming texture.
pub struct Rgb888;

impl PixelFormat for Rgb888 {
    type Cell = u32;

    fn map_rgb(r: u8, g: u8, b: u8) -> u32 {
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }
}

/// Byte-ordered RGBA with opaque alpha, the layout of the window presenter.
pub struct Rgba8;

impl PixelFormat for Rgba8 {
    type Cell = [u8; 4];

    fn map_rgb(r: u8, g: u8, b: u8) -> [u8; 4] {
        [r, g, b, 0xff]
    }
}

// ============================================================
// Palette
// ============================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// 256 colours, replaced wholesale on every palette change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteTable {
    colors: [Rgb; 256],
}

impl PaletteTable {
    /// Build from the engine's packed `r, g, b, r, g, b, ...` palette.
    pub fn from_bytes(palette: &[u8]) -> Result<Self, VidError> {
        if palette.len() < PALETTE_BYTES {
            return Err(VidError::Palette(palette.len()));
        }
        let colors = std::array::from_fn(|i| Rgb {
            r: palette[i * 3],
            g: palette[i * 3 + 1],
            b: palette[i * 3 + 2],
        });
        Ok(Self { colors })
    }

    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self {
            colors: [Rgb::default(); 256],
        }
    }
}

// ============================================================
// Framebuffer and dirty rectangles
// ============================================================

/// Width × height palette indices, row stride equal to width.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rowbytes(&self) -> usize {
        self.width
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Fill a rectangle (clipped to the frame) with one palette index.
    pub fn fill_rect(&mut self, rect: VRect, index: u8) {
        let Some((x, y, w, h)) = rect.clip(self.width, self.height) else {
            return;
        };
        for row in y..y + h {
            let start = row * self.width + x;
            self.pixels[start..start + w].fill(index);
        }
    }
}

/// Axis-aligned dirty region reported by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl VRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Intersect with a `width` × `height` frame. Returns `(x, y, w, h)`, or
    /// `None` when nothing of the rectangle is on screen.
    pub fn clip(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as usize, y0 as usize, (x1 - x0) as usize, (y1 - y0) as usize))
    }
}

// ============================================================
// Compositor
// ============================================================

/// Palette expansion state: the current palette mapped into output cells and
/// the pending full-redraw flag.
pub struct Compositor<F: PixelFormat> {
    palette: PaletteTable,
    mapped: [F::Cell; 256],
    force_entire_redraw: bool,
    _format: PhantomData<F>,
}

impl<F: PixelFormat> Compositor<F> {
    /// The first composite after construction always redraws everything.
    pub fn new(palette: PaletteTable) -> Self {
        let mapped = Self::map_palette(&palette);
        Self {
            palette,
            mapped,
            force_entire_redraw: true,
            _format: PhantomData,
        }
    }

    fn map_palette(palette: &PaletteTable) -> [F::Cell; 256] {
        std::array::from_fn(|i| {
            let c = palette.color(i as u8);
            F::map_rgb(c.r, c.g, c.b)
        })
    }

    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    /// Install a new palette. Palette changes can affect pixels outside the
    /// renderer's dirty rectangles (the status bar), so the next composite
    /// covers the whole frame.
    pub fn set_palette(&mut self, palette: PaletteTable) {
        self.mapped = Self::map_palette(&palette);
        self.palette = palette;
        self.force_entire_redraw = true;
    }

    pub fn force_entire_redraw(&mut self) {
        self.force_entire_redraw = true;
    }

    pub fn needs_entire_redraw(&self) -> bool {
        self.force_entire_redraw
    }

    /// Expand `rects` (or the whole frame when a full redraw is pending) from
    /// `fb` into `out`. `out` must hold exactly one cell per framebuffer pixel;
    /// anything else is treated as a failed lock and leaves all state as is.
    pub fn composite(
        &mut self,
        fb: &Framebuffer,
        rects: &[VRect],
        out: &mut [F::Cell],
    ) -> Result<(), VidError> {
        let expected = fb.width() * fb.height();
        if out.len() != expected {
            return Err(VidError::Lock(format!(
                "output buffer holds {} cells, frame needs {}",
                out.len(),
                expected
            )));
        }

        if self.force_entire_redraw {
            self.render_rgb(fb, out, 0, 0, fb.width(), fb.height());
            self.force_entire_redraw = false;
        } else {
            for rect in rects {
                if let Some((x, y, w, h)) = rect.clip(fb.width(), fb.height()) {
                    self.render_rgb(fb, out, x, y, w, h);
                }
            }
        }
        Ok(())
    }

    fn render_rgb(
        &self,
        fb: &Framebuffer,
        out: &mut [F::Cell],
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        let stride = fb.width();
        let src = fb.pixels();
        for yp in y..y + height {
            let start = yp * stride + x;
            let end = start + width;
            for (dst, &index) in out[start..end].iter_mut().zip(&src[start..end]) {
                *dst = self.mapped[index as usize];
            }
        }
    }
}

// ============================================================
// Tests
// ============================================================
