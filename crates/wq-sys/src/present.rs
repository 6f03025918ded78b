// present.rs -- presentation targets for the composited frame

use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use winit::window::Window;

use crate::compositor::{PixelFormat, Rgba8};
use crate::vid_soft::VidError;

pub type Cell = <Rgba8 as PixelFormat>::Cell;

/// Something that can lend out one RGBA cell per framebuffer pixel and then
/// put them on screen.
pub trait Presenter {
    /// Borrow the output cells for this frame.
    fn lock(&mut self) -> Result<&mut [Cell], VidError>;

    /// Show the cells written since the last present.
    fn present(&mut self) -> Result<(), VidError>;

    /// The window surface changed size; the logical frame size does not.
    fn resize_surface(&mut self, _width: u32, _height: u32) -> Result<(), VidError> {
        Ok(())
    }
}

// ============================================================
// Window presenter
// ============================================================

/// Streams the frame into a `pixels` texture stretched over the window with
/// nearest-neighbour scaling.
pub struct PixelsPresenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

impl PixelsPresenter {
    pub fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, VidError> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface).map_err(VidError::CreateRenderer)?;
        log::info!(
            "presenter: {}x{} frame on {}x{} surface",
            width,
            height,
            size.width,
            size.height
        );
        Ok(Self { window, pixels })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl Presenter for PixelsPresenter {
    fn lock(&mut self) -> Result<&mut [Cell], VidError> {
        bytemuck::try_cast_slice_mut(self.pixels.frame_mut())
            .map_err(|e| VidError::Lock(e.to_string()))
    }

    fn present(&mut self) -> Result<(), VidError> {
        self.window.pre_present_notify();
        self.pixels.render()?;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), VidError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }
}

// ============================================================
// In-memory presenter
// ============================================================

/// Keeps the composited frame in memory. Used for headless runs and tests.
pub struct MemoryPresenter {
    cells: Vec<Cell>,
    presented: usize,
    fail_lock: bool,
}

impl MemoryPresenter {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![Cell::default(); width * height],
            presented: 0,
            fail_lock: false,
        }
    }

    /// A presenter whose lock always fails.
    pub fn failing() -> Self {
        Self {
            cells: Vec::new(),
            presented: 0,
            fail_lock: true,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl Presenter for MemoryPresenter {
    fn lock(&mut self) -> Result<&mut [Cell], VidError> {
        if self.fail_lock {
            return Err(VidError::Lock("memory presenter is unavailable".into()));
        }
        Ok(&mut self.cells)
    }

    fn present(&mut self) -> Result<(), VidError> {
        self.presented += 1;
        Ok(())
    }
}
