//! Pixel render path: RGBA8888 buffers scaled into per-window 0RGB frames.

mod scale;

pub use scale::{blit, placement, rgba_to_xrgb, Placement};

use std::collections::HashMap;

use weft_common::{Color, CoreError, Handle, ScaleMode, Size};

/// How buffers are fitted into windows whose size differs from theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub scale_mode: ScaleMode,
    /// Letterbox colour. Alpha is ignored.
    pub background: Color,
}

impl RenderOptions {
    pub fn from_config(config: &weft_config::schema::RenderConfig) -> Self {
        Self {
            scale_mode: config.scale_mode,
            background: config.background(),
        }
    }
}

/// A presented image: one 0RGB `u32` per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Frame {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Check that `len` is exactly `width * height * 4`. An overflowing product
/// reports `usize::MAX` as the expected length.
pub fn validate_buffer(width: u32, height: u32, len: usize) -> Result<(), CoreError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));
    match expected {
        Some(expected) if expected == len => Ok(()),
        expected => Err(CoreError::BufferSizeMismatch {
            width,
            height,
            expected: expected.unwrap_or(usize::MAX),
            actual: len,
        }),
    }
}

/// Scales buffers into frames, keeping one frame allocation per window.
#[derive(Debug, Default)]
pub struct PixelRenderer {
    options: RenderOptions,
    frames: HashMap<Handle, Frame>,
}

impl PixelRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            frames: HashMap::new(),
        }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Render `rgba` (`width`x`height`) into the frame kept for `window`,
    /// sized to `target`.
    pub fn render(
        &mut self,
        window: Handle,
        target: Size,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<&Frame, CoreError> {
        validate_buffer(width, height, rgba.len())?;

        let frame = self.frames.entry(window).or_default();
        frame.width = target.width;
        frame.height = target.height;
        frame
            .pixels
            .resize(target.width as usize * target.height as usize, 0);

        let src = Size::new(width, height);
        let place = placement(src, target, self.options.scale_mode);
        blit(
            &mut frame.pixels,
            target,
            rgba,
            src,
            place,
            self.options.background.to_xrgb(),
        );
        Ok(frame)
    }

    /// The last frame rendered for `window`.
    pub fn frame(&self, window: Handle) -> Option<&Frame> {
        self.frames.get(&window)
    }

    /// Drop the cached frame of `window`. Returns whether one was cached.
    pub fn release(&mut self, window: Handle) -> bool {
        self.frames.remove(&window).is_some()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn cached_windows(&self) -> usize {
        self.frames.len()
    }
}
