//! Rasterization pipeline
//!
//! One render call, end to end:
//!
//! ```text
//! resolve page ──► plan ──► fill background ──► native draw ──► RenderResult
//!  (registry lock      (geometry)                 (outside the lock)
//!   held briefly)
//! ```
//!
//! The page entry is reference counted, so a concurrent close only removes
//! it from the registry; the native page is released once the draw returns.

pub mod encode;

pub use encode::encode_png;

use image::RgbaImage;

use crate::error::{RasterError, Result};
use crate::geometry::{compute_render_plan, resolve_background, CropRect, Rgba};
use crate::native::{NativeError, PdfBackend};
use crate::registry::Registry;

/// RGBA8 pixel buffer, row-major, non-premultiplied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
    background: Rgba,
}

impl PixelBuffer {
    /// Allocate a buffer with every pixel set to `background`
    pub fn filled(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(background.to_array())),
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color the buffer was filled with
    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|px| px.0)
    }

    /// Set one pixel; writes outside the buffer are ignored
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(px) = self.image.get_pixel_mut_checked(x, y) {
            *px = image::Rgba(color.to_array());
        }
    }

    /// Replace the contents with a same-sized RGBA8 image
    pub fn copy_from_rgba(&mut self, rgba: Vec<u8>) -> std::result::Result<(), NativeError> {
        let (len, expected) = (rgba.len(), self.image.as_raw().len());
        self.image = RgbaImage::from_raw(self.width(), self.height(), rgba).ok_or_else(|| {
            NativeError::Draw(format!("bitmap holds {} bytes, expected {}", len, expected))
        })?;
        Ok(())
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Parameters of a single render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub crop: CropRect,
    pub scale: f64,
    pub background: Option<String>,
}

impl RenderRequest {
    pub fn new(crop: CropRect) -> Self {
        Self {
            crop,
            scale: default_scale(),
            background: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }
}

/// Finished render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub width: u32,
    pub height: u32,
    /// RGBA8, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl From<PixelBuffer> for RenderResult {
    fn from(buffer: PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            pixels: buffer.image.into_raw(),
        }
    }
}

/// Render a crop of an open page
///
/// Blocking: call from a blocking context when used from async code.
pub fn render<B: PdfBackend>(
    registry: &Registry<B>,
    handle: i64,
    page: i64,
    request: &RenderRequest,
    max_pixels: u64,
) -> Result<RenderResult> {
    let entry = registry.resolve_page(handle, page)?;
    let backend = registry.backend();

    let geometry = entry.geometry();
    let plan = compute_render_plan(
        (geometry.width, geometry.height),
        &request.crop,
        request.scale,
        backend.axis(),
        max_pixels,
    )?;

    let background = resolve_background(request.background.as_deref());
    let mut buffer = PixelBuffer::filled(plan.output_width, plan.output_height, background);

    backend
        .draw_page(
            entry.native(),
            &mut buffer,
            &plan.transform,
            (0, 0, plan.output_width, plan.output_height),
        )
        .map_err(RasterError::Render)?;

    tracing::debug!(
        handle,
        page,
        width = plan.output_width,
        height = plan.output_height,
        "Rendered page"
    );

    Ok(buffer.into())
}
