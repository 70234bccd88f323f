//! Render geometry
//!
//! Turns a crop rectangle and a scale into output dimensions and the affine
//! transform handed to the native draw call. Everything here is pure.
//!
//! ```text
//!   page space                      output buffer
//!   ┌──────────────────┐
//!   │   (x,y)          │            ┌─────────────┐
//!   │     ┌──────┐     │  T(-x,-y)  │             │ floor(w·s)
//!   │     │ crop │ h   │ ─────────► │   S(s, s)   │
//!   │     └──────┘     │            │             │
//!   │        w         │            └─────────────┘
//!   └──────────────────┘               floor(h·s)
//! ```
//!
//! Rotation metadata is folded into the page's intrinsic size when the page
//! is opened and is not applied again here.

pub mod color;

pub use color::{parse_color, resolve_background, Rgba};

use crate::error::{RasterError, Result};

/// 2D affine transform `[a b c d e f]`
///
/// Maps `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)`, the same layout PDF
/// and most rasterizers use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Affine {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Affine {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Direction of the vertical axis in a backend's device space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    /// Origin top-left, y grows downwards (PDFium, Android)
    YDown,
    /// Origin bottom-left, y grows upwards (CoreGraphics)
    YUp,
}

/// Crop rectangle in page space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Output of the geometry engine for one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub output_width: u32,
    pub output_height: u32,
    pub transform: Affine,
}

/// Compute output dimensions and transform for a crop at `scale`
///
/// `page_size` is the rotation-normalized intrinsic size and is only used
/// when the backend's axis points up. Plans with no pixels, or more than
/// `max_pixels`, are rejected.
pub fn compute_render_plan(
    page_size: (f64, f64),
    crop: &CropRect,
    scale: f64,
    axis: AxisOrientation,
    max_pixels: u64,
) -> Result<RenderPlan> {
    if crop.width <= 0 || crop.height <= 0 {
        return Err(RasterError::BadArguments(format!(
            "crop size must be positive, got {}x{}",
            crop.width, crop.height
        )));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::BadArguments(format!(
            "scale must be a positive finite number, got {}",
            scale
        )));
    }

    let width = (crop.width as f64 * scale).floor();
    let height = (crop.height as f64 * scale).floor();

    if width < 1.0 || height < 1.0 {
        return Err(RasterError::BadArguments(format!(
            "render of {}x{} at scale {} produces an empty image",
            crop.width, crop.height, scale
        )));
    }
    if width * height > max_pixels as f64 {
        return Err(RasterError::BadArguments(format!(
            "render of {}x{} pixels exceeds the limit of {} pixels",
            width, height, max_pixels
        )));
    }

    let mut transform = Affine::IDENTITY;
    if axis == AxisOrientation::YUp {
        transform = Affine::scale(1.0, -1.0).then(&Affine::translate(0.0, page_size.1));
    }
    transform = transform.then(&Affine::translate(-(crop.x as f64), -(crop.y as f64)));
    if scale != 1.0 {
        transform = transform.then(&Affine::scale(scale, scale));
    }

    Ok(RenderPlan {
        output_width: width as u32,
        output_height: height as u32,
        transform,
    })
}
