//! Native PDF capability
//!
//! The registry and the raster pipeline only talk to a [`PdfBackend`]. A
//! backend hands out owned document and page values; dropping them is what
//! releases the native resource, so whoever holds the last `Arc` decides
//! when the release happens.
//!
//! ```text
//! SourceRef ──open_document──► Document ──open_page──► (Page, PageGeometry)
//!                                                          │
//!                 PixelBuffer ◄──────draw_page(transform, clip)
//! ```

pub mod pdfium;

#[cfg(test)]
pub mod memory;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geometry::{Affine, AxisOrientation};
use crate::raster::PixelBuffer;

pub use self::pdfium::PdfiumBackend;

/// Errors raised at the backend boundary
///
/// Backend-specific error types never leave the backend; they are flattened
/// into one of these variants first.
#[derive(Error, Debug)]
pub enum NativeError {
    #[error("Failed to bind PDF library: {0}")]
    Bind(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Failed to load page: {0}")]
    Page(String),

    #[error("Draw failed: {0}")]
    Draw(String),
}

/// A resolved local document source
///
/// Callers may hand in a plain path or a `file:` URI. Any other scheme is
/// rejected, documents are never fetched from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    raw: String,
    path: PathBuf,
}

impl SourceRef {
    pub fn parse(raw: &str) -> Result<Self, NativeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NativeError::UnsupportedSource("empty path".to_string()));
        }

        let path = match trimmed.split_once(':') {
            Some((scheme, rest)) if is_scheme(scheme) => {
                if !scheme.eq_ignore_ascii_case("file") {
                    return Err(NativeError::UnsupportedSource(format!(
                        "scheme '{}' is not supported",
                        scheme
                    )));
                }
                // file:///abs, file://localhost/abs and file:/abs all name the same path
                let rest = rest
                    .strip_prefix("//localhost")
                    .or_else(|| rest.strip_prefix("//"))
                    .unwrap_or(rest);
                // query and fragment do not name part of a local file
                let rest = rest.find(['?', '#']).map_or(rest, |end| &rest[..end]);
                let decoded = urlencoding::decode(rest).map_err(|_| {
                    NativeError::UnsupportedSource(format!("'{}' is not valid UTF-8", trimmed))
                })?;
                PathBuf::from(decoded.into_owned())
            }
            _ => PathBuf::from(trimmed),
        };

        Ok(Self {
            raw: raw.to_string(),
            path,
        })
    }

    /// Caller-supplied form, used in logs and messages
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// URI schemes are at least two characters, so `C:\...` stays a path
fn is_scheme(s: &str) -> bool {
    s.len() > 1
        && s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Page size and rotation recorded once at page open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Width after applying the page's rotation metadata
    pub width: f64,
    /// Height after applying the page's rotation metadata
    pub height: f64,
    /// Stored rotation in degrees (0, 90, 180 or 270)
    pub rotation: u16,
}

/// Native capability used by the registry and the raster pipeline
///
/// `Document` and `Page` are ownership tokens: a successful `open_*` is
/// matched by exactly one release, performed when the value is dropped.
pub trait PdfBackend: Send + Sync + 'static {
    type Document: Send + Sync + 'static;
    type Page: Send + Sync + 'static;

    /// Orientation of the vertical axis in the backend's device space
    fn axis(&self) -> AxisOrientation;

    fn open_document(&self, source: &SourceRef) -> Result<Self::Document, NativeError>;

    fn page_count(&self, document: &Self::Document) -> usize;

    /// Open a page by zero-based index
    fn open_page(
        &self,
        document: &Self::Document,
        index: usize,
    ) -> Result<(Self::Page, PageGeometry), NativeError>;

    /// Draw `page` into `target`, mapping page space through `transform` and
    /// touching only pixels inside `clip` (left, top, right, bottom)
    fn draw_page(
        &self,
        page: &Self::Page,
        target: &mut PixelBuffer,
        transform: &Affine,
        clip: (u32, u32, u32, u32),
    ) -> Result<(), NativeError>;
}
