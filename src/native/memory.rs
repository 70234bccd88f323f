//! In-memory backend for tests
//!
//! Documents are registered up front by path. Every open and every drop is
//! counted, so tests can assert that each acquire is released exactly once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{NativeError, PageGeometry, PdfBackend, SourceRef};
use crate::geometry::{Affine, AxisOrientation, Rgba};
use crate::raster::PixelBuffer;

/// Acquire/release counters shared with the values a backend hands out
#[derive(Debug, Default)]
pub struct Counters {
    documents_acquired: AtomicUsize,
    documents_released: AtomicUsize,
    pages_acquired: AtomicUsize,
    pages_released: AtomicUsize,
}

impl Counters {
    pub fn documents_acquired(&self) -> usize {
        self.documents_acquired.load(Ordering::SeqCst)
    }

    pub fn documents_released(&self) -> usize {
        self.documents_released.load(Ordering::SeqCst)
    }

    pub fn pages_acquired(&self) -> usize {
        self.pages_acquired.load(Ordering::SeqCst)
    }

    pub fn pages_released(&self) -> usize {
        self.pages_released.load(Ordering::SeqCst)
    }

    /// Every acquire has been matched by a release
    pub fn balanced(&self) -> bool {
        self.documents_acquired() == self.documents_released()
            && self.pages_acquired() == self.pages_released()
    }
}

/// Opaque rectangle painted by every page, in page space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Ink {
    pub const COLOR: Rgba = Rgba::new(0, 0, 0, 255);

    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

pub struct MemoryBackend {
    documents: HashMap<PathBuf, usize>,
    page_size: (f64, f64),
    rotation: u16,
    axis: AxisOrientation,
    ink: Option<Ink>,
    fail_pages: bool,
    fail_draws: bool,
    counters: Arc<Counters>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            page_size: (612.0, 792.0),
            rotation: 0,
            axis: AxisOrientation::YDown,
            ink: None,
            fail_pages: false,
            fail_draws: false,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_document(mut self, path: &str, pages: usize) -> Self {
        self.documents.insert(PathBuf::from(path), pages);
        self
    }

    /// Unrotated page size, shared by every page
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_size = (width, height);
        self
    }

    pub fn with_rotation(mut self, degrees: u16) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_axis(mut self, axis: AxisOrientation) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_ink(mut self, ink: Ink) -> Self {
        self.ink = Some(ink);
        self
    }

    /// Reject every page open, even for indices in range
    pub fn failing_pages(mut self) -> Self {
        self.fail_pages = true;
        self
    }

    pub fn failing_draws(mut self) -> Self {
        self.fail_draws = true;
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

pub struct MemoryDocument {
    pages: usize,
    counters: Arc<Counters>,
}

impl Drop for MemoryDocument {
    fn drop(&mut self) {
        self.counters.documents_released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MemoryPage {
    counters: Arc<Counters>,
}

impl Drop for MemoryPage {
    fn drop(&mut self) {
        self.counters.pages_released.fetch_add(1, Ordering::SeqCst);
    }
}

impl PdfBackend for MemoryBackend {
    type Document = MemoryDocument;
    type Page = MemoryPage;

    fn axis(&self) -> AxisOrientation {
        self.axis
    }

    fn open_document(&self, source: &SourceRef) -> Result<MemoryDocument, NativeError> {
        let pages = *self
            .documents
            .get(source.path())
            .ok_or_else(|| NativeError::NotFound(source.path().to_path_buf()))?;

        self.counters.documents_acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryDocument {
            pages,
            counters: Arc::clone(&self.counters),
        })
    }

    fn page_count(&self, document: &MemoryDocument) -> usize {
        document.pages
    }

    fn open_page(
        &self,
        document: &MemoryDocument,
        index: usize,
    ) -> Result<(MemoryPage, PageGeometry), NativeError> {
        if index >= document.pages {
            return Err(NativeError::Page(format!("no page {}", index)));
        }
        if self.fail_pages {
            return Err(NativeError::Page("simulated failure".to_string()));
        }

        let (width, height) = match self.rotation {
            90 | 270 => (self.page_size.1, self.page_size.0),
            _ => self.page_size,
        };

        self.counters.pages_acquired.fetch_add(1, Ordering::SeqCst);
        Ok((
            MemoryPage {
                counters: Arc::clone(&self.counters),
            },
            PageGeometry {
                width,
                height,
                rotation: self.rotation,
            },
        ))
    }

    fn draw_page(
        &self,
        _page: &MemoryPage,
        target: &mut PixelBuffer,
        transform: &Affine,
        clip: (u32, u32, u32, u32),
    ) -> Result<(), NativeError> {
        if self.fail_draws {
            return Err(NativeError::Draw("simulated failure".to_string()));
        }
        let Some(ink) = self.ink else {
            return Ok(());
        };

        let (ax, ay) = transform.apply(ink.x0, ink.y0);
        let (bx, by) = transform.apply(ink.x1, ink.y1);
        let (left, right) = (ax.min(bx), ax.max(bx));
        let (top, bottom) = (ay.min(by), ay.max(by));

        for y in clip.1..clip.3.min(target.height()) {
            let cy = y as f64 + 0.5;
            if cy < top || cy >= bottom {
                continue;
            }
            for x in clip.0..clip.2.min(target.width()) {
                let cx = x as f64 + 0.5;
                if cx >= left && cx < right {
                    target.put_pixel(x, y, Ink::COLOR);
                }
            }
        }

        Ok(())
    }
}
