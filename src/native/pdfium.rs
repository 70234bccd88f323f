//! PDFium backend using pdfium-render
//!
//! The PDFium binding is bound once per process and leaked, so documents and
//! pages can carry the `'static` lifetime and be owned by the registry.
//! Dropping a [`PdfiumDocument`] or [`PdfiumPage`] closes the native handle.

use std::path::Path;

use parking_lot::Mutex;
use pdfium_render::prelude::*;

use super::{NativeError, PageGeometry, PdfBackend, SourceRef};
use crate::geometry::{Affine, AxisOrientation};
use crate::raster::PixelBuffer;

/// PDFium-backed implementation of [`PdfBackend`]
pub struct PdfiumBackend {
    pdfium: &'static Pdfium,
    /// Serializes draw calls into the shared binding
    draw_lock: Mutex<()>,
}

/// An open PDFium document
pub struct PdfiumDocument(PdfDocument<'static>);

/// An open PDFium page
pub struct PdfiumPage(PdfPage<'static>);

// SAFETY: pdfium-render is built with its `thread_safe` feature, which routes
// every call into the library through a process-wide lock. The wrappers hold
// no thread-local state:
//
// 1. PdfDocument and PdfPage only store raw FPDF handles plus a reference to
//    the leaked 'static bindings; none of them are tied to the creating thread.
//
// 2. Pages are closed before their document: the registry's page entry owns
//    the page ahead of an Arc to the document, so field drop order releases
//    FPDF_ClosePage first.
//
// 3. Draws additionally take PdfiumBackend::draw_lock, so at most one
//    render touches a page at a time.
//
// 4. PdfiumBackend only holds the leaked 'static Pdfium. Its boxed bindings
//    are never mutated after binding; every call through them goes through
//    the thread_safe lock, and bitmap rendering also holds draw_lock.
unsafe impl Send for PdfiumBackend {}
unsafe impl Sync for PdfiumBackend {}
unsafe impl Send for PdfiumDocument {}
unsafe impl Sync for PdfiumDocument {}
unsafe impl Send for PdfiumPage {}
unsafe impl Sync for PdfiumPage {}

impl PdfiumBackend {
    /// Bind the PDFium shared library
    ///
    /// Looks in `library_dir` first when given, then the working directory,
    /// then the common system locations.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self, NativeError> {
        let first = library_dir.unwrap_or_else(|| Path::new("./"));
        let bind_at =
            |dir: &Path| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir));

        let bindings = bind_at(first)
            .or_else(|_| bind_at(Path::new("./")))
            .or_else(|_| bind_at(Path::new("/usr/lib")))
            .or_else(|_| bind_at(Path::new("/usr/local/lib")))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| NativeError::Bind(e.to_string()))?;

        let pdfium: &'static Pdfium = Box::leak(Box::new(Pdfium::new(bindings)));

        Ok(Self {
            pdfium,
            draw_lock: Mutex::new(()),
        })
    }
}

impl PdfBackend for PdfiumBackend {
    type Document = PdfiumDocument;
    type Page = PdfiumPage;

    fn axis(&self) -> AxisOrientation {
        AxisOrientation::YDown
    }

    fn open_document(&self, source: &SourceRef) -> Result<PdfiumDocument, NativeError> {
        let path = source.path();
        if !path.is_file() {
            return Err(NativeError::NotFound(path.to_path_buf()));
        }

        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| NativeError::Load(e.to_string()))?;

        Ok(PdfiumDocument(document))
    }

    fn page_count(&self, document: &PdfiumDocument) -> usize {
        document.0.pages().len() as usize
    }

    fn open_page(
        &self,
        document: &PdfiumDocument,
        index: usize,
    ) -> Result<(PdfiumPage, PageGeometry), NativeError> {
        let index = PdfPageIndex::try_from(index)
            .map_err(|_| NativeError::Page(format!("page index {} out of range", index)))?;

        let page = document
            .0
            .pages()
            .get(index)
            .map_err(|e| NativeError::Page(e.to_string()))?;

        // width()/height() already account for /Rotate
        let rotation = page
            .rotation()
            .map(|r| r.as_degrees() as u16)
            .unwrap_or(0);
        let geometry = PageGeometry {
            width: page.width().value as f64,
            height: page.height().value as f64,
            rotation,
        };

        Ok((PdfiumPage(page), geometry))
    }

    fn draw_page(
        &self,
        page: &PdfiumPage,
        target: &mut PixelBuffer,
        transform: &Affine,
        clip: (u32, u32, u32, u32),
    ) -> Result<(), NativeError> {
        let width = Pixels::try_from(target.width())
            .map_err(|_| NativeError::Draw("target too wide".to_string()))?;
        let height = Pixels::try_from(target.height())
            .map_err(|_| NativeError::Draw("target too tall".to_string()))?;

        let [r, g, b, a] = target.background().to_array();

        let config = PdfRenderConfig::new()
            .set_fixed_size(width, height)
            .set_format(PdfBitmapFormat::BGRA)
            .clear_before_rendering(true)
            .set_clear_color(PdfColor::new(r, g, b, a))
            .transform(
                transform.a as PdfMatrixValue,
                transform.b as PdfMatrixValue,
                transform.c as PdfMatrixValue,
                transform.d as PdfMatrixValue,
                transform.e as PdfMatrixValue,
                transform.f as PdfMatrixValue,
            )
            .map_err(|e| NativeError::Draw(e.to_string()))?
            .clip(clip.0 as Pixels, clip.1 as Pixels, clip.2 as Pixels, clip.3 as Pixels);

        let _guard = self.draw_lock.lock();

        let mut bitmap = PdfBitmap::empty(
            width,
            height,
            PdfBitmapFormat::BGRA,
            self.pdfium.bindings(),
        )
        .map_err(|e| NativeError::Draw(e.to_string()))?;

        page.0
            .render_into_bitmap_with_config(&mut bitmap, &config)
            .map_err(|e| NativeError::Draw(e.to_string()))?;

        target.copy_from_rgba(bitmap.as_rgba_bytes())
    }
}
