//! Document and page registry
//!
//! Maps integer handles to open documents and `(handle, page)` pairs to open
//! pages. All bookkeeping sits behind one lock:
//!
//! ```text
//! Registry
//! └── Mutex<RegistryState>
//!     ├── next_handle: i64            (1, 2, 3, ... never reused)
//!     └── documents: handle ──► DocumentEntry
//!                               ├── pages: index ──► Arc<PageEntry>
//!                               │                    ├── native page
//!                               │                    └── Arc<native document>
//!                               └── Arc<native document>
//! ```
//!
//! Native values are released when their last `Arc` drops. Removing an entry
//! therefore never invalidates a page a concurrent render is still drawing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::native::{PageGeometry, PdfBackend, SourceRef};

/// An open page
///
/// Field order matters: the native page is dropped before the document
/// reference, so a page never outlives its document.
pub struct PageEntry<B: PdfBackend> {
    geometry: PageGeometry,
    native: B::Page,
    _document: Arc<B::Document>,
}

impl<B: PdfBackend> PageEntry<B> {
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn native(&self) -> &B::Page {
        &self.native
    }
}

/// An open document
struct DocumentEntry<B: PdfBackend> {
    pages: HashMap<usize, Arc<PageEntry<B>>>,
    source: SourceRef,
    page_count: usize,
    native: Arc<B::Document>,
}

struct RegistryState<B: PdfBackend> {
    next_handle: i64,
    documents: HashMap<i64, DocumentEntry<B>>,
}

/// Integer page size as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSize {
    pub width: i64,
    pub height: i64,
}

/// Counts of open resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub open_documents: usize,
    pub open_pages: usize,
}

/// Handle registry over one backend
pub struct Registry<B: PdfBackend> {
    backend: Arc<B>,
    state: Mutex<RegistryState<B>>,
}

impl<B: PdfBackend> Registry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(RegistryState {
                next_handle: 1,
                documents: HashMap::new(),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a document and return a fresh handle
    ///
    /// Opening the same source twice yields two independent handles.
    pub fn open_document(&self, source: &str) -> Result<i64> {
        let open_error = |source_err| RasterError::Open {
            path: source.to_string(),
            source: source_err,
        };

        let source_ref = SourceRef::parse(source).map_err(open_error)?;

        // Parsing can be slow, keep it outside the lock
        let native = self.backend.open_document(&source_ref).map_err(open_error)?;
        let page_count = self.backend.page_count(&native);

        let mut state = self.state.lock();
        let handle = state.next_handle;
        state.next_handle += 1;
        state.documents.insert(
            handle,
            DocumentEntry {
                pages: HashMap::new(),
                source: source_ref,
                page_count,
                native: Arc::new(native),
            },
        );

        debug!(handle, source, page_count, "Opened document");
        Ok(handle)
    }

    /// Close a document, force-closing its open pages first
    pub fn close_document(&self, handle: i64) -> Result<i64> {
        let entry = self
            .state
            .lock()
            .documents
            .remove(&handle)
            .ok_or(RasterError::DocumentNotOpen(handle))?;

        let pages = entry.pages.len();
        let source = entry.source.as_str().to_string();
        // Pages go first; native releases happen outside the lock
        drop(entry);

        debug!(handle, source = %source, pages, "Closed document");
        Ok(handle)
    }

    /// Open a page by zero-based index
    pub fn open_page(&self, handle: i64, page: i64) -> Result<i64> {
        let mut state = self.state.lock();
        let entry = state
            .documents
            .get_mut(&handle)
            .ok_or(RasterError::DocumentNotOpen(handle))?;

        let index = usize::try_from(page)
            .ok()
            .filter(|&i| i < entry.page_count)
            .ok_or(RasterError::PageOutOfRange {
                page,
                count: entry.page_count,
            })?;

        if entry.pages.contains_key(&index) {
            return Err(RasterError::PageAlreadyOpen { handle, page });
        }

        let (native, geometry) = self
            .backend
            .open_page(&entry.native, index)
            .map_err(|e| RasterError::PageOpen { page, source: e })?;

        entry.pages.insert(
            index,
            Arc::new(PageEntry {
                geometry,
                native,
                _document: Arc::clone(&entry.native),
            }),
        );

        debug!(
            handle,
            page,
            width = geometry.width,
            height = geometry.height,
            rotation = geometry.rotation,
            "Opened page"
        );
        Ok(page)
    }

    pub fn close_page(&self, handle: i64, page: i64) -> Result<i64> {
        let removed = {
            let mut state = self.state.lock();
            let entry = state
                .documents
                .get_mut(&handle)
                .ok_or(RasterError::DocumentNotOpen(handle))?;

            usize::try_from(page)
                .ok()
                .and_then(|index| entry.pages.remove(&index))
                .ok_or(RasterError::PageNotOpen { handle, page })?
        };
        drop(removed);

        debug!(handle, page, "Closed page");
        Ok(page)
    }

    pub fn page_count(&self, handle: i64) -> Result<usize> {
        self.state
            .lock()
            .documents
            .get(&handle)
            .map(|entry| entry.page_count)
            .ok_or(RasterError::DocumentNotOpen(handle))
    }

    /// Size of an open page, truncated to integers
    pub fn page_size(&self, handle: i64, page: i64) -> Result<PageSize> {
        let geometry = self.resolve_page(handle, page)?.geometry();
        Ok(PageSize {
            width: geometry.width as i64,
            height: geometry.height as i64,
        })
    }

    /// Look up an open page
    ///
    /// The returned entry keeps the native page alive even if the page or
    /// its document is closed in the meantime.
    pub fn resolve_page(&self, handle: i64, page: i64) -> Result<Arc<PageEntry<B>>> {
        let state = self.state.lock();
        let entry = state
            .documents
            .get(&handle)
            .ok_or(RasterError::DocumentNotOpen(handle))?;

        usize::try_from(page)
            .ok()
            .and_then(|index| entry.pages.get(&index))
            .cloned()
            .ok_or(RasterError::PageNotOpen { handle, page })
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.lock();
        RegistryStats {
            open_documents: state.documents.len(),
            open_pages: state.documents.values().map(|d| d.pages.len()).sum(),
        }
    }

    /// Close every open document, returning how many were closed
    pub fn close_all(&self) -> usize {
        let documents: Vec<_> = self.state.lock().documents.drain().collect();
        let count = documents.len();
        drop(documents);

        if count > 0 {
            debug!(count, "Closed all documents");
        }
        count
    }
}
