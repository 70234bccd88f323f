//! PDF Render Server Library
//!
//! Handle-based PDF page rasterization. Documents and pages are opened into a
//! [`registry::Registry`], and crops of open pages are rendered into RGBA
//! buffers by the [`raster`] pipeline. The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `geometry`: output size, transform and background color for a render
//! - `native`: the native PDF capability (PDFium in production)
//! - `registry`: handle bookkeeping for open documents and pages
//! - `raster`: one render end to end, plus PNG encoding
//! - `error`: error types and their stable caller-facing codes
//! - `service` / `dispatch` / `routes`: async facade, method calls, HTTP

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod native;
pub mod raster;
pub mod registry;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ErrorCode, RasterError};
pub use registry::Registry;
pub use service::RenderService;
