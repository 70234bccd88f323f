//! Error types and classification
//!
//! Every failure inside the core is a [`RasterError`]. Before it crosses
//! into the transport it is classified into one [`ErrorCode`], which is the
//! only thing callers are expected to branch on.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::native::NativeError;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, RasterError>;

/// Stable, caller-facing error taxonomy
///
/// None of these carry retry guidance: every code is terminal for the
/// request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing or mistyped request fields
    BadArguments,
    /// Handle or page unresolved
    NotOpen,
    /// Duplicate page open
    AlreadyOpen,
    /// Document could not be resolved, accessed or parsed
    OpenError,
    /// Page index invalid or native page-open failure
    PageOpenError,
    /// Native draw failure
    RenderError,
    /// Catch-all
    UnknownError,
}

impl ErrorCode {
    /// Wire code for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadArguments => "BAD_ARGS",
            ErrorCode::NotOpen => "ERR_NOT_OPEN",
            ErrorCode::AlreadyOpen => "ERR_ALREADY_OPEN",
            ErrorCode::OpenError => "ERR_OPEN",
            ErrorCode::PageOpenError => "ERR_OPEN_PAGE",
            ErrorCode::RenderError => "ERR_RENDER",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// HTTP status used by the transport
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadArguments => StatusCode::BAD_REQUEST,
            ErrorCode::NotOpen => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyOpen => StatusCode::CONFLICT,
            ErrorCode::OpenError | ErrorCode::PageOpenError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::RenderError | ErrorCode::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Argument {0} not set")]
    MissingArgument(String),

    #[error("Bad arguments: {0}")]
    BadArguments(String),

    #[error("The requested pdf document with handle {0} is not opened")]
    DocumentNotOpen(i64),

    #[error("Page {page} of pdf document {handle} is not opened")]
    PageNotOpen { handle: i64, page: i64 },

    #[error("Page {page} of pdf document {handle} is already opened")]
    PageAlreadyOpen { handle: i64, page: i64 },

    #[error("Error while opening the pdf document for path {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: NativeError,
    },

    #[error("Error while opening the pdf page {page}: {source}")]
    PageOpen {
        page: i64,
        #[source]
        source: NativeError,
    },

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: i64, count: usize },

    #[error("Render failed: {0}")]
    Render(#[source] NativeError),

    #[error("Image encoding error: {0}")]
    Encode(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl RasterError {
    /// Classify this error into the stable taxonomy
    pub fn code(&self) -> ErrorCode {
        match self {
            RasterError::MissingArgument(_) | RasterError::BadArguments(_) => {
                ErrorCode::BadArguments
            }
            RasterError::DocumentNotOpen(_) | RasterError::PageNotOpen { .. } => ErrorCode::NotOpen,
            RasterError::PageAlreadyOpen { .. } => ErrorCode::AlreadyOpen,
            RasterError::Open { .. } => ErrorCode::OpenError,
            RasterError::PageOpen { .. } | RasterError::PageOutOfRange { .. } => {
                ErrorCode::PageOpenError
            }
            RasterError::Render(_) => ErrorCode::RenderError,
            RasterError::Encode(_) | RasterError::Task(_) => ErrorCode::UnknownError,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for RasterError {
    fn into_response(self) -> Response {
        let code = self.code();

        let message = match code {
            ErrorCode::UnknownError => {
                tracing::error!("Internal error: {}", self);
                "An unknown error occurred".to_string()
            }
            ErrorCode::RenderError => {
                tracing::error!("Render error: {}", self);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code.as_str(),
            message,
            details: if cfg!(debug_assertions) {
                std::error::Error::source(&self).map(|s| s.to_string())
            } else {
                None
            },
        });

        (code.status(), body).into_response()
    }
}
