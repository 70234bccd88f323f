//! Method-call endpoint
//!
//! `POST /api/v1/methods/:method` with a JSON argument map as body.
//!
//! - value replies: `200 {"result": ...}`
//! - render replies: `200 image/png` with `x-image-width` / `x-image-height`
//! - failures: `{"code", "message", "details"?}` with the code's status

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::dispatch::{dispatch, Method, MethodReply};
use crate::error::RasterError;
use crate::native::PdfBackend;
use crate::state::AppState;

pub const IMAGE_WIDTH: HeaderName = HeaderName::from_static("x-image-width");
pub const IMAGE_HEIGHT: HeaderName = HeaderName::from_static("x-image-height");

pub fn router<B: PdfBackend>() -> Router<AppState<B>> {
    Router::new().route("/:method", post(call_method::<B>))
}

/// Errors leaving the method endpoint
#[derive(Debug)]
pub enum MethodError {
    /// Unknown method name; not part of the core taxonomy
    NotImplemented(String),
    Raster(RasterError),
}

impl From<RasterError> for MethodError {
    fn from(err: RasterError) -> Self {
        MethodError::Raster(err)
    }
}

#[derive(Serialize)]
struct NotImplementedResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for MethodError {
    fn into_response(self) -> Response {
        match self {
            MethodError::NotImplemented(method) => (
                StatusCode::NOT_FOUND,
                Json(NotImplementedResponse {
                    code: "not_implemented",
                    message: format!("Method {} is not implemented", method),
                }),
            )
                .into_response(),
            MethodError::Raster(err) => err.into_response(),
        }
    }
}

async fn call_method<B: PdfBackend>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, MethodError> {
    let method = Method::from_name(&name).ok_or(MethodError::NotImplemented(name))?;

    let arguments: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| RasterError::BadArguments(format!("Invalid JSON body: {}", e)))?
    };

    tracing::debug!(method = method.name(), "Method call");

    let response = match dispatch(state.service(), method, &arguments).await? {
        MethodReply::Value(result) => Json(json!({ "result": result })).into_response(),
        MethodReply::Image(image) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
                (IMAGE_WIDTH, HeaderValue::from(image.width)),
                (IMAGE_HEIGHT, HeaderValue::from(image.height)),
            ],
            image.png,
        )
            .into_response(),
    };

    Ok(response)
}
