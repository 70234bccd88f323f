//! Health endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::native::PdfBackend;
use crate::registry::RegistryStats;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(flatten)]
    stats: RegistryStats,
}

pub async fn health_check<B: PdfBackend>(State(state): State<AppState<B>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stats: state.service().stats(),
    })
}
