//! HTTP routes for the render server

pub mod health;
pub mod methods;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::native::PdfBackend;
use crate::state::AppState;

/// Build the full application router
pub fn app<B: PdfBackend>(state: AppState<B>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check::<B>))
        .route("/api/v1/health", get(health::health_check::<B>))
        .nest("/api/v1/methods", methods::router::<B>())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
