//! # cinesync-server
//!
//! Axum surface over the catalog pipeline: import triggers, imported-id
//! lookups, the trailer refresh, the cached catalog listing and a health
//! check.

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use infra::app_state::AppState;
pub use infra::errors::{AppError, AppResult};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest("/api", routes::create_api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
