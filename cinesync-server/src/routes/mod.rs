use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;
use crate::handlers::admin::{import, trailers};
use crate::handlers::catalog;

/// Create the `/api` router
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/admin/import", post(import::import_content))
        .route("/admin/import/bulk", post(import::import_bulk))
        .route("/admin/import/imported", get(import::imported_ids))
        .route("/admin/import/check", post(import::check_imported))
        .route("/admin/trailers/refresh", post(trailers::refresh_trailers))
        .route("/catalog", get(catalog::list_catalog))
}
