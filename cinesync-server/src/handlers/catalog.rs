use axum::extract::{Query, State};
use axum::response::Json;

use cinesync_model::{CatalogFilter, CatalogPage};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;

pub async fn list_catalog(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> AppResult<Json<CatalogPage>> {
    let page = state.catalog().list(&filter).await?;
    Ok(Json(page))
}
