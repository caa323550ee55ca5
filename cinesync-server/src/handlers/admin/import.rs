use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cinesync_core::sync::{BulkReport, ImportRequest, ImportSummary};
use cinesync_model::ContentKind;

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BulkImportRequest {
    #[serde(alias = "tmdb_inputs")]
    pub inputs: Vec<String>,
    #[serde(default, alias = "content_type")]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportedIdsQuery {
    #[serde(default, alias = "type")]
    pub kind: Option<ContentKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedIdsResponse {
    pub tmdb_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckImportedRequest {
    pub tmdb_ids: Vec<i64>,
    #[serde(default, alias = "type")]
    pub kind: Option<ContentKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckImportedResponse {
    pub imported_ids: Vec<i64>,
}

/// Imports one movie or series and returns its summary.
pub async fn import_content(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> AppResult<Json<ImportSummary>> {
    let summary = state.importer().import(&request).await?;

    let evicted = state.catalog().invalidate().await;
    info!(
        external_id = %summary.external_id,
        outcome = ?summary.outcome,
        evicted,
        "import request completed"
    );
    Ok(Json(summary))
}

pub async fn import_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkImportRequest>,
) -> AppResult<Json<BulkReport>> {
    let inputs: Vec<String> = request
        .inputs
        .into_iter()
        .map(|input| input.trim().to_string())
        .filter(|input| !input.is_empty())
        .collect();
    if inputs.is_empty() {
        return Err(AppError::bad_request("Provide at least one TMDB id or URL"));
    }

    let report = state
        .bulk()
        .run(&inputs, request.kind, request.quality.as_deref())
        .await;

    if !report.succeeded.is_empty() {
        state.catalog().invalidate().await;
    }
    Ok(Json(report))
}

/// Provider ids already imported for a kind (movies when unspecified),
/// newest first.
pub async fn imported_ids(
    State(state): State<AppState>,
    Query(query): Query<ImportedIdsQuery>,
) -> AppResult<Json<ImportedIdsResponse>> {
    let kind = query.kind.unwrap_or(ContentKind::Movie);
    let tmdb_ids = state.catalog().imported_ids(kind).await?;
    debug!(kind = %kind, count = tmdb_ids.len(), "listed imported ids");
    Ok(Json(ImportedIdsResponse { tmdb_ids }))
}

/// Which of the given provider ids already have a record.
pub async fn check_imported(
    State(state): State<AppState>,
    Json(request): Json<CheckImportedRequest>,
) -> AppResult<Json<CheckImportedResponse>> {
    let kind = request.kind.unwrap_or(ContentKind::Movie);
    let imported_ids = state
        .catalog()
        .imported_among(kind, &request.tmdb_ids)
        .await?;
    debug!(
        kind = %kind,
        requested = request.tmdb_ids.len(),
        imported = imported_ids.len(),
        "checked imported ids"
    );
    Ok(Json(CheckImportedResponse { imported_ids }))
}
