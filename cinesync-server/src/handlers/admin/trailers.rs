use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;

use cinesync_core::sync::{DEFAULT_TRAILER_BATCH, TrailerReport};
use cinesync_model::ContentKind;

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshTrailersRequest {
    /// `movie`, `series` or `all`; absent means all.
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl RefreshTrailersRequest {
    fn kind_filter(&self) -> Result<Option<ContentKind>, AppError> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(kind) => kind
                .parse::<ContentKind>()
                .map(Some)
                .map_err(|err| AppError::bad_request(err.to_string())),
        }
    }
}

/// Backfills trailers for records imported without one.
pub async fn refresh_trailers(
    State(state): State<AppState>,
    Json(request): Json<RefreshTrailersRequest>,
) -> AppResult<Json<TrailerReport>> {
    let kind = request.kind_filter()?;
    let limit = request.limit.unwrap_or(DEFAULT_TRAILER_BATCH);
    if limit == 0 {
        return Err(AppError::bad_request("limit must be at least 1"));
    }

    let report = state.trailers().run(kind, limit).await?;
    if report.updated > 0 {
        state.catalog().invalidate().await;
    }
    Ok(Json(report))
}
