use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "cache": if state.catalog().cache_enabled() { "enabled" } else { "disabled" },
        }
    }))
}
