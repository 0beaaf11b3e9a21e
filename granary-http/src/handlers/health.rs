use axum::{extract::State, Json};
use granary::GranaryError;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "A corpus is loaded", body = serde_json::Value),
        (status = 503, description = "No corpus loaded yet", body = serde_json::Value)
    )
)]
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, GranaryError> {
    let snapshot = state.engine.store().snapshot()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "records": snapshot.corpus.len(),
        "generation": snapshot.generation,
    })))
}
