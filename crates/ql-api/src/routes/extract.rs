//! Entity extraction diagnostics.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use ql_protocol::EntityMap;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub query: String,
}

/// POST /api/v1/extract — show what entities a question resolves to.
pub async fn extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> ApiResult<Json<EntityMap>> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    Ok(Json(state.engine.extract(&req.query).await))
}
