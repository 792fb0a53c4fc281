//! Natural-language query endpoint.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use ql_engine::QueryOptions;
use ql_protocol::QueryResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for a query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Free-text question.
    pub query: String,
    /// Optional row cap. Omitted means every row.
    #[serde(default)]
    pub limit: Option<u64>,
}

/// POST /api/v1/query — answer a question.
///
/// Engine outcomes (including `kind: "error"`) are always 200.
pub async fn answer(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let text = req.query.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }

    let response = state
        .engine
        .answer_query_with(text, QueryOptions { limit: req.limit })
        .await;
    Ok(Json(response))
}
