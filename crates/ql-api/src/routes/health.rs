//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health — liveness plus the active rule count.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.engine.rules().snapshot().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "rules": catalog.list_active_rules().len(),
    }))
}
