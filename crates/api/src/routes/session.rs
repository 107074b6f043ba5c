use axum::{
    Json,
    extract::{Path, State},
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::registry::SessionSummary;

/// Lists active sessions and their connected roles.
pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.registry.summaries();
    Json(serde_json::json!({
        "total": sessions.len(),
        "sessions": sessions,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    state
        .registry
        .summary(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No active session {session_id}")))
}
