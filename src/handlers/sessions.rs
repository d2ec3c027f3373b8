use axum::extract::{Path, State};
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use crate::database::models::SessionPatch;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::schedule::{ExpansionRequest, GeneratedSession};

/// POST /api/sessions/preview - expand without saving
pub async fn preview(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ExpansionRequest>,
) -> ApiResult<Vec<GeneratedSession>> {
    let sessions = state.classrooms.preview(&request)?;
    Ok(ApiResponse::success(sessions))
}

/// PATCH /api/sessions/:id - edit teacher, lessons or description
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(patch): JsonBody<SessionPatch>,
) -> ApiResult<GeneratedSession> {
    let session = state.classrooms.update_session(id, patch).await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/sessions/:id - logical delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    state.classrooms.delete_session(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
