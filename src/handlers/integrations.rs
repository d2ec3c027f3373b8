use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::schedule::{GeneratedSession, WeeklySchedule};
use crate::services::classroom_service::ScheduleOutcome;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulesBody {
    pub schedules: Vec<WeeklySchedule>,
}

/// PUT /api/integrations/:id/schedules - replace schedules, regenerate sessions
pub async fn save_schedules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(body): JsonBody<SchedulesBody>,
) -> ApiResult<ScheduleOutcome> {
    let outcome = state.classrooms.save_schedules(id, body.schedules).await?;
    Ok(ApiResponse::success(outcome))
}

/// GET /api/integrations/:id/sessions
pub async fn list_sessions(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Vec<GeneratedSession>> {
    let sessions = state.classrooms.list_sessions(id).await?;
    Ok(ApiResponse::success(sessions))
}
