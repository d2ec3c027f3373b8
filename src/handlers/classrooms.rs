use axum::extract::{Path, State};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::classroom_service::RangeOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeBody {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// PUT /api/classrooms/:id/range - move the classroom's dates, regenerate all sessions
pub async fn update_range(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(range): JsonBody<RangeBody>,
) -> ApiResult<RangeOutcome> {
    let outcome = state
        .classrooms
        .update_classroom_range(id, range.start_date, range.end_date)
        .await?;
    Ok(ApiResponse::success(outcome))
}
