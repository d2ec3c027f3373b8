use axum::extract::{Path, State};
use uuid::Uuid;

use super::AppState;
use crate::database::repository::Row;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/data/:entity/:id - one live record, 404 when missing or deleted
pub async fn record_get(State(state): State<AppState>, Path((entity, id)): Path<(String, Uuid)>) -> ApiResult<Row> {
    state.ensure_entity(&entity).await?;
    let row = state.repo.select_404(&entity, FilterData::by_id(id)).await?;
    Ok(ApiResponse::success(row))
}
