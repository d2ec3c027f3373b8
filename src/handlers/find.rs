use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::AppState;
use crate::database::repository::Row;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};

/// POST /api/find/:entity - filtered search
///
/// Body is a `FilterData` document: `select`, `where`, `order`, `limit`,
/// `offset`. Soft-deleted rows are never returned.
pub async fn find_post(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    JsonBody(filter): JsonBody<FilterData>,
) -> ApiResult<Vec<Row>> {
    state.ensure_entity(&entity).await?;
    let rows = state.repo.select_any(&entity, filter).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/find/:entity/count
pub async fn count_post(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    JsonBody(filter): JsonBody<FilterData>,
) -> ApiResult<Value> {
    state.ensure_entity(&entity).await?;
    let count = state.repo.count(&entity, filter).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}
