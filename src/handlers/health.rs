use axum::extract::State;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "School Office API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "preview": "POST /api/sessions/preview",
            "schedules": "PUT /api/integrations/:id/schedules",
            "sessions": "GET /api/integrations/:id/sessions, PATCH|DELETE /api/sessions/:id",
            "range": "PUT /api/classrooms/:id/range",
            "find": "POST /api/find/:entity[/count]",
            "data": "GET /api/data/:entity/:id",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();
    match state.repo.ping().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}
