use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// JSON request body whose rejections (bad syntax, wrong content type,
/// wrong shape) come back as `400 INVALID_JSON` in the API error envelope
/// instead of axum's plain-text responses.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| ApiError::invalid_json(e.to_string()))
    }
}
