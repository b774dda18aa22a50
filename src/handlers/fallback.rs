use crate::core::error::ApiError;
use axum::response::{IntoResponse, Response};

pub async fn fallback_handler() -> Response {
    ApiError::InvalidRequest(
        "Invalid endpoint. Valid endpoints: /authorize, /confirm, /health".to_string(),
    )
    .into_response()
}
