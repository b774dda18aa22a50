// Metrics endpoint

use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::utils::auth::verify_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub api_key: String,
}

/// Returns JSON with authorization and confirmation counters, the
/// authorization success rate and uptime.
///
/// Requires `security.metrics_api_key` to be configured and supplied.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Response, MonitoringError> {
    if !verify_api_key(&params.api_key, state.config.security.metrics_api_key.as_deref()) {
        warn!("Unauthorized metrics access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    Ok((StatusCode::OK, Json(state.metrics.snapshot())).into_response())
}
