// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{authorize, confirm, fallback, health, metrics};
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Kiosk endpoints; older kiosks send GET with a JSON body
        .route("/authorize", get(authorize::authorize_handler).post(authorize::authorize_handler))
        .route("/confirm", get(confirm::confirm_handler).post(confirm::confirm_handler))
        .route("/pharmacy_get", get(authorize::authorize_handler).post(authorize::authorize_handler))
        .route("/pharmacy_done", get(confirm::confirm_handler).post(confirm::confirm_handler))

        .route("/health", get(health::health_handler))

        // Requires API key
        .route("/metrics", get(metrics::metrics_handler))

        .fallback(fallback::fallback_handler)

        .with_state(state)
}
