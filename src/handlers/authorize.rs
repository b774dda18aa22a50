use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{check_version, AuthorizeRequest, AuthorizeResponse, API_VERSION};
use crate::utils::time::current_timestamp;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Identify the person at the kiosk and list what may be dispensed.
///
/// GET|POST /authorize (legacy: /pharmacy_get)
///
/// The body is parsed by hand rather than through the `Json` extractor
/// because kiosks do not reliably send a JSON content type.
#[instrument(skip(state, body))]
pub async fn authorize_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    state.metrics.increment_authorizations();

    match process(&state, &body).await {
        Ok(response) => {
            state.metrics.increment_successful_authorizations();
            Ok(Json(response))
        }
        Err(e) => {
            state.metrics.increment_failed_authorizations();
            warn!(error = %e, kind = e.kind(), "Authorization rejected");
            Err(e)
        }
    }
}

async fn process(state: &AppState, body: &[u8]) -> Result<AuthorizeResponse, ApiError> {
    let request: AuthorizeRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    check_version(request.version.as_deref())?;
    let fingerprint = request.fingerprint.ok_or(ApiError::MissingField("fingerprint"))?;

    let now = current_timestamp();
    let authorization = state.authorizer.authorize(&fingerprint, now).await?;

    let response = AuthorizeResponse {
        version: API_VERSION.to_string(),
        success: true,
        transaction_id: authorization.transaction_id.to_string(),
        prescriptions: authorization.prescriptions.clone(),
    };

    // Response is final; the access record must not hold it up or fail it
    state.authorizer.ledger().spawn_access_record(
        authorization.user_id.clone(),
        authorization.dins(),
        now,
        Arc::clone(&state.metrics),
    );

    Ok(response)
}
