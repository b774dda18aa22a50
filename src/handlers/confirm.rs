use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{check_version, ConfirmRequest, ConfirmResponse, API_VERSION};
use crate::models::transaction::TransactionId;
use crate::utils::time::{current_timestamp, reported_timestamp};
use axum::{body::Bytes, extract::State, Json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Record that the kiosk physically released drugs for a transaction.
///
/// GET|POST /confirm (legacy: /pharmacy_done)
#[instrument(skip(state, body))]
pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ConfirmResponse>, ApiError> {
    state.metrics.increment_confirmations();

    match process(&state, &body).await {
        Ok(response) => {
            state.metrics.increment_successful_confirmations();
            Ok(Json(response))
        }
        Err(e) => {
            state.metrics.increment_failed_confirmations();
            warn!(error = %e, kind = e.kind(), "Confirmation rejected");
            Err(e)
        }
    }
}

async fn process(state: &AppState, body: &[u8]) -> Result<ConfirmResponse, ApiError> {
    let request: ConfirmRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    check_version(request.version.as_deref())?;

    let raw_id = request.transaction_id.ok_or(ApiError::MissingField("transactionId"))?;
    // A malformed id cannot name any stored transaction
    let transaction_id =
        TransactionId::parse(&raw_id).ok_or_else(|| ApiError::UnknownTransaction(raw_id.clone()))?;

    let dins = dedup(request.din.unwrap_or_default());
    if dins.is_empty() {
        return Err(ApiError::MissingField("din"));
    }

    let reported = request.timestamp.ok_or(ApiError::MissingField("timestamp"))?;
    let now = current_timestamp();
    let dispensed_at = reported_timestamp(reported, now)
        .ok_or_else(|| ApiError::InvalidRequest(format!("bad timestamp {}", reported)))?;

    let transaction = state
        .authorizer
        .confirm(&transaction_id, &dins, dispensed_at)
        .await?;

    info!(
        transaction_id = %transaction_id,
        user_id = %transaction.user_id,
        dispensed = dins.len(),
        "Dispense confirmed"
    );

    Ok(ConfirmResponse {
        version: API_VERSION.to_string(),
        success: true,
    })
}

/// Drop repeated dins, keeping first-seen order
fn dedup(dins: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    dins.into_iter().filter(|din| seen.insert(din.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometrics::codec::{BiometricVector, VECTOR_DIMENSIONS};
    use crate::core::config::Config;
    use crate::models::record::RecordKind;
    use crate::models::transaction::Transaction;
    use crate::models::user::User;
    use crate::stores::memory_store::MemoryStore;
    use crate::stores::store::Store;
    use axum::http::StatusCode;

    fn create_test_state() -> (Arc<AppState>, Arc<MemoryStore>, TransactionId) {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(User::new(
            "bob",
            "Bob",
            BiometricVector::from_components([7; VECTOR_DIMENSIONS]),
        ));

        let id = TransactionId::generate();
        store.insert_transaction(Transaction::new(
            id.clone(),
            "bob",
            current_timestamp() - 10,
            vec!["A1".to_string(), "B2".to_string()],
        ));

        let config = Config::parse("[server]\nport = 8080\n[logging]\n").unwrap();
        (Arc::new(AppState::new(config, store.clone())), store, id)
    }

    fn body(json: serde_json::Value) -> Bytes {
        Bytes::from(json.to_string())
    }

    #[tokio::test]
    async fn test_confirm_records_dispense() {
        let (state, store, id) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "transactionId": id.as_str(),
            "din": ["A1", "A1"],
            "timestamp": 1_000_000_000.9,
        }));

        let Json(response) = confirm_handler(State(state.clone()), request).await.unwrap();
        assert!(response.success);

        let bob = store.get_user("bob").await.unwrap().unwrap();
        assert_eq!(bob.ledger.len(), 1);
        assert_eq!(bob.ledger[0].kind, RecordKind::Dispense);
        assert_eq!(bob.ledger[0].dins, vec!["A1".to_string()]);
        assert_eq!(bob.ledger[0].timestamp, 1_000_000_000);
        assert_eq!(state.metrics.snapshot().successful_confirmations, 1);
    }

    #[tokio::test]
    async fn test_confirm_future_timestamp_is_clamped() {
        let (state, store, id) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "id": id.as_str(),
            "din": "B2",
            "timestamp": 9_999_999_999.0,
        }));

        confirm_handler(State(state), request).await.unwrap();

        let bob = store.get_user("bob").await.unwrap().unwrap();
        assert!(bob.ledger[0].timestamp <= current_timestamp());
    }

    #[tokio::test]
    async fn test_confirm_unknown_transaction() {
        let (state, store, _) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "transactionId": TransactionId::generate().as_str(),
            "din": ["A1"],
            "timestamp": 1_700_000_000,
        }));

        let err = confirm_handler(State(state.clone()), request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(store.get_user("bob").await.unwrap().unwrap().ledger.is_empty());
        assert_eq!(state.metrics.snapshot().failed_confirmations, 1);
    }

    #[tokio::test]
    async fn test_confirm_malformed_id_is_unknown() {
        let (state, _, _) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "transactionId": "../users/bob",
            "din": ["A1"],
            "timestamp": 1_700_000_000,
        }));

        let err = confirm_handler(State(state), request).await.unwrap_err();
        assert_eq!(err.kind(), "UnknownTransaction");
    }

    #[tokio::test]
    async fn test_confirm_din_outside_transaction() {
        let (state, store, id) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "transactionId": id.as_str(),
            "din": ["Z9"],
            "timestamp": 1_700_000_000,
        }));

        let err = confirm_handler(State(state), request).await.unwrap_err();
        assert_eq!(err.kind(), "DinNotAuthorized");
        assert!(store.get_user("bob").await.unwrap().unwrap().ledger.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_missing_fields() {
        let (state, _, id) = create_test_state();

        let err = confirm_handler(
            State(state.clone()),
            body(serde_json::json!({ "version": "0", "din": ["A1"] })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("transactionId")));

        let err = confirm_handler(
            State(state.clone()),
            body(serde_json::json!({ "version": "0", "transactionId": id.as_str(), "din": [] })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("din")));

        let err = confirm_handler(
            State(state.clone()),
            body(serde_json::json!({ "transactionId": id.as_str(), "din": ["A1"] })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("version")));

        let err = confirm_handler(
            State(state),
            body(serde_json::json!({ "version": "0", "transactionId": id.as_str(), "din": ["A1"] })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("timestamp")));
    }

    #[tokio::test]
    async fn test_confirm_negative_timestamp() {
        let (state, _, id) = create_test_state();
        let request = body(serde_json::json!({
            "version": "0",
            "transactionId": id.as_str(),
            "din": ["A1"],
            "timestamp": -5,
        }));

        let err = confirm_handler(State(state), request).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");
    }

    #[test]
    fn test_dedup_keeps_order() {
        let dins = vec!["B".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(dedup(dins), vec!["B".to_string(), "A".to_string()]);
    }
}
