use crate::core::error::StoreError;
use crate::models::record::Record;
use crate::models::transaction::{Transaction, TransactionId};
use crate::models::user::User;
use crate::stores::document::{TransactionDocument, UserDocument};
use crate::stores::store::Store;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for a path-addressed JSON document store.
///
/// Documents live at `{endpoint}/{path}.json`; `GET` returns `null` for a
/// missing path, `PUT` replaces a document and `POST` pushes a child under a
/// generated, creation-ordered key. No retries happen here.
pub struct RemoteStore {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

#[derive(Clone, Copy)]
enum Access {
    Read,
    Write,
}

fn classify(err: reqwest::Error, access: Access) -> StoreError {
    if err.is_timeout() || err.is_connect() {
        return StoreError::Unavailable(err.to_string());
    }
    match access {
        Access::Read => StoreError::Read(err.to_string()),
        Access::Write => StoreError::Write(err.to_string()),
    }
}

impl RemoteStore {
    pub fn new(endpoint: String, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.endpoint, path)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let response = self
            .with_auth(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| classify(e, Access::Read))?;

        if !response.status().is_success() {
            return Err(StoreError::Read(format!(
                "GET {} returned status {}",
                path,
                response.status()
            )));
        }

        response
            .json::<Option<T>>()
            .await
            .map_err(|e| classify(e, Access::Read))
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &T,
    ) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.request(method.clone(), self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(|e| classify(e, Access::Write))?;

        if !response.status().is_success() {
            return Err(StoreError::Write(format!(
                "{} {} returned status {}",
                method,
                path,
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Store for RemoteStore {
    async fn load_population(&self) -> Result<Vec<User>, StoreError> {
        // Each user document is parsed on its own; bad ones are skipped
        let documents: BTreeMap<String, serde_json::Value> =
            self.fetch("users").await?.unwrap_or_default();

        let total = documents.len();
        let users: Vec<User> = documents
            .into_iter()
            .filter_map(|(id, value)| {
                let doc = match serde_json::from_value::<UserDocument>(value) {
                    Ok(doc) => doc,
                    Err(e) => {
                        warn!(user_id = %id, error = %e, "Stored user document is malformed, skipping user");
                        return None;
                    }
                };
                match doc.into_user(id.clone()) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        warn!(user_id = %id, error = %e, "Stored fingerprint is invalid, skipping user");
                        None
                    }
                }
            })
            .collect();

        debug!(total = total, usable = users.len(), "Population loaded from remote store");
        Ok(users)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let document: Option<UserDocument> = self.fetch(&format!("users/{}", user_id)).await?;
        document
            .map(|doc| doc.into_user(user_id))
            .transpose()
            .map_err(|e| StoreError::Read(format!("user {}: {}", user_id, e)))
    }

    async fn append_record(&self, user_id: &str, record: Record) -> Result<(), StoreError> {
        self.send(
            reqwest::Method::POST,
            &format!("users/{}/record", user_id),
            &record,
        )
        .await
    }

    async fn put_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        self.send(
            reqwest::Method::PUT,
            &format!("transactions/{}", transaction.id),
            &TransactionDocument::from(transaction),
        )
        .await
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError> {
        let document: Option<TransactionDocument> =
            self.fetch(&format!("transactions/{}", id)).await?;
        Ok(document.map(|doc| doc.into_transaction(id.clone())))
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometrics::codec::{BiometricVector, VECTOR_DIMENSIONS};
    use crate::core::error::{ApiError, LedgerError};
    use crate::ledger::transactions::TransactionLedger;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// One request as the document backend saw it
    #[derive(Debug, Clone)]
    struct SeenRequest {
        method: Method,
        path: String,
        query: Option<String>,
        body: String,
    }

    /// Canned responses keyed by `"METHOD /path"`; anything else answers `null`
    #[derive(Default)]
    struct Backend {
        responses: HashMap<String, (StatusCode, String)>,
        seen: Mutex<Vec<SeenRequest>>,
    }

    async fn serve_document(
        State(backend): State<Arc<Backend>>,
        method: Method,
        uri: Uri,
        body: String,
    ) -> (StatusCode, String) {
        let key = format!("{} {}", method, uri.path());
        backend.seen.lock().unwrap().push(SeenRequest {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            body,
        });
        backend
            .responses
            .get(&key)
            .cloned()
            .unwrap_or((StatusCode::OK, "null".to_string()))
    }

    /// Start a local document backend and return its base url
    async fn spawn_backend(responses: Vec<(&str, StatusCode, String)>) -> (String, Arc<Backend>) {
        let backend = Arc::new(Backend {
            responses: responses
                .into_iter()
                .map(|(key, status, body)| (key.to_string(), (status, body)))
                .collect(),
            seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(serve_document)
            .with_state(backend.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), backend)
    }

    fn remote(endpoint: String, auth_token: Option<&str>) -> RemoteStore {
        RemoteStore::new(endpoint, auth_token.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_remote_store_creation() {
        let store = RemoteStore::new(
            "https://kiosk-db.example.com/arka/".to_string(),
            Some("secret".to_string()),
            Duration::from_secs(5),
        );
        assert!(store.is_ok());
    }

    #[test]
    fn test_url_building() {
        let store = RemoteStore::new(
            "https://kiosk-db.example.com/arka/".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(store.url("users"), "https://kiosk-db.example.com/arka/users.json");
        assert_eq!(
            store.url("transactions/abc"),
            "https://kiosk-db.example.com/arka/transactions/abc.json"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // nothing listens on the discard port
        let store = RemoteStore::new(
            "http://127.0.0.1:9".to_string(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = store.load_population().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "got {:?}", err);

        let tx = Transaction::new(TransactionId::generate(), "u1", 1, Vec::new());
        let err = store.put_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_missing_transaction_is_unknown() {
        let (endpoint, backend) = spawn_backend(Vec::new()).await;
        let store = Arc::new(remote(endpoint, None));
        let id = TransactionId::generate();

        assert_eq!(store.get_transaction(&id).await.unwrap(), None);

        let ledger = TransactionLedger::new(store);
        let err = ledger
            .confirm_dispense(&id, &["A1".to_string()], 10)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownTransaction(id.to_string()));
        assert_eq!(ApiError::from(err).status(), StatusCode::NOT_FOUND);

        // lookups only, no record pushed
        let seen = backend.seen.lock().unwrap();
        assert!(seen.iter().all(|r| r.method == Method::GET));
        assert!(seen.iter().all(|r| r.path == format!("/transactions/{}.json", id)));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_read_and_write_failures() {
        let id = TransactionId::generate();
        let put_key = format!("PUT /transactions/{}.json", id);
        let (endpoint, _) = spawn_backend(vec![
            ("GET /users.json", StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()),
            (put_key.as_str(), StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()),
            ("POST /users/bob/record.json", StatusCode::FORBIDDEN, "{}".to_string()),
        ])
        .await;
        let store = remote(endpoint, None);

        let err = store.load_population().await.unwrap_err();
        assert!(matches!(err, StoreError::Read(_)), "got {:?}", err);
        assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let tx = Transaction::new(id, "bob", 1, vec!["A1".to_string()]);
        let err = store.put_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, StoreError::Write(_)), "got {:?}", err);
        assert!(matches!(ApiError::from(err), ApiError::PersistenceFailure(_)));

        let err = store
            .append_record("bob", Record::dispense(vec!["A1".to_string()], 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write(_)), "got {:?}", err);
        assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_writes_use_document_paths_and_auth() {
        let (endpoint, backend) = spawn_backend(vec![(
            "POST /users/bob/record.json",
            StatusCode::OK,
            r#"{"name":"-NrecordKey"}"#.to_string(),
        )])
        .await;
        let store = remote(format!("{}/", endpoint), Some("secret"));

        let record = Record::dispense(vec!["A1".to_string()], 42);
        store.append_record("bob", record.clone()).await.unwrap();

        let tx = Transaction::new(TransactionId::generate(), "bob", 40, vec!["A1".to_string()]);
        store.put_transaction(&tx).await.unwrap();

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);

        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path, "/users/bob/record.json");
        assert_eq!(seen[0].query.as_deref(), Some("auth=secret"));
        let pushed: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(pushed, serde_json::to_value(&record).unwrap());

        assert_eq!(seen[1].method, Method::PUT);
        assert_eq!(seen[1].path, format!("/transactions/{}.json", tx.id));
        assert_eq!(seen[1].query.as_deref(), Some("auth=secret"));
        let stored: TransactionDocument = serde_json::from_str(&seen[1].body).unwrap();
        assert_eq!(stored, TransactionDocument::from(&tx));
    }

    #[tokio::test]
    async fn test_malformed_user_documents_are_skipped_individually() {
        let fingerprint = BiometricVector::from_components([9; VECTOR_DIMENSIONS]).encode();
        let users = serde_json::json!({
            "alice": { "name": "Alice", "fingerprint": fingerprint },
            "bob": { "fingerprint": fingerprint },
            "carol": { "name": "Carol", "fingerprint": "AAAA" },
            "dave": "not a document",
        });
        let (endpoint, _) =
            spawn_backend(vec![("GET /users.json", StatusCode::OK, users.to_string())]).await;
        let store = remote(endpoint, None);

        let population = store.load_population().await.unwrap();
        assert_eq!(population.len(), 1);
        assert_eq!(population[0].id, "alice");
        assert_eq!(population[0].name, "Alice");
    }
}
