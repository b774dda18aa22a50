use crate::core::error::LedgerError;
use crate::metrics::collector::Metrics;
use crate::models::record::Record;
use crate::models::transaction::{Transaction, TransactionId};
use crate::stores::store::Store;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Opens transactions at authorization time and posts ledger entries.
///
/// A transaction is never updated after creation. Confirmation is recorded
/// as a `dispense` entry on the owning user's ledger.
#[derive(Clone)]
pub struct TransactionLedger {
    store: Arc<dyn Store>,
}

impl TransactionLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist a new transaction for `user_id` and return its id.
    ///
    /// The id is the client's only handle for confirmation, so the
    /// authorization is not complete until this succeeds.
    #[instrument(skip(self, dins))]
    pub async fn open(&self, user_id: &str, dins: &[String], now: i64) -> Result<TransactionId, LedgerError> {
        let transaction = Transaction::new(TransactionId::generate(), user_id, now, dins.to_vec());

        self.store.put_transaction(&transaction).await.map_err(|e| {
            warn!(error = %e, "Failed to persist transaction");
            LedgerError::from(e)
        })?;

        debug!(transaction_id = %transaction.id, "Transaction opened");
        Ok(transaction.id)
    }

    pub async fn resolve(&self, id: &TransactionId) -> Result<Transaction, LedgerError> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or_else(|| LedgerError::UnknownTransaction(id.to_string()))
    }

    /// Append an `access` entry. Failures are logged here; callers treat
    /// them as non-fatal.
    pub async fn append_access_record(&self, user_id: &str, dins: Vec<String>, now: i64) -> Result<(), LedgerError> {
        let record = Record::access(dins, now);

        if let Err(e) = self.store.append_record(user_id, record.clone()).await {
            warn!(
                user_id = %user_id,
                dins = ?record.dins,
                error = %e,
                "Could not write record of access"
            );
            return Err(e.into());
        }

        Ok(())
    }

    /// Write the access entry on a detached task. The outcome only reaches
    /// the log and the failure counter, never the requester.
    pub fn spawn_access_record(
        &self,
        user_id: String,
        dins: Vec<String>,
        now: i64,
        metrics: Arc<Metrics>,
    ) -> JoinHandle<()> {
        let ledger = self.clone();
        tokio::spawn(async move {
            if ledger.append_access_record(&user_id, dins, now).await.is_err() {
                metrics.increment_access_record_failures();
            }
        })
    }

    /// Resolve the transaction and append a `dispense` entry to its user.
    ///
    /// Validation happens before the write: an unknown id or a din the
    /// transaction never handed out produces no ledger entry.
    #[instrument(skip(self, id, dins), fields(transaction_id = %id))]
    pub async fn confirm_dispense(
        &self,
        id: &TransactionId,
        dins: &[String],
        now: i64,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.resolve(id).await?;

        if let Some(din) = dins.iter().find(|din| !transaction.authorizes(din)) {
            warn!(din = %din, user_id = %transaction.user_id, "Confirmation names a din outside the transaction");
            return Err(LedgerError::DinNotAuthorized {
                transaction_id: id.to_string(),
                din: din.clone(),
            });
        }

        self.store
            .append_record(&transaction.user_id, Record::dispense(dins.to_vec(), now))
            .await
            .map_err(|e| {
                warn!(user_id = %transaction.user_id, error = %e, "Failed to record dispense");
                LedgerError::from(e)
            })?;

        info!(user_id = %transaction.user_id, dins = ?dins, "Dispense recorded");
        Ok(transaction)
    }
}
