use crate::biometrics::{codec, matcher};
use crate::core::error::ApiError;
use crate::eligibility::filter::{eligible, CooldownPolicy};
use crate::ledger::transactions::TransactionLedger;
use crate::models::prescription::Prescription;
use crate::models::transaction::{Transaction, TransactionId};
use crate::stores::store::Store;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a successful authorization
#[derive(Debug, Clone)]
pub struct Authorization {
    pub user_id: String,
    /// Squared distance between the presented and enrolled vectors
    pub distance: u64,
    pub transaction_id: TransactionId,
    pub prescriptions: Vec<Prescription>,
}

impl Authorization {
    pub fn dins(&self) -> Vec<String> {
        self.prescriptions.iter().map(|p| p.din.clone()).collect()
    }
}

/// Identity resolution and release decision for one kiosk request.
///
/// No per-user serialization happens here: two concurrent requests for the
/// same person can both see the same ledger snapshot and both be handed the
/// same prescriptions, each with its own transaction.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn Store>,
    ledger: TransactionLedger,
    cooldowns: CooldownPolicy,
}

impl Authorizer {
    pub fn new(store: Arc<dyn Store>, cooldowns: CooldownPolicy) -> Self {
        Self {
            ledger: TransactionLedger::new(Arc::clone(&store)),
            store,
            cooldowns,
        }
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    /// Match the fingerprint, compute releasable prescriptions and open a
    /// transaction.
    ///
    /// The access record is not written here; the caller dispatches it with
    /// [`TransactionLedger::spawn_access_record`] once its response is ready.
    pub async fn authorize(&self, fingerprint: &str, now: i64) -> Result<Authorization, ApiError> {
        let query = codec::decode(fingerprint)?;

        let population = self.store.load_population().await?;
        debug!(population = population.len(), "Population loaded");

        let best = matcher::nearest(&query, population.iter().map(|user| (user, &user.fingerprint)))?;
        let user = best.candidate;

        info!(
            user_id = %user.id,
            name = %user.name,
            distance = best.distance,
            "Closest user found, allowing dispensing of their prescriptions"
        );

        let prescriptions = eligible(now, &user.prescriptions, &user.ledger, &self.cooldowns);
        let dins: Vec<String> = prescriptions.iter().map(|p| p.din.clone()).collect();

        let transaction_id = self.ledger.open(&user.id, &dins, now).await?;

        info!(
            user_id = %user.id,
            transaction_id = %transaction_id,
            eligible = dins.len(),
            total = user.prescriptions.len(),
            "Authorization complete"
        );

        Ok(Authorization {
            user_id: user.id.clone(),
            distance: best.distance,
            transaction_id,
            prescriptions,
        })
    }

    /// Post a dispense confirmation at `dispensed_at`
    pub async fn confirm(
        &self,
        transaction_id: &TransactionId,
        dins: &[String],
        dispensed_at: i64,
    ) -> Result<Transaction, ApiError> {
        Ok(self
            .ledger
            .confirm_dispense(transaction_id, dins, dispensed_at)
            .await?)
    }
}
