// Persisted document layout shared by snapshot seeding and the remote store

use crate::biometrics::codec;
use crate::core::error::CodecError;
use crate::models::prescription::Prescription;
use crate::models::record::Record;
use crate::models::transaction::{Transaction, TransactionId};
use crate::models::user::User;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `users/{userId}`
///
/// Prescriptions and records are keyed maps in storage. Record keys are
/// generated in creation order, so iterating the map by key yields the
/// ledger oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub name: String,
    /// Base64-encoded enrolled vector
    pub fingerprint: String,
    #[serde(default)]
    pub prescriptions: BTreeMap<String, Prescription>,
    #[serde(default)]
    pub record: BTreeMap<String, Record>,
}

impl UserDocument {
    pub fn into_user(self, id: impl Into<String>) -> Result<User, CodecError> {
        let fingerprint = codec::decode(&self.fingerprint)?;

        Ok(User::new(id, self.name, fingerprint)
            .with_prescriptions(self.prescriptions.into_values().collect())
            .with_ledger(self.record.into_values().collect()))
    }

    #[cfg(test)]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            fingerprint: user.fingerprint.encode(),
            prescriptions: user
                .prescriptions
                .iter()
                .map(|p| (format!("DIN_{}", p.din), p.clone()))
                .collect(),
            record: user
                .ledger
                .iter()
                .enumerate()
                .map(|(i, r)| (format!("{:08}", i), r.clone()))
                .collect(),
        }
    }
}

/// `transactions/{transactionId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDocument {
    pub user_id: String,
    pub timestamp: i64,
    /// Absent on transactions written before din lists were kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dins: Option<Vec<String>>,
}

impl TransactionDocument {
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            timestamp: self.timestamp,
            dins: self.dins,
        }
    }
}

impl From<&Transaction> for TransactionDocument {
    fn from(tx: &Transaction) -> Self {
        Self {
            user_id: tx.user_id.clone(),
            timestamp: tx.timestamp,
            dins: tx.dins.clone(),
        }
    }
}

/// Whole-database export used to seed the in-memory backend
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default, alias = "user")]
    pub users: BTreeMap<String, UserDocument>,
    #[serde(default)]
    pub transactions: BTreeMap<String, TransactionDocument>,
}
