use crate::core::error::StoreError;
use crate::models::record::Record;
use crate::models::transaction::{Transaction, TransactionId};
use crate::models::user::User;
use crate::stores::store::Store;
use crate::wal::wal::{Wal, WalOperation};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

/// In-process store for users, ledgers and transactions.
///
/// When a WAL is attached every mutation is journaled before it is applied,
/// so a failed journal write leaves the maps untouched.
pub struct MemoryStore {
    users: DashMap<String, User>,
    transactions: DashMap<TransactionId, Transaction>,
    wal: Option<Wal>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            transactions: DashMap::new(),
            wal: None,
        }
    }

    pub fn with_wal(wal: Wal) -> Self {
        Self {
            wal: Some(wal),
            ..Self::new()
        }
    }

    /// Enroll or replace a user. Enrollment happens outside the core, so
    /// this is only used for seeding and is not journaled.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Restore a transaction from a snapshot without journaling it
    pub fn insert_transaction(&self, transaction: Transaction) {
        self.transactions.insert(transaction.id.clone(), transaction);
    }

    /// Re-apply a journaled operation during startup replay
    pub fn apply(&self, op: &WalOperation) {
        match op {
            WalOperation::OpenTransaction(tx) => {
                self.transactions.insert(tx.id.clone(), tx.clone());
            }
            WalOperation::AppendRecord { user_id, record } => match self.users.get_mut(user_id) {
                Some(mut user) => user.ledger.push(record.clone()),
                None => warn!(user_id = %user_id, "WAL record for unknown user, skipping"),
            },
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn wal(&self) -> Option<&Wal> {
        self.wal.as_ref()
    }

    fn journal(&self, op: &WalOperation) -> Result<(), StoreError> {
        match &self.wal {
            Some(wal) => wal
                .log_operation(op)
                .map_err(|e| StoreError::Write(format!("{:#}", e))),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    /// Sorted by user id so the matcher's first-seen tie-break is stable
    async fn load_population(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn append_record(&self, user_id: &str, record: Record) -> Result<(), StoreError> {
        if !self.users.contains_key(user_id) {
            return Err(StoreError::UnknownUser(user_id.to_string()));
        }

        let op = WalOperation::AppendRecord {
            user_id: user_id.to_string(),
            record,
        };
        self.journal(&op)?;
        self.apply(&op);
        Ok(())
    }

    async fn put_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        if self.transactions.contains_key(&transaction.id) {
            return Err(StoreError::Write(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }

        let op = WalOperation::OpenTransaction(transaction.clone());
        self.journal(&op)?;
        self.apply(&op);
        Ok(())
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.get(id).map(|entry| entry.value().clone()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
