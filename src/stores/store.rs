use crate::core::error::StoreError;
use crate::models::record::Record;
use crate::models::transaction::{Transaction, TransactionId};
use crate::models::user::User;
use async_trait::async_trait;

/// Storage collaborator the core reads users from and appends to.
///
/// Every call is a potential suspension point; nothing above this trait
/// performs I/O. Implementations never delete users, ledger entries or
/// transactions.
#[async_trait]
pub trait Store: Send + Sync {
    /// Snapshot of every enrolled user, including prescriptions and ledgers.
    /// The order of the returned list is the order the matcher scans.
    async fn load_population(&self) -> Result<Vec<User>, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Append one entry to the end of a user's ledger
    async fn append_record(&self, user_id: &str, record: Record) -> Result<(), StoreError>;

    /// Durably persist a new transaction. On error nothing is visible.
    async fn put_transaction(&self, transaction: &Transaction) -> Result<(), StoreError>;

    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}
