use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::{StorageBackend, StorageConfig};
use crate::models::transaction::TransactionId;
use crate::stores::document::Snapshot;
use crate::stores::memory_store::MemoryStore;
use crate::stores::remote_store::RemoteStore;
use crate::stores::store::Store;
use crate::wal::wal::{Wal, WalOperation};

/// Counts reported after seeding the memory backend
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub skipped_users: usize,
    pub transactions: usize,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot: {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse snapshot JSON")
}

/// Load users and transactions from an exported snapshot.
/// Users whose stored fingerprint does not decode are skipped.
pub fn seed_memory_store(store: &MemoryStore, snapshot: Snapshot) -> SeedSummary {
    let mut summary = SeedSummary::default();

    for (id, document) in snapshot.users {
        match document.into_user(id.clone()) {
            Ok(user) => {
                store.insert_user(user);
                summary.users += 1;
            }
            Err(e) => {
                warn!(user_id = %id, error = %e, "Invalid stored fingerprint, skipping user");
                summary.skipped_users += 1;
            }
        }
    }

    for (id, document) in snapshot.transactions {
        match TransactionId::parse(&id) {
            Some(tx_id) => {
                store.insert_transaction(document.into_transaction(tx_id));
                summary.transactions += 1;
            }
            None => warn!(transaction_id = %id, "Invalid transaction id in snapshot, skipping"),
        }
    }

    summary
}

// this runs at boot time, after seeding
pub fn apply_wal_operations(store: &MemoryStore, operations: &[WalOperation]) {
    for op in operations {
        store.apply(op);
    }
}

/// Build the storage collaborator the core will be handed
pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(build_memory_store(config)?)),
        StorageBackend::Remote => {
            let endpoint = config
                .endpoint
                .clone()
                .context("storage.endpoint is required for the remote backend")?;

            info!(endpoint = %endpoint, timeout_secs = config.timeout_secs, "Using remote document store");

            let store = RemoteStore::new(
                endpoint,
                config.auth_token.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
    }
}

fn build_memory_store(config: &StorageConfig) -> Result<MemoryStore> {
    let store = match &config.wal_path {
        Some(path) => {
            let wal = Wal::new(path.clone()).context("Failed to initialize WAL")?;
            info!(wal_path = %path.display(), "WAL initialized");
            MemoryStore::with_wal(wal)
        }
        None => {
            warn!("No wal_path configured, ledger writes will not survive a restart");
            MemoryStore::new()
        }
    };

    if let Some(seed_path) = &config.seed_path {
        let snapshot = load_snapshot(seed_path)?;
        let summary = seed_memory_store(&store, snapshot);
        info!(
            seed_path = %seed_path.display(),
            users = summary.users,
            skipped_users = summary.skipped_users,
            transactions = summary.transactions,
            "Store seeded from snapshot"
        );
    }

    if let Some(wal) = store.wal() {
        let operations = wal.replay().context("Failed to replay WAL")?;
        apply_wal_operations(&store, &operations);
        info!(
            operations_replayed = operations.len(),
            users = store.user_count(),
            transactions = store.transaction_count(),
            "WAL replay completed"
        );
    }

    Ok(store)
}
