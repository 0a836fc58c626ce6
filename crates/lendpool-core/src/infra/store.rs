//! Pool persistence
//!
//! The ledger singleton and loan records survive restarts through a
//! [`PoolStore`]. Writes arrive as a [`StoreBatch`] so a borrow persists its
//! ledger update and loan record together or not at all.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lendpool_common::{AccountId, LendingError, LoanRecord, PoolLedger};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Trait for pool storage backends
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Load the ledger singleton, if the pool was ever initialized
    async fn load_ledger(&self) -> Result<Option<PoolLedger>, StoreError>;

    /// Load a borrower's loan record
    async fn load_loan(&self, borrower: &AccountId) -> Result<Option<LoanRecord>, StoreError>;

    /// Atomically write a ledger (and optionally a new loan)
    async fn commit(&self, batch: StoreBatch) -> Result<(), StoreError>;
}

/// One atomic write
#[derive(Debug, Clone)]
pub struct StoreBatch {
    /// Ledger to persist
    pub ledger: PoolLedger,

    /// Version the stored ledger must currently have (`None` = absent)
    pub expected_version: Option<u64>,

    /// New loan record; must not already exist for its borrower
    pub loan: Option<LoanRecord>,
}

/// Errors from store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Ledger version conflict: expected {expected:?}, found {found:?}")]
    VersionConflict {
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("Loan record already exists for {0}")]
    LoanExists(AccountId),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StoreError> for LendingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { expected: None, .. } => LendingError::AlreadyInitialized,
            StoreError::LoanExists(borrower) => LendingError::LoanAlreadyExists(borrower),
            StoreError::SerializationError(msg) => LendingError::Serialization(msg),
            other => LendingError::Storage(other.to_string()),
        }
    }
}

/// Full persisted state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    ledger: Option<PoolLedger>,
    loans: BTreeMap<AccountId, LoanRecord>,
}

impl Snapshot {
    /// Check the batch against current state and apply it
    fn apply(&mut self, batch: StoreBatch) -> Result<(), StoreError> {
        let found = self.ledger.as_ref().map(|l| l.version);
        if found != batch.expected_version {
            return Err(StoreError::VersionConflict {
                expected: batch.expected_version,
                found,
            });
        }

        if let Some(loan) = &batch.loan {
            if self.loans.contains_key(&loan.borrower) {
                return Err(StoreError::LoanExists(loan.borrower.clone()));
            }
        }

        if let Some(loan) = batch.loan {
            self.loans.insert(loan.borrower.clone(), loan);
        }
        self.ledger = Some(batch.ledger);
        Ok(())
    }
}

/// In-memory storage implementation
#[derive(Default)]
pub struct InMemoryPoolStore {
    state: Mutex<Snapshot>,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored loan records
    pub fn loan_count(&self) -> usize {
        self.state.lock().loans.len()
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn load_ledger(&self) -> Result<Option<PoolLedger>, StoreError> {
        Ok(self.state.lock().ledger.clone())
    }

    async fn load_loan(&self, borrower: &AccountId) -> Result<Option<LoanRecord>, StoreError> {
        Ok(self.state.lock().loans.get(borrower).cloned())
    }

    async fn commit(&self, batch: StoreBatch) -> Result<(), StoreError> {
        self.state.lock().apply(batch)
    }
}

/// JSON snapshot file storage
///
/// Keeps the whole pool state in `<dir>/pool.json`. Each commit writes a
/// temporary file and renames it over the snapshot, so a crash leaves either
/// the old or the new state on disk.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating the directory if needed) a store rooted at `dir`
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            StoreError::StorageError(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        Ok(Self {
            path: dir.join(format!("{}.json", lendpool_common::POOL_LEDGER_KEY)),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(&self) -> Result<Snapshot, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::SerializationError(format!("Failed to parse snapshot: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(e) => Err(StoreError::StorageError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            StoreError::SerializationError(format!("Failed to serialize snapshot: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            StoreError::StorageError(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::StorageError(format!("Failed to replace snapshot: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl PoolStore for JsonFileStore {
    async fn load_ledger(&self) -> Result<Option<PoolLedger>, StoreError> {
        Ok(self.read_snapshot().await?.ledger)
    }

    async fn load_loan(&self, borrower: &AccountId) -> Result<Option<LoanRecord>, StoreError> {
        Ok(self.read_snapshot().await?.loans.remove(borrower))
    }

    #[instrument(skip(self, batch), fields(version = batch.ledger.version))]
    async fn commit(&self, batch: StoreBatch) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.read_snapshot().await?;
        snapshot.apply(batch)?;
        self.write_snapshot(&snapshot).await?;

        debug!(path = %self.path.display(), "Snapshot committed");
        Ok(())
    }
}
