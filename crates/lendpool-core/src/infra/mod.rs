//! Infrastructure collaborators
//!
//! Everything the pool reaches outside itself for:
//! - AssetLedger: custody of base, collateral, and receipt assets
//! - PoolStore: durable ledger and loan records
//! - Clock: current Unix time

pub mod assets;
pub mod clock;
pub mod store;

pub use assets::{AssetLedger, InMemoryAssetLedger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{InMemoryPoolStore, JsonFileStore, PoolStore, StoreBatch, StoreError};
