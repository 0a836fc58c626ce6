//! # Lendpool Common
//!
//! Shared types, errors, and configuration for the single-pool lending core.
//!
//! ## Core Types
//!
//! - [`PoolLedger`]: pool-wide deposited/borrowed totals and the receipt rate
//! - [`LoanRecord`]: a borrower's front-loaded debt and due time
//! - [`AccountId`]/[`AssetId`]: identities of owners and assets
//! - [`PoolConfig`]: protocol parameters (loan term, collateral ratio, ...)

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{CompoundingMode, PoolConfig};
pub use error::{AssetError, LendingError, Result};
pub use types::{
    account::{AccountId, AssetId, ReceiptAccountRef},
    loan_record::LoanRecord,
    pool_ledger::{PoolLedger, RateState},
};

/// Lendpool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basis-point scale (10000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

/// Highest representable rate
pub const MAX_RATE_BPS: u16 = 10_000;

/// Seconds per year used for rate projections (365.24 days)
pub const SECONDS_PER_YEAR: i64 = 31_556_736;

/// Default loan term (30 days)
pub const DEFAULT_LOAN_TERM_SECS: i64 = 30 * 24 * 60 * 60;

/// Persistence key of the pool ledger singleton
pub const POOL_LEDGER_KEY: &str = "pool";
