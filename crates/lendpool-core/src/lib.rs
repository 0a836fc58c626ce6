//! # Lendpool Core
//!
//! A single lending pool: lenders deposit a base currency and receive
//! interest-bearing receipts 1:1, borrowers escrow collateral and draw
//! principal with interest fixed up front. Every borrow re-derives the
//! receipt rate from the pool's utilization.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      LendingPool                         │
//! │        (one async mutex around the live ledger)          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │ DepositMinter│  │   LoanBook   │  │AccrualOracle │    │
//! │  │ register     │  │ borrow       │  │ accrued_value│    │
//! │  │ deposit      │  │ quote        │  │ project      │    │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┘    │
//! │         │                 │ RateCurve                    │
//! │  ┌──────┴─────────────────┴───────────────────────┐      │
//! │  │        Compensations (undo on failure)         │      │
//! │  └──────┬─────────────────┬───────────────────────┘      │
//! │         │                 │                              │
//! │  ┌──────┴──────┐   ┌──────┴──────┐   ┌─────────────┐     │
//! │  │ AssetLedger │   │  PoolStore  │   │    Clock    │     │
//! │  └─────────────┘   └─────────────┘   └─────────────┘     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lendpool_common::PoolConfig;
//! use lendpool_core::infra::{InMemoryAssetLedger, InMemoryPoolStore, SystemClock};
//! use lendpool_core::{LendingPool, PoolServices};
//!
//! # async fn run() -> lendpool_common::Result<()> {
//! let config = PoolConfig::load()?;
//! let assets = Arc::new(InMemoryAssetLedger::new());
//! assets.create_asset("sol".into(), None);
//! assets.create_asset("usdc".into(), None);
//! assets.create_asset("isol".into(), Some(config.mint_authority.clone()));
//!
//! let store = Arc::new(InMemoryPoolStore::new());
//! let services = PoolServices::new(assets, store, Arc::new(SystemClock));
//! let pool =
//!     LendingPool::initialize(config, services, "sol".into(), "usdc".into(), "isol".into())
//!         .await?;
//!
//! let lender = "lender".into();
//! pool.register_depositor(&lender).await?;
//! pool.deposit(&lender, 2_000_000_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod accrual;
pub mod curve;
pub mod infra;
pub mod loan_book;
pub mod minter;
pub mod pool;
pub mod unit;

pub use accrual::{to_ui_amount, AccrualOracle};
pub use curve::{is_valid_curve, LinearRateCurve, RateCurve};
pub use loan_book::{quote_borrow, BorrowQuote, LoanBook};
pub use minter::DepositMinter;
pub use pool::{AccruedValue, LendingPool, PoolServices};
pub use unit::{Compensations, Undo};
