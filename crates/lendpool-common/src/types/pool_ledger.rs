//! Pool Ledger - Aggregate accounting state of the lending pool
//!
//! One ledger exists per pool. It tracks:
//! - Principal deposited by lenders (outstanding as receipts)
//! - Principal drawn by borrowers (pre-interest)
//! - The immutable asset identities the pool was initialized with
//! - The receipt asset's current rate, re-derived on every borrow
//!
//! The ledger is a plain value: callers stage a clone, mutate it, and swap
//! it in only once the surrounding unit of work has committed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::types::account::AssetId;
use crate::BPS_SCALE;

/// Receipt asset rate, as last synchronized by a borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    /// Current annual rate in basis points
    pub rate_bps: u16,

    /// Unix timestamp (seconds) at which `rate_bps` took effect
    pub synced_at: i64,
}

/// Singleton pool ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLedger {
    /// Asset lent into the pool and drawn by borrowers
    pub base_asset_id: AssetId,

    /// Asset accepted as collateral (immutable after initialization)
    pub collateral_asset_id: AssetId,

    /// Interest-bearing receipt asset (immutable after initialization)
    pub receipt_asset_id: AssetId,

    /// Sum of all deposits outstanding as receipts
    pub total_deposited: u64,

    /// Sum of all outstanding loan principals
    pub total_borrowed: u64,

    /// Receipt asset rate
    pub rate: RateState,

    /// Initialization timestamp (Unix seconds)
    pub initialized_at: i64,

    /// Timestamp of last modification (Unix seconds)
    pub updated_at: i64,

    /// Bumped on every mutation
    pub version: u64,
}

impl PoolLedger {
    /// Create an empty ledger with a 0% rate
    pub fn new(
        base_asset_id: AssetId,
        collateral_asset_id: AssetId,
        receipt_asset_id: AssetId,
        now: i64,
    ) -> Self {
        Self {
            base_asset_id,
            collateral_asset_id,
            receipt_asset_id,
            total_deposited: 0,
            total_borrowed: 0,
            rate: RateState {
                rate_bps: 0,
                synced_at: now,
            },
            initialized_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Record a deposit of base currency
    pub fn record_deposit(&mut self, amount: u64, now: i64) -> Result<(), LendingError> {
        if amount == 0 {
            return Err(LendingError::invalid_amount("deposit amount"));
        }

        self.total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(LendingError::Overflow)?;
        self.touch(now);
        Ok(())
    }

    /// Record a new loan principal
    ///
    /// Fails without mutating when the draw would push utilization past 100%.
    pub fn record_borrow(&mut self, principal: u64, now: i64) -> Result<(), LendingError> {
        if principal == 0 {
            return Err(LendingError::invalid_amount("borrow principal"));
        }

        let borrowed = self
            .total_borrowed
            .checked_add(principal)
            .ok_or(LendingError::Overflow)?;

        if borrowed > self.total_deposited {
            return Err(LendingError::InsufficientLiquidity {
                requested: principal,
                available: self.available_liquidity(),
            });
        }

        self.total_borrowed = borrowed;
        self.touch(now);
        Ok(())
    }

    /// Utilization in basis points; 0 for an empty pool
    pub fn utilization_bps(&self) -> u64 {
        if self.total_deposited == 0 {
            return 0;
        }

        let bps = self.total_borrowed as u128 * BPS_SCALE as u128 / self.total_deposited as u128;
        u64::try_from(bps).unwrap_or(u64::MAX)
    }

    /// Principal still available to borrowers
    #[inline]
    pub fn available_liquidity(&self) -> u64 {
        self.total_deposited.saturating_sub(self.total_borrowed)
    }

    /// Set the receipt asset rate, stamping the synchronization time
    pub fn apply_rate(&mut self, rate_bps: u16, now: i64) {
        self.rate = RateState {
            rate_bps,
            synced_at: now,
        };
        self.touch(now);
    }

    /// Utilization as a fraction (0.5 = 50%)
    pub fn utilization(&self) -> Decimal {
        Decimal::new(self.utilization_bps() as i64, 4)
    }

    /// Whether the utilization invariant currently holds
    pub fn is_solvent(&self) -> bool {
        self.total_borrowed <= self.total_deposited
    }

    fn touch(&mut self, now: i64) {
        self.version += 1;
        self.updated_at = now;
    }
}

impl std::fmt::Display for PoolLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PoolLedger(deposited={}, borrowed={}, utilization={}bps, rate={}bps)",
            self.total_deposited,
            self.total_borrowed,
            self.utilization_bps(),
            self.rate.rate_bps
        )
    }
}
