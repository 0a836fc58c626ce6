//! Loan book - Collateralized borrowing against the pool
//!
//! A borrow escrows collateral, draws principal from the pool vault, and
//! resets the receipt rate from the pool's post-borrow utilization. Interest
//! is fixed up front at that new rate:
//!
//! ```text
//! rate     = curve((borrowed + P) * 10000 / deposited)
//! interest = floor(P * rate / 10000)
//! owed     = P + interest
//! ```

use lendpool_common::{
    AccountId, LendingError, LoanRecord, PoolConfig, PoolLedger, Result, BPS_SCALE,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::RateCurve;
use crate::infra::{AssetLedger, PoolStore, StoreBatch};
use crate::unit::Compensations;

/// Preview of a borrow against a given ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowQuote {
    pub principal: u64,
    /// Utilization after the draw
    pub utilization_bps: u64,
    /// Receipt rate after the draw, also the loan's interest rate
    pub rate_bps: u16,
    pub interest: u64,
    /// Principal plus interest
    pub amount: u64,
}

/// Front-loaded interest on `principal` at `rate_bps`
pub fn interest_for(principal: u64, rate_bps: u16) -> Result<u64> {
    let interest = principal as u128 * rate_bps as u128 / BPS_SCALE as u128;
    u64::try_from(interest).map_err(|_| LendingError::Overflow)
}

/// Apply a borrow to `staged` and return what it costs
///
/// On error `staged` is left as it was.
pub fn stage_borrow(
    staged: &mut PoolLedger,
    curve: &dyn RateCurve,
    principal: u64,
    now: i64,
) -> Result<BorrowQuote> {
    let mut next = staged.clone();
    next.record_borrow(principal, now)?;

    let utilization_bps = next.utilization_bps();
    let rate_bps = curve.rate_bps(utilization_bps);
    let interest = interest_for(principal, rate_bps)?;
    let amount = principal.checked_add(interest).ok_or(LendingError::Overflow)?;

    next.apply_rate(rate_bps, now);
    *staged = next;

    Ok(BorrowQuote {
        principal,
        utilization_bps,
        rate_bps,
        interest,
        amount,
    })
}

/// Side-effect-free borrow preview
pub fn quote_borrow(
    ledger: &PoolLedger,
    curve: &dyn RateCurve,
    principal: u64,
) -> Result<BorrowQuote> {
    let mut scratch = ledger.clone();
    stage_borrow(&mut scratch, curve, principal, ledger.updated_at)
}

/// Borrower-facing half of the pool
pub struct LoanBook<'a> {
    assets: &'a dyn AssetLedger,
    store: &'a dyn PoolStore,
    curve: &'a dyn RateCurve,
    config: &'a PoolConfig,
}

impl<'a> LoanBook<'a> {
    pub fn new(
        assets: &'a dyn AssetLedger,
        store: &'a dyn PoolStore,
        curve: &'a dyn RateCurve,
        config: &'a PoolConfig,
    ) -> Self {
        Self {
            assets,
            store,
            curve,
            config,
        }
    }

    /// Open a loan, returning the committed ledger and the new record
    pub async fn borrow(
        &self,
        ledger: &PoolLedger,
        borrower: &AccountId,
        collateral: u64,
        principal: u64,
        now: i64,
    ) -> Result<(PoolLedger, LoanRecord)> {
        if principal == 0 {
            return Err(LendingError::invalid_amount("borrow principal"));
        }
        if collateral == 0 {
            return Err(LendingError::invalid_amount("collateral amount"));
        }
        self.config.ensure_external(borrower)?;
        if self.store.load_loan(borrower).await?.is_some() {
            return Err(LendingError::LoanAlreadyExists(borrower.clone()));
        }

        let required = self.config.required_collateral(principal)?;
        if collateral < required {
            return Err(LendingError::InsufficientCollateral {
                required,
                provided: collateral,
            });
        }

        let mut staged = ledger.clone();
        let quote = stage_borrow(&mut staged, self.curve, principal, now)?;
        debug!(?quote, "Borrow staged");

        let loan = LoanRecord::new(
            borrower.clone(),
            principal,
            quote.interest,
            quote.rate_bps,
            collateral,
            now,
            self.config.loan_term_secs,
        )?;

        let mut undo = Compensations::new();
        if let Err(e) = self
            .settle(ledger.version, &staged, &loan, &mut undo)
            .await
        {
            return Err(undo.abort(self.assets, e).await);
        }

        Ok((staged, loan))
    }

    async fn settle(
        &self,
        expected_version: u64,
        staged: &PoolLedger,
        loan: &LoanRecord,
        undo: &mut Compensations,
    ) -> Result<()> {
        let collateral_asset = &staged.collateral_asset_id;
        let base = &staged.base_asset_id;
        let borrower = &loan.borrower;
        let escrow = &self.config.collateral_vault;
        let vault = &self.config.pool_vault;

        self.assets
            .transfer(collateral_asset, borrower, escrow, loan.collateral)
            .await?;
        undo.transferred(collateral_asset, borrower, escrow, loan.collateral);

        self.assets
            .transfer(base, vault, borrower, loan.principal)
            .await?;
        undo.transferred(base, vault, borrower, loan.principal);

        self.store
            .commit(StoreBatch {
                ledger: staged.clone(),
                expected_version: Some(expected_version),
                loan: Some(loan.clone()),
            })
            .await?;
        Ok(())
    }

    /// Persisted loan of `borrower`
    pub async fn loan(&self, borrower: &AccountId) -> Result<LoanRecord> {
        self.store
            .load_loan(borrower)
            .await?
            .ok_or_else(|| LendingError::NotFound(format!("loan for {}", borrower)))
    }
}
