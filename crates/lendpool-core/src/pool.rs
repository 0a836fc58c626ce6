//! Lending pool service
//!
//! Owns the live [`PoolLedger`] and runs every mutating operation as a unit
//! of work under one async mutex:
//!
//! 1. clone the live ledger into a staged copy
//! 2. validate and mutate the staged copy
//! 3. apply external effects (transfers, mints), recording inverses
//! 4. commit ledger (and loan) to the store in one batch
//! 5. swap the staged ledger in
//!
//! A failure at 3 or 4 replays the inverses and leaves the live ledger as it
//! was. Read paths take a snapshot and never mutate.

use std::sync::Arc;

use lendpool_common::{
    AccountId, AssetError, AssetId, LendingError, LoanRecord, PoolConfig, PoolLedger,
    ReceiptAccountRef, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::accrual::{to_ui_amount, AccrualOracle};
use crate::curve::{LinearRateCurve, RateCurve};
use crate::infra::{AssetLedger, Clock, PoolStore, StoreBatch};
use crate::loan_book::{self, BorrowQuote, LoanBook};
use crate::minter::DepositMinter;
use crate::unit::Compensations;

/// Collaborators injected into a pool
#[derive(Clone)]
pub struct PoolServices {
    pub assets: Arc<dyn AssetLedger>,
    pub store: Arc<dyn PoolStore>,
    pub clock: Arc<dyn Clock>,
    pub curve: Arc<dyn RateCurve>,
}

impl PoolServices {
    /// Services using the linear rate curve
    pub fn new(
        assets: Arc<dyn AssetLedger>,
        store: Arc<dyn PoolStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            assets,
            store,
            clock,
            curve: Arc::new(LinearRateCurve),
        }
    }

    pub fn with_curve(mut self, curve: Arc<dyn RateCurve>) -> Self {
        self.curve = curve;
        self
    }
}

/// Projected value of an owner's receipts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccruedValue {
    pub receipt_balance: u64,
    pub rate_bps: u16,
    pub elapsed_seconds: i64,
    /// Value in raw base-currency units
    pub value: Decimal,
    /// `value` scaled by the receipt asset's decimals
    pub ui_value: Decimal,
}

/// Single-pool lending service
pub struct LendingPool {
    config: PoolConfig,
    services: PoolServices,
    oracle: AccrualOracle,
    ledger: Mutex<PoolLedger>,
}

impl LendingPool {
    /// Create the pool ledger and its vault accounts
    ///
    /// Fails with `AlreadyInitialized` if the store already holds a ledger.
    #[instrument(skip(config, services))]
    pub async fn initialize(
        config: PoolConfig,
        services: PoolServices,
        base: AssetId,
        collateral: AssetId,
        receipt: AssetId,
    ) -> Result<Self> {
        config.validate()?;
        if receipt == base || receipt == collateral {
            return Err(LendingError::InvalidArgument(format!(
                "receipt asset {} must differ from base and collateral assets",
                receipt
            )));
        }
        if services.store.load_ledger().await?.is_some() {
            return Err(LendingError::AlreadyInitialized);
        }

        let ledger = PoolLedger::new(base, collateral, receipt, services.clock.now());

        let mut undo = Compensations::new();
        if let Err(e) = Self::open_vaults(&config, &services, &ledger, &mut undo).await {
            return Err(undo.abort(services.assets.as_ref(), e).await);
        }

        info!(%ledger, "Pool initialized");
        Ok(Self::from_parts(config, services, ledger))
    }

    async fn open_vaults(
        config: &PoolConfig,
        services: &PoolServices,
        ledger: &PoolLedger,
        undo: &mut Compensations,
    ) -> Result<()> {
        let vaults = [
            (&ledger.base_asset_id, &config.pool_vault),
            (&ledger.collateral_asset_id, &config.collateral_vault),
        ];
        for (asset, vault) in vaults {
            if !services.assets.has_account(asset, vault).await {
                services.assets.open_account(asset, vault).await?;
                undo.opened(asset, vault);
            }
        }

        services
            .store
            .commit(StoreBatch {
                ledger: ledger.clone(),
                expected_version: None,
                loan: None,
            })
            .await?;
        Ok(())
    }

    /// Resume a pool from its persisted ledger
    #[instrument(skip(config, services))]
    pub async fn open(config: PoolConfig, services: PoolServices) -> Result<Self> {
        config.validate()?;
        let ledger = services
            .store
            .load_ledger()
            .await?
            .ok_or_else(|| LendingError::NotFound("pool ledger".to_string()))?;

        debug!(%ledger, "Pool ledger loaded");
        Ok(Self::from_parts(config, services, ledger))
    }

    fn from_parts(config: PoolConfig, services: PoolServices, ledger: PoolLedger) -> Self {
        Self {
            oracle: AccrualOracle::new(config.compounding),
            config,
            services,
            ledger: Mutex::new(ledger),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn oracle(&self) -> &AccrualOracle {
        &self.oracle
    }

    fn minter(&self) -> DepositMinter<'_> {
        DepositMinter::new(
            self.services.assets.as_ref(),
            self.services.store.as_ref(),
            &self.config,
        )
    }

    fn loan_book(&self) -> LoanBook<'_> {
        LoanBook::new(
            self.services.assets.as_ref(),
            self.services.store.as_ref(),
            self.services.curve.as_ref(),
            &self.config,
        )
    }

    /// Open `depositor`'s receipt account
    #[instrument(skip(self))]
    pub async fn register_depositor(&self, depositor: &AccountId) -> Result<ReceiptAccountRef> {
        let ledger = self.ledger.lock().await;
        let receipt = self.minter().register(&ledger, depositor).await?;

        info!(%receipt, "Depositor registered");
        Ok(receipt)
    }

    /// Close `depositor`'s receipt account; its balance must be zero
    #[instrument(skip(self))]
    pub async fn unregister_depositor(&self, depositor: &AccountId) -> Result<()> {
        let ledger = self.ledger.lock().await;
        self.minter().unregister(&ledger, depositor).await?;

        info!(%depositor, "Depositor unregistered");
        Ok(())
    }

    /// Deposit base currency and receive receipts 1:1
    #[instrument(skip(self))]
    pub async fn deposit(&self, depositor: &AccountId, amount: u64) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        let now = self.services.clock.now();

        let updated = self.minter().deposit(&ledger, depositor, amount, now).await?;
        *ledger = updated;

        info!(
            %depositor,
            amount,
            total_deposited = ledger.total_deposited,
            utilization_bps = ledger.utilization_bps(),
            "Deposit committed"
        );
        Ok(())
    }

    /// Borrow base currency against collateral
    #[instrument(skip(self))]
    pub async fn borrow(
        &self,
        borrower: &AccountId,
        collateral: u64,
        principal: u64,
    ) -> Result<LoanRecord> {
        let mut ledger = self.ledger.lock().await;
        let now = self.services.clock.now();

        let (updated, loan) = self
            .loan_book()
            .borrow(&ledger, borrower, collateral, principal, now)
            .await?;
        *ledger = updated;

        info!(
            loan_id = %loan.id,
            %borrower,
            principal,
            owed = loan.amount,
            rate_bps = ledger.rate.rate_bps,
            "Loan opened"
        );
        Ok(loan)
    }

    /// Preview a borrow against the current ledger
    pub async fn quote_borrow(&self, principal: u64) -> Result<BorrowQuote> {
        let ledger = self.ledger.lock().await;
        let quote = loan_book::quote_borrow(&ledger, self.services.curve.as_ref(), principal)?;
        debug!(?quote, "Borrow quoted");
        Ok(quote)
    }

    /// Persisted loan of `borrower`
    pub async fn loan(&self, borrower: &AccountId) -> Result<LoanRecord> {
        self.loan_book().loan(borrower).await
    }

    /// Snapshot of the live ledger
    pub async fn ledger(&self) -> PoolLedger {
        self.ledger.lock().await.clone()
    }

    /// Receipt units held by `owner`
    pub async fn receipt_balance(&self, owner: &AccountId) -> Result<u64> {
        let receipt = self.ledger.lock().await.receipt_asset_id.clone();
        match self.services.assets.balance(&receipt, owner).await {
            Ok(balance) => Ok(balance),
            Err(AssetError::AccountNotFound { .. }) => {
                Err(LendingError::NotFound(format!("receipt account for {}", owner)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Value of `receipt_amount` after `elapsed_seconds` at `rate_bps`
    pub fn accrued_value(
        &self,
        receipt_amount: u64,
        rate_bps: u16,
        elapsed_seconds: i64,
    ) -> Result<Decimal> {
        self.oracle.accrued_value(receipt_amount, rate_bps, elapsed_seconds)
    }

    /// Project `owner`'s receipts to `at` (default: now) at the current rate
    #[instrument(skip(self))]
    pub async fn query_accrued_value(
        &self,
        owner: &AccountId,
        at: Option<i64>,
    ) -> Result<AccruedValue> {
        let rate = self.ledger.lock().await.rate;
        let receipt_balance = self.receipt_balance(owner).await?;
        let at = at.unwrap_or_else(|| self.services.clock.now());

        let value = self.oracle.project(receipt_balance, &rate, at)?;
        let accrued = AccruedValue {
            receipt_balance,
            rate_bps: rate.rate_bps,
            elapsed_seconds: at - rate.synced_at,
            value,
            ui_value: to_ui_amount(value, self.config.receipt_decimals)?,
        };

        debug!(?accrued, "Accrued value projected");
        Ok(accrued)
    }
}
