//! Deposit minter - Base currency in, receipts out
//!
//! A deposit moves base currency from the depositor into the pool vault and
//! mints the same number of receipt units back to the depositor. Both effects
//! and the ledger update land together; on any failure the effects already
//! applied are reversed.

use lendpool_common::{
    AccountId, AssetError, LendingError, PoolConfig, PoolLedger, ReceiptAccountRef, Result,
};
use tracing::debug;

use crate::infra::{AssetLedger, PoolStore, StoreBatch};
use crate::unit::Compensations;

/// Depositor-facing half of the pool
pub struct DepositMinter<'a> {
    assets: &'a dyn AssetLedger,
    store: &'a dyn PoolStore,
    config: &'a PoolConfig,
}

impl<'a> DepositMinter<'a> {
    pub fn new(
        assets: &'a dyn AssetLedger,
        store: &'a dyn PoolStore,
        config: &'a PoolConfig,
    ) -> Self {
        Self {
            assets,
            store,
            config,
        }
    }

    /// Open the depositor's receipt account
    pub async fn register(
        &self,
        ledger: &PoolLedger,
        depositor: &AccountId,
    ) -> Result<ReceiptAccountRef> {
        self.config.ensure_external(depositor)?;

        let receipt = &ledger.receipt_asset_id;
        if self.assets.has_account(receipt, depositor).await {
            return Err(LendingError::AlreadyRegistered(depositor.clone()));
        }

        match self.assets.open_account(receipt, depositor).await {
            Ok(()) => {}
            Err(AssetError::AccountExists { .. }) => {
                return Err(LendingError::AlreadyRegistered(depositor.clone()))
            }
            Err(e) => return Err(e.into()),
        }

        Ok(ReceiptAccountRef {
            owner: depositor.clone(),
            asset: receipt.clone(),
        })
    }

    /// Close the depositor's receipt account; it must hold no receipts
    pub async fn unregister(&self, ledger: &PoolLedger, depositor: &AccountId) -> Result<()> {
        let receipt = &ledger.receipt_asset_id;
        if !self.assets.has_account(receipt, depositor).await {
            return Err(not_registered(depositor));
        }

        let balance = self.assets.balance(receipt, depositor).await?;
        if balance != 0 {
            return Err(LendingError::NonZeroBalance { balance });
        }

        self.assets.close_account(receipt, depositor).await?;
        Ok(())
    }

    /// Deposit `amount` of base currency, returning the committed ledger
    pub async fn deposit(
        &self,
        ledger: &PoolLedger,
        depositor: &AccountId,
        amount: u64,
        now: i64,
    ) -> Result<PoolLedger> {
        if amount == 0 {
            return Err(LendingError::invalid_amount("deposit amount"));
        }
        self.config.ensure_external(depositor)?;
        if !self.assets.has_account(&ledger.receipt_asset_id, depositor).await {
            return Err(not_registered(depositor));
        }

        let mut staged = ledger.clone();
        staged.record_deposit(amount, now)?;

        let mut undo = Compensations::new();
        if let Err(e) = self.settle(ledger.version, &staged, depositor, amount, &mut undo).await {
            return Err(undo.abort(self.assets, e).await);
        }

        debug!(%depositor, amount, total_deposited = staged.total_deposited, "Deposit settled");
        Ok(staged)
    }

    async fn settle(
        &self,
        expected_version: u64,
        staged: &PoolLedger,
        depositor: &AccountId,
        amount: u64,
        undo: &mut Compensations,
    ) -> Result<()> {
        let base = &staged.base_asset_id;
        let receipt = &staged.receipt_asset_id;
        let vault = &self.config.pool_vault;
        let authority = &self.config.mint_authority;

        self.assets.transfer(base, depositor, vault, amount).await?;
        undo.transferred(base, depositor, vault, amount);

        self.assets.mint(receipt, depositor, amount, authority).await?;
        undo.minted(receipt, depositor, amount, authority);

        self.store
            .commit(StoreBatch {
                ledger: staged.clone(),
                expected_version: Some(expected_version),
                loan: None,
            })
            .await?;
        Ok(())
    }
}

fn not_registered(depositor: &AccountId) -> LendingError {
    LendingError::NotFound(format!("receipt account for {}", depositor))
}
