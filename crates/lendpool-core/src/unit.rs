//! Unit of work compensation log
//!
//! Each external effect applied during a deposit, borrow, or initialization
//! pushes its inverse here. If a later step fails, [`Compensations::rollback`]
//! replays the inverses newest-first so the asset ledger ends where it began.

use lendpool_common::{AccountId, AssetId, LendingError};
use tracing::{error, warn};

use crate::infra::AssetLedger;

/// Inverse of one applied effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Undo {
    /// Move `amount` of `asset` back from `from` to `to`
    Transfer {
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: u64,
    },
    /// Burn receipts minted into `from`
    Burn {
        asset: AssetId,
        from: AccountId,
        amount: u64,
        authority: AccountId,
    },
    /// Close an account opened by this unit of work
    CloseAccount { asset: AssetId, owner: AccountId },
}

/// Ordered list of pending inverses
#[derive(Debug, Default)]
pub struct Compensations {
    entries: Vec<Undo>,
}

impl Compensations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a transfer `from -> to` happened
    pub fn transferred(&mut self, asset: &AssetId, from: &AccountId, to: &AccountId, amount: u64) {
        self.entries.push(Undo::Transfer {
            asset: asset.clone(),
            from: to.clone(),
            to: from.clone(),
            amount,
        });
    }

    /// Record that `amount` was minted into `to`
    pub fn minted(&mut self, asset: &AssetId, to: &AccountId, amount: u64, authority: &AccountId) {
        self.entries.push(Undo::Burn {
            asset: asset.clone(),
            from: to.clone(),
            amount,
            authority: authority.clone(),
        });
    }

    /// Record that an account was opened
    pub fn opened(&mut self, asset: &AssetId, owner: &AccountId) {
        self.entries.push(Undo::CloseAccount {
            asset: asset.clone(),
            owner: owner.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending inverses, newest last
    pub fn entries(&self) -> &[Undo] {
        &self.entries
    }

    /// Roll back after `cause` and return the error to report
    ///
    /// If any inverse failed the unit of work is left partly applied, and
    /// `cause` comes back wrapped in `CompensationFailed`.
    pub async fn abort(self, assets: &dyn AssetLedger, cause: LendingError) -> LendingError {
        let failed = self.rollback(assets).await;
        LendingError::after_compensation(cause, failed)
    }

    /// Apply every inverse in reverse order
    ///
    /// A failing inverse is logged and skipped; the remaining ones still run.
    /// Returns the number of inverses that failed.
    pub async fn rollback(self, assets: &dyn AssetLedger) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        warn!(steps = self.entries.len(), "Unit of work aborted, compensating");

        let mut failed = 0;
        for undo in self.entries.into_iter().rev() {
            let result = match &undo {
                Undo::Transfer {
                    asset,
                    from,
                    to,
                    amount,
                } => assets.transfer(asset, from, to, *amount).await,
                Undo::Burn {
                    asset,
                    from,
                    amount,
                    authority,
                } => assets.burn(asset, from, *amount, authority).await,
                Undo::CloseAccount { asset, owner } => assets.close_account(asset, owner).await,
            };

            if let Err(e) = result {
                failed += 1;
                error!(?undo, error = %e, "Compensation failed");
            }
        }
        failed
    }
}
