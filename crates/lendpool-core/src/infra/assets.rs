//! Asset ledger collaborator
//!
//! Moves, mints, and burns units of named assets. The pool only calls
//! through [`AssetLedger`]; custody mechanics live behind it.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use lendpool_common::{AccountId, AssetError, AssetId};
use parking_lot::RwLock;
use tracing::debug;

/// Trait for asset custody backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Open an empty account of `asset` for `owner`
    async fn open_account(&self, asset: &AssetId, owner: &AccountId) -> Result<(), AssetError>;

    /// Close an account; the balance must already be zero
    async fn close_account(&self, asset: &AssetId, owner: &AccountId) -> Result<(), AssetError>;

    /// Whether `owner` holds an account of `asset`
    async fn has_account(&self, asset: &AssetId, owner: &AccountId) -> bool;

    /// Current balance of `owner`'s `asset` account
    async fn balance(&self, asset: &AssetId, owner: &AccountId) -> Result<u64, AssetError>;

    /// Move `amount` of `asset`; the destination account is created on demand
    async fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), AssetError>;

    /// Mint `amount` of `asset` into an existing account, signed by `authority`
    async fn mint(
        &self,
        asset: &AssetId,
        to: &AccountId,
        amount: u64,
        authority: &AccountId,
    ) -> Result<(), AssetError>;

    /// Burn `amount` of `asset` from an account, signed by `authority`
    async fn burn(
        &self,
        asset: &AssetId,
        from: &AccountId,
        amount: u64,
        authority: &AccountId,
    ) -> Result<(), AssetError>;
}

/// Registered asset
#[derive(Debug, Clone)]
struct AssetInfo {
    mint_authority: Option<AccountId>,
    supply: u64,
}

type AccountKey = (AssetId, AccountId);

/// In-memory asset ledger
///
/// Balances sit behind one lock so a transfer debits and credits atomically.
pub struct InMemoryAssetLedger {
    assets: DashMap<AssetId, AssetInfo>,
    balances: RwLock<HashMap<AccountKey, u64>>,
}

impl Default for InMemoryAssetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self {
            assets: DashMap::new(),
            balances: RwLock::new(HashMap::new()),
        }
    }

    /// Register an asset; `None` makes it unmintable through [`AssetLedger::mint`]
    pub fn create_asset(&self, asset: AssetId, mint_authority: Option<AccountId>) {
        self.assets.insert(
            asset,
            AssetInfo {
                mint_authority,
                supply: 0,
            },
        );
    }

    /// Credit `owner` out of thin air (test faucet / airdrop)
    pub fn fund(&self, asset: &AssetId, owner: &AccountId, amount: u64) -> Result<(), AssetError> {
        self.ensure_asset(asset)?;
        let mut balances = self.balances.write();
        let balance = balances.entry((asset.clone(), owner.clone())).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow {
                owner: owner.clone(),
            })?;
        drop(balances);

        if let Some(mut info) = self.assets.get_mut(asset) {
            info.supply = info.supply.saturating_add(amount);
        }
        Ok(())
    }

    /// Outstanding supply of an asset
    pub fn supply(&self, asset: &AssetId) -> u64 {
        self.assets.get(asset).map(|info| info.supply).unwrap_or(0)
    }

    fn ensure_asset(&self, asset: &AssetId) -> Result<(), AssetError> {
        if self.assets.contains_key(asset) {
            Ok(())
        } else {
            Err(AssetError::UnknownAsset(asset.to_string()))
        }
    }

    fn ensure_authority(&self, asset: &AssetId, signer: &AccountId) -> Result<(), AssetError> {
        let info = self
            .assets
            .get(asset)
            .ok_or_else(|| AssetError::UnknownAsset(asset.to_string()))?;

        match &info.mint_authority {
            Some(authority) if authority == signer => Ok(()),
            _ => Err(AssetError::Unauthorized {
                signer: signer.clone(),
                asset: asset.to_string(),
            }),
        }
    }
}

fn not_found(asset: &AssetId, owner: &AccountId) -> AssetError {
    AssetError::AccountNotFound {
        owner: owner.clone(),
        asset: asset.to_string(),
    }
}

#[async_trait]
impl AssetLedger for InMemoryAssetLedger {
    async fn open_account(&self, asset: &AssetId, owner: &AccountId) -> Result<(), AssetError> {
        self.ensure_asset(asset)?;
        let mut balances = self.balances.write();
        let key = (asset.clone(), owner.clone());
        if balances.contains_key(&key) {
            return Err(AssetError::AccountExists {
                owner: owner.clone(),
                asset: asset.to_string(),
            });
        }
        balances.insert(key, 0);
        Ok(())
    }

    async fn close_account(&self, asset: &AssetId, owner: &AccountId) -> Result<(), AssetError> {
        let mut balances = self.balances.write();
        let key = (asset.clone(), owner.clone());
        match balances.get(&key) {
            None => Err(not_found(asset, owner)),
            Some(&balance) if balance > 0 => Err(AssetError::InsufficientFunds {
                owner: owner.clone(),
                required: 0,
                available: balance,
            }),
            Some(_) => {
                balances.remove(&key);
                Ok(())
            }
        }
    }

    async fn has_account(&self, asset: &AssetId, owner: &AccountId) -> bool {
        self.balances
            .read()
            .contains_key(&(asset.clone(), owner.clone()))
    }

    async fn balance(&self, asset: &AssetId, owner: &AccountId) -> Result<u64, AssetError> {
        self.balances
            .read()
            .get(&(asset.clone(), owner.clone()))
            .copied()
            .ok_or_else(|| not_found(asset, owner))
    }

    async fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        self.ensure_asset(asset)?;
        let mut balances = self.balances.write();

        let from_key = (asset.clone(), from.clone());
        let to_key = (asset.clone(), to.clone());

        let available = *balances.get(&from_key).ok_or_else(|| not_found(asset, from))?;
        if available < amount {
            return Err(AssetError::InsufficientFunds {
                owner: from.clone(),
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = balances
            .get(&to_key)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow { owner: to.clone() })?;

        balances.insert(from_key, available - amount);
        balances.insert(to_key, credited);
        debug!(%asset, %from, %to, amount, "Transfer applied");
        Ok(())
    }

    async fn mint(
        &self,
        asset: &AssetId,
        to: &AccountId,
        amount: u64,
        authority: &AccountId,
    ) -> Result<(), AssetError> {
        self.ensure_authority(asset, authority)?;
        let mut balances = self.balances.write();
        let balance = balances
            .get_mut(&(asset.clone(), to.clone()))
            .ok_or_else(|| not_found(asset, to))?;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow { owner: to.clone() })?;
        drop(balances);

        if let Some(mut info) = self.assets.get_mut(asset) {
            info.supply = info.supply.saturating_add(amount);
        }
        debug!(%asset, %to, amount, "Minted");
        Ok(())
    }

    async fn burn(
        &self,
        asset: &AssetId,
        from: &AccountId,
        amount: u64,
        authority: &AccountId,
    ) -> Result<(), AssetError> {
        self.ensure_authority(asset, authority)?;
        let mut balances = self.balances.write();
        let balance = balances
            .get_mut(&(asset.clone(), from.clone()))
            .ok_or_else(|| not_found(asset, from))?;
        if *balance < amount {
            return Err(AssetError::InsufficientFunds {
                owner: from.clone(),
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        drop(balances);

        if let Some(mut info) = self.assets.get_mut(asset) {
            info.supply = info.supply.saturating_sub(amount);
        }
        debug!(%asset, %from, amount, "Burned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> InMemoryAssetLedger {
        let ledger = InMemoryAssetLedger::new();
        ledger.create_asset("sol".into(), None);
        ledger.create_asset("isol".into(), Some("isol_mint_auth".into()));
        ledger
    }

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let ledger = setup();
        let sol = AssetId::new("sol");
        let a = AccountId::new("holder-a");
        let pool = AccountId::new("pool");

        ledger.fund(&sol, &a, 100).unwrap();
        ledger.transfer(&sol, &a, &pool, 40).await.unwrap();

        assert_eq!(ledger.balance(&sol, &a).await.unwrap(), 60);
        assert_eq!(ledger.balance(&sol, &pool).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds() {
        let ledger = setup();
        let sol = AssetId::new("sol");
        let a = AccountId::new("holder-a");

        ledger.fund(&sol, &a, 10).unwrap();
        let result = ledger.transfer(&sol, &a, &"pool".into(), 11).await;
        assert!(matches!(result, Err(AssetError::InsufficientFunds { .. })));
        assert_eq!(ledger.balance(&sol, &a).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_mint_requires_authority() {
        let ledger = setup();
        let isol = AssetId::new("isol");
        let a = AccountId::new("holder-a");
        ledger.open_account(&isol, &a).await.unwrap();

        let result = ledger.mint(&isol, &a, 5, &"someone".into()).await;
        assert!(matches!(result, Err(AssetError::Unauthorized { .. })));

        ledger.mint(&isol, &a, 5, &"isol_mint_auth".into()).await.unwrap();
        assert_eq!(ledger.balance(&isol, &a).await.unwrap(), 5);
        assert_eq!(ledger.supply(&isol), 5);
    }

    #[tokio::test]
    async fn test_mint_into_missing_account() {
        let ledger = setup();
        let result = ledger
            .mint(&"isol".into(), &"nobody".into(), 5, &"isol_mint_auth".into())
            .await;
        assert!(matches!(result, Err(AssetError::AccountNotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_twice() {
        let ledger = setup();
        let isol = AssetId::new("isol");
        let a = AccountId::new("holder-a");

        ledger.open_account(&isol, &a).await.unwrap();
        let result = ledger.open_account(&isol, &a).await;
        assert!(matches!(result, Err(AssetError::AccountExists { .. })));
    }

    #[tokio::test]
    async fn test_close_requires_zero_balance() {
        let ledger = setup();
        let isol = AssetId::new("isol");
        let a = AccountId::new("holder-a");
        let auth = AccountId::new("isol_mint_auth");

        ledger.open_account(&isol, &a).await.unwrap();
        ledger.mint(&isol, &a, 1, &auth).await.unwrap();
        assert!(ledger.close_account(&isol, &a).await.is_err());

        ledger.burn(&isol, &a, 1, &auth).await.unwrap();
        ledger.close_account(&isol, &a).await.unwrap();
        assert!(!ledger.has_account(&isol, &a).await);
    }

    #[tokio::test]
    async fn test_unknown_asset() {
        let ledger = setup();
        let result = ledger.open_account(&"btc".into(), &"a".into()).await;
        assert!(matches!(result, Err(AssetError::UnknownAsset(_))));
    }
}
