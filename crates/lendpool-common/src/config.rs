//! Pool configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::types::account::AccountId;

/// How a receipt balance compounds over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingMode {
    /// `(1 + r)^years`
    #[default]
    Annual,
    /// `e^(r * years)`
    Continuous,
}

impl std::str::FromStr for CompoundingMode {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(CompoundingMode::Annual),
            "continuous" => Ok(CompoundingMode::Continuous),
            other => Err(LendingError::Config(format!(
                "unknown compounding mode: {}",
                other
            ))),
        }
    }
}

/// Protocol parameters for a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Loan term in seconds
    #[serde(default = "default_loan_term_secs")]
    pub loan_term_secs: i64,

    /// Collateral required per unit of principal, in bps (10000 = 1:1)
    #[serde(default = "default_collateral_ratio_bps")]
    pub collateral_ratio_bps: u64,

    /// Compounding law used for accrued-value projections
    #[serde(default)]
    pub compounding: CompoundingMode,

    /// Decimals of the receipt asset, for display amounts
    #[serde(default = "default_receipt_decimals")]
    pub receipt_decimals: u32,

    /// Account holding deposited base currency
    #[serde(default = "default_pool_vault")]
    pub pool_vault: AccountId,

    /// Account holding escrowed collateral
    #[serde(default = "default_collateral_vault")]
    pub collateral_vault: AccountId,

    /// Signer allowed to mint the receipt asset
    #[serde(default = "default_mint_authority")]
    pub mint_authority: AccountId,

    /// Directory for file-backed persistence (in-memory when unset)
    #[serde(default)]
    pub data_dir: Option<String>,
}

fn default_loan_term_secs() -> i64 {
    crate::DEFAULT_LOAN_TERM_SECS
}

fn default_collateral_ratio_bps() -> u64 {
    crate::BPS_SCALE
}

fn default_receipt_decimals() -> u32 {
    9
}

fn default_pool_vault() -> AccountId {
    AccountId::new("pool")
}

fn default_collateral_vault() -> AccountId {
    AccountId::new("collateral")
}

fn default_mint_authority() -> AccountId {
    AccountId::new("isol_mint_auth")
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            loan_term_secs: default_loan_term_secs(),
            collateral_ratio_bps: default_collateral_ratio_bps(),
            compounding: CompoundingMode::default(),
            receipt_decimals: default_receipt_decimals(),
            pool_vault: default_pool_vault(),
            collateral_vault: default_collateral_vault(),
            mint_authority: default_mint_authority(),
            data_dir: None,
        }
    }
}

impl PoolConfig {
    /// Load configuration from `.env` and `LENDPOOL_*` environment variables
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("LENDPOOL_LOAN_TERM_SECS") {
            cfg.loan_term_secs = val
                .parse()
                .with_context(|| format!("invalid LENDPOOL_LOAN_TERM_SECS: {}", val))?;
        }
        if let Ok(val) = std::env::var("LENDPOOL_COLLATERAL_RATIO_BPS") {
            cfg.collateral_ratio_bps = val
                .parse()
                .with_context(|| format!("invalid LENDPOOL_COLLATERAL_RATIO_BPS: {}", val))?;
        }
        if let Ok(val) = std::env::var("LENDPOOL_COMPOUNDING") {
            cfg.compounding = val.parse()?;
        }
        if let Ok(val) = std::env::var("LENDPOOL_RECEIPT_DECIMALS") {
            cfg.receipt_decimals = val
                .parse()
                .with_context(|| format!("invalid LENDPOOL_RECEIPT_DECIMALS: {}", val))?;
        }
        if let Ok(dir) = std::env::var("LENDPOOL_DATA_DIR") {
            cfg.data_dir = Some(dir);
        }

        cfg.validate()?;
        tracing::debug!(?cfg, "Pool configuration loaded");
        Ok(cfg)
    }

    /// Reject parameter combinations the pool cannot operate with
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.loan_term_secs <= 0 {
            return Err(LendingError::Config(format!(
                "loan_term_secs must be positive, got {}",
                self.loan_term_secs
            )));
        }
        if self.collateral_ratio_bps == 0 {
            return Err(LendingError::Config(
                "collateral_ratio_bps must be positive".to_string(),
            ));
        }
        if self.receipt_decimals > 18 {
            return Err(LendingError::Config(format!(
                "receipt_decimals must be at most 18, got {}",
                self.receipt_decimals
            )));
        }
        if self.pool_vault == self.collateral_vault {
            return Err(LendingError::Config(
                "pool_vault and collateral_vault must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `account` is one of the pool's own identities
    pub fn is_pool_account(&self, account: &AccountId) -> bool {
        account == &self.pool_vault
            || account == &self.collateral_vault
            || account == &self.mint_authority
    }

    /// Reject the pool's own identities as depositor or borrower
    pub fn ensure_external(&self, account: &AccountId) -> Result<(), LendingError> {
        if self.is_pool_account(account) {
            return Err(LendingError::InvalidArgument(format!(
                "{} is a pool account and cannot act as a depositor or borrower",
                account
            )));
        }
        Ok(())
    }

    /// Minimum collateral for a principal, rounded up
    pub fn required_collateral(&self, principal: u64) -> Result<u64, LendingError> {
        let scale = crate::BPS_SCALE as u128;
        let required = (principal as u128 * self.collateral_ratio_bps as u128 + scale - 1) / scale;
        u64::try_from(required).map_err(|_| LendingError::Overflow)
    }
}
