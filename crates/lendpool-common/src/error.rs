//! Error types for the lending core
//!
//! Provides a unified error type and the asset-collaborator error variants

use thiserror::Error;

use crate::types::account::AccountId;

/// Result type alias using LendingError
pub type Result<T> = std::result::Result<T, LendingError>;

/// Unified error type for lending operations
///
/// Every variant is terminal for the unit of work that raised it.
#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Pool ledger is already initialized")]
    AlreadyInitialized,

    #[error("Depositor already registered: {0}")]
    AlreadyRegistered(AccountId),

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Borrower already holds a loan: {0}")]
    LoanAlreadyExists(AccountId),

    #[error("Insufficient collateral: required {required}, provided {provided}")]
    InsufficientCollateral { required: u64, provided: u64 },

    #[error("Depositor has a non-zero receipt balance: {balance}")]
    NonZeroBalance { balance: u64 },

    // Asset collaborator errors
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Undo of a failed unit of work did not fully apply
    #[error("{failed} compensation step(s) failed after: {cause}")]
    CompensationFailed {
        #[source]
        cause: Box<LendingError>,
        failed: usize,
    },
}

/// Errors reported by the asset transfer/mint collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Insufficient funds in {owner}: required {required}, available {available}")]
    InsufficientFunds {
        owner: AccountId,
        required: u64,
        available: u64,
    },

    #[error("{signer} is not authorized to mint {asset}")]
    Unauthorized { signer: AccountId, asset: String },

    #[error("No {asset} account for {owner}")]
    AccountNotFound { owner: AccountId, asset: String },

    #[error("{owner} already holds a {asset} account")]
    AccountExists { owner: AccountId, asset: String },

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Balance overflow in {owner}")]
    BalanceOverflow { owner: AccountId },
}

impl LendingError {
    /// Stable snake_case code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::AlreadyInitialized => "already_initialized",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::InsufficientLiquidity { .. } => "insufficient_liquidity",
            Self::Overflow => "overflow",
            Self::NotFound(_) => "not_found",
            Self::LoanAlreadyExists(_) => "loan_already_exists",
            Self::InsufficientCollateral { .. } => "insufficient_collateral",
            Self::NonZeroBalance { .. } => "non_zero_balance",
            Self::Asset(AssetError::InsufficientFunds { .. }) => "insufficient_funds",
            Self::Asset(AssetError::Unauthorized { .. }) => "unauthorized",
            Self::Asset(_) => "asset_error",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::CompensationFailed { .. } => "compensation_failed",
        }
    }

    /// Wrap `cause` when `failed` undo steps could not be applied
    pub fn after_compensation(cause: LendingError, failed: usize) -> Self {
        if failed == 0 {
            cause
        } else {
            LendingError::CompensationFailed {
                cause: Box::new(cause),
                failed,
            }
        }
    }

    /// Shorthand for a zero or otherwise unusable amount
    pub fn invalid_amount(what: &str) -> Self {
        LendingError::InvalidArgument(format!("{} must be greater than zero", what))
    }
}

impl From<serde_json::Error> for LendingError {
    fn from(err: serde_json::Error) -> Self {
        LendingError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LendingError {
    fn from(err: std::io::Error) -> Self {
        LendingError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for LendingError {
    fn from(err: anyhow::Error) -> Self {
        LendingError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LendingError::InsufficientLiquidity {
            requested: 6,
            available: 5,
        };
        assert!(err.to_string().contains("requested 6, available 5"));
    }

    #[test]
    fn test_asset_error_codes() {
        let err: LendingError = AssetError::InsufficientFunds {
            owner: AccountId::new("holder-a"),
            required: 10,
            available: 1,
        }
        .into();
        assert_eq!(err.error_code(), "insufficient_funds");

        let err: LendingError = AssetError::UnknownAsset("usdc".into()).into();
        assert_eq!(err.error_code(), "asset_error");
    }

    #[test]
    fn test_invalid_amount() {
        let err = LendingError::invalid_amount("deposit amount");
        assert_eq!(err.error_code(), "invalid_argument");
        assert!(err.to_string().contains("deposit amount"));
    }

    #[test]
    fn test_after_compensation() {
        let err = LendingError::after_compensation(LendingError::Overflow, 0);
        assert!(matches!(err, LendingError::Overflow));

        let err = LendingError::after_compensation(LendingError::Storage("disk full".into()), 2);
        assert_eq!(err.error_code(), "compensation_failed");
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
