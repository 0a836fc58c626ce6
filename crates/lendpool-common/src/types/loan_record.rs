//! LoanRecord - A borrower's front-loaded debt
//!
//! Interest is fixed when the loan is opened: the record stores the total
//! owed (principal + interest) and the time after which it is due. Records
//! are immutable once persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LendingError;
use crate::types::account::AccountId;

/// Persisted loan, keyed by borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Unique loan ID (UUIDv7, time-ordered)
    pub id: Uuid,

    /// Owning borrower
    pub borrower: AccountId,

    /// Base currency disbursed
    pub principal: u64,

    /// Interest charged up front
    pub interest: u64,

    /// Total owed: principal + interest
    pub amount: u64,

    /// Rate (bps) the interest was computed at
    pub rate_bps: u16,

    /// Collateral escrowed for this loan
    pub collateral: u64,

    /// Creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Due timestamp (Unix seconds), strictly after `created_at`
    pub expiration_time: i64,
}

impl LoanRecord {
    /// Build a record for a loan opened at `created_at` with the given term
    pub fn new(
        borrower: AccountId,
        principal: u64,
        interest: u64,
        rate_bps: u16,
        collateral: u64,
        created_at: i64,
        term_secs: i64,
    ) -> Result<Self, LendingError> {
        if term_secs <= 0 {
            return Err(LendingError::InvalidArgument(format!(
                "loan term must be positive, got {}",
                term_secs
            )));
        }

        let amount = principal
            .checked_add(interest)
            .ok_or(LendingError::Overflow)?;
        let expiration_time = created_at
            .checked_add(term_secs)
            .ok_or(LendingError::Overflow)?;

        Ok(Self {
            id: Uuid::now_v7(),
            borrower,
            principal,
            interest,
            amount,
            rate_bps,
            collateral,
            created_at,
            expiration_time,
        })
    }

    /// Whether the loan is past its due time
    pub fn is_due(&self, now: i64) -> bool {
        now > self.expiration_time
    }

    /// Due time as a UTC datetime, if representable
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiration_time, 0)
    }

    /// Seconds remaining until due (negative once overdue)
    pub fn seconds_until_due(&self, now: i64) -> i64 {
        self.expiration_time.saturating_sub(now)
    }
}

impl std::fmt::Display for LoanRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LoanRecord(borrower={}, owed={}, rate={}bps, due={})",
            self.borrower, self.amount, self.rate_bps, self.expiration_time
        )
    }
}
