//! Accrual oracle - Projected value of a receipt balance
//!
//! Receipts are minted 1:1 with deposits and never re-minted; their value
//! grows by compounding at the receipt asset's current rate. Projections are
//! single-segment: the rate in force now is assumed over the whole interval
//! since it was last synchronized, and the target time may be in the future.
//!
//! ```text
//! annual:      value = amount * (1 + r)^(t / year)
//! continuous:  value = amount * e^(r * t / year)
//! ```

use lendpool_common::{
    CompoundingMode, LendingError, RateState, Result, BPS_SCALE, SECONDS_PER_YEAR,
};
use rust_decimal::{Decimal, MathematicalOps};

/// Side-effect-free receipt valuation
#[derive(Debug, Clone, Copy, Default)]
pub struct AccrualOracle {
    mode: CompoundingMode,
}

impl AccrualOracle {
    pub fn new(mode: CompoundingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CompoundingMode {
        self.mode
    }

    /// Value of `receipt_amount` after `elapsed_seconds` at `rate_bps`
    pub fn accrued_value(
        &self,
        receipt_amount: u64,
        rate_bps: u16,
        elapsed_seconds: i64,
    ) -> Result<Decimal> {
        let factor = self.growth_factor(rate_bps, elapsed_seconds)?;
        Decimal::from(receipt_amount)
            .checked_mul(factor)
            .ok_or(LendingError::Overflow)
    }

    /// Value of `receipt_amount` at `at`, measured from the rate's last sync
    pub fn project(&self, receipt_amount: u64, rate: &RateState, at: i64) -> Result<Decimal> {
        let elapsed = at.checked_sub(rate.synced_at).ok_or(LendingError::Overflow)?;
        if elapsed < 0 {
            return Err(LendingError::InvalidArgument(format!(
                "projection time {} precedes last rate sync {}",
                at, rate.synced_at
            )));
        }
        self.accrued_value(receipt_amount, rate.rate_bps, elapsed)
    }

    /// Multiplier applied to a receipt balance
    pub fn growth_factor(&self, rate_bps: u16, elapsed_seconds: i64) -> Result<Decimal> {
        if elapsed_seconds < 0 {
            return Err(LendingError::InvalidArgument(format!(
                "elapsed seconds must be non-negative, got {}",
                elapsed_seconds
            )));
        }
        if rate_bps == 0 || elapsed_seconds == 0 {
            return Ok(Decimal::ONE);
        }

        let rate = Decimal::from(rate_bps) / Decimal::from(BPS_SCALE);

        match self.mode {
            CompoundingMode::Annual => {
                let base = Decimal::ONE + rate;
                if elapsed_seconds % SECONDS_PER_YEAR == 0 {
                    // Whole years compound exactly
                    let years = (elapsed_seconds / SECONDS_PER_YEAR) as u64;
                    base.checked_powu(years).ok_or(LendingError::Overflow)
                } else {
                    base.checked_powd(years_elapsed(elapsed_seconds)?)
                        .ok_or(LendingError::Overflow)
                }
            }
            CompoundingMode::Continuous => rate
                .checked_mul(years_elapsed(elapsed_seconds)?)
                .and_then(|x| x.checked_exp())
                .ok_or(LendingError::Overflow),
        }
    }
}

fn years_elapsed(elapsed_seconds: i64) -> Result<Decimal> {
    Decimal::from(elapsed_seconds)
        .checked_div(Decimal::from(SECONDS_PER_YEAR))
        .ok_or(LendingError::Overflow)
}

/// Scale a raw-unit value down by the asset's decimals
///
/// Fails for more decimals than a `Decimal` can represent.
pub fn to_ui_amount(value: Decimal, decimals: u32) -> Result<Decimal> {
    let unit = Decimal::try_new(1, decimals).map_err(|_| {
        LendingError::InvalidArgument(format!("unsupported asset decimals: {}", decimals))
    })?;
    value.checked_mul(unit).ok_or(LendingError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const YEAR: i64 = SECONDS_PER_YEAR;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.001)
    }

    #[test]
    fn test_zero_rate_never_appreciates() {
        let oracle = AccrualOracle::default();
        for elapsed in [0, 1, YEAR / 2, YEAR, 10 * YEAR] {
            assert_eq!(
                oracle.accrued_value(2_000_000_000, 0, elapsed).unwrap(),
                dec!(2000000000)
            );
        }
    }

    #[test]
    fn test_zero_elapsed_returns_amount() {
        let oracle = AccrualOracle::default();
        assert_eq!(oracle.accrued_value(1_000, 5000, 0).unwrap(), dec!(1000));
    }

    #[test]
    fn test_one_year_annual() {
        let oracle = AccrualOracle::new(CompoundingMode::Annual);
        assert_eq!(oracle.accrued_value(1_000, 5000, YEAR).unwrap(), dec!(1500));
        assert_eq!(oracle.accrued_value(1_000, 6930, YEAR).unwrap(), dec!(1693));
    }

    #[test]
    fn test_two_years_annual_compounds() {
        let oracle = AccrualOracle::new(CompoundingMode::Annual);
        // 1000 * 1.5^2
        assert_eq!(oracle.accrued_value(1_000, 5000, 2 * YEAR).unwrap(), dec!(2250));
    }

    #[test]
    fn test_half_year_annual() {
        let oracle = AccrualOracle::new(CompoundingMode::Annual);
        // 1000 * sqrt(1.5)
        let value = oracle.accrued_value(1_000, 5000, YEAR / 2).unwrap();
        assert!(close(value, dec!(1224.7449)), "got {}", value);
    }

    #[test]
    fn test_one_year_continuous() {
        let oracle = AccrualOracle::new(CompoundingMode::Continuous);
        // 1000 * e^0.5
        let value = oracle.accrued_value(1_000, 5000, YEAR).unwrap();
        assert!(close(value, dec!(1648.7213)), "got {}", value);
    }

    #[test]
    fn test_negative_elapsed_rejected() {
        let oracle = AccrualOracle::default();
        let result = oracle.accrued_value(1_000, 5000, -1);
        assert!(matches!(result, Err(LendingError::InvalidArgument(_))));
    }

    #[test]
    fn test_project_from_sync_time() {
        let oracle = AccrualOracle::default();
        let rate = RateState {
            rate_bps: 5000,
            synced_at: 1_700_000_000,
        };

        let value = oracle.project(1_000, &rate, 1_700_000_000 + YEAR).unwrap();
        assert_eq!(value, dec!(1500));

        let result = oracle.project(1_000, &rate, 1_600_000_000);
        assert!(matches!(result, Err(LendingError::InvalidArgument(_))));
    }

    #[test]
    fn test_overflow_reported() {
        let oracle = AccrualOracle::default();
        // 2^1000 is far beyond Decimal's range
        let result = oracle.accrued_value(u64::MAX, 10_000, 1000 * YEAR);
        assert!(matches!(result, Err(LendingError::Overflow)));
    }

    #[test]
    fn test_ui_amount() {
        assert_eq!(to_ui_amount(dec!(2500000000), 9).unwrap(), dec!(2.5));
        assert_eq!(to_ui_amount(dec!(1500), 0).unwrap(), dec!(1500));
        assert_eq!(to_ui_amount(dec!(1), 28).unwrap(), Decimal::new(1, 28));
    }

    #[test]
    fn test_ui_amount_rejects_excess_decimals() {
        for decimals in [29, 255, u32::MAX] {
            assert!(matches!(
                to_ui_amount(dec!(1500), decimals),
                Err(LendingError::InvalidArgument(_))
            ));
        }
    }
}
