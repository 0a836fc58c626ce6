//! Exchange-rate curve - Utilization to receipt rate
//!
//! The shipped curve is the identity: a pool at 50% utilization pays 5000
//! bps, at 69.3% it pays 6930 bps. Any curve that maps 0 to 0, never
//! decreases, and stays at or below 10000 bps can stand in for it.

use lendpool_common::{BPS_SCALE, MAX_RATE_BPS};

/// Maps pool utilization (bps) to the receipt asset's rate (bps)
pub trait RateCurve: Send + Sync {
    fn rate_bps(&self, utilization_bps: u64) -> u16;
}

/// Rate equals utilization, clamped to `[0, 10000]`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRateCurve;

impl RateCurve for LinearRateCurve {
    #[inline]
    fn rate_bps(&self, utilization_bps: u64) -> u16 {
        utilization_bps.min(BPS_SCALE) as u16
    }
}

/// Check the curve contract on the full bps domain
pub fn is_valid_curve(curve: &dyn RateCurve) -> bool {
    if curve.rate_bps(0) != 0 {
        return false;
    }

    let mut prev = 0u16;
    for u in 0..=BPS_SCALE {
        let rate = curve.rate_bps(u);
        if rate < prev || rate > MAX_RATE_BPS {
            return false;
        }
        prev = rate;
    }
    true
}
