//! Reward accrual: pure arithmetic, no state.

use chrono::{DateTime, Utc};

use crate::error::LedgerError;

/// Fixed-point year used by the annualized rate.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Denominator of the per-mille-like rate coefficient.
pub const RATE_DENOMINATOR: u64 = 1_000;

/// Whole seconds elapsed since `deposit_time`, saturating at zero when `now`
/// lies before the deposit (back-dated batches make that reachable).
pub fn elapsed_secs(deposit_time: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    now.signed_duration_since(deposit_time)
        .num_seconds()
        .max(0) as u64
}

/// Reward accrued by `amount` at `rate` over `elapsed` seconds:
///
/// ```text
/// amount * rate * elapsed / (SECONDS_PER_YEAR * RATE_DENOMINATOR)
/// ```
///
/// The product is taken before the division in u128 with checked
/// multiplication, and the division floors. Accrual is intentionally not
/// capped at the lockup duration: a deposit left unwithdrawn past maturity
/// keeps accruing.
pub fn pending_reward(amount: u128, rate: u64, elapsed: u64) -> Result<u128, LedgerError> {
    let numerator = amount
        .checked_mul(rate as u128)
        .and_then(|v| v.checked_mul(elapsed as u128))
        .ok_or(LedgerError::ArithmeticOverflow)?;

    Ok(numerator / (SECONDS_PER_YEAR as u128 * RATE_DENOMINATOR as u128))
}
