//! # Weekly Integrators
//!
//! Lazily integrate liquidity over time into week buckets. Each integrator
//! keeps a cursor with the last time it ran; a call at `now` integrates
//! `[cursor, now)` assuming the magnitude did not change in between, which
//! holds because every liquidity change is preceded by an accrual.
//!
//! The first call for a cursor only records `now`. Liquidity present before
//! tracking began is never credited.

pub mod global;
pub mod position;

pub use global::accrue_global;
pub use position::{accrue_ambient_position, accrue_concentrated_position, accrue_position};

use crate::errors::{MiningError, MiningResult};
use crate::math::{liquidity_seconds, LiquiditySeconds, WeekSpans};
use crate::types::Timestamp;

/// What an accrual call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accrual {
    /// First call: the cursor was set and nothing was credited
    Seeded,
    /// `[from, to)` was integrated
    Integrated { from: Timestamp, to: Timestamp },
}

/// Reject calls that would move a cursor backwards
pub(crate) fn check_forward(last: Timestamp, now: Timestamp) -> MiningResult<()> {
    if now < last {
        return Err(MiningError::TimeWentBackwards { now, last });
    }
    Ok(())
}

/// Integrate a constant `liquidity` over `[from, to)`, handing the
/// liquidity-seconds of each week to `credit`. Weeks with nothing to credit
/// are skipped.
pub(crate) fn credit_weeks<F>(from: Timestamp, to: Timestamp, liquidity: u128, mut credit: F) -> MiningResult<()>
where
    F: FnMut(Timestamp, LiquiditySeconds) -> MiningResult<()>,
{
    if liquidity == 0 {
        return Ok(());
    }
    for span in WeekSpans::new(from, to) {
        let amount = liquidity_seconds(liquidity, span.duration());
        if !amount.is_zero() {
            credit(span.week, amount)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEK;

    #[test]
    fn test_credit_weeks_splits_by_week() {
        let mut credited = Vec::new();
        credit_weeks(WEEK - 10, WEEK + 5, 3, |week, amount| {
            credited.push((week, amount.as_u256().as_u128()));
            Ok(())
        })
        .unwrap();
        assert_eq!(credited, vec![(0, 30), (WEEK, 15)]);
    }

    #[test]
    fn test_credit_weeks_skips_zero_liquidity() {
        let mut calls = 0;
        credit_weeks(0, WEEK, 0, |_, _| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_check_forward() {
        assert!(check_forward(10, 10).is_ok());
        assert_eq!(
            check_forward(10, 9),
            Err(MiningError::TimeWentBackwards { now: 9, last: 10 })
        );
    }
}
