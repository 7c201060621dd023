//! # Global Weekly Integrator
//!
//! Pool-wide liquidity-seconds per week, for concentrated and ambient
//! liquidity separately. These buckets are the denominators of every
//! pro-rata share.

use tracing::debug;

use super::{check_forward, credit_weeks, Accrual};
use crate::batch::PoolBatch;
use crate::errors::MiningResult;
use crate::types::{LiquidityKind, Timestamp};

/// Integrate the pool's `current_liquidity` of `kind` up to `now`.
///
/// `current_liquidity` must be the magnitude that held since the previous
/// call, so the venue calls this before applying any change to it.
pub fn accrue_global(
    batch: &mut PoolBatch<'_>,
    kind: LiquidityKind,
    current_liquidity: u128,
    now: Timestamp,
) -> MiningResult<Accrual> {
    let Some(last) = batch.state().global_cursor(kind) else {
        debug!(pool = %batch.pool(), %kind, now, "seeding global accrual cursor");
        batch.set_global_cursor(kind, now);
        return Ok(Accrual::Seeded);
    };
    check_forward(last, now)?;

    credit_weeks(last, now, current_liquidity, |week, amount| {
        batch.add_global_weekly(week, kind, amount)
    })?;
    if now != last {
        batch.set_global_cursor(kind, now);
    }

    debug!(
        pool = %batch.pool(),
        %kind,
        liquidity = current_liquidity,
        from = last,
        to = now,
        "accrued global liquidity"
    );
    Ok(Accrual::Integrated { from: last, to: now })
}
