//! # Claim Engine
//!
//! Turns accrued weekly integrals into a payable reward. For each requested
//! week the position's share is
//!
//! ```text
//! reward = position_liquidity_seconds * weekly_budget / pool_liquidity_seconds
//! ```
//!
//! rounded down. Every requested week is marked claimed, including weeks
//! worth nothing, so the same week can never be settled twice.

use tracing::debug;

use crate::batch::PoolBatch;
use crate::constants::{is_week_aligned, week_elapsed};
use crate::errors::{MiningError, MiningResult};
use crate::interfaces::RewardBudget;
use crate::math::{mul_div_floor, safe_add_u128};
use crate::state::PoolMiningState;
use crate::types::{PoolId, PositionKey, Timestamp};

/// Check that `week` can be claimed by `key` at `now`
pub fn check_claimable(
    state: &PoolMiningState,
    key: &PositionKey,
    week: Timestamp,
    now: Timestamp,
) -> MiningResult<()> {
    if !is_week_aligned(week) {
        return Err(MiningError::InvalidWeek(week));
    }
    if !week_elapsed(week, now) {
        return Err(MiningError::WeekNotElapsed { week, now });
    }
    if state.is_claimed(key, week) {
        return Err(MiningError::AlreadyClaimed { week });
    }
    Ok(())
}

/// Share of `week`'s budget owed to `key`, from already accrued buckets
pub fn week_reward<B: RewardBudget + ?Sized>(
    state: &PoolMiningState,
    budget: &B,
    pool: PoolId,
    key: &PositionKey,
    week: Timestamp,
    tick_step: i32,
) -> MiningResult<u128> {
    let kind = key.kind();
    let global = state.global_weekly(week, kind);
    if global.is_zero() {
        return Ok(0);
    }
    let position = state.position_weekly(key, week, tick_step);
    if position.is_zero() {
        return Ok(0);
    }
    mul_div_floor(position, budget.reward_budget(pool, week, kind), global)
}

/// Settle `weeks` for `key`: validate each week, add up its share and mark
/// it claimed. Both integrators must already be accrued up to `now`.
///
/// Fails on the first invalid week. A week listed twice fails as already
/// claimed.
pub fn settle_weeks<B: RewardBudget + ?Sized>(
    batch: &mut PoolBatch<'_>,
    budget: &B,
    key: &PositionKey,
    weeks: &[Timestamp],
    tick_step: i32,
    now: Timestamp,
) -> MiningResult<u128> {
    let pool = batch.pool();
    let mut reward = 0u128;

    for &week in weeks {
        check_claimable(batch.state(), key, week, now)?;
        let share = week_reward(batch.state(), budget, pool, key, week, tick_step)?;
        reward = safe_add_u128(reward, share)?;
        batch.mark_claimed(key, week);
        debug!(%pool, position = %key, week, share, "settled week");
    }

    Ok(reward)
}
