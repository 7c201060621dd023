//! # Read Queries
//!
//! Read-only views over committed mining state, plus reward previews that
//! run a claim's accrual on a scratch copy of the pool and throw it away.

use std::collections::BTreeSet;

use crate::accrual::{accrue_global, accrue_position};
use crate::batch::PoolBatch;
use crate::claim::{check_claimable, week_reward};
use crate::constants::{next_week, week_start};
use crate::engine::LiquidityMining;
use crate::errors::{MiningError, MiningResult};
use crate::interfaces::{LiquiditySource, PositionRegistry, RewardBudget};
use crate::ledger::ActivityInterval;
use crate::math::{safe_add_u128, LiquiditySeconds};
use crate::types::{LiquidityKind, Owner, PoolId, PositionKey, Tick, TickRange, Timestamp};

/// Start of the reward week containing `now`
pub fn current_week(now: Timestamp) -> Timestamp {
    week_start(now)
}

/// Start of the reward week after the one containing `now`
pub fn upcoming_week(now: Timestamp) -> Timestamp {
    next_week(now)
}

impl<B: RewardBudget> LiquidityMining<B> {
    pub fn is_pool_initialized(&self, pool: PoolId) -> bool {
        self.pool(&pool).map_or(false, |state| state.is_initialized())
    }

    pub fn current_tick(&self, pool: PoolId) -> Option<Tick> {
        self.pool(&pool).and_then(|state| state.current_tick())
    }

    pub fn tick_step(&self, pool: PoolId) -> i32 {
        self.config.tick_step(pool)
    }

    /// Recorded activity of `tick`, oldest first
    pub fn tick_intervals(&self, pool: PoolId, tick: Tick) -> &[ActivityInterval] {
        match self.pool(&pool) {
            Some(state) => state.ledger().intervals(tick),
            None => &[],
        }
    }

    pub fn global_weekly_liquidity(&self, pool: PoolId, week: Timestamp, kind: LiquidityKind) -> LiquiditySeconds {
        self.pool(&pool).map_or(LiquiditySeconds::ZERO, |state| state.global_weekly(week, kind))
    }

    pub fn global_cursor(&self, pool: PoolId, kind: LiquidityKind) -> Option<Timestamp> {
        self.pool(&pool).and_then(|state| state.global_cursor(kind))
    }

    /// Liquidity-seconds `key` has been credited for `week`, summed over its
    /// tracked ticks
    pub fn position_weekly_liquidity(&self, pool: PoolId, key: &PositionKey, week: Timestamp) -> LiquiditySeconds {
        let tick_step = self.tick_step(pool);
        self.pool(&pool)
            .map_or(LiquiditySeconds::ZERO, |state| state.position_weekly(key, week, tick_step))
    }

    pub fn position_tick_liquidity(&self, pool: PoolId, key: &PositionKey, week: Timestamp, tick: Tick) -> LiquiditySeconds {
        self.pool(&pool)
            .map_or(LiquiditySeconds::ZERO, |state| state.position_tick_weekly(key, week, tick))
    }

    pub fn position_cursor(&self, pool: PoolId, key: &PositionKey) -> Option<Timestamp> {
        self.pool(&pool).and_then(|state| state.position_cursor(key))
    }

    pub fn resume_index(&self, pool: PoolId, key: &PositionKey, tick: Tick) -> u32 {
        self.pool(&pool).map_or(0, |state| state.resume_index(key, tick))
    }

    pub fn is_week_claimed(&self, pool: PoolId, key: &PositionKey, week: Timestamp) -> bool {
        self.pool(&pool).map_or(false, |state| state.is_claimed(key, week))
    }

    pub fn claimed_weeks(&self, pool: PoolId, key: &PositionKey) -> Vec<Timestamp> {
        self.pool(&pool)
            .map(|state| state.claimed_weeks(key).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Reward Previews
    // ========================================================================

    /// What a concentrated claim for `weeks` would pay at `now`.
    ///
    /// Weeks that are not claimable yet, or no longer, count as zero instead
    /// of failing. Nothing is written.
    pub fn pending_concentrated_rewards<M>(
        &self,
        market: &M,
        owner: Owner,
        pool: PoolId,
        range: TickRange,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
    {
        self.pending_rewards(market, PositionKey::concentrated(owner, range), pool, weeks, now)
    }

    /// What an ambient claim for `weeks` would pay at `now`
    pub fn pending_ambient_rewards<M>(
        &self,
        market: &M,
        owner: Owner,
        pool: PoolId,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
    {
        self.pending_rewards(market, PositionKey::ambient(owner), pool, weeks, now)
    }

    fn pending_rewards<M>(
        &self,
        market: &M,
        key: PositionKey,
        pool: PoolId,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
    {
        let liquidity = market
            .lookup_position(&key.owner, pool, key.range)
            .ok_or(MiningError::PositionNotFound)?;
        let mut scratch = match self.pool(&pool) {
            Some(state) if state.is_initialized() => state.clone(),
            _ => return Err(MiningError::PoolNotInitialized(pool)),
        };
        let tick_step = self.tick_step(pool);
        let kind = key.kind();

        let mut batch = PoolBatch::new(pool, &mut scratch);
        accrue_position(&mut batch, &key, liquidity, tick_step, now)?;
        accrue_global(&mut batch, kind, market.current_liquidity(pool, kind), now)?;
        batch.commit();

        let mut reward = 0u128;
        for week in weeks.iter().copied().collect::<BTreeSet<_>>() {
            if check_claimable(&scratch, &key, week, now).is_err() {
                continue;
            }
            let share = week_reward(&scratch, &self.budget, pool, &key, week, tick_step)?;
            reward = safe_add_u128(reward, share)?;
        }
        Ok(reward)
    }
}
