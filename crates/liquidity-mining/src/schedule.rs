//! # Reward Schedule
//!
//! Governance-maintained table of weekly reward budgets per pool and
//! liquidity kind. The engine only reads it.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::MiningConfig;
use crate::constants::{is_week_aligned, WEEK};
use crate::errors::{MiningError, MiningResult};
use crate::interfaces::RewardBudget;
use crate::types::{LiquidityKind, PoolId, Timestamp};

/// Budget per (pool, week, kind). Weeks never set have a budget of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardSchedule {
    budgets: BTreeMap<(PoolId, Timestamp, LiquidityKind), u128>,
}

impl RewardSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the schedule described by a configuration
    pub fn from_config(config: &MiningConfig) -> MiningResult<Self> {
        let mut schedule = Self::new();
        for pool in &config.pools {
            for rewards in &pool.rewards {
                schedule.set_weekly_rewards(
                    pool.pool,
                    LiquidityKind::Concentrated,
                    rewards.from_week,
                    rewards.to_week,
                    rewards.concentrated as u128,
                )?;
                schedule.set_weekly_rewards(
                    pool.pool,
                    LiquidityKind::Ambient,
                    rewards.from_week,
                    rewards.to_week,
                    rewards.ambient as u128,
                )?;
            }
        }
        Ok(schedule)
    }

    /// Set the budget of every week from `from_week` to `to_week` inclusive.
    ///
    /// Both bounds must be week aligned. Later calls overwrite earlier ones.
    pub fn set_weekly_rewards(
        &mut self,
        pool: PoolId,
        kind: LiquidityKind,
        from_week: Timestamp,
        to_week: Timestamp,
        amount: u128,
    ) -> MiningResult<()> {
        if !is_week_aligned(from_week) {
            return Err(MiningError::InvalidWeek(from_week));
        }
        if !is_week_aligned(to_week) || to_week < from_week {
            return Err(MiningError::InvalidWeek(to_week));
        }

        let mut week = from_week;
        loop {
            self.budgets.insert((pool, week, kind), amount);
            match week.checked_add(WEEK) {
                Some(next) if next <= to_week => week = next,
                _ => break,
            }
        }

        info!(%pool, %kind, from_week, to_week, amount, "weekly rewards set");
        Ok(())
    }

    pub fn weekly_rewards(&self, pool: PoolId, week: Timestamp, kind: LiquidityKind) -> u128 {
        self.budgets.get(&(pool, week, kind)).copied().unwrap_or(0)
    }

    /// Total budget configured for `pool` and `kind` across all weeks
    pub fn total_rewards(&self, pool: PoolId, kind: LiquidityKind) -> u128 {
        self.budgets
            .iter()
            .filter(|((p, _, k), _)| *p == pool && *k == kind)
            .fold(0u128, |total, (_, amount)| total.saturating_add(*amount))
    }
}

impl RewardBudget for RewardSchedule {
    fn reward_budget(&self, pool: PoolId, week: Timestamp, kind: LiquidityKind) -> u128 {
        self.weekly_rewards(pool, week, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: PoolId = PoolId(7);

    #[test]
    fn test_range_is_inclusive() {
        let mut schedule = RewardSchedule::new();
        schedule
            .set_weekly_rewards(POOL, LiquidityKind::Concentrated, WEEK, 3 * WEEK, 50)
            .unwrap();

        assert_eq!(schedule.weekly_rewards(POOL, 0, LiquidityKind::Concentrated), 0);
        assert_eq!(schedule.weekly_rewards(POOL, WEEK, LiquidityKind::Concentrated), 50);
        assert_eq!(schedule.weekly_rewards(POOL, 3 * WEEK, LiquidityKind::Concentrated), 50);
        assert_eq!(schedule.weekly_rewards(POOL, 4 * WEEK, LiquidityKind::Concentrated), 0);
        assert_eq!(schedule.weekly_rewards(POOL, WEEK, LiquidityKind::Ambient), 0);
        assert_eq!(schedule.total_rewards(POOL, LiquidityKind::Concentrated), 150);
    }

    #[test]
    fn test_later_calls_overwrite() {
        let mut schedule = RewardSchedule::new();
        schedule.set_weekly_rewards(POOL, LiquidityKind::Ambient, 0, 2 * WEEK, 10).unwrap();
        schedule.set_weekly_rewards(POOL, LiquidityKind::Ambient, WEEK, WEEK, 99).unwrap();
        assert_eq!(schedule.reward_budget(POOL, 0, LiquidityKind::Ambient), 10);
        assert_eq!(schedule.reward_budget(POOL, WEEK, LiquidityKind::Ambient), 99);
        assert_eq!(schedule.reward_budget(POOL, 2 * WEEK, LiquidityKind::Ambient), 10);
    }

    #[test]
    fn test_misaligned_weeks_rejected() {
        let mut schedule = RewardSchedule::new();
        assert_eq!(
            schedule.set_weekly_rewards(POOL, LiquidityKind::Ambient, 1, WEEK, 10),
            Err(MiningError::InvalidWeek(1))
        );
        assert_eq!(
            schedule.set_weekly_rewards(POOL, LiquidityKind::Ambient, 2 * WEEK, WEEK, 10),
            Err(MiningError::InvalidWeek(WEEK))
        );
        assert_eq!(schedule, RewardSchedule::new());
    }
}
