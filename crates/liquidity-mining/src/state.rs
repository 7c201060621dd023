//! # Pool Mining State
//!
//! Everything the engine persists for one pool: the tick activity ledger,
//! accrual cursors, weekly liquidity-time buckets, per-tick resume indices and
//! claimed weeks. Pools never share state.
//!
//! This module only exposes reads. Writes go through [`crate::batch::PoolBatch`]
//! so a failing operation can be rolled back.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::ledger::TickActivityLedger;
use crate::math::LiquiditySeconds;
use crate::types::{LiquidityKind, PositionKey, Tick, Timestamp};

/// Persisted mining state of a single pool
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PoolMiningState {
    /// Tick currently holding the open ledger interval
    pub(crate) current_tick: Option<Tick>,

    pub(crate) ledger: TickActivityLedger,

    /// Pool-wide liquidity-seconds per (week, kind)
    pub(crate) global_weekly: BTreeMap<(Timestamp, LiquidityKind), LiquiditySeconds>,

    /// Last global accrual per kind. Absent means never initialized.
    pub(crate) global_cursor: BTreeMap<LiquidityKind, Timestamp>,

    /// Last accrual per position. The key's range encodes the kind.
    pub(crate) position_cursor: BTreeMap<PositionKey, Timestamp>,

    /// Concentrated position liquidity-seconds per (position, week, tick)
    pub(crate) position_tick_weekly: BTreeMap<(PositionKey, Timestamp, Tick), LiquiditySeconds>,

    /// Ambient position liquidity-seconds per (position, week)
    pub(crate) position_ambient_weekly: BTreeMap<(PositionKey, Timestamp), LiquiditySeconds>,

    /// Ledger index per (position, tick) up to which activity is fully accounted for
    pub(crate) resume_index: BTreeMap<(PositionKey, Tick), u32>,

    /// Weeks already paid out, per position
    pub(crate) claimed: BTreeSet<(PositionKey, Timestamp)>,
}

impl PoolMiningState {
    pub fn is_initialized(&self) -> bool {
        self.current_tick.is_some()
    }

    pub fn current_tick(&self) -> Option<Tick> {
        self.current_tick
    }

    pub fn ledger(&self) -> &TickActivityLedger {
        &self.ledger
    }

    pub fn global_weekly(&self, week: Timestamp, kind: LiquidityKind) -> LiquiditySeconds {
        self.global_weekly.get(&(week, kind)).copied().unwrap_or_default()
    }

    pub fn global_cursor(&self, kind: LiquidityKind) -> Option<Timestamp> {
        self.global_cursor.get(&kind).copied()
    }

    pub fn position_cursor(&self, key: &PositionKey) -> Option<Timestamp> {
        self.position_cursor.get(key).copied()
    }

    /// Liquidity-seconds credited to a concentrated position for one tracked tick
    pub fn position_tick_weekly(&self, key: &PositionKey, week: Timestamp, tick: Tick) -> LiquiditySeconds {
        self.position_tick_weekly
            .get(&(*key, week, tick))
            .copied()
            .unwrap_or_default()
    }

    pub fn position_ambient_weekly(&self, key: &PositionKey, week: Timestamp) -> LiquiditySeconds {
        self.position_ambient_weekly
            .get(&(*key, week))
            .copied()
            .unwrap_or_default()
    }

    /// Liquidity-seconds a position earned in `week`, summed over its tracked
    /// ticks for concentrated positions.
    ///
    /// Saturates instead of failing: the sum is bounded by the pool-wide
    /// integral, which is itself checked.
    pub fn position_weekly(&self, key: &PositionKey, week: Timestamp, tick_step: i32) -> LiquiditySeconds {
        match key.range {
            Some(range) => range
                .tracked_ticks(tick_step)
                .map(|tick| self.position_tick_weekly(key, week, tick))
                .fold(LiquiditySeconds::ZERO, LiquiditySeconds::saturating_add),
            None => self.position_ambient_weekly(key, week),
        }
    }

    pub fn resume_index(&self, key: &PositionKey, tick: Tick) -> u32 {
        self.resume_index.get(&(*key, tick)).copied().unwrap_or(0)
    }

    pub fn is_claimed(&self, key: &PositionKey, week: Timestamp) -> bool {
        self.claimed.contains(&(*key, week))
    }

    /// Weeks already claimed by `key`, in ascending order
    pub fn claimed_weeks<'a>(&'a self, key: &'a PositionKey) -> impl Iterator<Item = Timestamp> + 'a {
        self.claimed
            .range((*key, Timestamp::MIN)..=(*key, Timestamp::MAX))
            .map(|(_, week)| *week)
    }

    /// Whether nothing has ever been written for this pool
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Owner, TickRange};

    #[test]
    fn test_default_reads() {
        let state = PoolMiningState::default();
        let key = PositionKey::ambient(Owner::from_index(1));
        assert!(state.is_empty());
        assert!(!state.is_initialized());
        assert!(state.global_weekly(0, LiquidityKind::Ambient).is_zero());
        assert_eq!(state.global_cursor(LiquidityKind::Concentrated), None);
        assert_eq!(state.position_cursor(&key), None);
        assert_eq!(state.resume_index(&key, 0), 0);
        assert!(!state.is_claimed(&key, 0));
    }

    #[test]
    fn test_position_weekly_sums_tracked_ticks_only() {
        let mut state = PoolMiningState::default();
        let range = TickRange::new(0, 40).unwrap();
        let key = PositionKey::concentrated(Owner::from_index(1), range);

        state.position_tick_weekly.insert((key, 0, 10), LiquiditySeconds::new(5));
        state.position_tick_weekly.insert((key, 0, 20), LiquiditySeconds::new(7));
        state.position_tick_weekly.insert((key, 0, 15), LiquiditySeconds::new(100));

        assert_eq!(state.position_weekly(&key, 0, 10), 12u128);
        assert!(state.position_weekly(&key, 604_800, 10).is_zero());
    }

    #[test]
    fn test_claimed_weeks_are_scoped_to_position() {
        let mut state = PoolMiningState::default();
        let alice = PositionKey::ambient(Owner::from_index(1));
        let bob = PositionKey::ambient(Owner::from_index(2));
        state.claimed.insert((alice, 604_800));
        state.claimed.insert((alice, 0));
        state.claimed.insert((bob, 0));

        assert_eq!(state.claimed_weeks(&alice).collect::<Vec<_>>(), vec![0, 604_800]);
        assert_eq!(state.claimed_weeks(&bob).count(), 1);
    }
}
