//! # Staged Pool Writes
//!
//! A [`PoolBatch`] applies writes to a pool's state in place and records how
//! to undo each of them. The engine either commits the batch, keeping the
//! writes and publishing the staged events, or rolls it back, restoring the
//! state exactly as it was before the operation started.

use tracing::trace;

use crate::errors::MiningResult;
use crate::events::MiningEvent;
use crate::math::LiquiditySeconds;
use crate::state::PoolMiningState;
use crate::types::{LiquidityKind, PoolId, PositionKey, Tick, Timestamp};

/// Inverse of one staged write
#[derive(Debug, Clone)]
enum Undo {
    CurrentTick(Option<Tick>),
    LedgerOpened(Tick),
    LedgerClosed(Tick),
    GlobalWeekly((Timestamp, LiquidityKind), Option<LiquiditySeconds>),
    GlobalCursor(LiquidityKind, Option<Timestamp>),
    PositionCursor(PositionKey, Option<Timestamp>),
    PositionTickWeekly((PositionKey, Timestamp, Tick), Option<LiquiditySeconds>),
    PositionAmbientWeekly((PositionKey, Timestamp), Option<LiquiditySeconds>),
    ResumeIndex((PositionKey, Tick), Option<u32>),
    Claimed((PositionKey, Timestamp)),
}

/// Write batch over a single pool's state
pub struct PoolBatch<'a> {
    pool: PoolId,
    state: &'a mut PoolMiningState,
    undo: Vec<Undo>,
    events: Vec<MiningEvent>,
}

impl<'a> PoolBatch<'a> {
    pub fn new(pool: PoolId, state: &'a mut PoolMiningState) -> Self {
        Self {
            pool,
            state,
            undo: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn pool(&self) -> PoolId {
        self.pool
    }

    /// Current view of the state, including writes staged so far
    pub fn state(&self) -> &PoolMiningState {
        self.state
    }

    pub fn staged_writes(&self) -> usize {
        self.undo.len()
    }

    /// Stage an event published only if the batch commits
    pub fn emit(&mut self, event: MiningEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // Ledger Writes
    // ========================================================================

    pub fn set_current_tick(&mut self, tick: Tick) {
        let previous = self.state.current_tick.replace(tick);
        self.undo.push(Undo::CurrentTick(previous));
    }

    pub fn open_tick(&mut self, tick: Tick, now: Timestamp) -> MiningResult<()> {
        self.state.ledger.open_tick(tick, now)?;
        self.undo.push(Undo::LedgerOpened(tick));
        Ok(())
    }

    pub fn close_tick(&mut self, tick: Tick, now: Timestamp) -> MiningResult<()> {
        self.state.ledger.close_tick(tick, now)?;
        self.undo.push(Undo::LedgerClosed(tick));
        Ok(())
    }

    // ========================================================================
    // Integrator Writes
    // ========================================================================

    pub fn add_global_weekly(&mut self, week: Timestamp, kind: LiquidityKind, amount: LiquiditySeconds) -> MiningResult<()> {
        let key = (week, kind);
        let previous = self.state.global_weekly.get(&key).copied();
        let updated = previous.unwrap_or_default().checked_add(amount)?;
        self.state.global_weekly.insert(key, updated);
        self.undo.push(Undo::GlobalWeekly(key, previous));
        Ok(())
    }

    pub fn set_global_cursor(&mut self, kind: LiquidityKind, now: Timestamp) {
        let previous = self.state.global_cursor.insert(kind, now);
        self.undo.push(Undo::GlobalCursor(kind, previous));
    }

    pub fn set_position_cursor(&mut self, key: &PositionKey, now: Timestamp) {
        let previous = self.state.position_cursor.insert(*key, now);
        self.undo.push(Undo::PositionCursor(*key, previous));
    }

    pub fn add_position_tick_weekly(
        &mut self,
        key: &PositionKey,
        week: Timestamp,
        tick: Tick,
        amount: LiquiditySeconds,
    ) -> MiningResult<()> {
        let slot = (*key, week, tick);
        let previous = self.state.position_tick_weekly.get(&slot).copied();
        let updated = previous.unwrap_or_default().checked_add(amount)?;
        self.state.position_tick_weekly.insert(slot, updated);
        self.undo.push(Undo::PositionTickWeekly(slot, previous));
        Ok(())
    }

    pub fn add_position_ambient_weekly(&mut self, key: &PositionKey, week: Timestamp, amount: LiquiditySeconds) -> MiningResult<()> {
        let slot = (*key, week);
        let previous = self.state.position_ambient_weekly.get(&slot).copied();
        let updated = previous.unwrap_or_default().checked_add(amount)?;
        self.state.position_ambient_weekly.insert(slot, updated);
        self.undo.push(Undo::PositionAmbientWeekly(slot, previous));
        Ok(())
    }

    pub fn set_resume_index(&mut self, key: &PositionKey, tick: Tick, index: u32) {
        let previous = self.state.resume_index.insert((*key, tick), index);
        self.undo.push(Undo::ResumeIndex((*key, tick), previous));
    }

    // ========================================================================
    // Claim Writes
    // ========================================================================

    /// Mark `week` claimed for `key`. Returns false if it already was.
    pub fn mark_claimed(&mut self, key: &PositionKey, week: Timestamp) -> bool {
        let inserted = self.state.claimed.insert((*key, week));
        if inserted {
            self.undo.push(Undo::Claimed((*key, week)));
        }
        inserted
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Keep every staged write and hand back the staged events
    pub fn commit(self) -> Vec<MiningEvent> {
        trace!(pool = %self.pool, writes = self.undo.len(), "committing pool batch");
        self.events
    }

    /// Undo every staged write, newest first, and drop the staged events
    pub fn rollback(self) {
        trace!(pool = %self.pool, writes = self.undo.len(), "rolling back pool batch");
        let state = self.state;
        for undo in self.undo.into_iter().rev() {
            match undo {
                Undo::CurrentTick(previous) => state.current_tick = previous,
                Undo::LedgerOpened(tick) => state.ledger.revert_open(tick),
                Undo::LedgerClosed(tick) => state.ledger.revert_close(tick),
                Undo::GlobalWeekly(key, previous) => restore(&mut state.global_weekly, key, previous),
                Undo::GlobalCursor(kind, previous) => restore(&mut state.global_cursor, kind, previous),
                Undo::PositionCursor(key, previous) => restore(&mut state.position_cursor, key, previous),
                Undo::PositionTickWeekly(slot, previous) => {
                    restore(&mut state.position_tick_weekly, slot, previous)
                }
                Undo::PositionAmbientWeekly(slot, previous) => {
                    restore(&mut state.position_ambient_weekly, slot, previous)
                }
                Undo::ResumeIndex(slot, previous) => restore(&mut state.resume_index, slot, previous),
                Undo::Claimed(slot) => {
                    state.claimed.remove(&slot);
                }
            }
        }
    }
}

fn restore<K: Ord, V>(map: &mut std::collections::BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Owner, TickRange};

    fn populated() -> PoolMiningState {
        let mut state = PoolMiningState::default();
        let mut batch = PoolBatch::new(PoolId(1), &mut state);
        batch.set_current_tick(0);
        batch.open_tick(0, 10).unwrap();
        batch.set_global_cursor(LiquidityKind::Concentrated, 10);
        batch.add_global_weekly(0, LiquidityKind::Concentrated, LiquiditySeconds::new(500)).unwrap();
        batch.commit();
        state
    }

    #[test]
    fn test_commit_keeps_writes_and_events() {
        let mut state = PoolMiningState::default();
        let mut batch = PoolBatch::new(PoolId(1), &mut state);
        batch.set_current_tick(3);
        batch.emit(MiningEvent::PoolInitialized { pool: PoolId(1), tick: 3, timestamp: 7 });
        assert_eq!(batch.staged_writes(), 1);
        let events = batch.commit();

        assert_eq!(events.len(), 1);
        assert_eq!(state.current_tick(), Some(3));
    }

    #[test]
    fn test_rollback_restores_exact_state() {
        let mut state = populated();
        let before = state.clone();
        let key = PositionKey::concentrated(Owner::from_index(9), TickRange::new(-20, 20).unwrap());

        let mut batch = PoolBatch::new(PoolId(1), &mut state);
        batch.close_tick(0, 50).unwrap();
        batch.open_tick(10, 50).unwrap();
        batch.set_current_tick(10);
        batch.add_global_weekly(0, LiquidityKind::Concentrated, LiquiditySeconds::new(40)).unwrap();
        batch.add_global_weekly(0, LiquidityKind::Ambient, LiquiditySeconds::new(40)).unwrap();
        batch.set_global_cursor(LiquidityKind::Concentrated, 50);
        batch.set_position_cursor(&key, 50);
        batch.add_position_tick_weekly(&key, 0, 0, LiquiditySeconds::new(5)).unwrap();
        batch.set_resume_index(&key, 0, 1);
        assert!(batch.mark_claimed(&key, 0));
        batch.rollback();

        assert_eq!(state, before);
    }

    #[test]
    fn test_failed_write_leaves_no_undo_entry() {
        let mut state = populated();
        let before = state.clone();
        let mut batch = PoolBatch::new(PoolId(1), &mut state);
        assert!(batch.add_global_weekly(0, LiquidityKind::Concentrated, LiquiditySeconds::MAX).is_err());
        assert!(batch.close_tick(42, 60).is_err());
        assert_eq!(batch.staged_writes(), 0);
        batch.rollback();
        assert_eq!(state, before);
    }

    #[test]
    fn test_mark_claimed_twice() {
        let mut state = PoolMiningState::default();
        let key = PositionKey::ambient(Owner::from_index(1));
        let mut batch = PoolBatch::new(PoolId(1), &mut state);
        assert!(batch.mark_claimed(&key, 0));
        assert!(!batch.mark_claimed(&key, 0));
        batch.rollback();
        assert!(!state.is_claimed(&key, 0));
    }
}
