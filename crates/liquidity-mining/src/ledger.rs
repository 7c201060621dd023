//! # Tick Activity Ledger
//!
//! Per-tick log of the spans during which the pool's current tick sat on that
//! tick. Written by tick crossings, read by the position integrator. Entries
//! are never removed: a position accruing late still needs the history.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{MiningError, MiningResult};
use crate::types::{Tick, Timestamp};

/// Span during which a tick was the pool's active tick
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct ActivityInterval {
    pub enter: Timestamp,
    /// `None` while the tick is still active
    pub exit: Option<Timestamp>,
}

impl ActivityInterval {
    pub const fn opened_at(enter: Timestamp) -> Self {
        Self { enter, exit: None }
    }

    pub const fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    /// End of the span as seen at `now`
    pub fn end_at(&self, now: Timestamp) -> Timestamp {
        self.exit.unwrap_or(now).min(now)
    }

    /// Whether the span closed at or before `now`, so nothing more can
    /// accrue from it
    pub fn closed_by(&self, now: Timestamp) -> bool {
        matches!(self.exit, Some(exit) if exit <= now)
    }
}

/// Append-only interval log keyed by tick.
///
/// Invariants: at most one open interval per tick, only the last interval of
/// a tick is ever mutated, and intervals of a tick never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TickActivityLedger {
    ticks: BTreeMap<Tick, Vec<ActivityInterval>>,
}

impl TickActivityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded intervals of `tick`, oldest first
    pub fn intervals(&self, tick: Tick) -> &[ActivityInterval] {
        self.ticks.get(&tick).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, tick: Tick) -> usize {
        self.ticks.get(&tick).map_or(0, Vec::len)
    }

    pub fn latest(&self, tick: Tick) -> Option<&ActivityInterval> {
        self.ticks.get(&tick).and_then(|intervals| intervals.last())
    }

    /// Number of ticks with any recorded activity
    pub fn tracked_tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// Resume index a position starts from when it first accrues at a time
    /// where this ledger is current: the open interval if there is one,
    /// otherwise past the end.
    pub fn catch_up_index(&self, tick: Tick) -> usize {
        match self.latest(tick) {
            Some(latest) if latest.is_open() => self.len(tick) - 1,
            _ => self.len(tick),
        }
    }

    /// Append an open interval for `tick` starting at `now`
    pub fn open_tick(&mut self, tick: Tick, now: Timestamp) -> MiningResult<()> {
        let intervals = self.ticks.entry(tick).or_default();
        if let Some(latest) = intervals.last() {
            match latest.exit {
                None => return Err(MiningError::InvariantViolation("tick already has an open interval")),
                Some(exit) if exit > now => {
                    return Err(MiningError::TimeWentBackwards { now, last: exit });
                }
                Some(_) => {}
            }
        }
        intervals.push(ActivityInterval::opened_at(now));
        Ok(())
    }

    /// Close the open interval of `tick` at `now`, returning its index
    pub fn close_tick(&mut self, tick: Tick, now: Timestamp) -> MiningResult<usize> {
        let intervals = self
            .ticks
            .get_mut(&tick)
            .ok_or(MiningError::InvariantViolation("closing a tick with no recorded activity"))?;
        let index = intervals.len().saturating_sub(1);
        let latest = intervals
            .last_mut()
            .ok_or(MiningError::InvariantViolation("closing a tick with no recorded activity"))?;
        if !latest.is_open() {
            return Err(MiningError::InvariantViolation("closing a tick with no open interval"));
        }
        if now < latest.enter {
            return Err(MiningError::TimeWentBackwards { now, last: latest.enter });
        }
        latest.exit = Some(now);
        Ok(index)
    }

    /// Close `exit_tick` and open `entry_tick`, both at `now`
    pub fn cross_tick(&mut self, exit_tick: Tick, entry_tick: Tick, now: Timestamp) -> MiningResult<()> {
        self.close_tick(exit_tick, now)?;
        self.open_tick(entry_tick, now)
    }

    /// Remove the last interval of `tick`. Only used to roll back a staged open.
    pub(crate) fn revert_open(&mut self, tick: Tick) {
        if let Some(intervals) = self.ticks.get_mut(&tick) {
            intervals.pop();
            if intervals.is_empty() {
                self.ticks.remove(&tick);
            }
        }
    }

    /// Reopen the last interval of `tick`. Only used to roll back a staged close.
    pub(crate) fn revert_close(&mut self, tick: Tick) {
        if let Some(latest) = self.ticks.get_mut(&tick).and_then(|intervals| intervals.last_mut()) {
            latest.exit = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_cross() {
        let mut ledger = TickActivityLedger::new();
        ledger.open_tick(0, 100).unwrap();
        ledger.cross_tick(0, 10, 250).unwrap();
        ledger.cross_tick(10, 0, 400).unwrap();

        assert_eq!(
            ledger.intervals(0),
            &[
                ActivityInterval { enter: 100, exit: Some(250) },
                ActivityInterval { enter: 400, exit: None },
            ]
        );
        assert_eq!(ledger.intervals(10), &[ActivityInterval { enter: 250, exit: Some(400) }]);
        assert_eq!(ledger.tracked_tick_count(), 2);
    }

    #[test]
    fn test_close_without_open_interval_is_invariant_violation() {
        let mut ledger = TickActivityLedger::new();
        assert!(matches!(ledger.close_tick(5, 10), Err(MiningError::InvariantViolation(_))));

        ledger.open_tick(5, 10).unwrap();
        ledger.close_tick(5, 20).unwrap();
        assert!(matches!(ledger.close_tick(5, 30), Err(MiningError::InvariantViolation(_))));
    }

    #[test]
    fn test_second_open_interval_rejected() {
        let mut ledger = TickActivityLedger::new();
        ledger.open_tick(5, 10).unwrap();
        assert!(matches!(ledger.open_tick(5, 20), Err(MiningError::InvariantViolation(_))));
    }

    #[test]
    fn test_time_going_backwards_rejected() {
        let mut ledger = TickActivityLedger::new();
        ledger.open_tick(5, 100).unwrap();
        assert_eq!(
            ledger.close_tick(5, 50),
            Err(MiningError::TimeWentBackwards { now: 50, last: 100 })
        );
        ledger.close_tick(5, 150).unwrap();
        assert_eq!(
            ledger.open_tick(5, 120),
            Err(MiningError::TimeWentBackwards { now: 120, last: 150 })
        );
    }

    #[test]
    fn test_catch_up_index() {
        let mut ledger = TickActivityLedger::new();
        assert_eq!(ledger.catch_up_index(0), 0);

        ledger.open_tick(0, 10).unwrap();
        assert_eq!(ledger.catch_up_index(0), 0);

        ledger.cross_tick(0, 10, 20).unwrap();
        assert_eq!(ledger.catch_up_index(0), 1);
        assert_eq!(ledger.catch_up_index(10), 0);
    }

    #[test]
    fn test_interval_end_and_closure() {
        let open = ActivityInterval::opened_at(10);
        assert_eq!(open.end_at(50), 50);
        assert!(!open.closed_by(50));

        let closed = ActivityInterval { enter: 10, exit: Some(40) };
        assert_eq!(closed.end_at(50), 40);
        assert_eq!(closed.end_at(30), 30);
        assert!(closed.closed_by(40));
        assert!(!closed.closed_by(39));
    }

    #[test]
    fn test_revert_helpers() {
        let mut ledger = TickActivityLedger::new();
        ledger.open_tick(0, 10).unwrap();
        ledger.close_tick(0, 20).unwrap();
        ledger.revert_close(0);
        assert!(ledger.latest(0).unwrap().is_open());
        ledger.revert_open(0);
        assert_eq!(ledger.len(0), 0);
        assert_eq!(ledger.tracked_tick_count(), 0);
    }
}
