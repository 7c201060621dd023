//! # Position Weekly Integrator
//!
//! Credits a position with liquidity-seconds for the time it spent in range.
//!
//! Concentrated positions are credited per tracked tick: for every tick of
//! the range, the ledger says when that tick was the pool's active tick, and
//! the overlap of those spans with `[cursor, now)` is credited to the
//! position's bucket for that (week, tick). A per-tick resume index remembers
//! which ledger intervals were fully consumed, so a call only walks activity
//! recorded since the previous one.
//!
//! Ambient positions are always in range and integrate like the global
//! buckets, using the position's own liquidity.

use tracing::debug;

use super::{check_forward, credit_weeks, Accrual};
use crate::batch::PoolBatch;
use crate::errors::{MiningError, MiningResult};
use crate::events::MiningEvent;
use crate::ledger::ActivityInterval;
use crate::types::{PositionKey, Tick, TickRange, Timestamp};

/// Accrue `key` up to `now`, dispatching on the key's kind
pub fn accrue_position(
    batch: &mut PoolBatch<'_>,
    key: &PositionKey,
    liquidity: u128,
    tick_step: i32,
    now: Timestamp,
) -> MiningResult<Accrual> {
    match key.range {
        Some(range) => accrue_concentrated_position(batch, key, range, liquidity, tick_step, now),
        None => accrue_ambient_position(batch, key, liquidity, now),
    }
}

/// Accrue a concentrated position's in-range liquidity up to `now`
pub fn accrue_concentrated_position(
    batch: &mut PoolBatch<'_>,
    key: &PositionKey,
    range: TickRange,
    liquidity: u128,
    tick_step: i32,
    now: Timestamp,
) -> MiningResult<Accrual> {
    let Some(last) = batch.state().position_cursor(key) else {
        // Start from the present: an open interval is resumed from `now`,
        // closed ones are skipped entirely.
        for tick in range.tracked_ticks(tick_step) {
            let index = batch.state().ledger().catch_up_index(tick);
            if index > 0 {
                batch.set_resume_index(key, tick, to_index(index)?);
            }
        }
        seed(batch, key, now);
        return Ok(Accrual::Seeded);
    };
    check_forward(last, now)?;

    for tick in range.tracked_ticks(tick_step) {
        accrue_tick(batch, key, tick, liquidity, last, now)?;
    }
    if now != last {
        batch.set_position_cursor(key, now);
    }

    debug!(pool = %batch.pool(), position = %key, liquidity, from = last, to = now, "accrued concentrated position");
    Ok(Accrual::Integrated { from: last, to: now })
}

/// Credit one tracked tick's activity in `[last, now)` and advance its
/// resume index past every interval that is now fully consumed
fn accrue_tick(
    batch: &mut PoolBatch<'_>,
    key: &PositionKey,
    tick: Tick,
    liquidity: u128,
    last: Timestamp,
    now: Timestamp,
) -> MiningResult<()> {
    let start = batch.state().resume_index(key, tick) as usize;
    let pending: Vec<ActivityInterval> = match batch.state().ledger().intervals(tick).get(start..) {
        Some(pending) if !pending.is_empty() => pending.to_vec(),
        _ => return Ok(()),
    };

    let mut index = start;
    for interval in pending {
        let from = interval.enter.max(last);
        let to = interval.end_at(now);
        credit_weeks(from, to, liquidity, |week, amount| {
            batch.add_position_tick_weekly(key, week, tick, amount)
        })?;

        // Still open: the next call picks up from the same interval
        if !interval.closed_by(now) {
            break;
        }
        index += 1;
    }

    if index != start {
        batch.set_resume_index(key, tick, to_index(index)?);
    }
    Ok(())
}

/// Accrue an ambient position's liquidity up to `now`
pub fn accrue_ambient_position(
    batch: &mut PoolBatch<'_>,
    key: &PositionKey,
    liquidity: u128,
    now: Timestamp,
) -> MiningResult<Accrual> {
    let Some(last) = batch.state().position_cursor(key) else {
        seed(batch, key, now);
        return Ok(Accrual::Seeded);
    };
    check_forward(last, now)?;

    credit_weeks(last, now, liquidity, |week, amount| {
        batch.add_position_ambient_weekly(key, week, amount)
    })?;
    if now != last {
        batch.set_position_cursor(key, now);
    }

    debug!(pool = %batch.pool(), position = %key, liquidity, from = last, to = now, "accrued ambient position");
    Ok(Accrual::Integrated { from: last, to: now })
}

fn seed(batch: &mut PoolBatch<'_>, key: &PositionKey, now: Timestamp) {
    debug!(pool = %batch.pool(), position = %key, now, "seeding position accrual cursor");
    batch.set_position_cursor(key, now);
    let pool = batch.pool();
    batch.emit(MiningEvent::PositionTracked {
        pool,
        position: *key,
        timestamp: now,
    });
}

fn to_index(index: usize) -> MiningResult<u32> {
    u32::try_from(index).map_err(|_| MiningError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEK;
    use crate::state::PoolMiningState;
    use crate::types::{Owner, PoolId};

    const STEP: i32 = 10;
    const LIQUIDITY: u128 = 1_000;

    fn key() -> PositionKey {
        PositionKey::concentrated(Owner::from_index(1), TickRange::new(-20, 20).unwrap())
    }

    fn with_batch<T>(state: &mut PoolMiningState, f: impl FnOnce(&mut PoolBatch<'_>) -> T) -> T {
        let mut batch = PoolBatch::new(PoolId(1), state);
        let result = f(&mut batch);
        batch.commit();
        result
    }

    fn accrue(state: &mut PoolMiningState, now: Timestamp) -> Accrual {
        with_batch(state, |batch| {
            accrue_position(batch, &key(), LIQUIDITY, STEP, now).unwrap()
        })
    }

    fn cross(state: &mut PoolMiningState, exit: Tick, entry: Tick, now: Timestamp) {
        with_batch(state, |batch| {
            batch.close_tick(exit, now).unwrap();
            batch.open_tick(entry, now).unwrap();
        })
    }

    #[test]
    fn test_first_call_seeds_without_crediting() {
        let mut state = PoolMiningState::default();
        with_batch(&mut state, |batch| batch.open_tick(0, 100).unwrap());
        cross(&mut state, 0, 10, 200);
        cross(&mut state, 10, 0, 300);

        assert_eq!(accrue(&mut state, 400), Accrual::Seeded);
        assert_eq!(state.position_cursor(&key()), Some(400));
        // Tick 0 is open again: resume from its latest interval
        assert_eq!(state.resume_index(&key(), 0), 1);
        // Tick 10 closed: skip its history
        assert_eq!(state.resume_index(&key(), 10), 1);
        assert_eq!(state.position_weekly(&key(), 0, STEP), 0u128);
    }

    #[test]
    fn test_open_interval_credited_from_cursor() {
        let mut state = PoolMiningState::default();
        with_batch(&mut state, |batch| batch.open_tick(0, 100).unwrap());
        accrue(&mut state, 150);
        accrue(&mut state, 250);

        assert_eq!(state.position_tick_weekly(&key(), 0, 0), 100 * LIQUIDITY);
        // Still open, so the index stays on it
        assert_eq!(state.resume_index(&key(), 0), 0);
    }

    #[test]
    fn test_several_intervals_within_one_week() {
        let mut state = PoolMiningState::default();
        with_batch(&mut state, |batch| batch.open_tick(-50, 0).unwrap());
        accrue(&mut state, 5);

        cross(&mut state, -50, 0, 10);
        cross(&mut state, 0, -50, 20);
        cross(&mut state, -50, 0, 30);
        cross(&mut state, 0, 10, 40);
        accrue(&mut state, 100);

        assert_eq!(state.position_tick_weekly(&key(), 0, 0), 20 * LIQUIDITY);
        assert_eq!(state.position_tick_weekly(&key(), 0, 10), 60 * LIQUIDITY);
        assert_eq!(state.resume_index(&key(), 0), 2);
        assert_eq!(state.resume_index(&key(), 10), 0);
    }

    #[test]
    fn test_interval_spanning_weeks_is_split() {
        let mut state = PoolMiningState::default();
        with_batch(&mut state, |batch| batch.open_tick(0, 0).unwrap());
        accrue(&mut state, WEEK / 2);
        cross(&mut state, 0, 100, 2 * WEEK + 10);
        accrue(&mut state, 3 * WEEK);

        assert_eq!(state.position_tick_weekly(&key(), 0, 0), (WEEK / 2) as u128 * LIQUIDITY);
        assert_eq!(state.position_tick_weekly(&key(), WEEK, 0), WEEK as u128 * LIQUIDITY);
        assert_eq!(state.position_tick_weekly(&key(), 2 * WEEK, 0), 10 * LIQUIDITY);
        assert_eq!(state.resume_index(&key(), 0), 1);
    }

    #[test]
    fn test_ticks_outside_tracked_set_ignored() {
        let mut state = PoolMiningState::default();
        // -20 is the range's lower bound and 5 is off the step grid
        with_batch(&mut state, |batch| batch.open_tick(-20, 0).unwrap());
        accrue(&mut state, 1);
        cross(&mut state, -20, 5, 50);
        accrue(&mut state, 100);
        assert_eq!(state.position_weekly(&key(), 0, STEP), 0u128);
    }

    #[test]
    fn test_ambient_position() {
        let mut state = PoolMiningState::default();
        let ambient = PositionKey::ambient(Owner::from_index(2));
        let run = |state: &mut PoolMiningState, now| {
            with_batch(state, |batch| accrue_position(batch, &ambient, 7, STEP, now).unwrap())
        };
        assert_eq!(run(&mut state, WEEK - 5), Accrual::Seeded);
        assert_eq!(run(&mut state, WEEK + 5), Accrual::Integrated { from: WEEK - 5, to: WEEK + 5 });
        assert_eq!(state.position_ambient_weekly(&ambient, 0), 35u128);
        assert_eq!(state.position_ambient_weekly(&ambient, WEEK), 35u128);
    }

    #[test]
    fn test_seed_emits_tracking_event() {
        let mut state = PoolMiningState::default();
        let mut batch = PoolBatch::new(PoolId(3), &mut state);
        accrue_position(&mut batch, &key(), LIQUIDITY, STEP, 10).unwrap();
        let events = batch.commit();
        assert_eq!(
            events,
            vec![MiningEvent::PositionTracked { pool: PoolId(3), position: key(), timestamp: 10 }]
        );
    }
}
