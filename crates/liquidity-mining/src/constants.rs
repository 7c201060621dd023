//! # Mining Constants
//!
//! Fixed parameters of the liquidity mining program:
//! - Week bucket length used by every integrator
//! - Tick bounds accepted for position ranges
//! - Default tick step for per-tick position tracking

use crate::types::Timestamp;

// ============================================================================
// Time Constants
// ============================================================================

/// Length of a reward week in seconds (7 days)
pub const WEEK: Timestamp = 604_800;

/// One day in seconds
pub const DAY: Timestamp = 86_400;

// ============================================================================
// Tick Constants
// ============================================================================

/// Minimum tick accepted in a position range
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick accepted in a position range
pub const MAX_TICK: i32 = 887_272;

/// Default distance between tracked ticks inside a position range.
///
/// Tracked ticks start one step above the lower bound and stop one step
/// below the upper bound.
pub const DEFAULT_TICK_STEP: i32 = 10;

/// Largest tick step a pool may configure
pub const MAX_TICK_STEP: i32 = 32_767;

// ============================================================================
// Helper Functions
// ============================================================================

/// Start of the week containing `timestamp`
pub const fn week_start(timestamp: Timestamp) -> Timestamp {
    (timestamp / WEEK) * WEEK
}

/// Start of the week following the one containing `timestamp`.
/// Saturates at `Timestamp::MAX` for the final partial week.
pub const fn next_week(timestamp: Timestamp) -> Timestamp {
    week_start(timestamp).saturating_add(WEEK)
}

/// Whether `timestamp` sits exactly on a week boundary
pub const fn is_week_aligned(timestamp: Timestamp) -> bool {
    timestamp % WEEK == 0
}

/// Whether the week starting at `week` is fully in the past at `now`.
/// The boundary is exclusive: a week ending exactly at `now` has not elapsed.
pub const fn week_elapsed(week: Timestamp, now: Timestamp) -> bool {
    (week as u64) + (WEEK as u64) < now as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_validity() {
        assert!(MIN_TICK < MAX_TICK);
        assert_eq!(WEEK, 7 * DAY);
        assert!(DEFAULT_TICK_STEP > 0 && DEFAULT_TICK_STEP <= MAX_TICK_STEP);
    }

    #[test]
    fn test_week_helpers() {
        assert_eq!(week_start(0), 0);
        assert_eq!(week_start(WEEK - 1), 0);
        assert_eq!(week_start(WEEK), WEEK);
        assert_eq!(next_week(WEEK + 5), 2 * WEEK);
        assert_eq!(next_week(Timestamp::MAX), Timestamp::MAX);
        assert!(is_week_aligned(3 * WEEK));
        assert!(!is_week_aligned(3 * WEEK + 1));
    }

    #[test]
    fn test_week_elapsed_boundary_is_exclusive() {
        assert!(!week_elapsed(0, WEEK));
        assert!(week_elapsed(0, WEEK + 1));
        assert!(!week_elapsed(Timestamp::MAX - WEEK, Timestamp::MAX));
    }
}
