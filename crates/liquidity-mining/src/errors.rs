//! # Mining Error Types
//!
//! Every error aborts the operation that raised it. The engine rolls back all
//! writes staged by that operation before the error reaches the caller.

use thiserror::Error;

use crate::types::{PoolId, Tick, Timestamp};

/// Errors raised by the liquidity mining engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    // ========================================================================
    // Claim Errors
    // ========================================================================
    #[error("Week {week} has not elapsed at {now}")]
    WeekNotElapsed { week: Timestamp, now: Timestamp },

    #[error("Week {week} already claimed")]
    AlreadyClaimed { week: Timestamp },

    #[error("Week {0} is not aligned to a week boundary")]
    InvalidWeek(Timestamp),

    #[error("Position not found")]
    PositionNotFound,

    #[error("Payout failed: {0}")]
    PayoutFailed(String),

    // ========================================================================
    // Ledger and Timeline Errors
    // ========================================================================
    /// Caller discipline was broken upstream. Never retried.
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Pool {0} not initialized")]
    PoolNotInitialized(PoolId),

    #[error("Pool {0} already initialized")]
    PoolAlreadyInitialized(PoolId),

    #[error("Timestamp {now} precedes last recorded time {last}")]
    TimeWentBackwards { now: Timestamp, last: Timestamp },

    #[error("Invalid tick range [{lower}, {upper}]")]
    InvalidRange { lower: Tick, upper: Tick },

    // ========================================================================
    // Math Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Configuration and Persistence Errors
    // ========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type using mining errors
pub type MiningResult<T> = Result<T, MiningError>;

impl MiningError {
    /// Create a configuration error for a named parameter
    pub fn invalid_parameter(name: &str, value: &str, expected: &str) -> Self {
        Self::Config(format!("{} = {} (expected {})", name, value, expected))
    }

    /// Whether the error points at a bug in the calling venue rather than
    /// at the request itself
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation(_) | Self::TimeWentBackwards { .. }
        )
    }
}
