//! Event definitions

use serde::{Deserialize, Serialize};

use crate::types::{LiquidityKind, Owner, PoolId, PositionKey, Tick, Timestamp};

/// Record of a committed mining operation. Events of a failed operation are
/// discarded together with its writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MiningEvent {
    /// Tick tracking started for a pool
    PoolInitialized {
        pool: PoolId,
        tick: Tick,
        timestamp: Timestamp,
    },

    /// Pool's active tick moved
    TickCrossed {
        pool: PoolId,
        exit_tick: Tick,
        entry_tick: Tick,
        timestamp: Timestamp,
    },

    /// A position's first accrual, fixing where its integration starts
    PositionTracked {
        pool: PoolId,
        position: PositionKey,
        timestamp: Timestamp,
    },

    /// Rewards settled for a set of weeks
    RewardsClaimed {
        pool: PoolId,
        owner: Owner,
        kind: LiquidityKind,
        weeks: Vec<Timestamp>,
        reward: u128,
        timestamp: Timestamp,
    },
}

impl MiningEvent {
    pub fn pool(&self) -> PoolId {
        match self {
            Self::PoolInitialized { pool, .. }
            | Self::TickCrossed { pool, .. }
            | Self::PositionTracked { pool, .. }
            | Self::RewardsClaimed { pool, .. } => *pool,
        }
    }
}
