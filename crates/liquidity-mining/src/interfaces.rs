//! # Collaborator Interfaces
//!
//! What the mining engine needs from the rest of the venue. The curve engine
//! owns liquidity magnitudes, the position registry owns positions, the
//! reward budget is set by governance and payouts move value to claimants.

use std::fmt;

use crate::types::{LiquidityKind, Owner, PoolId, TickRange, Timestamp};

/// Current pool-wide liquidity, read from the curve engine
pub trait LiquiditySource {
    /// Liquidity active at the pool's current tick
    fn concentrated_liquidity(&self, pool: PoolId) -> u128;

    /// Full-range liquidity
    fn ambient_liquidity(&self, pool: PoolId) -> u128;

    fn current_liquidity(&self, pool: PoolId, kind: LiquidityKind) -> u128 {
        match kind {
            LiquidityKind::Concentrated => self.concentrated_liquidity(pool),
            LiquidityKind::Ambient => self.ambient_liquidity(pool),
        }
    }
}

/// Position lookups, read from the position registry
pub trait PositionRegistry {
    /// Liquidity of the position, or `None` if it does not exist.
    /// `range` is `None` for the owner's ambient position.
    fn lookup_position(&self, owner: &Owner, pool: PoolId, range: Option<TickRange>) -> Option<u128>;
}

/// Weekly reward budgets
pub trait RewardBudget {
    /// Amount distributed among `kind` providers of `pool` for `week`
    fn reward_budget(&self, pool: PoolId, week: Timestamp, kind: LiquidityKind) -> u128;
}

/// Transfer of claimed rewards to their owner
pub trait Payout {
    type Error: fmt::Display;

    fn payout(&mut self, owner: &Owner, amount: u128) -> Result<(), Self::Error>;
}
