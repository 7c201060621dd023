//! # In-Memory Venue
//!
//! Minimal curve engine, position registry and payout ledger backed by maps.
//! Used by the replay tool and by tests to drive the engine end to end.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::interfaces::{LiquiditySource, Payout, PositionRegistry};
use crate::types::{Owner, PoolId, PositionKey, Tick, TickRange};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VenuePool {
    tick: Tick,
    positions: BTreeMap<PositionKey, u128>,
}

/// Pools with a current tick and positions.
///
/// Concentrated liquidity is the sum of positions whose range contains the
/// current tick; ambient liquidity is the sum of ambient positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryVenue {
    pools: BTreeMap<PoolId, VenuePool>,
}

impl MemoryVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self, pool: PoolId) -> Option<Tick> {
        self.pools.get(&pool).map(|p| p.tick)
    }

    pub fn set_tick(&mut self, pool: PoolId, tick: Tick) {
        self.pools.entry(pool).or_default().tick = tick;
    }

    /// Create or resize a position. Zero liquidity keeps the position.
    pub fn set_position(&mut self, owner: Owner, pool: PoolId, range: Option<TickRange>, liquidity: u128) {
        self.pools
            .entry(pool)
            .or_default()
            .positions
            .insert(PositionKey { owner, range }, liquidity);
    }

    pub fn remove_position(&mut self, owner: Owner, pool: PoolId, range: Option<TickRange>) -> Option<u128> {
        self.pools
            .get_mut(&pool)?
            .positions
            .remove(&PositionKey { owner, range })
    }

    pub fn positions(&self, pool: PoolId) -> impl Iterator<Item = (&PositionKey, &u128)> {
        self.pools.get(&pool).into_iter().flat_map(|p| p.positions.iter())
    }
}

impl LiquiditySource for MemoryVenue {
    fn concentrated_liquidity(&self, pool: PoolId) -> u128 {
        let Some(venue) = self.pools.get(&pool) else {
            return 0;
        };
        venue
            .positions
            .iter()
            .filter(|(key, _)| key.range.map_or(false, |range| range.contains(venue.tick)))
            .fold(0u128, |total, (_, liquidity)| total.saturating_add(*liquidity))
    }

    fn ambient_liquidity(&self, pool: PoolId) -> u128 {
        self.positions(pool)
            .filter(|(key, _)| key.range.is_none())
            .fold(0u128, |total, (_, liquidity)| total.saturating_add(*liquidity))
    }
}

impl PositionRegistry for MemoryVenue {
    fn lookup_position(&self, owner: &Owner, pool: PoolId, range: Option<TickRange>) -> Option<u128> {
        self.pools
            .get(&pool)?
            .positions
            .get(&PositionKey { owner: *owner, range })
            .copied()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("payout of {amount} to {owner} rejected")]
pub struct PayoutRejected {
    pub owner: Owner,
    pub amount: u128,
}

/// Payout that credits balances, optionally rejecting every transfer
#[derive(Debug, Clone, Default)]
pub struct LedgerPayout {
    balances: BTreeMap<Owner, u128>,
    failing: bool,
}

impl LedgerPayout {
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn balance(&self, owner: &Owner) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &BTreeMap<Owner, u128> {
        &self.balances
    }

    pub fn total_paid(&self) -> u128 {
        self.balances.values().fold(0u128, |total, paid| total.saturating_add(*paid))
    }
}

impl Payout for LedgerPayout {
    type Error = PayoutRejected;

    fn payout(&mut self, owner: &Owner, amount: u128) -> Result<(), PayoutRejected> {
        if self.failing {
            return Err(PayoutRejected { owner: *owner, amount });
        }
        let balance = self.balances.entry(*owner).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_liquidity() {
        let pool = PoolId(1);
        let mut venue = MemoryVenue::new();
        let alice = Owner::from_index(1);
        let bob = Owner::from_index(2);
        venue.set_tick(pool, 0);
        venue.set_position(alice, pool, Some(TickRange::new(-20, 20).unwrap()), 100);
        venue.set_position(bob, pool, Some(TickRange::new(10, 40).unwrap()), 50);
        venue.set_position(bob, pool, None, 7);

        assert_eq!(venue.concentrated_liquidity(pool), 100);
        assert_eq!(venue.ambient_liquidity(pool), 7);
        venue.set_tick(pool, 10);
        assert_eq!(venue.concentrated_liquidity(pool), 150);
        venue.set_tick(pool, 20);
        assert_eq!(venue.concentrated_liquidity(pool), 50);

        assert_eq!(venue.lookup_position(&bob, pool, None), Some(7));
        assert_eq!(venue.lookup_position(&alice, pool, None), None);
        assert_eq!(venue.concentrated_liquidity(PoolId(2)), 0);
    }

    #[test]
    fn test_ledger_payout() {
        let owner = Owner::from_index(1);
        let mut payout = LedgerPayout::default();
        payout.payout(&owner, 10).unwrap();
        payout.set_failing(true);
        assert_eq!(payout.payout(&owner, 5), Err(PayoutRejected { owner, amount: 5 }));
        assert_eq!(payout.balance(&owner), 10);
        assert_eq!(payout.total_paid(), 10);
    }
}
