//! # State Snapshots
//!
//! Borsh encoding of every pool's mining state. Restoring a snapshot into an
//! engine with the same configuration and budget reproduces the accrual and
//! claim behaviour of the engine it was taken from.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::info;

use crate::engine::LiquidityMining;
use crate::errors::{MiningError, MiningResult};
use crate::interfaces::RewardBudget;
use crate::state::PoolMiningState;
use crate::types::PoolId;

/// Format version written at the head of every snapshot
pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(BorshSerialize, BorshDeserialize)]
struct MiningSnapshot {
    version: u8,
    pools: BTreeMap<PoolId, PoolMiningState>,
}

impl<B: RewardBudget> LiquidityMining<B> {
    /// Encode the state of every pool
    pub fn snapshot(&self) -> MiningResult<Vec<u8>> {
        let snapshot = MiningSnapshot {
            version: SNAPSHOT_VERSION,
            pools: self.pools.clone(),
        };
        snapshot
            .try_to_vec()
            .map_err(|e| MiningError::Snapshot(format!("Failed to encode snapshot: {}", e)))
    }

    /// Replace all pool state with a snapshot.
    ///
    /// Pending events are dropped. On error the engine is left untouched.
    pub fn restore(&mut self, bytes: &[u8]) -> MiningResult<()> {
        let snapshot = MiningSnapshot::try_from_slice(bytes)
            .map_err(|e| MiningError::Snapshot(format!("Failed to decode snapshot: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(MiningError::Snapshot(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        info!(pools = snapshot.pools.len(), "restored mining state");
        self.pools = snapshot.pools;
        self.events.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryVenue;

    #[test]
    fn test_restore_reproduces_pools() {
        let mut engine = LiquidityMining::new();
        let venue = MemoryVenue::new();
        engine.on_pool_init(&venue, PoolId(1), 0, 0).unwrap();
        engine.on_tick_cross(&venue, PoolId(1), 0, 10, 50).unwrap();
        let bytes = engine.snapshot().unwrap();

        let mut restored = LiquidityMining::new();
        restored.restore(&bytes).unwrap();
        assert_eq!(restored.pool(&PoolId(1)), engine.pool(&PoolId(1)));
        assert!(restored.drain_events().is_empty());
    }

    #[test]
    fn test_rejects_garbage_and_other_versions() {
        let mut engine = LiquidityMining::new();
        assert!(matches!(engine.restore(&[1, 2, 3]), Err(MiningError::Snapshot(_))));

        let mut bytes = LiquidityMining::new().snapshot().unwrap();
        bytes[0] = SNAPSHOT_VERSION + 1;
        assert!(matches!(engine.restore(&bytes), Err(MiningError::Snapshot(_))));
    }
}
