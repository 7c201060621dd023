//! # Liquidity Mining Engine
//!
//! Entry points called by the venue. Every call runs as one transaction over
//! the pool it touches: writes are staged in a [`PoolBatch`], kept if the call
//! succeeds and rolled back if any step fails, including the payout.
//!
//! Hooks must be called *before* the venue applies the change they announce,
//! so that liquidity reads return the magnitude that held up to `now`.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::accrual::{accrue_global, accrue_position, Accrual};
use crate::batch::PoolBatch;
use crate::claim::settle_weeks;
use crate::config::MiningConfig;
use crate::errors::{MiningError, MiningResult};
use crate::events::MiningEvent;
use crate::interfaces::{LiquiditySource, Payout, PositionRegistry, RewardBudget};
use crate::schedule::RewardSchedule;
use crate::state::PoolMiningState;
use crate::types::{LiquidityKind, Owner, PoolId, PositionKey, Tick, TickRange, Timestamp};

/// Liquidity mining engine over any number of independent pools
#[derive(Debug, Clone)]
pub struct LiquidityMining<B = RewardSchedule> {
    pub(crate) config: MiningConfig,
    pub(crate) budget: B,
    pub(crate) pools: BTreeMap<PoolId, PoolMiningState>,
    pub(crate) events: Vec<MiningEvent>,
}

impl LiquidityMining<RewardSchedule> {
    /// Engine with the default configuration and an empty reward schedule
    pub fn new() -> Self {
        Self::with_budget(MiningConfig::default(), RewardSchedule::default())
    }

    /// Engine whose reward budgets come from the configuration
    pub fn from_config(config: MiningConfig) -> MiningResult<Self> {
        config.validate()?;
        let budget = RewardSchedule::from_config(&config)?;
        Ok(Self::with_budget(config, budget))
    }
}

impl Default for LiquidityMining<RewardSchedule> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RewardBudget> LiquidityMining<B> {
    pub fn with_budget(config: MiningConfig, budget: B) -> Self {
        Self {
            config,
            budget,
            pools: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn budget(&self) -> &B {
        &self.budget
    }

    /// Governance access to the reward budget
    pub fn budget_mut(&mut self) -> &mut B {
        &mut self.budget
    }

    pub fn pool(&self, pool: &PoolId) -> Option<&PoolMiningState> {
        self.pools.get(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = (&PoolId, &PoolMiningState)> {
        self.pools.iter()
    }

    /// Take the events of every call committed since the last drain
    pub fn drain_events(&mut self) -> Vec<MiningEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Venue Hooks
    // ========================================================================

    /// Start tracking `pool` with `start_tick` active from `now`.
    ///
    /// Opens the starting tick's first ledger interval and seeds both global
    /// cursors.
    pub fn on_pool_init<C>(&mut self, curve: &C, pool: PoolId, start_tick: Tick, now: Timestamp) -> MiningResult<()>
    where
        C: LiquiditySource + ?Sized,
    {
        self.transact(pool, "pool init", |batch, _, _| {
            if batch.state().is_initialized() {
                return Err(MiningError::PoolAlreadyInitialized(pool));
            }
            batch.open_tick(start_tick, now)?;
            batch.set_current_tick(start_tick);
            for kind in LiquidityKind::ALL {
                accrue_global(batch, kind, curve.current_liquidity(pool, kind), now)?;
            }
            batch.emit(MiningEvent::PoolInitialized {
                pool,
                tick: start_tick,
                timestamp: now,
            });
            Ok(())
        })?;

        info!(%pool, tick = start_tick, now, "pool mining initialized");
        Ok(())
    }

    /// Record the pool's active tick moving from `exit_tick` to `entry_tick`.
    ///
    /// Concentrated global liquidity is accrued first with the pre-crossing
    /// magnitude, since crossing a tick changes which positions are in range.
    pub fn on_tick_cross<C>(
        &mut self,
        curve: &C,
        pool: PoolId,
        exit_tick: Tick,
        entry_tick: Tick,
        now: Timestamp,
    ) -> MiningResult<()>
    where
        C: LiquiditySource + ?Sized,
    {
        self.transact(pool, "tick cross", |batch, _, _| {
            let current = batch
                .state()
                .current_tick()
                .ok_or(MiningError::PoolNotInitialized(pool))?;
            if current != exit_tick {
                return Err(MiningError::InvariantViolation("exit tick is not the current tick"));
            }

            accrue_global(batch, LiquidityKind::Concentrated, curve.concentrated_liquidity(pool), now)?;
            batch.close_tick(exit_tick, now)?;
            batch.open_tick(entry_tick, now)?;
            batch.set_current_tick(entry_tick);
            batch.emit(MiningEvent::TickCrossed {
                pool,
                exit_tick,
                entry_tick,
                timestamp: now,
            });
            Ok(())
        })
    }

    /// Accrue a position and its pool before the venue changes the
    /// position's liquidity.
    ///
    /// A position the registry does not know yet is being minted and is
    /// accrued with zero liquidity, which starts its tracking at `now`. A
    /// tracked position missing from the registry is rejected.
    pub fn on_position_liquidity_changed<M>(
        &mut self,
        market: &M,
        owner: Owner,
        pool: PoolId,
        range: Option<TickRange>,
        now: Timestamp,
    ) -> MiningResult<()>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
    {
        let key = PositionKey { owner, range };
        let registered = market.lookup_position(&owner, pool, range);

        self.transact(pool, "liquidity change", |batch, _, tick_step| {
            require_initialized(batch)?;
            let liquidity = match registered {
                Some(liquidity) => liquidity,
                None if batch.state().position_cursor(&key).is_none() => 0,
                None => return Err(MiningError::PositionNotFound),
            };
            accrue_position(batch, &key, liquidity, tick_step, now)?;
            let kind = key.kind();
            accrue_global(batch, kind, market.current_liquidity(pool, kind), now)?;
            Ok(())
        })
    }

    /// Bring both global integrators of `pool` up to `now`
    pub fn accrue_pool<C>(&mut self, curve: &C, pool: PoolId, now: Timestamp) -> MiningResult<()>
    where
        C: LiquiditySource + ?Sized,
    {
        self.transact(pool, "pool accrual", |batch, _, _| {
            require_initialized(batch)?;
            for kind in LiquidityKind::ALL {
                accrue_global(batch, kind, curve.current_liquidity(pool, kind), now)?;
            }
            Ok(())
        })
    }

    // ========================================================================
    // Claims
    // ========================================================================

    /// Claim the concentrated rewards of `owner`'s position over `range` for
    /// `weeks`, returning the amount paid
    #[allow(clippy::too_many_arguments)]
    pub fn claim_concentrated_rewards<M, P>(
        &mut self,
        market: &M,
        payout: &mut P,
        owner: Owner,
        pool: PoolId,
        range: TickRange,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
        P: Payout + ?Sized,
    {
        self.claim(market, payout, PositionKey::concentrated(owner, range), pool, weeks, now)
    }

    /// Claim the ambient rewards of `owner` in `pool` for `weeks`, returning
    /// the amount paid
    pub fn claim_ambient_rewards<M, P>(
        &mut self,
        market: &M,
        payout: &mut P,
        owner: Owner,
        pool: PoolId,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
        P: Payout + ?Sized,
    {
        self.claim(market, payout, PositionKey::ambient(owner), pool, weeks, now)
    }

    fn claim<M, P>(
        &mut self,
        market: &M,
        payout: &mut P,
        key: PositionKey,
        pool: PoolId,
        weeks: &[Timestamp],
        now: Timestamp,
    ) -> MiningResult<u128>
    where
        M: LiquiditySource + PositionRegistry + ?Sized,
        P: Payout + ?Sized,
    {
        let kind = key.kind();
        let liquidity = market
            .lookup_position(&key.owner, pool, key.range)
            .ok_or(MiningError::PositionNotFound)?;

        let reward = self.transact(pool, "claim", |batch, budget, tick_step| {
            require_initialized(batch)?;
            if let Accrual::Seeded = accrue_position(batch, &key, liquidity, tick_step, now)? {
                warn!(%pool, position = %key, "claim is the position's first accrual, nothing has been credited yet");
            }
            accrue_global(batch, kind, market.current_liquidity(pool, kind), now)?;

            let reward = settle_weeks(batch, budget, &key, weeks, tick_step, now)?;
            if reward > 0 {
                payout
                    .payout(&key.owner, reward)
                    .map_err(|e| MiningError::PayoutFailed(e.to_string()))?;
            }

            batch.emit(MiningEvent::RewardsClaimed {
                pool,
                owner: key.owner,
                kind,
                weeks: weeks.to_vec(),
                reward,
                timestamp: now,
            });
            Ok(reward)
        })?;

        info!(%pool, position = %key, weeks = weeks.len(), reward, "rewards claimed");
        Ok(reward)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run `op` against `pool`'s state, keeping its writes only if it succeeds
    fn transact<T, F>(&mut self, pool: PoolId, name: &'static str, op: F) -> MiningResult<T>
    where
        F: FnOnce(&mut PoolBatch<'_>, &B, i32) -> MiningResult<T>,
    {
        let tick_step = self.config.tick_step(pool);
        let state = self.pools.entry(pool).or_default();
        let mut batch = PoolBatch::new(pool, state);

        match op(&mut batch, &self.budget, tick_step) {
            Ok(value) => {
                let events = batch.commit();
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                batch.rollback();
                if self.pools.get(&pool).map_or(false, PoolMiningState::is_empty) {
                    self.pools.remove(&pool);
                }
                warn!(%pool, operation = name, error = %err, fatal = err.is_fatal(), "mining call rolled back");
                Err(err)
            }
        }
    }
}

fn require_initialized(batch: &PoolBatch<'_>) -> MiningResult<()> {
    if !batch.state().is_initialized() {
        return Err(MiningError::PoolNotInitialized(batch.pool()));
    }
    Ok(())
}
