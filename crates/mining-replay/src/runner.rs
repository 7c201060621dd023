//! Replay driver
//!
//! Applies scenario actions in order. Hooks are called before the venue is
//! updated, the same way a live venue calls them. Claim failures are
//! recorded as outcomes; any other failure stops the replay.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use feels_liquidity_mining::memory::{LedgerPayout, MemoryVenue};
use feels_liquidity_mining::{
    LiquidityKind, LiquidityMining, MiningConfig, MiningEvent, Owner, PoolId, TickRange, Timestamp,
};

use crate::scenario::{Action, Scenario};

/// Result of one claim action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    /// Position of the action in the scenario
    pub action: usize,
    pub pool: PoolId,
    pub owner: Owner,
    pub kind: LiquidityKind,
    pub weeks: Vec<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub owner: Owner,
    pub paid: u128,
}

/// Everything a replay produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub scenario: String,
    pub claims: Vec<ClaimOutcome>,
    pub balances: Vec<Balance>,
    pub events: Vec<MiningEvent>,
}

/// Engine, venue and payout ledger driven by a scenario
pub struct Replay {
    engine: LiquidityMining,
    venue: MemoryVenue,
    payout: LedgerPayout,
}

impl Replay {
    pub fn new(config: MiningConfig) -> Result<Self> {
        let engine = LiquidityMining::from_config(config).context("Invalid mining configuration")?;
        Ok(Self {
            engine,
            venue: MemoryVenue::new(),
            payout: LedgerPayout::default(),
        })
    }

    pub fn engine(&self) -> &LiquidityMining {
        &self.engine
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<ReplayReport> {
        info!(scenario = %scenario.name, actions = scenario.actions.len(), "starting replay");

        let mut claims = Vec::new();
        let mut events = Vec::new();
        for (index, action) in scenario.actions.iter().enumerate() {
            debug!(index, action = action.label(), "applying action");
            if let Some(outcome) = self
                .apply(index, action)
                .with_context(|| format!("Action #{} ({}) failed", index, action.label()))?
            {
                claims.push(outcome);
            }
            events.extend(self.engine.drain_events());
        }

        let balances = self
            .payout
            .balances()
            .iter()
            .map(|(owner, paid)| Balance { owner: *owner, paid: *paid })
            .collect();

        info!(claims = claims.len(), events = events.len(), "replay finished");
        Ok(ReplayReport {
            scenario: scenario.name.clone(),
            claims,
            balances,
            events,
        })
    }

    fn apply(&mut self, index: usize, action: &Action) -> Result<Option<ClaimOutcome>> {
        match action {
            Action::InitPool { pool, tick, at } => {
                self.venue.set_tick(*pool, *tick);
                self.engine.on_pool_init(&self.venue, *pool, *tick, *at)?;
            }
            Action::Cross { pool, tick, at } => {
                let exit = self
                    .venue
                    .tick(*pool)
                    .with_context(|| format!("{} has no current tick", pool))?;
                self.engine.on_tick_cross(&self.venue, *pool, exit, *tick, *at)?;
                self.venue.set_tick(*pool, *tick);
            }
            Action::SetLiquidity { pool, owner, range, liquidity, at } => {
                let range = validate(*range)?;
                self.engine
                    .on_position_liquidity_changed(&self.venue, *owner, *pool, range, *at)?;
                self.venue.set_position(*owner, *pool, range, u128::from(*liquidity));
            }
            Action::Accrue { pool, at } => {
                self.engine.accrue_pool(&self.venue, *pool, *at)?;
            }
            Action::Claim { pool, owner, range, weeks, at } => {
                let range = validate(*range)?;
                let result = match range {
                    Some(range) => self.engine.claim_concentrated_rewards(
                        &self.venue,
                        &mut self.payout,
                        *owner,
                        *pool,
                        range,
                        weeks,
                        *at,
                    ),
                    None => self
                        .engine
                        .claim_ambient_rewards(&self.venue, &mut self.payout, *owner, *pool, weeks, *at),
                };

                let (reward, error) = match result {
                    Ok(reward) => (Some(reward), None),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => (None, Some(e.to_string())),
                };
                return Ok(Some(ClaimOutcome {
                    action: index,
                    pool: *pool,
                    owner: *owner,
                    kind: if range.is_some() { LiquidityKind::Concentrated } else { LiquidityKind::Ambient },
                    weeks: weeks.clone(),
                    reward,
                    error,
                }));
            }
            Action::FailPayouts { failing } => {
                self.payout.set_failing(*failing);
            }
        }
        Ok(None)
    }
}

/// Scenario ranges bypass `TickRange::new`, so check them here
fn validate(range: Option<TickRange>) -> Result<Option<TickRange>> {
    range
        .map(|r| TickRange::new(r.lower, r.upper))
        .transpose()
        .map_err(Into::into)
}
