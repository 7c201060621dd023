//! # Feels Liquidity Mining
//!
//! Time-weighted liquidity accrual and weekly reward distribution for Feels
//! pools. It provides:
//!
//! - A per-tick activity ledger recording when each tick was active
//! - Lazy week-bucketed integrators of pool-wide and per-position liquidity
//! - A claim engine paying each position its pro-rata share of a week's budget
//!
//! The venue drives the engine through the hooks on [`LiquidityMining`] and
//! supplies liquidity, positions, budgets and payouts through the traits in
//! [`interfaces`].

pub mod accrual;
pub mod batch;
pub mod claim;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod ledger;
pub mod math;
pub mod memory;
pub mod query;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use accrual::Accrual;
pub use config::{MiningConfig, PoolConfig, WeeklyRewards};
pub use constants::*;
pub use engine::LiquidityMining;
pub use errors::{MiningError, MiningResult};
pub use events::MiningEvent;
pub use interfaces::{LiquiditySource, Payout, PositionRegistry, RewardBudget};
pub use ledger::{ActivityInterval, TickActivityLedger};
pub use math::LiquiditySeconds;
pub use schedule::RewardSchedule;
pub use state::PoolMiningState;
pub use types::*;
