//! Scenario file format

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use feels_liquidity_mining::{Owner, PoolId, Tick, TickRange, Timestamp};

/// Ordered venue actions to replay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub actions: Vec<Action>,
}

/// One venue action. `at` is the block timestamp the action happens at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    InitPool {
        pool: PoolId,
        tick: Tick,
        at: Timestamp,
    },
    Cross {
        pool: PoolId,
        tick: Tick,
        at: Timestamp,
    },
    /// Mint, resize or burn a position. Omit `range` for ambient liquidity.
    SetLiquidity {
        pool: PoolId,
        owner: Owner,
        #[serde(default)]
        range: Option<TickRange>,
        liquidity: u64,
        at: Timestamp,
    },
    Accrue {
        pool: PoolId,
        at: Timestamp,
    },
    Claim {
        pool: PoolId,
        owner: Owner,
        #[serde(default)]
        range: Option<TickRange>,
        weeks: Vec<Timestamp>,
        at: Timestamp,
    },
    /// Make every following payout fail, or succeed again
    FailPayouts { failing: bool },
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InitPool { .. } => "init_pool",
            Self::Cross { .. } => "cross",
            Self::SetLiquidity { .. } => "set_liquidity",
            Self::Accrue { .. } => "accrue",
            Self::Claim { .. } => "claim",
            Self::FailPayouts { .. } => "fail_payouts",
        }
    }
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse scenario file {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
