//! # Mining Configuration
//!
//! TOML configuration for the mining engine: the default tick step, per-pool
//! overrides and the weekly reward budgets each pool starts with.
//!
//! ```toml
//! default_tick_step = 10
//!
//! [[pools]]
//! pool = 1
//! tick_step = 60
//!
//! [[pools.rewards]]
//! from_week = 0
//! to_week = 1814400
//! concentrated = 1000000
//! ambient = 250000
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{is_week_aligned, DEFAULT_TICK_STEP, MAX_TICK_STEP};
use crate::errors::{MiningError, MiningResult};
use crate::types::{PoolId, Timestamp};

/// Engine configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MiningConfig {
    /// Tick step for pools without an override
    #[serde(default = "default_tick_step")]
    pub default_tick_step: i32,

    /// Pools with explicit settings
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// Settings for an individual pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PoolConfig {
    pub pool: PoolId,

    /// Distance between tracked ticks. Must match the venue's tick spacing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_step: Option<i32>,

    /// Reward budgets, applied in order
    #[serde(default)]
    pub rewards: Vec<WeeklyRewards>,
}

/// Budget for every week from `from_week` to `to_week` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeeklyRewards {
    pub from_week: Timestamp,
    pub to_week: Timestamp,
    #[serde(default)]
    pub concentrated: u64,
    #[serde(default)]
    pub ambient: u64,
}

fn default_tick_step() -> i32 {
    DEFAULT_TICK_STEP
}

impl MiningConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> MiningResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| MiningError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> MiningResult<Self> {
        let config: MiningConfig = toml::from_str(content)
            .map_err(|e| MiningError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> MiningResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| MiningError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| MiningError::Config(format!("Failed to write config file {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> MiningResult<()> {
        validate_tick_step("default_tick_step", self.default_tick_step)?;

        let mut seen = BTreeSet::new();
        for pool in &self.pools {
            if !seen.insert(pool.pool) {
                return Err(MiningError::invalid_parameter(
                    "pools.pool",
                    &pool.pool.0.to_string(),
                    "each pool configured once",
                ));
            }
            pool.validate()?;
        }

        Ok(())
    }

    /// Tick step used for `pool`
    pub fn tick_step(&self, pool: PoolId) -> i32 {
        self.pool(pool)
            .and_then(|p| p.tick_step)
            .unwrap_or(self.default_tick_step)
    }

    pub fn pool(&self, pool: PoolId) -> Option<&PoolConfig> {
        self.pools.iter().find(|p| p.pool == pool)
    }
}

impl PoolConfig {
    pub fn new(pool: PoolId) -> Self {
        Self {
            pool,
            tick_step: None,
            rewards: Vec::new(),
        }
    }

    fn validate(&self) -> MiningResult<()> {
        if let Some(step) = self.tick_step {
            validate_tick_step("tick_step", step)?;
        }
        for rewards in &self.rewards {
            rewards.validate()?;
        }
        Ok(())
    }
}

impl WeeklyRewards {
    fn validate(&self) -> MiningResult<()> {
        if !is_week_aligned(self.from_week) {
            return Err(MiningError::invalid_parameter(
                "from_week",
                &self.from_week.to_string(),
                "a multiple of 604800",
            ));
        }
        if !is_week_aligned(self.to_week) {
            return Err(MiningError::invalid_parameter(
                "to_week",
                &self.to_week.to_string(),
                "a multiple of 604800",
            ));
        }
        if self.to_week < self.from_week {
            return Err(MiningError::invalid_parameter(
                "to_week",
                &self.to_week.to_string(),
                &format!("at least from_week ({})", self.from_week),
            ));
        }
        Ok(())
    }
}

fn validate_tick_step(name: &str, step: i32) -> MiningResult<()> {
    if step < 1 || step > MAX_TICK_STEP {
        return Err(MiningError::invalid_parameter(
            name,
            &step.to_string(),
            &format!("between 1 and {}", MAX_TICK_STEP),
        ));
    }
    Ok(())
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            default_tick_step: DEFAULT_TICK_STEP,
            pools: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEK;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
default_tick_step = 10

[[pools]]
pool = 1
tick_step = 60

[[pools.rewards]]
from_week = 0
to_week = 1209600
concentrated = 1000
ambient = 250

[[pools]]
pool = 2
"#;

    #[test]
    fn test_parse_sample() {
        let config = MiningConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.pools.len(), 2);
        assert_eq!(config.tick_step(PoolId(1)), 60);
        assert_eq!(config.tick_step(PoolId(2)), 10);
        assert_eq!(config.tick_step(PoolId(3)), 10);
        assert_eq!(
            config.pools[0].rewards,
            vec![WeeklyRewards { from_week: 0, to_week: 2 * WEEK, concentrated: 1000, ambient: 250 }]
        );
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(MiningConfig::from_toml_str("").unwrap(), MiningConfig::default());
    }

    #[test]
    fn test_rejects_bad_tick_step() {
        assert!(matches!(
            MiningConfig::from_toml_str("default_tick_step = 0"),
            Err(MiningError::Config(_))
        ));
        assert!(MiningConfig::from_toml_str("[[pools]]\npool = 1\ntick_step = -5").is_err());
    }

    #[test]
    fn test_rejects_duplicate_pool() {
        assert!(MiningConfig::from_toml_str("[[pools]]\npool = 1\n[[pools]]\npool = 1").is_err());
    }

    #[test]
    fn test_rejects_misaligned_rewards() {
        let toml = "[[pools]]\npool = 1\n[[pools.rewards]]\nfrom_week = 5\nto_week = 604800\n";
        assert!(MiningConfig::from_toml_str(toml).is_err());
        let toml = "[[pools]]\npool = 1\n[[pools.rewards]]\nfrom_week = 1209600\nto_week = 604800\n";
        assert!(MiningConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = MiningConfig::default();
        let mut pool = PoolConfig::new(PoolId(4));
        pool.tick_step = Some(1);
        pool.rewards.push(WeeklyRewards { from_week: WEEK, to_week: WEEK, concentrated: 5, ambient: 0 });
        config.pools.push(pool);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mining.toml");
        config.save(&path).unwrap();
        let loaded = MiningConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
