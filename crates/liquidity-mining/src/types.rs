//! # Core Type Definitions
//!
//! Identifiers and keys shared by the ledger, the integrators and the claim
//! engine.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{MAX_TICK, MIN_TICK};
use crate::errors::{MiningError, MiningResult};

/// Unix timestamp in seconds
pub type Timestamp = u32;

/// Discretized price coordinate
pub type Tick = i32;

/// Identifier of a pool in the venue
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Account owning positions and receiving rewards
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize,
)]
pub struct Owner(pub [u8; 32]);

impl Owner {
    /// Owner whose key is `index` in big-endian, left padded with zeros
    pub fn from_index(index: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&index.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", self)
    }
}

impl FromStr for Owner {
    type Err = MiningError;

    /// Parses up to 64 hex digits, with or without a `0x` prefix. Shorter
    /// inputs are left padded, so `"0x2a"` is the owner with index 42.
    fn from_str(s: &str) -> MiningResult<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(MiningError::invalid_parameter("owner", s, "1 to 64 hex digits"));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MiningError::invalid_parameter("owner", s, "hex digits"));
        }

        let mut bytes = [0u8; 32];
        let padded = format!("{:0>64}", digits);
        for (i, chunk) in padded.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| MiningError::invalid_parameter("owner", s, "hex digits"))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| MiningError::invalid_parameter("owner", s, "hex digits"))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Owner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Owner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Owner::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Which liquidity pool-wide integral a position contributes to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityKind {
    /// Range-bound liquidity, only active while the pool tick is inside the range
    Concentrated,
    /// Full-range liquidity, always active
    Ambient,
}

impl LiquidityKind {
    pub const ALL: [LiquidityKind; 2] = [LiquidityKind::Concentrated, LiquidityKind::Ambient];
}

impl fmt::Display for LiquidityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concentrated => write!(f, "concentrated"),
            Self::Ambient => write!(f, "ambient"),
        }
    }
}

/// Half-open tick range `[lower, upper)` of a concentrated position
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TickRange {
    pub lower: Tick,
    pub upper: Tick,
}

impl TickRange {
    pub fn new(lower: Tick, upper: Tick) -> MiningResult<Self> {
        if lower >= upper || lower < MIN_TICK || upper > MAX_TICK {
            return Err(MiningError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Ticks whose activity is credited to a position with this range.
    ///
    /// Starts one `step` above `lower` and stops at or before `upper - step`.
    /// Narrow ranges can track no tick at all.
    pub fn tracked_ticks(&self, step: i32) -> impl Iterator<Item = Tick> {
        let step = step.max(1);
        (self.lower + step..=self.upper - step).step_by(step as usize)
    }

    pub fn contains(&self, tick: Tick) -> bool {
        self.lower <= tick && tick < self.upper
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Collision-free key of a position inside one pool.
///
/// Concentrated positions are keyed by owner and range, ambient positions by
/// owner alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct PositionKey {
    pub owner: Owner,
    pub range: Option<TickRange>,
}

impl PositionKey {
    pub const fn concentrated(owner: Owner, range: TickRange) -> Self {
        Self { owner, range: Some(range) }
    }

    pub const fn ambient(owner: Owner) -> Self {
        Self { owner, range: None }
    }

    pub const fn kind(&self) -> LiquidityKind {
        match self.range {
            Some(_) => LiquidityKind::Concentrated,
            None => LiquidityKind::Ambient,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => write!(f, "{}@{}", self.owner, range),
            None => write!(f, "{}@ambient", self.owner),
        }
    }
}
