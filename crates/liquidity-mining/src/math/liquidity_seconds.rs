//! # Liquidity-Seconds
//!
//! 256-bit accumulator for liquidity integrated over time. A u128 liquidity
//! held for a u32 number of seconds always fits, so integrating a single span
//! never fails; only summing spans into a bucket is checked.

use std::fmt;
use std::io::{Read, Write};

use borsh::{BorshDeserialize, BorshSerialize};
use ethnum::U256;

use crate::errors::{MiningError, MiningResult};
use crate::types::Timestamp;

/// Liquidity multiplied by seconds held
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LiquiditySeconds(U256);

impl LiquiditySeconds {
    pub const ZERO: Self = Self(U256::ZERO);
    pub const MAX: Self = Self(U256::MAX);

    pub const fn new(value: u128) -> Self {
        Self(U256::new(value))
    }

    pub const fn from_u256(value: U256) -> Self {
        Self(value)
    }

    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// `liquidity` held for `seconds`
    pub fn of(liquidity: u128, seconds: Timestamp) -> Self {
        Self(U256::new(liquidity) * U256::new(seconds as u128))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    pub fn checked_add(self, other: Self) -> MiningResult<Self> {
        self.0.checked_add(other.0).map(Self).ok_or(MiningError::MathOverflow)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for LiquiditySeconds {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u128> for LiquiditySeconds {
    fn from(value: u128) -> Self {
        Self::new(value)
    }
}

impl PartialEq<u128> for LiquiditySeconds {
    fn eq(&self, other: &u128) -> bool {
        self.0 == U256::new(*other)
    }
}

impl fmt::Display for LiquiditySeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Stored as 32 little-endian bytes
impl BorshSerialize for LiquiditySeconds {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.0.to_le_bytes())
    }
}

impl BorshDeserialize for LiquiditySeconds {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        Ok(Self(U256::from_le_bytes(bytes)))
    }
}
