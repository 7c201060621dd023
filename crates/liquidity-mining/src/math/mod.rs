//! # Mathematical Functions
//!
//! Checked integer arithmetic, 256-bit liquidity-seconds and the week-aligned timeline walk shared by
//! every integrator.

pub mod liquidity_seconds;
pub mod safe_math;
pub mod timeline;

pub use liquidity_seconds::LiquiditySeconds;
pub use safe_math::*;
pub use timeline::*;
