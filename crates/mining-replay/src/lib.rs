//! # Feels Mining Replay
//!
//! Drives the liquidity mining engine with a recorded sequence of venue
//! actions against the in-memory venue, and reports claim outcomes and the
//! events the engine emitted.

pub mod runner;
pub mod scenario;

pub use runner::{ClaimOutcome, Replay, ReplayReport};
pub use scenario::{Action, Scenario};
