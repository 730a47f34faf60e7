//! # DDMS Policy - Licensed Mining Admission Subsystem
//!
//! **Bounded Context:** Mining admission under licensed hash-rate shares
//!
//! ## Purpose
//!
//! Enforces Decentralized Dynamic Mining Sharing: only miners holding a
//! hash-rate license issued on-chain by the WDMO organization may extend the
//! chain, and each licensed miner is limited to a per-round block quota
//! proportional to its licensed share. The subsystem has two halves:
//!
//! - A **license registry** that projects license-carrying transactions into
//!   the current set of `(address, hash_rate, height)` entries.
//! - A **mining mechanism** that derives per-round quotas, tracks how many
//!   blocks each miner may still produce in the current round, and answers
//!   the admission question `can_mine`.
//!
//! ## Ring Rules
//!
//! A round of [`MINING_ROUND_SIZE`] blocks is **closed** by default: a miner
//! whose remaining allowance is exhausted may not produce further blocks.
//! The round **opens** (every licensed miner may exceed its quota) when any
//! of the following holds:
//!
//! 1. Miners owning at least half of the licensed hash-rate are saturated.
//! 2. The candidate block's timestamp exceeds the tip's by more than the
//!    network time offset plus the closed-round limit.
//! 3. Some adjacent block pair inside the round already shows such a stall.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - InMemoryChain: ChainReader for tests/bootstrap   │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: MiningPolicyApi                         │
//! │  - Outbound: ChainReader, TimeOffsetSource          │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - LicenseRegistry + journal                        │
//! │  - License output wire format                       │
//! │  - Round boundary and quota arithmetic              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: pure policy logic (registry, wire format, round math)
//! - [`ports`]: hexagonal interfaces (inbound/outbound)
//! - [`adapters`]: in-memory collaborators
//! - [`service`]: [`MiningPolicyService`], the registry-plus-chain facade

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::PolicyConfig;
pub use error::{PolicyError, Result};

// Re-export commonly used types
pub use domain::{
    is_license_carrier, is_license_header, parse_license_output, LicenseEntry, LicenseRegistry,
    LicenseUpdate, MinerAddress, LICENSE_HEADER,
};

pub use ports::{ChainReader, MiningPolicyApi, TimeOffsetSource, ZeroTimeOffset};

pub use adapters::{InMemoryChain, StaticTimeOffset};

pub use service::MiningPolicyService;

/// Number of consecutive block heights forming one quota round.
pub const MINING_ROUND_SIZE: u16 = 100;

/// Default upper bound on how far a block timestamp may run ahead of network
/// time, in seconds. Mirrors the host chain's consensus constant.
///
/// The first mining round height and the WDMO locking script have no
/// constant here on purpose: both are chain parameters that
/// [`PolicyConfig`] requires explicitly.
pub const MAX_FUTURE_BLOCK_TIME: u32 = 2 * 60 * 60;

/// The closed-round time limit is this multiple of [`MAX_FUTURE_BLOCK_TIME`].
pub const CLOSED_ROUND_TIME_FACTOR: u32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(MINING_ROUND_SIZE, 100);
        assert_eq!(MAX_FUTURE_BLOCK_TIME, 7_200);
        assert_eq!(CLOSED_ROUND_TIME_FACTOR, 5);
    }
}
