//! Adapters for the outbound ports
//!
//! The production `ChainReader` lives with the host's block index; what
//! ships here is the in-memory chain used by tests, simulations, and
//! bootstrap tooling.

mod memory_chain;

pub use memory_chain::{InMemoryChain, StaticTimeOffset, DEFAULT_BLOCK_SPACING};
