//! Hexagonal architecture ports
//!
//! - `inbound`: the API the host drives (driving side)
//! - `outbound`: the collaborators the policy drives (driven side)

mod inbound;
mod outbound;

pub use inbound::MiningPolicyApi;
pub use outbound::{ChainReader, TimeOffsetSource, ZeroTimeOffset};
