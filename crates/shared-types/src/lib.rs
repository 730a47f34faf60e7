//! # Shared Types Crate
//!
//! Chain entities shared between the host node and the policy subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem chain types are defined here,
//!   never re-declared inside a subsystem crate.
//! - **View types, not storage types**: these structs carry exactly the fields
//!   the policy layer consults. The host keeps its own richer representations
//!   and converts at the boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod script;

pub use entities::{Block, BlockHeader, BlockIndex, Hash, Transaction, TxOut};
pub use script::{Script, MAX_DIRECT_PUSH, OP_EQUAL, OP_HASH160, OP_RETURN};
