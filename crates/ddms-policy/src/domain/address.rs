//! Miner identity
//!
//! A miner is identified by the script-hash its coinbase pays to. The
//! registry compares and stores the lowercase hex form so addresses sort,
//! hash, and log cleanly.

use serde::{Deserialize, Serialize};
use shared_types::Script;
use std::fmt;

/// Lowercase hex of the script-hash bytes embedded in a miner's
/// `OP_HASH160 <hash> OP_EQUAL` locking script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinerAddress(String);

impl MinerAddress {
    /// Address for raw script-hash bytes.
    pub fn from_script_hash(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Address embedded in a pay-to-script-hash locking script, or `None`
    /// when the script does not match the template.
    pub fn from_locking_script(script: &Script) -> Option<Self> {
        script.p2sh_hash().map(Self::from_script_hash)
    }

    /// The hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MinerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MinerAddress {
    fn from(s: &str) -> Self {
        Self(s.to_ascii_lowercase())
    }
}
