//! Locking-script byte strings and the small opcode vocabulary the policy
//! layer needs. This is not a script interpreter; execution stays with the
//! host.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// `OP_RETURN`: marks an output as an unspendable data carrier.
pub const OP_RETURN: u8 = 0x6a;

/// `OP_HASH160`: pops the stack top and pushes its HASH160.
pub const OP_HASH160: u8 = 0xa9;

/// `OP_EQUAL`: pops two items and pushes the comparison result.
pub const OP_EQUAL: u8 = 0x87;

/// Largest opcode that is a direct data push of its own value in bytes.
pub const MAX_DIRECT_PUSH: u8 = 0x4b;

/// An owned locking script (`scriptPubKey`) byte string.
///
/// Serialized as lowercase hex so scripts can be embedded in JSON/TOML
/// configuration and log output without escaping.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    /// Wrap raw script bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Build the `OP_HASH160 <push> <script_hash> OP_EQUAL` locking script.
    ///
    /// `script_hash` must fit in a direct push (at most 75 bytes); hashes in
    /// the wild are 20 or 32 bytes.
    pub fn p2sh(script_hash: &[u8]) -> Self {
        debug_assert!(script_hash.len() <= MAX_DIRECT_PUSH as usize);
        let mut bytes = Vec::with_capacity(script_hash.len() + 3);
        bytes.push(OP_HASH160);
        bytes.push(script_hash.len() as u8);
        bytes.extend_from_slice(script_hash);
        bytes.push(OP_EQUAL);
        Self(bytes)
    }

    /// Build the `OP_RETURN <push> <data>` data-carrier script.
    ///
    /// `data` must fit in a direct push (at most 75 bytes).
    pub fn op_return(data: &[u8]) -> Self {
        debug_assert!(data.len() <= MAX_DIRECT_PUSH as usize);
        let mut bytes = Vec::with_capacity(data.len() + 2);
        bytes.push(OP_RETURN);
        bytes.push(data.len() as u8);
        bytes.extend_from_slice(data);
        Self(bytes)
    }

    /// Raw script bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Script length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the zero-length script.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The embedded script-hash bytes of an `OP_HASH160 <push> <hash>
    /// OP_EQUAL` locking script, or `None` when the script does not match
    /// that template exactly.
    pub fn p2sh_hash(&self) -> Option<&[u8]> {
        let bytes = &self.0;
        if bytes.len() < 4 {
            return None;
        }
        let push = bytes[1] as usize;
        if bytes[0] == OP_HASH160
            && bytes[1] <= MAX_DIRECT_PUSH
            && bytes[bytes.len() - 1] == OP_EQUAL
            && bytes.len() == push + 3
        {
            Some(&bytes[2..2 + push])
        } else {
            None
        }
    }

    /// True iff the script matches the pay-to-script-hash template.
    pub fn is_p2sh(&self) -> bool {
        self.p2sh_hash().is_some()
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2sh_roundtrip() {
        let hash = [0xab_u8; 20];
        let script = Script::p2sh(&hash);
        assert_eq!(script.len(), 23);
        assert_eq!(script.p2sh_hash(), Some(&hash[..]));
        assert!(script.is_p2sh());
    }

    #[test]
    fn test_p2sh_hash_rejects_other_templates() {
        assert_eq!(Script::new(vec![]).p2sh_hash(), None);
        assert_eq!(Script::op_return(&[1, 2, 3]).p2sh_hash(), None);

        // Right shape, wrong trailing opcode
        let mut bytes = Script::p2sh(&[7u8; 20]).as_bytes().to_vec();
        *bytes.last_mut().unwrap() = OP_RETURN;
        assert_eq!(Script::new(bytes).p2sh_hash(), None);

        // Push length inconsistent with total length
        let mut bytes = Script::p2sh(&[7u8; 20]).as_bytes().to_vec();
        bytes[1] = 19;
        assert_eq!(Script::new(bytes).p2sh_hash(), None);
    }

    #[test]
    fn test_op_return_layout() {
        let script = Script::op_return(&[0xde, 0xad]);
        assert_eq!(script.as_bytes(), &[OP_RETURN, 2, 0xde, 0xad]);
    }

    #[test]
    fn test_serde_hex_string() {
        let script = Script::p2sh(&[0x11u8; 20]);
        let json = serde_json::to_string(&script).unwrap();
        assert!(json.contains("a914"));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
