//! License output wire format
//!
//! A license-carrying output locks to an `OP_RETURN` data payload:
//!
//! ```text
//! OP_RETURN        - 1 byte
//! data push length - 1 byte
//! license header   - 3 bytes ("LTx")
//! miner script     - 20-32 bytes (script-hash of the licensed miner)
//! hashrate in PH   - 2 bytes, big-endian
//! ```
//!
//! This module only consumes the format; licenses are issued off-chain by
//! the WDMO and the host verifies provenance before the registry sees the
//! transaction.

use super::{LicenseEntry, MinerAddress};
use shared_types::{Script, Transaction, OP_RETURN};

/// Three-byte marker that opens every license payload.
pub const LICENSE_HEADER: [u8; 3] = [0x4c, 0x54, 0x78]; // "LTx"

const OPCODE_SIZE: usize = 1;
const DATA_LENGTH_SIZE: usize = 1;
const HEADER_SIZE: usize = 3;
const HASH_RATE_SIZE: usize = 2;
const MIN_MINER_SCRIPT_SIZE: usize = 20;
const MAX_MINER_SCRIPT_SIZE: usize = 32;

/// Smallest well-formed license script, in bytes.
pub const MIN_LICENSE_SCRIPT_SIZE: usize =
    OPCODE_SIZE + DATA_LENGTH_SIZE + HEADER_SIZE + MIN_MINER_SCRIPT_SIZE + HASH_RATE_SIZE;

/// Largest well-formed license script, in bytes.
pub const MAX_LICENSE_SCRIPT_SIZE: usize =
    OPCODE_SIZE + DATA_LENGTH_SIZE + HEADER_SIZE + MAX_MINER_SCRIPT_SIZE + HASH_RATE_SIZE;

/// True iff the script opens with `OP_RETURN` followed by the license
/// header, regardless of overall size. Used to tell "malformed license"
/// apart from "not a license at all".
pub fn has_license_prefix(script: &Script) -> bool {
    let bytes = script.as_bytes();
    bytes.len() >= OPCODE_SIZE + DATA_LENGTH_SIZE + HEADER_SIZE
        && bytes[0] == OP_RETURN
        && bytes[2..5] == LICENSE_HEADER
}

/// True iff the script is a well-formed license-bearing output.
pub fn is_license_header(script: &Script) -> bool {
    has_license_prefix(script)
        && (MIN_LICENSE_SCRIPT_SIZE..=MAX_LICENSE_SCRIPT_SIZE).contains(&script.len())
}

/// True iff any output of `tx` carries a well-formed license payload.
///
/// Provenance (that the transaction was produced by the WDMO) is the
/// caller's responsibility; this predicate is the cheap header half.
pub fn is_license_carrier(tx: &Transaction) -> bool {
    tx.outputs
        .iter()
        .any(|out| is_license_header(&out.script_pubkey))
}

fn miner_script_size(script: &Script) -> usize {
    script.len() - OPCODE_SIZE - DATA_LENGTH_SIZE - HEADER_SIZE - HASH_RATE_SIZE
}

/// Decode a license-bearing output into a candidate registry entry.
///
/// Returns `None` for anything that fails [`is_license_header`]; a
/// malformed output never aborts the surrounding transaction scan.
pub fn parse_license_output(script: &Script, height: u32) -> Option<LicenseEntry> {
    if !is_license_header(script) {
        return None;
    }

    let bytes = script.as_bytes();
    let script_start = OPCODE_SIZE + DATA_LENGTH_SIZE + HEADER_SIZE;
    let script_end = script_start + miner_script_size(script);

    let address = MinerAddress::from_script_hash(&bytes[script_start..script_end]);
    let hash_rate = u16::from_be_bytes([bytes[script_end], bytes[script_end + 1]]);

    Some(LicenseEntry::new(height, hash_rate, address))
}
