//! License registry
//!
//! In-memory projection of the license-carrying transactions observed on the
//! canonical chain. Entries live in insertion order; the set is small (one
//! per licensed miner), so lookups are linear scans.
//!
//! Every accepted mutation is also appended to a journal of applied
//! operations. After a reorg the host truncates the journal to the new
//! common height with [`LicenseRegistry::rollback_to`] instead of replaying
//! the whole chain.

use super::ltx;
use super::MinerAddress;
use crate::metrics;
use serde::{Deserialize, Serialize};
use shared_types::{Script, Transaction};
use tracing::debug;

/// One licensed miner: the height of the latest accepted amendment, the
/// licensed hash-rate in PH/s, and the miner's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseEntry {
    /// Height at which the latest accepted amendment was observed.
    pub height: u32,
    /// Licensed hash-rate in PH/s.
    pub hash_rate: u16,
    /// The licensed miner.
    pub address: MinerAddress,
}

impl LicenseEntry {
    /// Build an entry.
    pub fn new(height: u32, hash_rate: u16, address: MinerAddress) -> Self {
        Self {
            height,
            hash_rate,
            address,
        }
    }
}

/// Outcome of applying one license candidate to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseUpdate {
    /// No entry existed; the candidate was inserted.
    Granted,
    /// An existing entry was overwritten by a newer candidate.
    Amended,
    /// A newer zero-rate candidate removed the entry.
    Revoked,
    /// The candidate was older than (or as old as) the stored entry, or a
    /// bootstrap insert hit an existing address.
    Ignored,
}

impl LicenseUpdate {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Amended => "amended",
            Self::Revoked => "revoked",
            Self::Ignored => "ignored",
        }
    }
}

/// A journaled registry operation.
#[derive(Debug, Clone)]
enum JournalOp {
    /// Candidate extracted from a license-carrying transaction output.
    Amendment(LicenseEntry),
    /// Unconditional bootstrap insert via `push_license`.
    Bootstrap(LicenseEntry),
}

impl JournalOp {
    fn height(&self) -> u32 {
        match self {
            Self::Amendment(entry) | Self::Bootstrap(entry) => entry.height,
        }
    }
}

/// The authoritative in-memory set of miner licenses.
#[derive(Debug, Default)]
pub struct LicenseRegistry {
    entries: Vec<LicenseEntry>,
    journal: Vec<JournalOp>,
}

impl LicenseRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan all outputs of `tx` and apply every well-formed license payload
    /// observed at `height`.
    ///
    /// The caller must already have verified that `tx` was produced by the
    /// WDMO; provenance is not re-checked here. Malformed license outputs
    /// are skipped without error.
    pub fn handle_tx(&mut self, tx: &Transaction, height: u32) {
        for out in &tx.outputs {
            let script = &out.script_pubkey;
            if !ltx::has_license_prefix(script) {
                continue;
            }
            match ltx::parse_license_output(script, height) {
                Some(candidate) => {
                    let address = candidate.address.clone();
                    let update = self.record(JournalOp::Amendment(candidate));
                    debug!(%address, height, kind = update.kind(), "license update");
                    metrics::record_license_update(update.kind());
                }
                None => {
                    debug!(height, "skipping malformed license output");
                    metrics::record_output_skipped();
                }
            }
        }
    }

    /// Insert an entry iff the address is not already licensed.
    ///
    /// Unlike amendments, a zero hash-rate is stored as-is; this is the
    /// bootstrap path, not the revocation path.
    pub fn push_license(&mut self, height: u32, hash_rate: u16, address: MinerAddress) {
        let update = self.record(JournalOp::Bootstrap(LicenseEntry::new(
            height, hash_rate, address,
        )));
        metrics::record_license_update(update.kind());
    }

    /// True iff the script-hash embedded in `locking_script` belongs to a
    /// licensed miner.
    pub fn allowed_miner(&self, locking_script: &Script) -> bool {
        MinerAddress::from_locking_script(locking_script)
            .map(|address| self.find(&address).is_some())
            .unwrap_or(false)
    }

    /// Sum of all licensed hash-rates.
    pub fn hash_rate_sum(&self) -> f32 {
        self.entries
            .iter()
            .map(|entry| f32::from(entry.hash_rate))
            .sum()
    }

    /// Licensed hash-rate of `address`, or `0.0` when unlicensed.
    pub fn miner_hash_rate(&self, address: &MinerAddress) -> f32 {
        self.find(address)
            .map(|entry| f32::from(entry.hash_rate))
            .unwrap_or(0.0)
    }

    /// The entry for `address`, if any.
    pub fn find(&self, address: &MinerAddress) -> Option<&LicenseEntry> {
        self.entries.iter().find(|entry| entry.address == *address)
    }

    /// All entries, in insertion order.
    pub fn licenses(&self) -> &[LicenseEntry] {
        &self.entries
    }

    /// Number of licensed miners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff no miner is licensed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every journaled operation observed above `height` and rebuild
    /// the entry set by replay. The host calls this after a reorg whose new
    /// common ancestor is at `height`.
    pub fn rollback_to(&mut self, height: u32) {
        self.journal.retain(|op| op.height() <= height);
        let journal = std::mem::take(&mut self.journal);
        self.entries.clear();
        for op in &journal {
            self.apply(op);
        }
        self.journal = journal;
        debug!(height, entries = self.entries.len(), "registry rolled back");
    }

    /// Clear entries and journal. Full-replay recovery path and tests.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.journal.clear();
    }

    fn record(&mut self, op: JournalOp) -> LicenseUpdate {
        let update = self.apply(&op);
        self.journal.push(op);
        update
    }

    fn apply(&mut self, op: &JournalOp) -> LicenseUpdate {
        match op {
            JournalOp::Amendment(candidate) => self.apply_candidate(candidate),
            JournalOp::Bootstrap(candidate) => {
                if self.find(&candidate.address).is_none() {
                    self.entries.push(candidate.clone());
                    LicenseUpdate::Granted
                } else {
                    LicenseUpdate::Ignored
                }
            }
        }
    }

    /// Amendment rules: insert when absent (a zero rate at insert time means
    /// "revoke nothing" and is stored as a zero-rate entry); otherwise only
    /// strictly newer candidates win, and a newer zero rate revokes.
    fn apply_candidate(&mut self, candidate: &LicenseEntry) -> LicenseUpdate {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.address == candidate.address);

        match position {
            None => {
                self.entries.push(candidate.clone());
                LicenseUpdate::Granted
            }
            Some(i) => {
                if candidate.height <= self.entries[i].height {
                    LicenseUpdate::Ignored
                } else if candidate.hash_rate == 0 {
                    self.entries.remove(i);
                    LicenseUpdate::Revoked
                } else {
                    self.entries[i].hash_rate = candidate.hash_rate;
                    self.entries[i].height = candidate.height;
                    LicenseUpdate::Amended
                }
            }
        }
    }
}
