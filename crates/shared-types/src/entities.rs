//! # Core Chain Entities
//!
//! The block, transaction, and chain-index views that policy subsystems
//! consume. Fields the policy never reads (inputs, witnesses, difficulty
//! target) are deliberately absent; the host converts its own block and
//! transaction types into these at the subsystem boundary.

use crate::script::Script;
use serde::{Deserialize, Serialize};

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// A transaction output: amount in base units plus the locking script that
/// encumbers it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TxOut {
    /// Output amount in base units.
    pub value: i64,
    /// Locking script of the output.
    pub script_pubkey: Script,
}

/// Transaction view.
///
/// Policy subsystems are predicate-only consumers: they scan outputs and
/// never touch inputs, so only outputs cross the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// All outputs of the transaction, in wire order.
    pub outputs: Vec<TxOut>,
}

impl Transaction {
    /// Build a transaction view from its outputs.
    pub fn with_outputs(outputs: Vec<TxOut>) -> Self {
        Self { outputs }
    }
}

/// Block header view.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain.
    pub height: u32,
    /// Unix timestamp the block claims.
    pub time: u32,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Merkle root of all transactions in the block.
    pub merkle_root: Hash,
}

/// A full block view: header plus transactions, coinbase first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// All transactions; index 0 is the coinbase.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The coinbase transaction, or `None` for a (malformed) empty block.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }
}

/// Lightweight chain-index handle: enough to walk the chain and compare
/// timestamps without reading block bodies from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockIndex {
    /// Block height.
    pub height: u32,
    /// Block timestamp.
    pub time: u32,
    /// Block hash.
    pub hash: Hash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_is_first_transaction() {
        let coinbase = Transaction::with_outputs(vec![TxOut {
            value: 50_000,
            script_pubkey: Script::p2sh(&[1u8; 20]),
        }]);
        let block = Block {
            header: BlockHeader::default(),
            transactions: vec![coinbase, Transaction::default()],
        };
        assert_eq!(block.coinbase().unwrap().outputs[0].value, 50_000);
    }

    #[test]
    fn test_empty_block_has_no_coinbase() {
        assert!(Block::default().coinbase().is_none());
    }
}
