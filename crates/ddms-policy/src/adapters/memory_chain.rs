//! In-memory chain adapter
//!
//! Implements the `ChainReader` port over a vector of blocks. Each pushed
//! block carries a single-output coinbase paying to the given script, which
//! is all the policy walks ever look at.

use crate::error::{PolicyError, Result};
use crate::ports::{ChainReader, TimeOffsetSource};
use parking_lot::RwLock;
use shared_types::{Block, BlockHeader, BlockIndex, Hash, Script, Transaction, TxOut};

/// Seconds between consecutive blocks pushed without an explicit timestamp.
pub const DEFAULT_BLOCK_SPACING: u32 = 10;

/// In-memory chain for tests and bootstrap runs.
pub struct InMemoryChain {
    base_height: u32,
    blocks: RwLock<Vec<Block>>,
}

impl InMemoryChain {
    /// Chain whose first block sits at `height` with timestamp `time`,
    /// mined to `coinbase_script`.
    pub fn with_base(height: u32, time: u32, coinbase_script: Script) -> Self {
        let chain = Self {
            base_height: height,
            blocks: RwLock::new(Vec::new()),
        };
        chain.push_block(coinbase_script, time);
        chain
    }

    /// Append a block mined to `coinbase_script` with an explicit timestamp.
    ///
    /// Heights are assigned contiguously from the base height, so the first
    /// push lands on the base itself.
    pub fn push_block(&self, coinbase_script: Script, time: u32) -> BlockIndex {
        let mut blocks = self.blocks.write();
        let height = self.base_height + blocks.len() as u32;
        let parent_hash = blocks
            .last()
            .map(|block| Self::index_of(&block.header).hash)
            .unwrap_or_default();
        let coinbase = Transaction::with_outputs(vec![TxOut {
            value: 50_000,
            script_pubkey: coinbase_script,
        }]);
        let block = Block {
            header: BlockHeader {
                height,
                time,
                parent_hash,
                merkle_root: Hash::default(),
            },
            transactions: vec![coinbase],
        };
        let index = Self::index_of(&block.header);
        blocks.push(block);
        index
    }

    /// Append a block mined to `coinbase_script`, spacing its timestamp
    /// [`DEFAULT_BLOCK_SPACING`] seconds after the tip (or starting at zero
    /// on an empty chain).
    pub fn push_coinbase(&self, coinbase_script: &Script) -> BlockIndex {
        let time = self
            .tip_time()
            .map(|time| time + DEFAULT_BLOCK_SPACING)
            .unwrap_or(0);
        self.push_block(coinbase_script.clone(), time)
    }

    /// Append `count` blocks mined to `coinbase_script`.
    pub fn push_coinbases(&self, coinbase_script: &Script, count: usize) {
        for _ in 0..count {
            self.push_coinbase(coinbase_script);
        }
    }

    /// Height of the current tip.
    pub fn tip_height(&self) -> u32 {
        self.tip().map(|tip| tip.height).unwrap_or(0)
    }

    /// Timestamp of the current tip.
    pub fn tip_time(&self) -> Option<u32> {
        self.tip().map(|tip| tip.time)
    }

    fn index_of(header: &BlockHeader) -> BlockIndex {
        // Synthetic hash: unique per height is enough for an in-memory chain.
        let mut hash = Hash::default();
        hash[..4].copy_from_slice(&header.height.to_le_bytes());
        BlockIndex {
            height: header.height,
            time: header.time,
            hash,
        }
    }
}

impl ChainReader for InMemoryChain {
    fn tip(&self) -> Option<BlockIndex> {
        self.blocks
            .read()
            .last()
            .map(|block| Self::index_of(&block.header))
    }

    fn parent(&self, index: &BlockIndex) -> Option<BlockIndex> {
        if index.height <= self.base_height {
            return None;
        }
        let offset = (index.height - 1 - self.base_height) as usize;
        self.blocks
            .read()
            .get(offset)
            .map(|block| Self::index_of(&block.header))
    }

    fn read_block(&self, index: &BlockIndex) -> Result<Block> {
        if index.height < self.base_height {
            return Err(PolicyError::MissingBlock {
                height: index.height,
            });
        }
        let offset = (index.height - self.base_height) as usize;
        self.blocks
            .read()
            .get(offset)
            .cloned()
            .ok_or(PolicyError::MissingBlock {
                height: index.height,
            })
    }
}

/// Fixed time offset source.
pub struct StaticTimeOffset(pub i64);

impl TimeOffsetSource for StaticTimeOffset {
    fn time_offset(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner_script(tag: u8) -> Script {
        Script::p2sh(&[tag; 20])
    }

    #[test]
    fn test_chain_links_and_heights() {
        let chain = InMemoryChain::with_base(100, 1_000, miner_script(1));
        chain.push_coinbases(&miner_script(2), 3);

        let tip = chain.tip().unwrap();
        assert_eq!(tip.height, 103);
        assert_eq!(tip.time, 1_000 + 3 * DEFAULT_BLOCK_SPACING);

        let parent = chain.parent(&tip).unwrap();
        assert_eq!(parent.height, 102);
    }

    #[test]
    fn test_walk_stops_at_base() {
        let chain = InMemoryChain::with_base(100, 1_000, miner_script(1));
        chain.push_coinbase(&miner_script(2));

        let mut cursor = chain.tip();
        let mut visited = Vec::new();
        while let Some(index) = cursor {
            visited.push(index.height);
            cursor = chain.parent(&index);
        }
        assert_eq!(visited, vec![101, 100]);
    }

    #[test]
    fn test_read_block_returns_coinbase_script() {
        let chain = InMemoryChain::with_base(0, 0, miner_script(7));
        let tip = chain.tip().unwrap();
        let block = chain.read_block(&tip).unwrap();
        let coinbase = block.coinbase().unwrap();
        assert_eq!(coinbase.outputs[0].script_pubkey, miner_script(7));
    }

    #[test]
    fn test_read_block_below_base_is_missing() {
        let chain = InMemoryChain::with_base(100, 1_000, miner_script(1));
        let missing = BlockIndex {
            height: 99,
            time: 0,
            hash: Hash::default(),
        };
        assert!(matches!(
            chain.read_block(&missing),
            Err(PolicyError::MissingBlock { height: 99 })
        ));
    }

    #[test]
    fn test_explicit_timestamp_block() {
        let chain = InMemoryChain::with_base(0, 0, miner_script(1));
        let index = chain.push_block(miner_script(2), 50_000);
        assert_eq!(index.time, 50_000);
    }
}
