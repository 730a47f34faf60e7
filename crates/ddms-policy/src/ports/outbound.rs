//! Outbound ports (driven side)

use crate::error::Result;
use shared_types::{Block, BlockIndex};

/// Port: read-only view of the canonical chain.
///
/// Round walks are the only consumers: they start at the tip, follow parent
/// links, and read block bodies for coinbase inspection. One disk read per
/// step is the expected cost model, so callers bound walk depth with their
/// height threshold.
pub trait ChainReader: Send + Sync {
    /// The current chain tip, or `None` before genesis is connected.
    fn tip(&self) -> Option<BlockIndex>;

    /// The parent of `index`, or `None` at the chain's first block.
    fn parent(&self, index: &BlockIndex) -> Option<BlockIndex>;

    /// The full block for `index`.
    ///
    /// Failing to produce a block the index promised is infrastructure
    /// trouble; implementations return [`crate::PolicyError::MissingBlock`].
    fn read_block(&self, index: &BlockIndex) -> Result<Block>;
}

/// Port: the node's median network time offset.
///
/// Used only as additive slack in the stall predicate; a policy wired to a
/// fixed zero offset is valid whenever the host does not track peer time.
pub trait TimeOffsetSource: Send + Sync {
    /// Median offset between peer clocks and the local clock, in seconds.
    fn time_offset(&self) -> i64;
}

/// Default time offset source for hosts without peer time tracking.
pub struct ZeroTimeOffset;

impl TimeOffsetSource for ZeroTimeOffset {
    fn time_offset(&self) -> i64 {
        0
    }
}
