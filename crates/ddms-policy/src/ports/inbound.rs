//! Inbound port (driving side)

use crate::domain::MinerAddress;
use crate::error::Result;
use shared_types::{BlockHeader, Script};
use std::collections::HashMap;

/// The admission surface the host's validation and proposal paths drive.
///
/// Every method is a pure function of the registry snapshot, the chain view,
/// and its arguments; none blocks on anything but chain reads.
///
/// `height_threshold` is the floor below which no walk descends. Hosts
/// normally pass the configured first mining round height; tests pin it to
/// whatever base their fixture chain starts at.
pub trait MiningPolicyApi: Send + Sync {
    /// True iff the miner behind `locking_script` holds a license.
    fn allowed_miner(&self, locking_script: &Script) -> bool;

    /// Per-miner block quota for a full round.
    fn calc_miners_block_quota(&self) -> HashMap<MinerAddress, i32>;

    /// Block quota of one miner; `0` when unlicensed.
    fn calc_miner_block_quota(&self, locking_script: &Script) -> u16;

    /// Per-miner blocks still minable in the current round. Values go
    /// negative when a miner overshot its quota.
    fn calc_miners_block_left_in_round(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, i32>>;

    /// Remaining allowance of one miner, clamped at zero; `0` when
    /// unlicensed.
    fn calc_miner_block_left_in_round(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<u16>;

    /// Per-miner average block count per round since `height_threshold`.
    fn calc_miners_block_average_on_all_rounds(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, f32>>;

    /// Round average of one miner; `0.0` when unlicensed.
    fn calc_miner_block_average_on_all_rounds(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<f32>;

    /// Whether the miner behind `coinbase_script` may produce `candidate`
    /// on top of the current tip: true iff the round is open or the miner
    /// still has quota left.
    fn can_mine(
        &self,
        coinbase_script: &Script,
        candidate: &BlockHeader,
        height_threshold: u32,
    ) -> Result<bool>;
}
