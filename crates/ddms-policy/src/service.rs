//! Mining Policy Service - registry plus chain-walk orchestration
//!
//! # Architecture
//! - The registry is the only mutable state, guarded by a reader/writer
//!   lock; `handle_tx` applies a whole transaction as one atomic batch.
//! - Every query is a deterministic function of the registry snapshot, the
//!   chain view, and its arguments. No clocks, no randomness; network time
//!   enters only through the `TimeOffsetSource` port.
//! - Chain walks are bounded by the caller's height threshold and perform
//!   one block read per step.

use crate::config::PolicyConfig;
use crate::domain::{block_quotas, round_start, LicenseEntry, LicenseRegistry, MinerAddress};
use crate::error::{PolicyError, Result};
use crate::metrics;
use crate::ports::{ChainReader, MiningPolicyApi, TimeOffsetSource, ZeroTimeOffset};
use parking_lot::RwLock;
use shared_types::{BlockHeader, BlockIndex, Script, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Fraction of total licensed hash-rate that must be saturated before the
/// round opens for everyone.
const SATURATION_THRESHOLD: f32 = 0.5;

/// The DDMS policy facade: owns the license registry and answers admission
/// queries against the chain view.
pub struct MiningPolicyService<C: ChainReader> {
    chain: Arc<C>,
    time_offset: Box<dyn TimeOffsetSource>,
    registry: RwLock<LicenseRegistry>,
    config: PolicyConfig,
}

impl<C: ChainReader> MiningPolicyService<C> {
    /// Create a service over `chain` with a zero time offset.
    ///
    /// Fails when `config` does not validate.
    pub fn new(chain: Arc<C>, config: PolicyConfig) -> Result<Self> {
        config.validate()?;
        info!(
            round_size = config.mining_round_size,
            first_round_height = config.first_mining_round_height,
            "mining policy initialized"
        );
        Ok(Self {
            chain,
            time_offset: Box::new(ZeroTimeOffset),
            registry: RwLock::new(LicenseRegistry::new()),
            config,
        })
    }

    /// Replace the time offset source (median peer offset tracking).
    pub fn with_time_offset_source(mut self, source: Box<dyn TimeOffsetSource>) -> Self {
        self.time_offset = source;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Apply every license payload of a confirmed transaction at `height`.
    ///
    /// The host calls this from the block-connect path for transactions it
    /// has already attributed to the WDMO; all entries derived from one
    /// transaction become visible to readers atomically.
    pub fn handle_tx(&self, tx: &Transaction, height: u32) {
        self.registry.write().handle_tx(tx, height);
    }

    /// Bootstrap insert, see [`LicenseRegistry::push_license`].
    pub fn push_license(&self, height: u32, hash_rate: u16, address: MinerAddress) {
        self.registry.write().push_license(height, hash_rate, address);
    }

    /// Roll the registry back to `height` after a reorg.
    pub fn rollback_to(&self, height: u32) {
        info!(height, "rolling license registry back");
        self.registry.write().rollback_to(height);
    }

    /// Clear the registry for a full replay.
    pub fn reset(&self) {
        self.registry.write().reset();
    }

    /// Snapshot of all licenses, in insertion order.
    pub fn licenses(&self) -> Vec<LicenseEntry> {
        self.registry.read().licenses().to_vec()
    }

    /// Sum of all licensed hash-rates.
    pub fn hash_rate_sum(&self) -> f32 {
        self.registry.read().hash_rate_sum()
    }

    /// Licensed hash-rate of `address`, or `0.0`.
    pub fn miner_hash_rate(&self, address: &MinerAddress) -> f32 {
        self.registry.read().miner_hash_rate(address)
    }

    /// True iff the miner behind `locking_script` holds a license.
    pub fn allowed_miner(&self, locking_script: &Script) -> bool {
        self.registry.read().allowed_miner(locking_script)
    }

    /// Per-miner block quota for a full round.
    pub fn calc_miners_block_quota(&self) -> HashMap<MinerAddress, i32> {
        let registry = self.registry.read();
        block_quotas(registry.licenses(), self.round_size())
    }

    /// Block quota of one miner; `0` when unlicensed.
    pub fn calc_miner_block_quota(&self, locking_script: &Script) -> u16 {
        let Some(address) = MinerAddress::from_locking_script(locking_script) else {
            return 0;
        };
        self.calc_miners_block_quota()
            .get(&address)
            .map(|&quota| quota.max(0) as u16)
            .unwrap_or(0)
    }

    /// Per-miner blocks still minable in the current round.
    ///
    /// Starts from the full quota and walks the current round's blocks from
    /// its end down to `max(round_start, height_threshold)`, decrementing
    /// one unit per licensed coinbase output. Counters go negative when a
    /// miner overshot its quota; downstream treats `<= 0` as saturated.
    pub fn calc_miners_block_left_in_round(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, i32>> {
        let mut left = self.calc_miners_block_quota();
        let tip = self.chain.tip().ok_or(PolicyError::EmptyChain)?;
        let start = round_start(tip.height, self.round_size(), height_threshold);

        let mut cursor = Some(tip);
        while let Some(index) = cursor {
            if index.height < start {
                break;
            }
            let block = self.chain.read_block(&index)?;
            if let Some(coinbase) = block.coinbase() {
                for out in &coinbase.outputs {
                    if let Some(address) = MinerAddress::from_locking_script(&out.script_pubkey) {
                        if let Some(count) = left.get_mut(&address) {
                            *count -= 1;
                        }
                    }
                }
            }
            cursor = self.chain.parent(&index);
        }

        Ok(left)
    }

    /// Remaining allowance of one miner, clamped at zero; `0` when
    /// unlicensed.
    pub fn calc_miner_block_left_in_round(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<u16> {
        let Some(address) = MinerAddress::from_locking_script(locking_script) else {
            return Ok(0);
        };
        Ok(self
            .calc_miners_block_left_in_round(height_threshold)?
            .get(&address)
            .map(|&count| count.max(0) as u16)
            .unwrap_or(0))
    }

    /// Per-miner average block count per round since `height_threshold`.
    ///
    /// The tip's round usually is partial; it still counts as one round, so
    /// the average of a miner that is on pace stays close to its quota. A
    /// tip sitting exactly on a round end contributes no extra round.
    pub fn calc_miners_block_average_on_all_rounds(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, f32>> {
        let tip = self.chain.tip().ok_or(PolicyError::EmptyChain)?;
        let round = u32::from(self.round_size());

        let mut counts: HashMap<MinerAddress, u32> = {
            let registry = self.registry.read();
            registry
                .licenses()
                .iter()
                .map(|entry| (entry.address.clone(), 0))
                .collect()
        };

        let mut rounds: u32 = if tip.height % round != round - 1 { 1 } else { 0 };
        let mut cursor = Some(tip);
        while let Some(index) = cursor {
            if index.height < height_threshold {
                break;
            }
            let block = self.chain.read_block(&index)?;
            if let Some(coinbase) = block.coinbase() {
                for out in &coinbase.outputs {
                    if let Some(address) = MinerAddress::from_locking_script(&out.script_pubkey) {
                        if let Some(count) = counts.get_mut(&address) {
                            *count += 1;
                        }
                    }
                }
            }
            // Stepping from a round's last block into its predecessor round
            // completes one more round of history.
            if index.height % round == round - 1 {
                rounds += 1;
            }
            cursor = self.chain.parent(&index);
        }

        let rounds = rounds.max(1) as f32;
        Ok(counts
            .into_iter()
            .map(|(address, count)| (address, count as f32 / rounds))
            .collect())
    }

    /// Round average of one miner; `0.0` when unlicensed.
    pub fn calc_miner_block_average_on_all_rounds(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<f32> {
        let Some(address) = MinerAddress::from_locking_script(locking_script) else {
            return Ok(0.0);
        };
        Ok(self
            .calc_miners_block_average_on_all_rounds(height_threshold)?
            .get(&address)
            .copied()
            .unwrap_or(0.0))
    }

    /// Whether the miner behind `coinbase_script` may produce `candidate` on
    /// top of the current tip.
    ///
    /// True iff the round is open, or the miner still has remaining quota.
    pub fn can_mine(
        &self,
        coinbase_script: &Script,
        candidate: &BlockHeader,
        height_threshold: u32,
    ) -> Result<bool> {
        let left = self.calc_miners_block_left_in_round(height_threshold)?;
        let tip = self.chain.tip().ok_or(PolicyError::EmptyChain)?;

        let open = self.is_round_open(&left, candidate, &tip, height_threshold);
        let allowed = open
            || MinerAddress::from_locking_script(coinbase_script)
                .and_then(|address| left.get(&address).copied())
                .map(|count| count > 0)
                .unwrap_or(false);

        debug!(open_round = open, allowed, height_threshold, "admission check");
        metrics::record_admission(allowed);
        Ok(allowed)
    }

    fn round_size(&self) -> u16 {
        self.config.mining_round_size
    }

    /// Share of total licensed hash-rate owned by saturated miners (those
    /// with no remaining allowance).
    fn saturated_power_fraction(&self, left: &HashMap<MinerAddress, i32>) -> f32 {
        let registry = self.registry.read();
        let total = registry.hash_rate_sum();
        if total == 0.0 {
            return 0.0;
        }
        let saturated: f32 = registry
            .licenses()
            .iter()
            .filter(|entry| left.get(&entry.address).copied().unwrap_or(0) <= 0)
            .map(|entry| f32::from(entry.hash_rate))
            .sum();
        saturated / total
    }

    /// The open-ring rule. A round opens when saturated miners own at least
    /// half the licensed power, when the candidate itself arrives past the
    /// closed-round time limit, or when two adjacent blocks inside the round
    /// already show such a stall.
    fn is_round_open(
        &self,
        left: &HashMap<MinerAddress, i32>,
        candidate: &BlockHeader,
        tip: &BlockIndex,
        height_threshold: u32,
    ) -> bool {
        // No licensed power at all: nothing to saturate, the ring cannot close.
        if self.registry.read().hash_rate_sum() == 0.0 {
            return true;
        }

        if self.saturated_power_fraction(left) >= SATURATION_THRESHOLD {
            debug!("round open: saturated power above threshold");
            return true;
        }

        let slack =
            self.time_offset.time_offset() + i64::from(self.config.max_closed_round_time());

        if i64::from(candidate.time) > i64::from(tip.time) + slack {
            debug!("round open: candidate past closed-round time limit");
            return true;
        }

        let start = round_start(tip.height, self.round_size(), height_threshold);
        let mut index = *tip;
        while index.height > start {
            let Some(parent) = self.chain.parent(&index) else {
                break;
            };
            if i64::from(index.time) > i64::from(parent.time) + slack {
                debug!(height = index.height, "round open: intra-round stall");
                return true;
            }
            index = parent;
        }

        false
    }
}

impl<C: ChainReader> MiningPolicyApi for MiningPolicyService<C> {
    fn allowed_miner(&self, locking_script: &Script) -> bool {
        MiningPolicyService::allowed_miner(self, locking_script)
    }

    fn calc_miners_block_quota(&self) -> HashMap<MinerAddress, i32> {
        MiningPolicyService::calc_miners_block_quota(self)
    }

    fn calc_miner_block_quota(&self, locking_script: &Script) -> u16 {
        MiningPolicyService::calc_miner_block_quota(self, locking_script)
    }

    fn calc_miners_block_left_in_round(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, i32>> {
        MiningPolicyService::calc_miners_block_left_in_round(self, height_threshold)
    }

    fn calc_miner_block_left_in_round(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<u16> {
        MiningPolicyService::calc_miner_block_left_in_round(self, locking_script, height_threshold)
    }

    fn calc_miners_block_average_on_all_rounds(
        &self,
        height_threshold: u32,
    ) -> Result<HashMap<MinerAddress, f32>> {
        MiningPolicyService::calc_miners_block_average_on_all_rounds(self, height_threshold)
    }

    fn calc_miner_block_average_on_all_rounds(
        &self,
        locking_script: &Script,
        height_threshold: u32,
    ) -> Result<f32> {
        MiningPolicyService::calc_miner_block_average_on_all_rounds(
            self,
            locking_script,
            height_threshold,
        )
    }

    fn can_mine(
        &self,
        coinbase_script: &Script,
        candidate: &BlockHeader,
        height_threshold: u32,
    ) -> Result<bool> {
        MiningPolicyService::can_mine(self, coinbase_script, candidate, height_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryChain, StaticTimeOffset};

    fn miner_script(tag: u8) -> Script {
        Script::p2sh(&[tag; 20])
    }

    fn miner_address(tag: u8) -> MinerAddress {
        MinerAddress::from_script_hash(&[tag; 20])
    }

    fn service(
        chain: Arc<InMemoryChain>,
        first_round_height: u32,
    ) -> MiningPolicyService<InMemoryChain> {
        let config = PolicyConfig::new(Script::p2sh(&[0x0b; 20]), first_round_height);
        MiningPolicyService::new(chain, config).unwrap()
    }

    fn candidate_after(chain: &InMemoryChain, delta: i64) -> BlockHeader {
        let tip = chain.tip().unwrap();
        BlockHeader {
            height: tip.height + 1,
            time: (i64::from(tip.time) + delta) as u32,
            ..BlockHeader::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let chain = Arc::new(InMemoryChain::with_base(0, 0, miner_script(9)));
        let config = PolicyConfig::new(Script::op_return(&[1]), 0);
        assert!(MiningPolicyService::new(chain, config).is_err());
    }

    #[test]
    fn test_quota_lookup_for_unlicensed_and_non_p2sh() {
        let chain = Arc::new(InMemoryChain::with_base(0, 0, miner_script(9)));
        let service = service(chain, 0);
        service.push_license(1, 5, miner_address(1));

        assert_eq!(service.calc_miner_block_quota(&miner_script(2)), 0);
        assert_eq!(service.calc_miner_block_quota(&Script::op_return(&[1])), 0);
        assert_eq!(service.calc_miner_block_quota(&miner_script(1)), 100);
    }

    #[test]
    fn test_walks_error_on_empty_chain() {
        struct EmptyChain;
        impl ChainReader for EmptyChain {
            fn tip(&self) -> Option<BlockIndex> {
                None
            }
            fn parent(&self, _index: &BlockIndex) -> Option<BlockIndex> {
                None
            }
            fn read_block(&self, index: &BlockIndex) -> Result<shared_types::Block> {
                Err(PolicyError::MissingBlock {
                    height: index.height,
                })
            }
        }
        let service = MiningPolicyService::new(
            Arc::new(EmptyChain),
            PolicyConfig::new(Script::p2sh(&[0x0b; 20]), 0),
        )
        .unwrap();

        assert!(matches!(
            service.calc_miners_block_left_in_round(0),
            Err(PolicyError::EmptyChain)
        ));
        assert!(matches!(
            service.can_mine(&miner_script(1), &BlockHeader::default(), 0),
            Err(PolicyError::EmptyChain)
        ));
    }

    #[test]
    fn test_can_mine_trivially_open_without_licensed_power() {
        let chain = Arc::new(InMemoryChain::with_base(0, 1_000, miner_script(9)));
        let service = service(Arc::clone(&chain), 0);

        // Empty registry
        assert!(service
            .can_mine(&miner_script(1), &candidate_after(&chain, 1), 0)
            .unwrap());

        // Zero-rate bootstrap entry: still no licensed power
        service.push_license(1, 0, miner_address(1));
        assert!(service
            .can_mine(&miner_script(1), &candidate_after(&chain, 1), 0)
            .unwrap());
    }

    #[test]
    fn test_left_in_round_clamps_negative_to_zero() {
        let chain = Arc::new(InMemoryChain::with_base(100, 1_000, miner_script(9)));
        let service = service(Arc::clone(&chain), 100);
        service.push_license(1, 1, miner_address(1));
        service.push_license(1, 9, miner_address(2));

        // Quota of miner 1 is 10; mine 12 blocks over it.
        chain.push_coinbases(&miner_script(1), 12);

        let left = service.calc_miners_block_left_in_round(100).unwrap();
        assert_eq!(left[&miner_address(1)], -2);
        assert_eq!(
            service
                .calc_miner_block_left_in_round(&miner_script(1), 100)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_time_offset_source_extends_staleness_slack() {
        let chain = Arc::new(InMemoryChain::with_base(100, 1_000, miner_script(9)));
        let config = PolicyConfig::new(Script::p2sh(&[0x0b; 20]), 100);
        let limit = i64::from(config.max_closed_round_time());

        let service = MiningPolicyService::new(Arc::clone(&chain), config)
            .unwrap()
            .with_time_offset_source(Box::new(StaticTimeOffset(100)));
        service.push_license(1, 1, miner_address(1));
        service.push_license(1, 9, miner_address(2));

        // Saturate miner 1 (10% of power: round stays closed).
        chain.push_coinbases(&miner_script(1), 10);

        // Past the unslacked limit but within offset slack: still closed.
        let candidate = candidate_after(&chain, limit + 50);
        assert!(!service.can_mine(&miner_script(1), &candidate, 100).unwrap());

        // Past limit plus offset: open.
        let candidate = candidate_after(&chain, limit + 101);
        assert!(service.can_mine(&miner_script(1), &candidate, 100).unwrap());
    }
}
