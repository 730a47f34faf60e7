//! Configuration types for the mining policy

use crate::error::{PolicyError, Result};
use serde::Deserialize;
use shared_types::Script;

/// Runtime configuration for the DDMS policy.
///
/// Round size and maximum future block time default to the crate constants.
/// The WDMO locking script and the first mining round height have no
/// default: both must come from chain parameters. The policy itself never
/// verifies license provenance (that stays with the host's transaction
/// validation), but it is the natural owner of the configured script, so
/// hosts query it through [`PolicyConfig::is_wdmo_script`].
#[derive(Clone, Debug, Deserialize)]
pub struct PolicyConfig {
    /// Number of block heights per quota round.
    #[serde(default = "default_round_size")]
    pub mining_round_size: u16,

    /// Height at which the first mining round starts; round walks never
    /// descend below it. Required, never defaulted.
    pub first_mining_round_height: u32,

    /// The host chain's maximum future block time, in seconds.
    #[serde(default = "default_max_future_block_time")]
    pub max_future_block_time: u32,

    /// Locking script of the WDMO organization that issues licenses.
    /// Required, never defaulted.
    pub wdmo_script: Script,
}

fn default_round_size() -> u16 {
    crate::MINING_ROUND_SIZE
}

fn default_max_future_block_time() -> u32 {
    crate::MAX_FUTURE_BLOCK_TIME
}

impl PolicyConfig {
    /// Configuration with default consensus parameters and the two values
    /// the chain must supply: the WDMO locking script and the first mining
    /// round height.
    pub fn new(wdmo_script: Script, first_mining_round_height: u32) -> Self {
        Self {
            mining_round_size: default_round_size(),
            first_mining_round_height,
            max_future_block_time: default_max_future_block_time(),
            wdmo_script,
        }
    }

    /// Seconds a round must stall before saturated miners may mine again.
    pub fn max_closed_round_time(&self) -> u32 {
        crate::CLOSED_ROUND_TIME_FACTOR * self.max_future_block_time
    }

    /// True iff `script` is the configured WDMO locking script.
    pub fn is_wdmo_script(&self, script: &Script) -> bool {
        *script == self.wdmo_script
    }

    /// Reject configurations the policy cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.mining_round_size == 0 {
            return Err(PolicyError::InvalidConfig(
                "mining_round_size must be positive".into(),
            ));
        }
        if !self.wdmo_script.is_p2sh() {
            return Err(PolicyError::InvalidConfig(
                "wdmo_script must be an OP_HASH160 <hash> OP_EQUAL locking script".into(),
            ));
        }
        Ok(())
    }
}
