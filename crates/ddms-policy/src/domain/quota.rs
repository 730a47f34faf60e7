//! Quota distribution
//!
//! Each licensed miner's per-round block quota is its hash-rate share of the
//! round, rounded half-away-from-zero. The quotas are not normalized: their
//! sum may differ from the round size by at most one block per miner, and
//! consensus accepts that.

use super::{LicenseEntry, MinerAddress};
use std::collections::HashMap;

/// Per-miner block quota for one round.
///
/// `round(round_size * hash_rate / hash_rate_sum)` for every licensed miner;
/// all zeros when the summed hash-rate is zero.
pub fn block_quotas(licenses: &[LicenseEntry], round_size: u16) -> HashMap<MinerAddress, i32> {
    let rate_sum: f32 = licenses
        .iter()
        .map(|entry| f32::from(entry.hash_rate))
        .sum();

    licenses
        .iter()
        .map(|entry| {
            let quota = if rate_sum == 0.0 {
                0
            } else {
                (f32::from(round_size) * f32::from(entry.hash_rate) / rate_sum).round() as i32
            };
            (entry.address.clone(), quota)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn licenses(rates: &[u16]) -> Vec<LicenseEntry> {
        rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| {
                LicenseEntry::new(1, rate, MinerAddress::from_script_hash(&[i as u8; 20]))
            })
            .collect()
    }

    #[test]
    fn test_distributes_round_proportionally() {
        let licenses = licenses(&[3, 2, 1, 4, 5]);
        let quotas = block_quotas(&licenses, 100);

        let expected = [20, 13, 7, 27, 33];
        for (entry, want) in licenses.iter().zip(expected) {
            assert_eq!(quotas[&entry.address], want);
        }
    }

    #[test]
    fn test_quota_sum_stays_within_rounding_slack() {
        let licenses = licenses(&[3, 2, 1, 4, 5]);
        let quotas = block_quotas(&licenses, 100);
        let sum: i32 = quotas.values().sum();
        assert!((sum - 100).unsigned_abs() as usize <= licenses.len());
    }

    #[test]
    fn test_single_miner_takes_whole_round() {
        let licenses = licenses(&[7]);
        let quotas = block_quotas(&licenses, 100);
        assert_eq!(quotas[&licenses[0].address], 100);
    }

    #[test]
    fn test_zero_rate_sum_yields_zero_quotas() {
        let licenses = licenses(&[0, 0]);
        let quotas = block_quotas(&licenses, 100);
        assert!(quotas.values().all(|&quota| quota == 0));
    }

    #[test]
    fn test_empty_registry_yields_empty_map() {
        assert!(block_quotas(&[], 100).is_empty());
    }
}
