//! Gas Manager
//!
//! Generalizes the teacher's single `max_gas_price_gwei` threshold check
//! (`submitter.rs::submit_claim`) into a rolling fee-history cache so the
//! executor can judge "is gas acceptable right now" against recent chain
//! conditions instead of one static ceiling, and can derive EIP-1559
//! `maxFeePerGas`/`maxPriorityFeePerGas` values from it.

use std::collections::VecDeque;

/// Refresh threshold: roughly one hour of 12-second blocks.
const BLOCKS_PER_HOUR: u64 = 300;

/// Rolling cache of recent base fees plus the acceptability/derivation
/// rules built on top of it.
#[derive(Debug, Clone)]
pub struct GasManager {
    base_fees_wei: VecDeque<u128>,
    /// Target window size in blocks, derived from `txGasFeeHistoryDays`.
    /// Bounds both the cache's retention and how many blocks one refresh
    /// asks `eth_feeHistory` for.
    history_window_blocks: u64,
    last_fee_history_block_number: Option<u64>,
    acceptable_percentile: f64,
    min_priority_fee_wei: u128,
    max_priority_fee_wei: u128,
}

impl GasManager {
    #[must_use]
    pub fn new(
        acceptable_percentile: f64,
        min_priority_fee_wei: u128,
        max_priority_fee_wei: u128,
        history_window_blocks: u64,
    ) -> Self {
        let history_window_blocks = history_window_blocks.max(1);
        Self {
            base_fees_wei: VecDeque::with_capacity(history_window_blocks.min(4096) as usize),
            history_window_blocks,
            last_fee_history_block_number: None,
            acceptable_percentile,
            min_priority_fee_wei,
            max_priority_fee_wei,
        }
    }

    /// Size of the `eth_feeHistory` window this cache targets, i.e. how
    /// many blocks of base fees a full refresh should fetch.
    #[must_use]
    pub fn history_window_blocks(&self) -> u64 {
        self.history_window_blocks
    }

    /// Whether the cache needs a fresh `eth_feeHistory` call before being
    /// used to judge acceptability: always on a cold cache, otherwise
    /// skipped unless the chain has advanced at least roughly an hour's
    /// worth of blocks since the last refresh.
    #[must_use]
    pub fn needs_refresh(&self, current_block_number: u64) -> bool {
        match self.last_fee_history_block_number {
            None => true,
            Some(last) => current_block_number.saturating_sub(last) >= BLOCKS_PER_HOUR,
        }
    }

    /// Record a batch of per-block base fees (oldest first, as returned by
    /// `eth_feeHistory`), evicting the oldest entries beyond the configured
    /// history window.
    pub fn record_fee_history(&mut self, base_fees_wei: &[u128], latest_block_number: u64) {
        for &fee in base_fees_wei {
            if self.base_fees_wei.len() as u64 == self.history_window_blocks {
                self.base_fees_wei.pop_front();
            }
            self.base_fees_wei.push_back(fee);
        }
        self.last_fee_history_block_number = Some(latest_block_number);
    }

    /// The base-fee value at `percentile` (0.0..=100.0) of the cached
    /// distribution, linear-interpolated between the two bracketing sorted
    /// samples. `None` if the cache is empty.
    #[must_use]
    pub fn percentile_value(&self, percentile: f64) -> Option<u128> {
        if self.base_fees_wei.is_empty() {
            return None;
        }
        let mut sorted: Vec<u128> = self.base_fees_wei.iter().copied().collect();
        sorted.sort_unstable();

        if sorted.len() == 1 {
            return Some(sorted[0]);
        }

        let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
        let lower_idx = rank.floor() as usize;
        let upper_idx = rank.ceil() as usize;
        if lower_idx == upper_idx {
            return Some(sorted[lower_idx]);
        }
        let frac = rank - lower_idx as f64;
        let lower = sorted[lower_idx] as f64;
        let upper = sorted[upper_idx] as f64;
        Some((lower + frac * (upper - lower)).round() as u128)
    }

    /// Gas is acceptable iff `currentBaseFee <= percentile(cache,
    /// acceptablePercentile)`. An empty cache (no history fetched yet)
    /// is treated as acceptable so the very first cycle is never blocked
    /// waiting on a fee-history call that hasn't happened.
    #[must_use]
    pub fn is_acceptable(&self, current_base_fee_wei: u128) -> bool {
        match self.percentile_value(self.acceptable_percentile) {
            Some(threshold) => current_base_fee_wei <= threshold,
            None => true,
        }
    }

    /// `maxPriorityFeePerGas = clamp(rewardValue, minPriorityFee, maxPriorityFee)`.
    #[must_use]
    pub fn derive_priority_fee(&self, reward_value_wei: u128) -> u128 {
        reward_value_wei.clamp(self.min_priority_fee_wei, self.max_priority_fee_wei)
    }

    /// `maxFeePerGas = 2 * currentBaseFee + maxPriorityFeePerGas`, where the
    /// priority fee is the clamped `reward_value_wei` from a fresh 1-block
    /// fee-history call at the configured priority-fee percentile.
    #[must_use]
    pub fn derive_fees(&self, current_base_fee_wei: u128, reward_value_wei: u128) -> (u128, u128) {
        let priority_fee = self.derive_priority_fee(reward_value_wei);
        let max_fee_per_gas = current_base_fee_wei.saturating_mul(2).saturating_add(priority_fee);
        (max_fee_per_gas, priority_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_refresh_when_empty() {
        let gm = GasManager::new(90.0, 1_000_000_000, 10_000_000_000, 32);
        assert!(gm.needs_refresh(100));
    }

    #[test]
    fn needs_refresh_after_interval() {
        let mut gm = GasManager::new(90.0, 1_000_000_000, 10_000_000_000, 32);
        gm.record_fee_history(&[10, 20], 100);
        assert!(!gm.needs_refresh(399));
        assert!(gm.needs_refresh(400));
    }

    #[test]
    fn percentile_value_bounds() {
        let mut gm = GasManager::new(90.0, 1, 1, 32);
        gm.record_fee_history(&[10, 20, 30, 40, 50], 100);
        assert_eq!(gm.percentile_value(0.0), Some(10));
        assert_eq!(gm.percentile_value(100.0), Some(50));
    }

    #[test]
    fn percentile_value_interpolates_midpoint() {
        let mut gm = GasManager::new(90.0, 1, 1, 32);
        gm.record_fee_history(&[0, 100], 1);
        assert_eq!(gm.percentile_value(50.0), Some(50));
    }

    #[test]
    fn is_acceptable_with_empty_cache_defaults_true() {
        let gm = GasManager::new(90.0, 1, 1, 32);
        assert!(gm.is_acceptable(1_000_000_000));
    }

    #[test]
    fn is_acceptable_respects_percentile() {
        let mut gm = GasManager::new(50.0, 1, 1, 32);
        gm.record_fee_history(&[10, 20, 30, 40, 50], 1);
        assert!(gm.is_acceptable(30));
        assert!(!gm.is_acceptable(31));
    }

    #[test]
    fn derive_priority_fee_clamps_to_range() {
        let gm = GasManager::new(90.0, 1_000_000_000, 5_000_000_000, 32);
        assert_eq!(gm.derive_priority_fee(100), 1_000_000_000);
        assert_eq!(gm.derive_priority_fee(9_000_000_000), 5_000_000_000);
        assert_eq!(gm.derive_priority_fee(2_000_000_000), 2_000_000_000);
    }

    #[test]
    fn derive_fees_combines_base_and_priority() {
        let gm = GasManager::new(90.0, 1, 1_000_000, 32);
        let (max_fee, priority) = gm.derive_fees(100, 50);
        assert_eq!(priority, 50);
        assert_eq!(max_fee, 250);
    }
}
