//! Deadline Resolver
//!
//! Turns a validator's activation epoch plus its module's configured exit
//! threshold into the slot/epoch at which the exit-delay penalty becomes
//! provable, per the six-step arithmetic below. Pure functions only — the
//! threshold itself is fetched once per `(moduleId, nodeOpId)` per cycle by
//! the caller and cached via [`ThresholdCache`].

use std::collections::HashMap;

use crate::model::{epoch_to_slot, slot_to_epoch, BeaconConfig, Epoch, Slot, Timestamp};

/// `deadlineResult` returned by [`resolve_exit_deadline`]: everything
/// downstream components need to place a validator in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDeadline {
    pub earliest_exit_timestamp: Timestamp,
    pub eligible_exit_timestamp: Timestamp,
    pub exit_deadline_timestamp: Timestamp,
    pub exit_deadline_slot: Slot,
    pub exit_deadline_epoch: Epoch,
}

/// Compute the exit deadline for one validator.
///
/// 1. `earliest = genesisTime + activationEpoch * slotsPerEpoch * secondsPerSlot
///    + shardCommitteePeriodInSeconds`
/// 2. `eligibleExitTimestamp = max(deliveredTimestamp, earliest)`
/// 3. `exitDeadline = eligibleExitTimestamp + exitDeadlineThreshold`
/// 4. `exitDeadlineSlot = floor((exitDeadline - genesisTime) / secondsPerSlot)`
/// 5. `exitDeadlineEpoch = floor(exitDeadlineSlot / slotsPerEpoch)`
#[must_use]
pub fn resolve_exit_deadline(
    config: &BeaconConfig,
    activation_epoch: Epoch,
    delivered_timestamp: Timestamp,
    exit_deadline_threshold: u64,
) -> ExitDeadline {
    let activation_slot = epoch_to_slot(activation_epoch, config.slots_per_epoch);
    let earliest_exit_timestamp = config.genesis_time
        + activation_slot * config.seconds_per_slot
        + config.shard_committee_period_in_seconds;

    let eligible_exit_timestamp = delivered_timestamp.max(earliest_exit_timestamp);
    let exit_deadline_timestamp = eligible_exit_timestamp + exit_deadline_threshold;

    let exit_deadline_slot =
        (exit_deadline_timestamp - config.genesis_time) / config.seconds_per_slot;
    let exit_deadline_epoch = slot_to_epoch(exit_deadline_slot, config.slots_per_epoch);

    ExitDeadline {
        earliest_exit_timestamp,
        eligible_exit_timestamp,
        exit_deadline_timestamp,
        exit_deadline_slot,
        exit_deadline_epoch,
    }
}

/// Per-cycle cache of `(moduleId, nodeOpId) -> exitDeadlineThreshold` so a
/// batch of validators sharing an operator only pays one registry round
/// trip. Cleared at the start of each accumulate pass by the caller.
#[derive(Debug, Default)]
pub struct ThresholdCache {
    entries: HashMap<(u32, u64), u64>,
}

impl ThresholdCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, module_id: u32, node_op_id: u64) -> Option<u64> {
        self.entries.get(&(module_id, node_op_id)).copied()
    }

    pub fn insert(&mut self, module_id: u32, node_op_id: u64, threshold: u64) {
        self.entries.insert((module_id, node_op_id), threshold);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BeaconConfig {
        BeaconConfig {
            genesis_time: 1_606_824_023,
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            capella_fork_epoch: 0,
            shard_committee_period_in_seconds: 98_304,
        }
    }

    #[test]
    fn worked_scenario_one() {
        let cfg = config();
        let deadline = resolve_exit_deadline(&cfg, 100, 1_606_824_023, 0);
        assert_eq!(deadline.earliest_exit_timestamp, 1_606_960_727);
    }

    #[test]
    fn delivered_after_earliest_wins() {
        let cfg = config();
        let deadline = resolve_exit_deadline(&cfg, 0, 2_000_000_000, 0);
        assert_eq!(deadline.eligible_exit_timestamp, 2_000_000_000);
    }

    #[test]
    fn delivered_before_earliest_uses_earliest() {
        let cfg = config();
        let deadline = resolve_exit_deadline(&cfg, 0, 0, 0);
        assert_eq!(deadline.eligible_exit_timestamp, deadline.earliest_exit_timestamp);
    }

    #[test]
    fn threshold_shifts_deadline_and_slot() {
        let cfg = config();
        let without = resolve_exit_deadline(&cfg, 10, 0, 0);
        let with = resolve_exit_deadline(&cfg, 10, 0, 3600);
        assert_eq!(with.exit_deadline_timestamp - without.exit_deadline_timestamp, 3600);
        assert!(with.exit_deadline_slot >= without.exit_deadline_slot);
    }

    #[test]
    fn threshold_cache_round_trips() {
        let mut cache = ThresholdCache::new();
        assert!(cache.get(1, 2).is_none());
        cache.insert(1, 2, 86_400);
        assert_eq!(cache.get(1, 2), Some(86_400));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
