//! Validator Store
//!
//! Holds every validator currently past its eligible-exit window but not
//! yet reported, keyed by deadline slot so the cycle driver can pull out
//! everything due as of the current head slot in one ascending scan. Owned
//! single-threaded by [`crate::prover::ProverCore`] — unlike the teacher's
//! `AppState`, nothing here is shared across tasks, so no `DashMap`/`Arc` is
//! needed, just a `BTreeMap`.

use std::collections::{BTreeMap, HashSet};

use crate::model::{DeadlineGroup, DeadlineMap, Slot};

/// Pending validators awaiting submission, grouped by deadline slot.
#[derive(Debug, Default)]
pub struct ValidatorStore {
    map: DeadlineMap,
}

impl ValidatorStore {
    #[must_use]
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    /// Record a deadline group. Groups for the same slot accumulate; a
    /// group that duplicates one already present (same `exitRequestsHash`)
    /// is appended anyway — de-duplication happens at submission time
    /// against [`ReportedSet`], not here, so a restart that re-accumulates
    /// the same request before the set catches up never silently drops it.
    pub fn add(&mut self, slot: Slot, group: DeadlineGroup) {
        self.map.entry(slot).or_default().push(group);
    }

    /// All deadline groups whose slot has already passed the given head
    /// slot, in ascending slot order.
    #[must_use]
    pub fn eligible_entries(&self, head_slot: Slot) -> Vec<(Slot, &DeadlineGroup)> {
        self.map
            .range(..=head_slot)
            .flat_map(|(&slot, groups)| groups.iter().map(move |g| (slot, g)))
            .collect()
    }

    /// Drop every validator entry at or before `head_slot` whose pubkey is
    /// not in `reported`; entries past `head_slot` haven't been through a
    /// verification pass yet and are left untouched regardless of
    /// `reported`. A pubkey lands in `reported` on successful submission
    /// and is pulled back out the moment the penalty-applicability check
    /// turns false, so surviving cleanup means "still owed a re-check" —
    /// not "already reported".
    pub fn cleanup(&mut self, head_slot: Slot, reported: &ReportedSet) {
        self.map.retain(|&slot, groups| {
            if slot > head_slot {
                return true;
            }
            for group in groups.iter_mut() {
                group.entries.retain(|entry| reported.contains(&entry.validator.pubkey));
            }
            groups.retain(|group| !group.entries.is_empty());
            !groups.is_empty()
        });
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.map
            .values()
            .flat_map(|groups| groups.iter())
            .map(|g| g.entries.len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Pubkeys of validators already confirmed on-chain. Persisted across
/// restarts alongside [`ValidatorStore`] so a crash mid-cycle never
/// resubmits an already-reported validator.
#[derive(Debug, Default, Clone)]
pub struct ReportedSet {
    pubkeys: HashSet<[u8; 48]>,
}

impl ReportedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pubkey: [u8; 48]) -> bool {
        self.pubkeys.insert(pubkey)
    }

    /// Pulled out when a later cycle's penalty-applicability check returns
    /// false for an already-reported pubkey, so the next cleanup forgets it.
    pub fn remove(&mut self, pubkey: &[u8; 48]) -> bool {
        self.pubkeys.remove(pubkey)
    }

    #[must_use]
    pub fn contains(&self, pubkey: &[u8; 48]) -> bool {
        self.pubkeys.contains(pubkey)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &[u8; 48]> {
        self.pubkeys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecodedValidator, DeadlineEntry, ExitRequest};

    fn group(pubkeys: &[[u8; 48]]) -> DeadlineGroup {
        DeadlineGroup {
            exit_request: ExitRequest {
                exit_requests_hash: [0u8; 32],
                packed_data: vec![],
                data_format: 0,
                delivered_timestamp: 0,
            },
            entries: pubkeys
                .iter()
                .enumerate()
                .map(|(i, pk)| DeadlineEntry {
                    validator: DecodedValidator {
                        exit_data_index: i as u32,
                        module_id: 1,
                        node_op_id: 1,
                        validator_index: i as u64,
                        pubkey: *pk,
                    },
                    activation_epoch: 0,
                    exit_deadline_epoch: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn eligible_entries_only_returns_past_slots() {
        let mut store = ValidatorStore::new();
        store.add(100, group(&[[1u8; 48]]));
        store.add(200, group(&[[2u8; 48]]));

        let eligible = store.eligible_entries(150);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].0, 100);
    }

    #[test]
    fn cleanup_drops_unreported_entries_but_keeps_reported_ones() {
        let mut store = ValidatorStore::new();
        store.add(100, group(&[[1u8; 48], [2u8; 48]]));

        let mut reported = ReportedSet::new();
        reported.insert([1u8; 48]);

        store.cleanup(100, &reported);
        assert_eq!(store.validator_count(), 1, "only the reported pubkey survives cleanup");

        reported.insert([2u8; 48]);
        store.add(100, group(&[[2u8; 48]]));
        store.cleanup(100, &reported);
        assert_eq!(store.validator_count(), 2);
    }

    #[test]
    fn cleanup_drops_empty_slots() {
        let mut store = ValidatorStore::new();
        store.add(100, group(&[[1u8; 48]]));
        let reported = ReportedSet::new();
        store.cleanup(100, &reported);
        assert_eq!(store.slot_count(), 0);
    }

    #[test]
    fn cleanup_leaves_future_slots_untouched() {
        let mut store = ValidatorStore::new();
        store.add(200, group(&[[1u8; 48]]));
        let reported = ReportedSet::new();

        store.cleanup(100, &reported);
        assert_eq!(store.validator_count(), 1, "deadline hasn't arrived yet, nothing to clean up");
    }
}
