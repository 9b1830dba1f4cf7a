//! Core Data Model
//!
//! The plain-data types shared across every component: slot/epoch/timestamp
//! arithmetic, the beacon-chain configuration read once at startup, decoded
//! exit-request records, the deadline bookkeeping types, and the witness
//! shapes handed to the verifier contract.

use std::collections::BTreeMap;

/// A consensus-layer slot number.
pub type Slot = u64;
/// A consensus-layer epoch number.
pub type Epoch = u64;
/// A unix timestamp in seconds.
pub type Timestamp = u64;
/// A 32-byte SSZ / keccak root.
pub type Root = [u8; 32];

/// The far-future epoch sentinel used by the consensus spec for validators
/// that have not been assigned a withdrawable epoch.
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

/// `slot -> timestamp = genesisTime + slot * secondsPerSlot`.
#[must_use]
pub fn slot_to_timestamp(slot: Slot, genesis_time: Timestamp, seconds_per_slot: u64) -> Timestamp {
    genesis_time + slot * seconds_per_slot
}

/// `epoch -> slot = epoch * slotsPerEpoch`.
#[must_use]
pub const fn epoch_to_slot(epoch: Epoch, slots_per_epoch: u64) -> Slot {
    epoch * slots_per_epoch
}

/// `slot -> epoch = floor(slot / slotsPerEpoch)`.
#[must_use]
pub const fn slot_to_epoch(slot: Slot, slots_per_epoch: u64) -> Epoch {
    slot / slots_per_epoch
}

/// Immutable, process-wide chain configuration. Populated once at startup
/// from CLI configuration plus a read of `SHARD_COMMITTEE_PERIOD_IN_SECONDS`
/// off the verifier contract; never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconConfig {
    pub genesis_time: Timestamp,
    pub seconds_per_slot: u64,
    pub slots_per_epoch: u64,
    pub slots_per_historical_root: u64,
    pub capella_fork_epoch: Epoch,
    pub shard_committee_period_in_seconds: u64,
}

impl BeaconConfig {
    #[must_use]
    pub const fn capella_fork_slot(&self) -> Slot {
        epoch_to_slot(self.capella_fork_epoch, self.slots_per_epoch)
    }

    #[must_use]
    pub fn slot_timestamp(&self, slot: Slot) -> Timestamp {
        slot_to_timestamp(slot, self.genesis_time, self.seconds_per_slot)
    }
}

/// A batch of exit requests delivered by the oracle, identified by the hash
/// of its packed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequest {
    pub exit_requests_hash: Root,
    pub packed_data: Vec<u8>,
    pub data_format: u32,
    /// Fetched from the oracle by `exit_requests_hash`.
    pub delivered_timestamp: Timestamp,
}

/// One validator entry decoded from an `ExitRequest`'s packed payload (C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedValidator {
    /// Ordinal of this entry within the packed payload, assigned sequentially.
    pub exit_data_index: u32,
    pub module_id: u32,
    pub node_op_id: u64,
    pub validator_index: u64,
    pub pubkey: [u8; 48],
}

/// A single validator's position in the deadline pipeline, carried inside a
/// [`DeadlineGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineEntry {
    pub validator: DecodedValidator,
    pub activation_epoch: Epoch,
    pub exit_deadline_epoch: Epoch,
}

/// All validators from one exit request that share a deadline slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineGroup {
    pub exit_request: ExitRequest,
    pub entries: Vec<DeadlineEntry>,
}

/// Persistent-in-memory map `deadlineSlot -> [DeadlineGroup]`, ascending by
/// construction (see [`crate::store::ValidatorStore`] for the operations).
pub type DeadlineMap = BTreeMap<Slot, Vec<DeadlineGroup>>;

/// Output of C2 (proof) + C4 (deadline)/C8 (state read): everything the
/// verifier contract needs to check one validator's exit-delay penalty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorWitness {
    pub exit_request_index: u32,
    pub withdrawal_credentials: Root,
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
    pub validator_proof: Vec<Root>,
    pub module_id: u32,
    pub node_op_id: u64,
    pub pubkey: [u8; 48],
}

/// A beacon block header paired with the timestamp the contract uses to
/// validate it is fresh enough to trust (`rootsTimestamp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvableBeaconBlockHeader {
    pub header: BlockHeaderFields,
    pub roots_timestamp: Timestamp,
}

impl ProvableBeaconBlockHeader {
    #[must_use]
    pub fn new(header: BlockHeaderFields, config: &BeaconConfig) -> Self {
        let roots_timestamp = config.slot_timestamp(header.slot + 1);
        Self { header, roots_timestamp }
    }
}

/// Plain field set of a beacon block header — kept separate from the SSZ
/// container type in [`crate::ssz_types`] so call sites that only need the
/// values (not SSZ-ability) don't have to depend on `ssz_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeaderFields {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body_root: Root,
}

/// Proves that a historical block header is contained in the finalized
/// state's `historicalSummaries[summaryIndex].blockSummaryRoot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalHeaderWitness {
    pub header: BlockHeaderFields,
    pub proof: Vec<Root>,
    /// See `SPEC_FULL.md` §9 / `DESIGN.md` Open Question 2: some contract ABI
    /// variants carry the gindex of the patched leaf explicitly rather than
    /// assuming a fixed one.
    pub root_gindex: u64,
}

/// The wire payload carrying a request's packed data to the verifier
/// contract, mirroring the oracle's own `ExitRequestsData` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequestsData {
    pub data: Vec<u8>,
    pub data_format: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_timestamp_matches_formula() {
        let cfg = BeaconConfig {
            genesis_time: 1_606_824_023,
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            capella_fork_epoch: 0,
            shard_committee_period_in_seconds: 98_304,
        };
        assert_eq!(cfg.slot_timestamp(100), 1_606_824_023 + 1200);
    }

    #[test]
    fn epoch_slot_roundtrip() {
        assert_eq!(slot_to_epoch(epoch_to_slot(7, 32), 32), 7);
    }

    #[test]
    fn provable_header_roots_timestamp() {
        let cfg = BeaconConfig {
            genesis_time: 0,
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            capella_fork_epoch: 0,
            shard_committee_period_in_seconds: 0,
        };
        let header = BlockHeaderFields { slot: 10, ..Default::default() };
        let provable = ProvableBeaconBlockHeader::new(header, &cfg);
        assert_eq!(provable.roots_timestamp, 11 * 12);
    }
}
