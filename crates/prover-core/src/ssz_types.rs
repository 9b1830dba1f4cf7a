//! Fork-Aware BeaconState SSZ Types
//!
//! Defines the SSZ containers needed to deserialize a beacon state for each
//! of the four supported forks (capella, deneb, electra, fulu) and to
//! compute Merkle proofs over them. Capella and Deneb share one field
//! layout (28 fields); Electra and Fulu share another (37 fields) since
//! Fulu's PeerDAS changes do not touch the `BeaconState` container.
//!
//! List/vector limits are the production consensus-spec presets
//! (`VALIDATOR_REGISTRY_LIMIT = 2^40`, `HISTORICAL_SUMMARIES_LIMIT = 2^24`,
//! `SLOTS_PER_HISTORICAL_ROOT = 2^13`). `BeaconConfig::slots_per_historical_root`
//! is a runtime value used for arithmetic only; `beacon_client` asserts it
//! matches `SLOTS_PER_HISTORICAL_ROOT` below at startup, since the SSZ
//! container's vector length is necessarily a compile-time constant.

use ssz_rs::prelude::*;

/// Consensus-spec preset constant: length of `block_roots`/`state_roots`.
pub const SLOTS_PER_HISTORICAL_ROOT: usize = 8192;
/// Consensus-spec preset constant: `validators` list capacity (2^40).
pub const VALIDATOR_REGISTRY_LIMIT: usize = 1_099_511_627_776;
/// Consensus-spec preset constant: `historical_summaries`/`historical_roots` capacity (2^24).
pub const HISTORICAL_ROOTS_LIMIT: usize = 16_777_216;
/// Consensus-spec preset constant: `eth1_data_votes` capacity.
pub const ETH1_DATA_VOTES_LIMIT: usize = 2048;
/// Consensus-spec preset constant: `pending_deposits` capacity (Electra+).
pub const PENDING_DEPOSITS_LIMIT: usize = 134_217_728;
/// Consensus-spec preset constant: `pending_partial_withdrawals` capacity (Electra+).
pub const PENDING_PARTIAL_WITHDRAWALS_LIMIT: usize = 134_217_728;
/// Consensus-spec preset constant: `pending_consolidations` capacity (Electra+).
pub const PENDING_CONSOLIDATIONS_LIMIT: usize = 262_144;

/// The four fork names this prover understands. Anything else is a fatal
/// `UnsupportedFork` at the beacon-client layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForkName {
    Capella,
    Deneb,
    Electra,
    Fulu,
}

impl ForkName {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "capella" => Some(Self::Capella),
            "deneb" => Some(Self::Deneb),
            "electra" => Some(Self::Electra),
            "fulu" => Some(Self::Fulu),
            _ => None,
        }
    }

    /// Total number of top-level `BeaconState` fields for this fork.
    #[must_use]
    pub const fn field_count(self) -> usize {
        match self {
            Self::Capella | Self::Deneb => 28,
            Self::Electra | Self::Fulu => 37,
        }
    }

    /// `ceil(log2(field_count))`: the depth of the state's own Merkle tree.
    #[must_use]
    pub fn tree_depth(self) -> u32 {
        (self.field_count() as u64).next_power_of_two().trailing_zeros()
    }

    /// Field index of `validators` — stable across every fork since later
    /// forks only ever append fields.
    #[must_use]
    pub const fn validators_field_index(self) -> u64 {
        11
    }

    /// Field index of `historical_summaries` — introduced in Capella,
    /// stable in every later fork for the same reason.
    #[must_use]
    pub const fn historical_summaries_field_index(self) -> u64 {
        27
    }
}

/// Checkpoint for fork choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: [u8; 32],
}

/// Eth1 deposit data.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Eth1Data {
    pub deposit_root: [u8; 32],
    pub deposit_count: u64,
    pub block_hash: [u8; 32],
}

/// Fork data.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Fork {
    pub previous_version: [u8; 4],
    pub current_version: [u8; 4],
    pub epoch: u64,
}

/// Beacon block header, in its SSZ-provable shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}

impl From<BeaconBlockHeader> for crate::model::BlockHeaderFields {
    fn from(h: BeaconBlockHeader) -> Self {
        Self {
            slot: h.slot,
            proposer_index: h.proposer_index,
            parent_root: h.parent_root,
            state_root: h.state_root,
            body_root: h.body_root,
        }
    }
}

impl From<crate::model::BlockHeaderFields> for BeaconBlockHeader {
    fn from(f: crate::model::BlockHeaderFields) -> Self {
        Self {
            slot: f.slot,
            proposer_index: f.proposer_index,
            parent_root: f.parent_root,
            state_root: f.state_root,
            body_root: f.body_root,
        }
    }
}

/// Validator record. Field order/indices are load-bearing: see
/// `GindexCalculator` in `gindex.rs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Validator {
    pub pubkey: Vector<u8, 48>,
    pub withdrawal_credentials: [u8; 32],
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: u64,
    pub activation_epoch: u64,
    pub exit_epoch: u64,
    pub withdrawable_epoch: u64,
}

/// Historical summary entry: root of a past era's block-roots and
/// state-roots vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct HistoricalSummary {
    pub block_summary_root: [u8; 32],
    pub state_summary_root: [u8; 32],
}

/// Sync committee (Altair+). Not consulted by any prover operation but
/// required for the state's field layout to hash correctly.
#[derive(Debug, Clone, PartialEq, Eq, SimpleSerialize)]
pub struct SyncCommittee {
    pub pubkeys: Vector<Vector<u8, 48>, 512>,
    pub aggregate_pubkey: Vector<u8, 48>,
}

impl Default for SyncCommittee {
    fn default() -> Self {
        Self { pubkeys: Vector::default(), aggregate_pubkey: Vector::default() }
    }
}

/// Execution payload header, Capella shape (no blob-gas fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ExecutionPayloadHeaderCapella {
    pub parent_hash: [u8; 32],
    pub fee_recipient: [u8; 20],
    pub state_root: [u8; 32],
    pub receipts_root: [u8; 32],
    pub logs_bloom: Vector<u8, 256>,
    pub prev_randao: [u8; 32],
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: List<u8, 32>,
    pub base_fee_per_gas: U256,
    pub block_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub withdrawals_root: [u8; 32],
}

/// Execution payload header, Deneb/Electra/Fulu shape (adds blob-gas fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ExecutionPayloadHeaderDeneb {
    pub parent_hash: [u8; 32],
    pub fee_recipient: [u8; 20],
    pub state_root: [u8; 32],
    pub receipts_root: [u8; 32],
    pub logs_bloom: Vector<u8, 256>,
    pub prev_randao: [u8; 32],
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: List<u8, 32>,
    pub base_fee_per_gas: U256,
    pub block_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub withdrawals_root: [u8; 32],
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

/// Pending deposit entry (Electra+).
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct PendingDeposit {
    pub pubkey: Vector<u8, 48>,
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
    pub signature: Vector<u8, 96>,
    pub slot: u64,
}

/// Pending partial withdrawal (Electra+).
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct PendingPartialWithdrawal {
    pub index: u64,
    pub amount: u64,
    pub withdrawable_epoch: u64,
}

/// Pending consolidation (Electra+). Retained from the teacher's
/// consolidation-incentives use of this same field; unused by this prover's
/// own logic but required for the state's field layout to hash correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct PendingConsolidation {
    pub source_index: u64,
    pub target_index: u64,
}

/// `BeaconState`, Capella/Deneb field layout (28 fields).
#[derive(Debug, Clone, SimpleSerialize)]
pub struct CapellaBeaconState {
    pub genesis_time: u64,
    pub genesis_validators_root: [u8; 32],
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub state_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub historical_roots: List<[u8; 32], HISTORICAL_ROOTS_LIMIT>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: List<Eth1Data, ETH1_DATA_VOTES_LIMIT>,
    pub eth1_deposit_index: u64,
    pub validators: List<Validator, VALIDATOR_REGISTRY_LIMIT>,
    pub balances: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub randao_mixes: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub slashings: Vector<u64, SLOTS_PER_HISTORICAL_ROOT>,
    pub previous_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub current_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub justification_bits: Bitvector<4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub current_sync_committee: SyncCommittee,
    pub next_sync_committee: SyncCommittee,
    pub latest_execution_payload_header: ExecutionPayloadHeaderCapella,
    pub next_withdrawal_index: u64,
    pub next_withdrawal_validator_index: u64,
    pub historical_summaries: List<HistoricalSummary, HISTORICAL_ROOTS_LIMIT>,
}

impl Default for CapellaBeaconState {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            genesis_validators_root: [0; 32],
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Vector::default(),
            state_roots: Vector::default(),
            historical_roots: List::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: List::default(),
            eth1_deposit_index: 0,
            validators: List::default(),
            balances: List::default(),
            randao_mixes: Vector::default(),
            slashings: Vector::default(),
            previous_epoch_participation: List::default(),
            current_epoch_participation: List::default(),
            justification_bits: Bitvector::default(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            inactivity_scores: List::default(),
            current_sync_committee: SyncCommittee::default(),
            next_sync_committee: SyncCommittee::default(),
            latest_execution_payload_header: ExecutionPayloadHeaderCapella::default(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            historical_summaries: List::default(),
        }
    }
}

/// `BeaconState`, Deneb field layout — identical to Capella's, only the
/// execution payload header type differs (blob-gas fields).
#[derive(Debug, Clone, SimpleSerialize)]
pub struct DenebBeaconState {
    pub genesis_time: u64,
    pub genesis_validators_root: [u8; 32],
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub state_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub historical_roots: List<[u8; 32], HISTORICAL_ROOTS_LIMIT>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: List<Eth1Data, ETH1_DATA_VOTES_LIMIT>,
    pub eth1_deposit_index: u64,
    pub validators: List<Validator, VALIDATOR_REGISTRY_LIMIT>,
    pub balances: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub randao_mixes: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub slashings: Vector<u64, SLOTS_PER_HISTORICAL_ROOT>,
    pub previous_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub current_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub justification_bits: Bitvector<4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub current_sync_committee: SyncCommittee,
    pub next_sync_committee: SyncCommittee,
    pub latest_execution_payload_header: ExecutionPayloadHeaderDeneb,
    pub next_withdrawal_index: u64,
    pub next_withdrawal_validator_index: u64,
    pub historical_summaries: List<HistoricalSummary, HISTORICAL_ROOTS_LIMIT>,
}

impl Default for DenebBeaconState {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            genesis_validators_root: [0; 32],
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Vector::default(),
            state_roots: Vector::default(),
            historical_roots: List::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: List::default(),
            eth1_deposit_index: 0,
            validators: List::default(),
            balances: List::default(),
            randao_mixes: Vector::default(),
            slashings: Vector::default(),
            previous_epoch_participation: List::default(),
            current_epoch_participation: List::default(),
            justification_bits: Bitvector::default(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            inactivity_scores: List::default(),
            current_sync_committee: SyncCommittee::default(),
            next_sync_committee: SyncCommittee::default(),
            latest_execution_payload_header: ExecutionPayloadHeaderDeneb::default(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            historical_summaries: List::default(),
        }
    }
}

/// `BeaconState`, Electra/Fulu field layout (37 fields).
#[derive(Debug, Clone, SimpleSerialize)]
pub struct ElectraBeaconState {
    pub genesis_time: u64,
    pub genesis_validators_root: [u8; 32],
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub state_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub historical_roots: List<[u8; 32], HISTORICAL_ROOTS_LIMIT>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: List<Eth1Data, ETH1_DATA_VOTES_LIMIT>,
    pub eth1_deposit_index: u64,
    pub validators: List<Validator, VALIDATOR_REGISTRY_LIMIT>,
    pub balances: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub randao_mixes: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub slashings: Vector<u64, SLOTS_PER_HISTORICAL_ROOT>,
    pub previous_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub current_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub justification_bits: Bitvector<4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub current_sync_committee: SyncCommittee,
    pub next_sync_committee: SyncCommittee,
    pub latest_execution_payload_header: ExecutionPayloadHeaderDeneb,
    pub next_withdrawal_index: u64,
    pub next_withdrawal_validator_index: u64,
    pub historical_summaries: List<HistoricalSummary, HISTORICAL_ROOTS_LIMIT>,
    pub deposit_requests_start_index: u64,
    pub deposit_balance_to_consume: u64,
    pub exit_balance_to_consume: u64,
    pub earliest_exit_epoch: u64,
    pub consolidation_balance_to_consume: u64,
    pub earliest_consolidation_epoch: u64,
    pub pending_deposits: List<PendingDeposit, PENDING_DEPOSITS_LIMIT>,
    pub pending_partial_withdrawals: List<PendingPartialWithdrawal, PENDING_PARTIAL_WITHDRAWALS_LIMIT>,
    pub pending_consolidations: List<PendingConsolidation, PENDING_CONSOLIDATIONS_LIMIT>,
}

impl Default for ElectraBeaconState {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            genesis_validators_root: [0; 32],
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Vector::default(),
            state_roots: Vector::default(),
            historical_roots: List::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: List::default(),
            eth1_deposit_index: 0,
            validators: List::default(),
            balances: List::default(),
            randao_mixes: Vector::default(),
            slashings: Vector::default(),
            previous_epoch_participation: List::default(),
            current_epoch_participation: List::default(),
            justification_bits: Bitvector::default(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            inactivity_scores: List::default(),
            current_sync_committee: SyncCommittee::default(),
            next_sync_committee: SyncCommittee::default(),
            latest_execution_payload_header: ExecutionPayloadHeaderDeneb::default(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            historical_summaries: List::default(),
            deposit_requests_start_index: 0,
            deposit_balance_to_consume: 0,
            exit_balance_to_consume: 0,
            earliest_exit_epoch: 0,
            consolidation_balance_to_consume: 0,
            earliest_consolidation_epoch: 0,
            pending_deposits: List::default(),
            pending_partial_withdrawals: List::default(),
            pending_consolidations: List::default(),
        }
    }
}

/// Fulu has not changed the `BeaconState` container relative to Electra.
pub type FuluBeaconState = ElectraBeaconState;

/// Fork-tagged view over a deserialized beacon state. Call sites that only
/// need the handful of fields the prover actually reads (slot, validator
/// lookups, historical summaries, block roots) go through this instead of
/// matching on the four container types directly.
#[derive(Debug, Clone)]
pub enum BeaconStateView {
    Capella(Box<CapellaBeaconState>),
    Deneb(Box<DenebBeaconState>),
    Electra(Box<ElectraBeaconState>),
    Fulu(Box<FuluBeaconState>),
}

impl BeaconStateView {
    /// Deserialize raw SSZ bytes (as returned by the beacon API's
    /// `/eth/v2/debug/beacon/states/{id}` endpoint) into the variant named
    /// by `fork`, which the caller reads off the response's
    /// `Eth-Consensus-Version` header.
    pub fn from_ssz_bytes(bytes: &[u8], fork: ForkName) -> Result<Self, ssz_rs::DeserializeError> {
        Ok(match fork {
            ForkName::Capella => Self::Capella(Box::new(ssz_rs::deserialize(bytes)?)),
            ForkName::Deneb => Self::Deneb(Box::new(ssz_rs::deserialize(bytes)?)),
            ForkName::Electra => Self::Electra(Box::new(ssz_rs::deserialize(bytes)?)),
            ForkName::Fulu => Self::Fulu(Box::new(ssz_rs::deserialize(bytes)?)),
        })
    }

    #[must_use]
    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Capella(_) => ForkName::Capella,
            Self::Deneb(_) => ForkName::Deneb,
            Self::Electra(_) => ForkName::Electra,
            Self::Fulu(_) => ForkName::Fulu,
        }
    }

    #[must_use]
    pub fn slot(&self) -> u64 {
        match self {
            Self::Capella(s) => s.slot,
            Self::Deneb(s) => s.slot,
            Self::Electra(s) => s.slot,
            Self::Fulu(s) => s.slot,
        }
    }

    pub fn hash_tree_root(&self) -> Result<[u8; 32], MerkleizationError> {
        let root = match self {
            Self::Capella(s) => s.clone().hash_tree_root()?,
            Self::Deneb(s) => s.clone().hash_tree_root()?,
            Self::Electra(s) => s.clone().hash_tree_root()?,
            Self::Fulu(s) => s.clone().hash_tree_root()?,
        };
        Ok(root.into())
    }

    /// Hash-tree-root of every top-level field, in declaration order. This
    /// is the leaf layer [`crate::proof`] builds the state-level Merkle
    /// proof over — computing it field-by-field instead of relying on
    /// `ssz_rs`'s `Prove` trait is exactly the memory-avoidance technique
    /// `sparse_proof` documents, now applied one level up at the container
    /// itself.
    pub fn field_roots(&self) -> Result<Vec<[u8; 32]>, MerkleizationError> {
        macro_rules! root_of {
            ($field:expr) => {{
                let mut v = $field.clone();
                let r: [u8; 32] = v.hash_tree_root()?.into();
                r
            }};
        }

        let roots = match self {
            Self::Capella(s) => vec![
                root_of!(s.genesis_time),
                root_of!(s.genesis_validators_root),
                root_of!(s.slot),
                root_of!(s.fork),
                root_of!(s.latest_block_header),
                root_of!(s.block_roots),
                root_of!(s.state_roots),
                root_of!(s.historical_roots),
                root_of!(s.eth1_data),
                root_of!(s.eth1_data_votes),
                root_of!(s.eth1_deposit_index),
                root_of!(s.validators),
                root_of!(s.balances),
                root_of!(s.randao_mixes),
                root_of!(s.slashings),
                root_of!(s.previous_epoch_participation),
                root_of!(s.current_epoch_participation),
                root_of!(s.justification_bits),
                root_of!(s.previous_justified_checkpoint),
                root_of!(s.current_justified_checkpoint),
                root_of!(s.finalized_checkpoint),
                root_of!(s.inactivity_scores),
                root_of!(s.current_sync_committee),
                root_of!(s.next_sync_committee),
                root_of!(s.latest_execution_payload_header),
                root_of!(s.next_withdrawal_index),
                root_of!(s.next_withdrawal_validator_index),
                root_of!(s.historical_summaries),
            ],
            Self::Deneb(s) => vec![
                root_of!(s.genesis_time),
                root_of!(s.genesis_validators_root),
                root_of!(s.slot),
                root_of!(s.fork),
                root_of!(s.latest_block_header),
                root_of!(s.block_roots),
                root_of!(s.state_roots),
                root_of!(s.historical_roots),
                root_of!(s.eth1_data),
                root_of!(s.eth1_data_votes),
                root_of!(s.eth1_deposit_index),
                root_of!(s.validators),
                root_of!(s.balances),
                root_of!(s.randao_mixes),
                root_of!(s.slashings),
                root_of!(s.previous_epoch_participation),
                root_of!(s.current_epoch_participation),
                root_of!(s.justification_bits),
                root_of!(s.previous_justified_checkpoint),
                root_of!(s.current_justified_checkpoint),
                root_of!(s.finalized_checkpoint),
                root_of!(s.inactivity_scores),
                root_of!(s.current_sync_committee),
                root_of!(s.next_sync_committee),
                root_of!(s.latest_execution_payload_header),
                root_of!(s.next_withdrawal_index),
                root_of!(s.next_withdrawal_validator_index),
                root_of!(s.historical_summaries),
            ],
            Self::Electra(s) | Self::Fulu(s) => vec![
                root_of!(s.genesis_time),
                root_of!(s.genesis_validators_root),
                root_of!(s.slot),
                root_of!(s.fork),
                root_of!(s.latest_block_header),
                root_of!(s.block_roots),
                root_of!(s.state_roots),
                root_of!(s.historical_roots),
                root_of!(s.eth1_data),
                root_of!(s.eth1_data_votes),
                root_of!(s.eth1_deposit_index),
                root_of!(s.validators),
                root_of!(s.balances),
                root_of!(s.randao_mixes),
                root_of!(s.slashings),
                root_of!(s.previous_epoch_participation),
                root_of!(s.current_epoch_participation),
                root_of!(s.justification_bits),
                root_of!(s.previous_justified_checkpoint),
                root_of!(s.current_justified_checkpoint),
                root_of!(s.finalized_checkpoint),
                root_of!(s.inactivity_scores),
                root_of!(s.current_sync_committee),
                root_of!(s.next_sync_committee),
                root_of!(s.latest_execution_payload_header),
                root_of!(s.next_withdrawal_index),
                root_of!(s.next_withdrawal_validator_index),
                root_of!(s.historical_summaries),
                root_of!(s.deposit_requests_start_index),
                root_of!(s.deposit_balance_to_consume),
                root_of!(s.exit_balance_to_consume),
                root_of!(s.earliest_exit_epoch),
                root_of!(s.consolidation_balance_to_consume),
                root_of!(s.earliest_consolidation_epoch),
                root_of!(s.pending_deposits),
                root_of!(s.pending_partial_withdrawals),
                root_of!(s.pending_consolidations),
            ],
        };
        Ok(roots)
    }

    #[must_use]
    pub fn validators_len(&self) -> usize {
        match self {
            Self::Capella(s) => s.validators.len(),
            Self::Deneb(s) => s.validators.len(),
            Self::Electra(s) => s.validators.len(),
            Self::Fulu(s) => s.validators.len(),
        }
    }

    #[must_use]
    pub fn validator(&self, index: usize) -> Option<&Validator> {
        match self {
            Self::Capella(s) => s.validators.get(index),
            Self::Deneb(s) => s.validators.get(index),
            Self::Electra(s) => s.validators.get(index),
            Self::Fulu(s) => s.validators.get(index),
        }
    }

    /// Hash-tree-root of every validator entry, in order. Used to build a
    /// sparse proof of `validators[i]` without materializing a `2^40`-leaf
    /// tree (see `sparse_proof::prove_against_leaf_chunks`).
    pub fn validator_hashes(&self) -> Result<Vec<[u8; 32]>, MerkleizationError> {
        let len = self.validators_len();
        (0..len)
            .map(|i| {
                let mut v = self.validator(i).expect("in range").clone();
                Ok(v.hash_tree_root()?.into())
            })
            .collect()
    }

    #[must_use]
    pub fn historical_summaries_len(&self) -> usize {
        match self {
            Self::Capella(s) => s.historical_summaries.len(),
            Self::Deneb(s) => s.historical_summaries.len(),
            Self::Electra(s) => s.historical_summaries.len(),
            Self::Fulu(s) => s.historical_summaries.len(),
        }
    }

    #[must_use]
    pub fn historical_summary(&self, index: usize) -> Option<&HistoricalSummary> {
        match self {
            Self::Capella(s) => s.historical_summaries.get(index),
            Self::Deneb(s) => s.historical_summaries.get(index),
            Self::Electra(s) => s.historical_summaries.get(index),
            Self::Fulu(s) => s.historical_summaries.get(index),
        }
    }

    pub fn historical_summary_hashes(&self) -> Result<Vec<[u8; 32]>, MerkleizationError> {
        let len = self.historical_summaries_len();
        (0..len)
            .map(|i| {
                let mut summary = self.historical_summary(i).expect("in range").clone();
                Ok(summary.hash_tree_root()?.into())
            })
            .collect()
    }

    /// `block_roots`, as 32-byte leaf chunks, for a *summary* state fetched
    /// to patch a historical-summary proof (see `proof::build_historical_state_proof`).
    #[must_use]
    pub fn block_roots(&self) -> Vec<[u8; 32]> {
        match self {
            Self::Capella(s) => s.block_roots.to_vec(),
            Self::Deneb(s) => s.block_roots.to_vec(),
            Self::Electra(s) => s.block_roots.to_vec(),
            Self::Fulu(s) => s.block_roots.to_vec(),
        }
    }

    pub fn latest_block_header(&self) -> BeaconBlockHeader {
        match self {
            Self::Capella(s) => s.latest_block_header.clone(),
            Self::Deneb(s) => s.latest_block_header.clone(),
            Self::Electra(s) => s.latest_block_header.clone(),
            Self::Fulu(s) => s.latest_block_header.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_field_counts_match_layouts() {
        assert_eq!(ForkName::Capella.field_count(), 28);
        assert_eq!(ForkName::Deneb.field_count(), 28);
        assert_eq!(ForkName::Electra.field_count(), 37);
        assert_eq!(ForkName::Fulu.field_count(), 37);
        assert_eq!(ForkName::Capella.tree_depth(), 5);
        assert_eq!(ForkName::Electra.tree_depth(), 6);
    }

    #[test]
    fn fork_parse_is_case_insensitive() {
        assert_eq!(ForkName::parse("Electra"), Some(ForkName::Electra));
        assert_eq!(ForkName::parse("bogus"), None);
    }

    #[test]
    fn validator_ssz_roundtrip() {
        let mut validator = Validator::default();
        validator.effective_balance = 32_000_000_000;
        validator.activation_epoch = 100;
        validator.withdrawal_credentials[0] = 0x01;

        let encoded = ssz_rs::serialize(&validator).expect("serialize");
        let decoded: Validator = ssz_rs::deserialize(&encoded).expect("deserialize");
        assert_eq!(validator, decoded);
    }

    #[test]
    fn field_roots_length_matches_field_count() {
        let capella = BeaconStateView::Capella(Box::new(CapellaBeaconState::default()));
        assert_eq!(capella.field_roots().unwrap().len(), ForkName::Capella.field_count());

        let electra = BeaconStateView::Electra(Box::new(ElectraBeaconState::default()));
        assert_eq!(electra.field_roots().unwrap().len(), ForkName::Electra.field_count());
    }

    #[test]
    fn field_roots_combine_to_state_root() {
        use crate::sparse_proof::prove_against_leaf_chunks;

        let mut state = ElectraBeaconState::default();
        state.slot = 42;
        let view = BeaconStateView::Electra(Box::new(state));

        let roots = view.field_roots().unwrap();
        let (_, computed_root) = prove_against_leaf_chunks(&roots, 0, ForkName::Electra.tree_depth());
        assert_eq!(computed_root, view.hash_tree_root().unwrap());
    }

    #[test]
    fn from_ssz_bytes_round_trips_through_fork_dispatch() {
        let mut state = ElectraBeaconState::default();
        state.slot = 777;
        let bytes = ssz_rs::serialize(&state).expect("serialize");
        let view = BeaconStateView::from_ssz_bytes(&bytes, ForkName::Electra).expect("deserialize");
        assert_eq!(view.slot(), 777);
        assert_eq!(view.fork_name(), ForkName::Electra);
    }

    #[test]
    fn beacon_state_view_reads_electra_validators() {
        let mut state = ElectraBeaconState::default();
        let mut v = Validator::default();
        v.activation_epoch = 55;
        state.validators.push(v);
        let view = BeaconStateView::Electra(Box::new(state));
        assert_eq!(view.validators_len(), 1);
        assert_eq!(view.validator(0).unwrap().activation_epoch, 55);
    }
}
