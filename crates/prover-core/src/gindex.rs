//! Generalized Index Computation
//!
//! Computes generalized indices (gindices) for SSZ Merkle proofs: root = 1,
//! left child = `2*i`, right child = `2*i+1`. Field indices into
//! `BeaconState` are stable across forks (later forks only append fields),
//! so the only thing that varies by fork is the state's own tree depth —
//! see `ssz_types::ForkName`.

use crate::ssz_types::ForkName;

/// Calculator for generalized indices in the beacon-state and
/// beacon-block-header trees.
#[derive(Debug, Clone, Copy)]
pub struct GindexCalculator {
    pub fork: ForkName,
}

impl GindexCalculator {
    // BeaconBlockHeader has 5 fields -> tree depth 3 (2^3 = 8 >= 5).
    const HEADER_TREE_DEPTH: u32 = 3;
    const HEADER_BASE_GINDEX: u64 = 1 << Self::HEADER_TREE_DEPTH;
    const STATE_ROOT_FIELD_INDEX: u64 = 3;

    // Validator has 8 fields -> tree depth 3 (2^3 = 8).
    const VALIDATOR_TREE_DEPTH: u32 = 3;
    const VALIDATOR_BASE_GINDEX: u64 = 1 << Self::VALIDATOR_TREE_DEPTH;

    // HistoricalSummary has 2 fields -> tree depth 1.
    const SUMMARY_TREE_DEPTH: u32 = 1;
    const SUMMARY_BASE_GINDEX: u64 = 1 << Self::SUMMARY_TREE_DEPTH;
    const BLOCK_SUMMARY_ROOT_FIELD_INDEX: u64 = 0;

    #[must_use]
    pub const fn new(fork: ForkName) -> Self {
        Self { fork }
    }

    fn state_base_gindex(self) -> u64 {
        1 << self.fork.tree_depth()
    }

    /// gindex of `state_root` within a `BeaconBlockHeader`.
    #[must_use]
    pub fn state_root_in_header(self) -> u64 {
        Self::HEADER_BASE_GINDEX + Self::STATE_ROOT_FIELD_INDEX
    }

    /// gindex of the `validators` list field within `BeaconState`.
    #[must_use]
    pub fn validators_in_state(self) -> u64 {
        self.state_base_gindex() + self.fork.validators_field_index()
    }

    /// gindex of the `historical_summaries` list field within `BeaconState`.
    #[must_use]
    pub fn historical_summaries_in_state(self) -> u64 {
        self.state_base_gindex() + self.fork.historical_summaries_field_index()
    }

    /// gindex of `validators[index]`'s whole container root, anchored at a
    /// beacon *block root* (header -> state_root -> validators -> element).
    #[must_use]
    pub fn validator_container_gindex(self, validator_index: u64, validators_tree_depth: u32) -> u64 {
        let element_in_data = (1_u64 << validators_tree_depth) + validator_index;
        Self::concat_gindices(&[
            self.state_root_in_header(),
            self.validators_in_state(),
            2, // data_root of the List
            element_in_data,
        ])
    }

    /// gindex of `historical_summaries[index].block_summary_root`, anchored
    /// at a beacon block root.
    #[must_use]
    pub fn historical_summary_block_root_gindex(self, summary_index: u64, summaries_tree_depth: u32) -> u64 {
        let element_in_data = (1_u64 << summaries_tree_depth) + summary_index;
        let block_summary_root_in_summary =
            Self::SUMMARY_BASE_GINDEX + Self::BLOCK_SUMMARY_ROOT_FIELD_INDEX;
        Self::concat_gindices(&[
            self.state_root_in_header(),
            self.historical_summaries_in_state(),
            2, // data_root of the List
            element_in_data,
            block_summary_root_in_summary,
        ])
    }

    /// gindex of `block_roots[index]` within a summary era's block-roots
    /// vector (a fixed-size `Vector`, so no length mixin).
    #[must_use]
    pub fn block_root_in_vector_gindex(index: u64, vector_tree_depth: u32) -> u64 {
        (1_u64 << vector_tree_depth) + index
    }

    /// Depth of the validators list's data tree: `log2(VALIDATOR_REGISTRY_LIMIT)`.
    #[must_use]
    pub const fn validators_tree_depth() -> u32 {
        40
    }

    /// Depth of the historical-summaries list's data tree: `log2(HISTORICAL_ROOTS_LIMIT)`.
    #[must_use]
    pub const fn historical_summaries_tree_depth() -> u32 {
        24
    }

    /// Depth of one era's `block_roots` vector: `log2(SLOTS_PER_HISTORICAL_ROOT)`.
    #[must_use]
    pub const fn block_roots_vector_depth() -> u32 {
        13
    }

    /// Depth of `BeaconBlockHeader`'s own 5-field tree.
    #[must_use]
    pub const fn header_tree_depth() -> u32 {
        Self::HEADER_TREE_DEPTH
    }

    /// Field index of `state_root` within `BeaconBlockHeader`.
    #[must_use]
    pub const fn state_root_field_index() -> u64 {
        Self::STATE_ROOT_FIELD_INDEX
    }

    /// Concatenate generalized indices along a path: given a sequence of
    /// gindices each relative to the root of the previous step's subtree,
    /// compute one absolute gindex from the outermost root.
    #[must_use]
    pub fn concat_gindices(gindices: &[u64]) -> u64 {
        let mut result = 1_u64;
        for &gindex in gindices {
            let depth = Self::gindex_depth(gindex);
            result = (result << depth) | (gindex ^ (1_u64 << depth));
        }
        result
    }

    /// `floor(log2(gindex))`: the number of proof witnesses for this gindex.
    #[must_use]
    pub const fn gindex_depth(gindex: u64) -> u32 {
        63 - gindex.leading_zeros()
    }

    /// Expected proof length (witness count) for a validator container proof.
    #[must_use]
    pub fn validator_proof_length(self) -> u32 {
        Self::gindex_depth(self.validator_container_gindex(0, Self::validators_tree_depth()))
    }

    /// Expected proof length (witness count) for a historical-summary proof,
    /// before the block-roots sub-proof is appended (see `proof.rs`).
    #[must_use]
    pub fn historical_summary_proof_length(self) -> u32 {
        Self::gindex_depth(self.historical_summary_block_root_gindex(0, Self::historical_summaries_tree_depth()))
    }
}
