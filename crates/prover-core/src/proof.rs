//! Merkle Proof Builder (C2)
//!
//! Combines [`crate::gindex`]'s path arithmetic with [`crate::sparse_proof`]'s
//! zero-hash machinery and [`crate::ssz_types`]'s fork-aware containers into
//! the two proofs the verifier contract needs: a validator's whole-container
//! inclusion proof (current mode) and a historical block header's inclusion
//! proof inside `historicalSummaries` (historical mode), built by patching
//! the real `block_roots` subtree into the summary leaf rather than
//! re-fetching and re-merkleizing the full historical state — see
//! `generate_full_proof_bundle` in the teacher's `state_prover.rs` for the
//! header-wrapping technique this generalizes.

use ssz_rs::prelude::SimpleSerialize;
use thiserror::Error;

use crate::gindex::GindexCalculator;
use crate::model::{BlockHeaderFields, HistoricalHeaderWitness, Root};
use crate::sparse_proof::{mix_in_length, prove_against_leaf_chunks};
use crate::ssz_types::{BeaconBlockHeader, BeaconStateView, Validator};

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("validator index {0} out of bounds (have {1})")]
    ValidatorIndexOutOfBounds(u64, usize),
    #[error("historical summary index {0} out of bounds (have {1})")]
    SummaryIndexOutOfBounds(u64, usize),
    #[error("block roots sibling count {0} does not match vector depth {1}")]
    WrongSiblingCount(usize, u32),
    #[error("merkleization error: {0}")]
    Merkleization(#[from] ssz_rs::MerkleizationError),
    #[error("generated proof failed local verification: {0}")]
    LocalVerificationFailed(String),
}

/// Everything needed to populate a `verifyValidatorExitDelay` call for one
/// validator, anchored at a block root.
#[derive(Debug, Clone)]
pub struct ValidatorProof {
    pub validator: Validator,
    pub proof: Vec<Root>,
    pub block_root: Root,
}

/// Hash-tree-root of each of `BeaconBlockHeader`'s 5 fields, in declaration
/// order, padded to the container's 3-deep, 8-leaf tree by
/// `prove_against_leaf_chunks`.
fn header_field_roots(header: &BeaconBlockHeader) -> Result<Vec<Root>, ProofError> {
    let mut slot = header.slot;
    let mut proposer_index = header.proposer_index;
    let mut parent_root = header.parent_root;
    let mut state_root = header.state_root;
    let mut body_root = header.body_root;
    Ok(vec![
        slot.hash_tree_root()?.into(),
        proposer_index.hash_tree_root()?.into(),
        parent_root.hash_tree_root()?.into(),
        state_root.hash_tree_root()?.into(),
        body_root.hash_tree_root()?.into(),
    ])
}

/// Proof of `state_root`'s path within `header`'s field tree, plus the
/// header's own root.
fn header_state_root_proof(header: &BeaconBlockHeader) -> Result<(Vec<Root>, Root), ProofError> {
    let roots = header_field_roots(header)?;
    let (proof, root) = prove_against_leaf_chunks(
        &roots,
        GindexCalculator::state_root_field_index() as usize,
        GindexCalculator::header_tree_depth(),
    );
    Ok((proof, root))
}

/// Build the Merkle proof of `validators[index]`'s whole container,
/// anchored at `header`'s root, then verifies it locally before returning —
/// a bad proof must never reach the contract, since a reverted transaction
/// still costs gas.
pub fn build_validator_proof(
    state: &BeaconStateView,
    header: &BeaconBlockHeader,
    validator_index: u64,
) -> Result<ValidatorProof, ProofError> {
    let fork = state.fork_name();
    let validators_len = state.validators_len();
    let validator = state
        .validator(validator_index as usize)
        .ok_or(ProofError::ValidatorIndexOutOfBounds(validator_index, validators_len))?
        .clone();

    let hashes = state.validator_hashes()?;
    let data_depth = GindexCalculator::validators_tree_depth();
    let (data_proof, data_root) =
        prove_against_leaf_chunks(&hashes, validator_index as usize, data_depth);

    let list_root = mix_in_length(data_root, validators_len);
    let length_leaf = length_mixin_leaf(validators_len as u64);

    let field_roots = state.field_roots()?;
    let field_depth = fork.tree_depth();
    let (field_proof, field_root) = prove_against_leaf_chunks(
        &field_roots,
        fork.validators_field_index() as usize,
        field_depth,
    );
    debug_assert_eq!(field_roots[fork.validators_field_index() as usize], list_root);
    debug_assert_eq!(field_root, state.hash_tree_root()?);

    let (header_proof, header_root) = header_state_root_proof(header)?;
    debug_assert_eq!(header.state_root, field_root, "header must describe this state");

    let mut proof = data_proof;
    proof.push(length_leaf);
    proof.extend(field_proof);
    proof.extend(header_proof);

    let calc = GindexCalculator::new(fork);
    let gindex = calc.validator_container_gindex(validator_index, data_depth);
    let leaf: Root = hashes[validator_index as usize];
    verify_branch(leaf, &proof, gindex, header_root)?;

    Ok(ValidatorProof { validator, proof, block_root: header_root })
}

/// Build the proof that `historical_header` is the block at
/// `historical_summaries[summary_index]`'s patched `block_summary_root`
/// leaf, anchored at `finalized_header`'s root.
///
/// The summary's `block_summary_root` is itself the root of an entire era's
/// `block_roots` vector; rather than refetch and re-merkleize that whole
/// vector, the proof "patches" the summary leaf: it proves `header_root` is
/// at `block_roots[root_index_in_summary]` within that vector (using the
/// caller-supplied sibling hashes for the rest of the vector), then proves
/// the resulting vector root equals `historical_summaries[summary_index].block_summary_root`
/// against the finalized state, then proves that field against the
/// finalized block root.
pub fn build_historical_state_proof(
    finalized_state: &BeaconStateView,
    finalized_header: &BeaconBlockHeader,
    historical_header: &BeaconBlockHeader,
    summary_index: u64,
    root_index_in_summary: u64,
    block_roots_siblings: &[Root],
) -> Result<HistoricalHeaderWitness, ProofError> {
    let fork = finalized_state.fork_name();
    let calc = GindexCalculator::new(fork);

    let summaries_len = finalized_state.historical_summaries_len();
    if summary_index as usize >= summaries_len {
        return Err(ProofError::SummaryIndexOutOfBounds(summary_index, summaries_len));
    }

    let vector_depth = GindexCalculator::block_roots_vector_depth();
    if block_roots_siblings.len() != vector_depth as usize {
        return Err(ProofError::WrongSiblingCount(block_roots_siblings.len(), vector_depth));
    }

    let historical_header_root: Root = historical_header.clone().hash_tree_root()?.into();

    // Layer 1: historical_header_root's position within the era's block_roots vector.
    let vector_proof = block_roots_siblings.to_vec();

    // Layer 2: historical_summaries[summary_index].block_summary_root field
    // within the HistoricalSummary container (2 fields -> depth 1, field 0).
    let summary = finalized_state
        .historical_summary(summary_index as usize)
        .ok_or(ProofError::SummaryIndexOutOfBounds(summary_index, summaries_len))?;
    let summary_field_proof = vec![summary.state_summary_root];

    // Layer 3: historical_summaries[summary_index] within the list's data tree.
    let summary_hashes = finalized_state.historical_summary_hashes()?;
    let summaries_depth = GindexCalculator::historical_summaries_tree_depth();
    let (summary_list_proof, _) =
        prove_against_leaf_chunks(&summary_hashes, summary_index as usize, summaries_depth);
    let summary_length_leaf = length_mixin_leaf(summaries_len as u64);

    // Layer 4: historical_summaries field within the state container.
    let field_roots = finalized_state.field_roots()?;
    let field_depth = fork.tree_depth();
    let (field_proof, field_root) = prove_against_leaf_chunks(
        &field_roots,
        fork.historical_summaries_field_index() as usize,
        field_depth,
    );
    debug_assert_eq!(field_root, finalized_state.hash_tree_root()?);

    // Layer 5: state_root within the finalized block header.
    let (header_proof, header_root) = header_state_root_proof(finalized_header)?;
    debug_assert_eq!(finalized_header.state_root, field_root, "header must describe this state");

    let mut proof = vector_proof;
    proof.extend(summary_field_proof);
    proof.extend(summary_list_proof);
    proof.push(summary_length_leaf);
    proof.extend(field_proof);
    proof.extend(header_proof);

    let gindex = GindexCalculator::concat_gindices(&[
        calc.historical_summary_block_root_gindex(summary_index, summaries_depth),
        GindexCalculator::block_root_in_vector_gindex(root_index_in_summary, vector_depth),
    ]);

    verify_branch(historical_header_root, &proof, gindex, header_root)?;

    Ok(HistoricalHeaderWitness {
        header: BlockHeaderFields::from(historical_header.clone()),
        proof,
        root_gindex: gindex,
    })
}

/// `length` encoded as an SSZ little-endian `uint256` leaf, the sibling a
/// `List`'s data-root is hashed against to mix in its length.
fn length_mixin_leaf(length: u64) -> Root {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&length.to_le_bytes());
    leaf
}

fn verify_branch(leaf: Root, proof: &[Root], gindex: u64, root: Root) -> Result<(), ProofError> {
    use ssz_rs::proofs::is_valid_merkle_branch_for_generalized_index;
    use ssz_rs::Node;

    let leaf_node = Node::try_from(leaf.as_slice()).expect("32 bytes");
    let root_node = Node::try_from(root.as_slice()).expect("32 bytes");
    let branch: Vec<Node> =
        proof.iter().map(|b| Node::try_from(b.as_slice()).expect("32 bytes")).collect();

    is_valid_merkle_branch_for_generalized_index(leaf_node, &branch, gindex as usize, root_node)
        .map_err(|e| ProofError::LocalVerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz_types::{ElectraBeaconState, HistoricalSummary};

    fn make_validator(fill: u8) -> Validator {
        let mut v = Validator::default();
        v.withdrawal_credentials[0] = 0x01;
        v.withdrawal_credentials[12..32].copy_from_slice(&[fill; 20]);
        v.activation_epoch = 100 + fill as u64;
        v.effective_balance = 32_000_000_000;
        v
    }

    fn header_for(state_root: Root) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: 12345,
            proposer_index: 7,
            parent_root: [9u8; 32],
            state_root,
            body_root: [3u8; 32],
        }
    }

    #[test]
    fn validator_proof_verifies_against_header_root() {
        let mut state = ElectraBeaconState::default();
        for i in 0..5u8 {
            state.validators.push(make_validator(i));
        }
        let state_root: Root = state.clone().hash_tree_root().unwrap().into();
        let view = BeaconStateView::Electra(Box::new(state));
        let header = header_for(state_root);

        let result = build_validator_proof(&view, &header, 2).expect("proof should build and verify");
        let expected_len = GindexCalculator::new(view.fork_name()).validator_proof_length();
        assert_eq!(result.proof.len() as u32, expected_len);
        assert_eq!(result.validator.activation_epoch, 102);
    }

    #[test]
    fn validator_proof_rejects_out_of_bounds_index() {
        let state = ElectraBeaconState::default();
        let view = BeaconStateView::Electra(Box::new(state));
        let header = header_for([0u8; 32]);
        let result = build_validator_proof(&view, &header, 0);
        assert!(matches!(result, Err(ProofError::ValidatorIndexOutOfBounds(0, 0))));
    }

    #[test]
    fn historical_state_proof_verifies_with_patched_block_roots() {
        let vector_depth = GindexCalculator::block_roots_vector_depth();

        // The test era's block_roots vector has the historical header's own
        // root at index 0 and default (zero) leaves everywhere else;
        // prove_against_leaf_chunks derives both the sibling path and the
        // resulting vector root for that single real leaf without
        // materializing all 8192 entries.
        let historical_header = header_for([0u8; 32]);
        let leaf: Root = historical_header.clone().hash_tree_root().unwrap().into();
        let (siblings, block_roots_root) = prove_against_leaf_chunks(&[leaf], 0, vector_depth);

        let mut state = ElectraBeaconState::default();
        state.historical_summaries.push(HistoricalSummary {
            block_summary_root: block_roots_root,
            state_summary_root: [8u8; 32],
        });
        let state_root: Root = state.clone().hash_tree_root().unwrap().into();
        let view = BeaconStateView::Electra(Box::new(state));
        let finalized_header = header_for(state_root);

        let witness = build_historical_state_proof(
            &view,
            &finalized_header,
            &historical_header,
            0,
            0,
            &siblings,
        )
        .expect("historical proof should build and verify");

        assert_eq!(witness.header.slot, historical_header.slot);

        let expected_len = siblings.len()
            + 1 // summary's state_summary_root sibling
            + GindexCalculator::historical_summaries_tree_depth() as usize
            + 1 // length mixin
            + crate::ssz_types::ForkName::Electra.tree_depth() as usize
            + GindexCalculator::header_tree_depth() as usize;
        assert_eq!(witness.proof.len(), expected_len);
    }
}
