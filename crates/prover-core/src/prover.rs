//! Prover Core (C8)
//!
//! Owns the two halves of the validator-tracking pipeline that run every
//! cycle: [`ProverCore::accumulate`] scans newly-finalized `ExitDataProcessing`
//! events into [`crate::store::ValidatorStore`], and [`ProverCore::verify`]
//! walks the store's eligible slots, builds the Merkle witnesses, and drives
//! each submission through [`crate::executor::TransactionExecutor`]. The
//! on-chain plumbing (`ProviderBuilder`, `EthereumWallet`, the contract call
//! builder) is exactly the teacher's `submitter.rs::submit_claim` shape,
//! generalized to two verifier functions and read-only registry calls.

use std::collections::HashMap;

use alloy::consensus::Transaction as _;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, FixedBytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{SolCall, SolEvent};
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::contracts::{
    ExitDelayVerifier, ExitRequestsOracle, NodeOperatorRegistry, OracleSelector, RegistryDispatch,
    ORACLE_SELECTORS,
};
use crate::deadline::{resolve_exit_deadline, ThresholdCache};
use crate::decoder::decode_exit_requests;
use crate::executor::{ExecutorError, Submission, TransactionExecutor};
use crate::model::{
    BeaconConfig, DeadlineEntry, DeadlineGroup, Epoch, ExitRequest, Slot, Timestamp,
    ValidatorWitness,
};
use crate::proof::{build_historical_state_proof, build_validator_proof};
use crate::sparse_proof::prove_against_leaf_chunks;
use crate::ssz_types::{BeaconBlockHeader, BeaconStateView};
use crate::store::{ReportedSet, ValidatorStore};
use crate::beacon_client::BeaconClient;

/// Everything [`ProverCore`] needs beyond what its sub-components already
/// own, read once at startup.
#[derive(Debug, Clone)]
pub struct ProverConfig {
    pub beacon: BeaconConfig,
    pub el_rpc_url: String,
    pub verifier_address: Address,
    pub oracle_address: Address,
    pub staking_router_address: Address,
    pub private_key: Option<String>,
    /// Bound on how many blocks one `eth_getLogs` call spans, so a wide
    /// `[prevBlock, latestBlock]` range doesn't exceed an execution node's
    /// per-call log limit.
    pub max_accumulate_block_range: u64,
    /// Upper bound on validators attempted per deadline group per cycle;
    /// the remainder stays in the store and is retried next cycle.
    pub validator_batch_size: usize,
    pub slot_skip_max_search: u64,
    pub confirmations: u64,
}

/// Owns the pending-validator store, the reported set, and every per-cycle
/// cache, and drives both halves of the cycle.
pub struct ProverCore {
    config: ProverConfig,
    beacon: BeaconClient,
    store: ValidatorStore,
    reported: ReportedSet,
    threshold_cache: ThresholdCache,
    registry: RegistryDispatch,
    registry_addresses: HashMap<u32, Address>,
    signer: Option<PrivateKeySigner>,
    executor: TransactionExecutor,
}

impl ProverCore {
    /// # Errors
    /// Returns an error if `config.private_key` is set but fails to parse as
    /// a private key.
    pub fn new(config: ProverConfig, beacon: BeaconClient, executor: TransactionExecutor) -> Result<Self> {
        let signer = match &config.private_key {
            Some(key) => {
                let key = key.strip_prefix("0x").unwrap_or(key);
                Some(key.parse::<PrivateKeySigner>().context("invalid private key")?)
            }
            None => None,
        };
        let registry = RegistryDispatch::new(config.staking_router_address);

        Ok(Self {
            config,
            beacon,
            store: ValidatorStore::new(),
            reported: ReportedSet::new(),
            threshold_cache: ThresholdCache::new(),
            registry,
            registry_addresses: HashMap::new(),
            signer,
            executor,
        })
    }

    #[must_use]
    pub fn store(&self) -> &ValidatorStore {
        &self.store
    }

    #[must_use]
    pub fn reported(&self) -> &ReportedSet {
        &self.reported
    }

    /// Scan `[from_block, to_block]` for `ExitDataProcessing` events,
    /// resolve each one's issuing transaction, decode its packed payload,
    /// and insert every validator into the store keyed by its exit deadline
    /// slot.
    #[instrument(skip(self))]
    pub async fn accumulate(&mut self, from_block: u64, to_block: u64) -> Result<()> {
        self.threshold_cache.clear();

        let (state_bytes, fork) = self
            .beacon
            .get_state_ssz("finalized")
            .await
            .context("fetch finalized state for accumulation")?;
        let state = BeaconStateView::from_ssz_bytes(&state_bytes, fork)
            .context("deserialize finalized state for accumulation")?;

        let url: reqwest::Url =
            self.config.el_rpc_url.parse().context("invalid execution-layer RPC URL")?;
        let provider = ProviderBuilder::new().connect_http(url);

        let mut from = from_block;
        while from <= to_block {
            let to = (from + self.config.max_accumulate_block_range - 1).min(to_block);

            let filter = Filter::new()
                .address(self.config.oracle_address)
                .event_signature(ExitRequestsOracle::ExitDataProcessing::SIGNATURE_HASH)
                .from_block(from)
                .to_block(to);

            let logs = provider
                .get_logs(&filter)
                .await
                .context("eth_getLogs for ExitDataProcessing failed")?;

            for log in logs {
                let event = match ExitRequestsOracle::ExitDataProcessing::decode_log(&log.inner) {
                    Ok(decoded) => decoded.data,
                    Err(e) => {
                        warn!(error = %e, "failed to decode ExitDataProcessing log, skipping");
                        continue;
                    }
                };
                if let Err(e) = self.accumulate_event(&provider, &state, &event, &log).await {
                    warn!(error = %e, "skipping exit request that failed to accumulate");
                }
            }

            from = to + 1;
        }

        Ok(())
    }

    async fn accumulate_event<P: Provider>(
        &mut self,
        provider: &P,
        state: &BeaconStateView,
        event: &ExitRequestsOracle::ExitDataProcessing,
        log: &Log,
    ) -> Result<()> {
        let tx_hash = log.transaction_hash.context("log missing transaction hash")?;
        let tx = provider
            .get_transaction_by_hash(tx_hash)
            .await
            .context("get_transaction_by_hash failed")?
            .context("issuing transaction not found")?;
        let receipt = provider
            .get_transaction_receipt(tx_hash)
            .await
            .context("get_transaction_receipt failed")?
            .context("issuing transaction receipt not found")?;
        if !receipt.status() {
            anyhow::bail!("issuing transaction {tx_hash} reverted");
        }

        let packed_data = decode_oracle_calldata(tx.input())?;
        let delivered_timestamp: Timestamp =
            event.timestamp.try_into().context("event timestamp overflows a u64")?;

        let exit_request = ExitRequest {
            exit_requests_hash: event.exitRequestsHash.0,
            packed_data: packed_data.clone(),
            data_format: 0,
            delivered_timestamp,
        };

        let decoded =
            decode_exit_requests(&packed_data).context("decode packed exit-request payload")?;

        let mut by_slot: HashMap<Slot, Vec<DeadlineEntry>> = HashMap::new();
        for validator in decoded {
            let Some(record) = state.validator(validator.validator_index as usize) else {
                warn!(
                    validator_index = validator.validator_index,
                    "validator index not present in finalized state, skipping"
                );
                continue;
            };
            let activation_epoch: Epoch = record.activation_epoch;

            let threshold =
                match self.threshold_for(validator.module_id, validator.node_op_id).await {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(
                            error = %e,
                            module_id = validator.module_id,
                            node_op_id = validator.node_op_id,
                            "failed to resolve exit-deadline threshold, skipping validator"
                        );
                        continue;
                    }
                };

            let deadline = resolve_exit_deadline(
                &self.config.beacon,
                activation_epoch,
                delivered_timestamp,
                threshold,
            );
            by_slot.entry(deadline.exit_deadline_slot).or_default().push(DeadlineEntry {
                validator,
                activation_epoch,
                exit_deadline_epoch: deadline.exit_deadline_epoch,
            });
        }

        for (slot, entries) in by_slot {
            self.store.add(slot, DeadlineGroup { exit_request: exit_request.clone(), entries });
        }

        Ok(())
    }

    /// Walk every deadline slot at or before the current finalized slot,
    /// build and submit one `verifyValidatorExitDelay` (or
    /// `verifyHistoricalValidatorExitDelay`) call per still-applicable
    /// validator, and drop fully-reported groups from the store.
    #[instrument(skip(self))]
    pub async fn verify(&mut self) -> Result<()> {
        let (state_bytes, fork) = match self.beacon.get_state_ssz("finalized").await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "failed to fetch finalized state, skipping this cycle's verification");
                return Ok(());
            }
        };
        let finalized_state = match BeaconStateView::from_ssz_bytes(&state_bytes, fork) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "finalized state failed to deserialize, skipping this cycle's verification");
                return Ok(());
            }
        };
        let finalized_fetched = self
            .beacon
            .get_finalized_header()
            .await
            .context("fetch finalized header for verification")?;
        let finalized_header: BeaconBlockHeader = finalized_fetched.header.into();

        if let Ok(url) = self.config.el_rpc_url.parse::<reqwest::Url>() {
            let provider = ProviderBuilder::new().connect_http(url);
            if let Err(e) = self.executor.refresh_gas_if_needed(&provider).await {
                warn!(error = %e, "failed to refresh gas fee history, using cached acceptability window");
            }
        }

        let head_slot = finalized_state.slot();
        let mut slots: Vec<Slot> =
            self.store.eligible_entries(head_slot).iter().map(|(slot, _)| *slot).collect();
        slots.sort_unstable();
        slots.dedup();

        for slot in slots {
            let groups: Vec<DeadlineGroup> = self
                .store
                .eligible_entries(head_slot)
                .into_iter()
                .filter(|(s, _)| *s == slot)
                .map(|(_, g)| g.clone())
                .collect();

            for group in groups {
                if let Err(e) =
                    self.verify_group(slot, group, &finalized_state, &finalized_header).await
                {
                    warn!(error = %e, deadline_slot = slot, "failed to process deadline group");
                }
            }
        }

        self.store.cleanup(head_slot, &self.reported);
        Ok(())
    }

    async fn verify_group(
        &mut self,
        deadline_slot: Slot,
        group: DeadlineGroup,
        finalized_state: &BeaconStateView,
        finalized_header: &BeaconBlockHeader,
    ) -> Result<()> {
        let penalizable_slot = deadline_slot + 1;
        let deadline_fetched = self
            .beacon
            .find_next_available_slot(penalizable_slot, self.config.slot_skip_max_search)
            .await
            .context("locate deadline slot's header")?;
        let deadline_header_fields = deadline_fetched.header;
        let deadline_header: BeaconBlockHeader = deadline_header_fields.into();

        let (deadline_state_bytes, deadline_fork) = self
            .beacon
            .get_state_ssz(&deadline_header_fields.slot.to_string())
            .await
            .context("fetch deadline-slot state")?;
        let deadline_state = BeaconStateView::from_ssz_bytes(&deadline_state_bytes, deadline_fork)
            .context("deserialize deadline-slot state")?;

        let provable =
            crate::model::ProvableBeaconBlockHeader::new(deadline_header_fields, &self.config.beacon);
        let proof_slot_timestamp = self.config.beacon.slot_timestamp(deadline_header_fields.slot);

        let is_old = finalized_state
            .slot()
            .saturating_sub(deadline_header_fields.slot)
            >= self.config.beacon.slots_per_historical_root;

        let historical = if is_old {
            Some(
                self.build_historical_witness(finalized_state, finalized_header, &deadline_header)
                    .await
                    .context("build historical header witness")?,
            )
        } else {
            None
        };

        for entry in group.entries.iter().take(self.config.validator_batch_size) {
            let witness = match self
                .verify_entry(
                    entry,
                    &group.exit_request,
                    &deadline_state,
                    &deadline_header,
                    proof_slot_timestamp,
                )
                .await
            {
                Ok(Some(w)) => w,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        error = %e,
                        validator_index = entry.validator.validator_index,
                        "failed to verify validator this cycle, will retry"
                    );
                    continue;
                }
            };

            match self
                .submit_witness(witness.clone(), provable.roots_timestamp, historical.clone())
                .await
            {
                Ok(submission) => {
                    if !submission.dry_run {
                        self.reported.insert(witness.pubkey);
                    }
                    info!(
                        validator_index = entry.validator.validator_index,
                        tx_hash = %submission.tx_hash,
                        dry_run = submission.dry_run,
                        "validator exit-delay penalty submission processed"
                    );
                }
                Err(e) => {
                    warn!(
                        error_id = %e.id,
                        validator_index = entry.validator.validator_index,
                        "submission failed, will retry next cycle"
                    );
                }
            }
        }

        Ok(())
    }

    /// Decide whether `entry`'s validator is still exposed to the penalty
    /// and, if so, build its witness. `Ok(None)` means there is nothing to
    /// submit this cycle (already exited in time, not yet eligible, or the
    /// registry says the penalty no longer applies) — cleanup then decides
    /// whether the entry survives based on `reported`, not this return value.
    async fn verify_entry(
        &mut self,
        entry: &DeadlineEntry,
        exit_request: &ExitRequest,
        deadline_state: &BeaconStateView,
        deadline_header: &BeaconBlockHeader,
        proof_slot_timestamp: Timestamp,
    ) -> Result<Option<ValidatorWitness>> {
        let validator_index = entry.validator.validator_index;
        let record = deadline_state
            .validator(validator_index as usize)
            .with_context(|| format!("validator {validator_index} not present in deadline-slot state"))?;

        if record.exit_epoch < entry.exit_deadline_epoch {
            return Ok(None);
        }

        let threshold =
            self.threshold_for(entry.validator.module_id, entry.validator.node_op_id).await?;
        let deadline = resolve_exit_deadline(
            &self.config.beacon,
            entry.activation_epoch,
            exit_request.delivered_timestamp,
            threshold,
        );
        if proof_slot_timestamp < deadline.eligible_exit_timestamp {
            return Ok(None);
        }
        let seconds_since_eligible = proof_slot_timestamp - deadline.eligible_exit_timestamp;

        let registry_address = self.registry_address_for(entry.validator.module_id).await?;
        let url: reqwest::Url =
            self.config.el_rpc_url.parse().context("invalid execution-layer RPC URL")?;
        let provider = ProviderBuilder::new().connect_http(url);
        let registry = NodeOperatorRegistry::new(registry_address, &provider);
        let applicable = registry
            .isValidatorExitDelayPenaltyApplicable(
                entry.validator.node_op_id,
                proof_slot_timestamp,
                entry.validator.pubkey.to_vec().into(),
                seconds_since_eligible,
            )
            .call()
            .await
            .context("isValidatorExitDelayPenaltyApplicable call failed")?;
        if !applicable {
            self.reported.remove(&entry.validator.pubkey);
            return Ok(None);
        }

        let proof = build_validator_proof(deadline_state, deadline_header, validator_index)
            .context("build validator inclusion proof")?;

        Ok(Some(ValidatorWitness {
            exit_request_index: entry.validator.exit_data_index,
            withdrawal_credentials: proof.validator.withdrawal_credentials,
            effective_balance: proof.validator.effective_balance,
            slashed: proof.validator.slashed,
            activation_eligibility_epoch: proof.validator.activation_eligibility_epoch,
            activation_epoch: proof.validator.activation_epoch,
            withdrawable_epoch: proof.validator.withdrawable_epoch,
            validator_proof: proof.proof,
            module_id: entry.validator.module_id,
            node_op_id: entry.validator.node_op_id,
            pubkey: entry.validator.pubkey,
        }))
    }

    async fn build_historical_witness(
        &self,
        finalized_state: &BeaconStateView,
        finalized_header: &BeaconBlockHeader,
        deadline_header: &BeaconBlockHeader,
    ) -> Result<crate::model::HistoricalHeaderWitness> {
        let cfg = &self.config.beacon;
        let capella_fork_slot = cfg.capella_fork_slot();
        let summary_index = (deadline_header.slot - capella_fork_slot) / cfg.slots_per_historical_root;
        let summary_slot = capella_fork_slot + (summary_index + 1) * cfg.slots_per_historical_root;
        let root_index_in_summary = deadline_header.slot % cfg.slots_per_historical_root;

        let (summary_state_bytes, summary_fork) = self
            .beacon
            .get_state_ssz(&summary_slot.to_string())
            .await
            .context("fetch historical-summary era state")?;
        let summary_state = BeaconStateView::from_ssz_bytes(&summary_state_bytes, summary_fork)
            .context("deserialize historical-summary era state")?;

        let block_roots = summary_state.block_roots();
        let vector_depth = crate::gindex::GindexCalculator::block_roots_vector_depth();
        let (siblings, _) =
            prove_against_leaf_chunks(&block_roots, root_index_in_summary as usize, vector_depth);

        build_historical_state_proof(
            finalized_state,
            finalized_header,
            deadline_header,
            summary_index,
            root_index_in_summary,
            &siblings,
        )
        .map_err(Into::into)
    }

    async fn registry_address_for(&mut self, module_id: u32) -> Result<Address> {
        if let Some(addr) = self.registry_addresses.get(&module_id) {
            return Ok(*addr);
        }
        let addr = self.registry.resolve(&self.config.el_rpc_url, module_id).await?;
        self.registry_addresses.insert(module_id, addr);
        Ok(addr)
    }

    async fn threshold_for(&mut self, module_id: u32, node_op_id: u64) -> Result<u64> {
        if let Some(t) = self.threshold_cache.get(module_id, node_op_id) {
            return Ok(t);
        }
        let registry_address = self.registry_address_for(module_id).await?;
        let url: reqwest::Url =
            self.config.el_rpc_url.parse().context("invalid execution-layer RPC URL")?;
        let provider = ProviderBuilder::new().connect_http(url);
        let registry = NodeOperatorRegistry::new(registry_address, &provider);
        let threshold = registry
            .exitDeadlineThreshold(node_op_id)
            .call()
            .await
            .context("exitDeadlineThreshold call failed")?;
        self.threshold_cache.insert(module_id, node_op_id, threshold);
        Ok(threshold)
    }

    async fn submit_witness(
        &self,
        witness: ValidatorWitness,
        roots_timestamp: Timestamp,
        historical: Option<crate::model::HistoricalHeaderWitness>,
    ) -> Result<Submission, ExecutorError> {
        let call = PendingCall {
            rpc_url: &self.config.el_rpc_url,
            verifier_address: self.config.verifier_address,
            signer: self.signer.as_ref(),
            witness: &witness,
            roots_timestamp,
            historical: historical.as_ref(),
            confirmations: self.config.confirmations,
        };

        self.executor
            .execute(
                || async { Ok::<(), String>(()) },
                || call.emulate(),
                || call.estimate(),
                |gas_limit| call.submit(gas_limit),
            )
            .await
    }
}

type ProofArgs =
    (u64, u32, FixedBytes<32>, u64, bool, u64, u64, u64, Vec<FixedBytes<32>>, u32, u64, alloy::primitives::Bytes);

/// The call's arguments borrowed from the owning [`ProverCore`] for the
/// lifetime of one `populate`/`emulate`/`estimate`/`submit` round trip, so
/// `TransactionExecutor::execute`'s closures can each build a fresh
/// provider without cloning the witness repeatedly.
struct PendingCall<'a> {
    rpc_url: &'a str,
    verifier_address: Address,
    signer: Option<&'a PrivateKeySigner>,
    witness: &'a ValidatorWitness,
    roots_timestamp: Timestamp,
    historical: Option<&'a crate::model::HistoricalHeaderWitness>,
    confirmations: u64,
}

impl PendingCall<'_> {
    fn provider_url(&self) -> Result<reqwest::Url, String> {
        self.rpc_url.parse().map_err(|e| format!("invalid execution-layer RPC URL: {e}"))
    }

    fn proof_args(&self) -> ProofArgs {
        (
            self.roots_timestamp,
            self.witness.exit_request_index,
            FixedBytes::<32>::from(self.witness.withdrawal_credentials),
            self.witness.effective_balance,
            self.witness.slashed,
            self.witness.activation_eligibility_epoch,
            self.witness.activation_epoch,
            self.witness.withdrawable_epoch,
            self.witness.validator_proof.iter().map(|r| FixedBytes::<32>::from(*r)).collect(),
            self.witness.module_id,
            self.witness.node_op_id,
            self.witness.pubkey.to_vec().into(),
        )
    }

    async fn emulate(&self) -> Result<(), String> {
        let url = self.provider_url()?;
        let provider = ProviderBuilder::new().connect_http(url);
        let contract = ExitDelayVerifier::new(self.verifier_address, &provider);
        let (rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk) = self.proof_args();

        let result = match self.historical {
            None => contract
                .verifyValidatorExitDelay(rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk)
                .call()
                .await
                .map(|_| ()),
            Some(h) => contract
                .verifyHistoricalValidatorExitDelay(
                    rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk,
                    h.header.slot,
                    h.header.proposer_index,
                    FixedBytes::<32>::from(h.header.parent_root),
                    FixedBytes::<32>::from(h.header.body_root),
                    h.proof.iter().map(|r| FixedBytes::<32>::from(*r)).collect(),
                    h.root_gindex,
                )
                .call()
                .await
                .map(|_| ()),
        };
        result.map_err(|e| e.to_string())
    }

    async fn estimate(&self) -> Result<(u64, u128), String> {
        let url = self.provider_url()?;
        let provider = ProviderBuilder::new().connect_http(url);
        let contract = ExitDelayVerifier::new(self.verifier_address, &provider);
        let (rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk) = self.proof_args();

        let estimated = match self.historical {
            None => contract
                .verifyValidatorExitDelay(rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk)
                .estimate_gas()
                .await
                .map_err(|e| e.to_string())?,
            Some(h) => contract
                .verifyHistoricalValidatorExitDelay(
                    rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk,
                    h.header.slot,
                    h.header.proposer_index,
                    FixedBytes::<32>::from(h.header.parent_root),
                    FixedBytes::<32>::from(h.header.body_root),
                    h.proof.iter().map(|r| FixedBytes::<32>::from(*r)).collect(),
                    h.root_gindex,
                )
                .estimate_gas()
                .await
                .map_err(|e| e.to_string())?,
        };
        let base_fee = provider.get_gas_price().await.map_err(|e| e.to_string())?;
        Ok((estimated, base_fee))
    }

    async fn submit(&self, gas_limit: u64) -> Result<B256, String> {
        let signer = self.signer.ok_or_else(|| "no signer configured".to_string())?;
        let wallet = EthereumWallet::from(signer.clone());
        let url = self.provider_url()?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
        let contract = ExitDelayVerifier::new(self.verifier_address, &provider);
        let (rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk) = self.proof_args();

        let pending_tx = match self.historical {
            None => contract
                .verifyValidatorExitDelay(rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk)
                .gas(gas_limit)
                .send()
                .await
                .map_err(|e| e.to_string())?,
            Some(h) => contract
                .verifyHistoricalValidatorExitDelay(
                    rt, eri, wc, eb, sl, aee, ae, we, vp, mid, noi, pk,
                    h.header.slot,
                    h.header.proposer_index,
                    FixedBytes::<32>::from(h.header.parent_root),
                    FixedBytes::<32>::from(h.header.body_root),
                    h.proof.iter().map(|r| FixedBytes::<32>::from(*r)).collect(),
                    h.root_gindex,
                )
                .gas(gas_limit)
                .send()
                .await
                .map_err(|e| e.to_string())?,
        };

        let tx_hash = *pending_tx.tx_hash();
        let receipt = pending_tx
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| e.to_string())?;
        if !receipt.status() {
            return Err(format!("transaction {tx_hash} reverted"));
        }
        Ok(tx_hash)
    }
}

/// Decode an already-mined oracle transaction's calldata back into its
/// packed exit-request payload, trying each known submit-function selector
/// in the order `ORACLE_SELECTORS` lists them.
fn decode_oracle_calldata(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < 4 {
        anyhow::bail!("calldata too short to contain a function selector");
    }
    let selector: [u8; 4] = input[0..4].try_into().expect("checked length above");

    for candidate in ORACLE_SELECTORS {
        let matches = match candidate {
            OracleSelector::SubmitReportData => selector == ExitRequestsOracle::submitReportDataCall::SELECTOR,
            OracleSelector::SubmitExitRequestsData => {
                selector == ExitRequestsOracle::submitExitRequestsDataCall::SELECTOR
            }
        };
        if !matches {
            continue;
        }
        return match candidate {
            OracleSelector::SubmitReportData => {
                let decoded = ExitRequestsOracle::submitReportDataCall::abi_decode(input)
                    .context("decode submitReportData calldata")?;
                Ok(decoded.data.to_vec())
            }
            OracleSelector::SubmitExitRequestsData => {
                let decoded = ExitRequestsOracle::submitExitRequestsDataCall::abi_decode(input)
                    .context("decode submitExitRequestsData calldata")?;
                Ok(decoded.data.to_vec())
            }
        };
    }
    anyhow::bail!("calldata selector does not match any known oracle submit function")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_oracle_calldata_rejects_short_input() {
        let result = decode_oracle_calldata(&[1, 2, 3]);
        assert!(result.is_err());
    }

    #[test]
    fn decode_oracle_calldata_rejects_unknown_selector() {
        let result = decode_oracle_calldata(&[0xde, 0xad, 0xbe, 0xef, 0, 0]);
        assert!(result.is_err());
    }

    #[test]
    fn decode_oracle_calldata_accepts_submit_report_data() {
        let call = ExitRequestsOracle::submitReportDataCall {
            data: vec![1, 2, 3].into(),
            contractVersion: alloy::primitives::U256::from(1u64),
        };
        let encoded = ExitRequestsOracle::submitReportDataCall::abi_encode(&call);
        let decoded = decode_oracle_calldata(&encoded).expect("known selector should decode");
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn decode_oracle_calldata_accepts_submit_exit_requests_data() {
        let call = ExitRequestsOracle::submitExitRequestsDataCall { data: vec![4, 5, 6].into() };
        let encoded = ExitRequestsOracle::submitExitRequestsDataCall::abi_encode(&call);
        let decoded = decode_oracle_calldata(&encoded).expect("known selector should decode");
        assert_eq!(decoded, vec![4, 5, 6]);
    }
}
