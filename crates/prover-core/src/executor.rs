//! Transaction Executor (C7)
//!
//! Generalizes the teacher's `submitter.rs::submit_claim` — one hardcoded
//! `claimReward` call wrapped in a gas-price check and a confirmation wait —
//! into a parametrized populate/emulate/submit sequence so the prover core
//! can drive both `verifyValidatorExitDelay` and
//! `verifyHistoricalValidatorExitDelay` through the same retry and
//! error-classification engine.

use std::future::Future;
use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::B256;
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::error::LoggedError;
use crate::gas::GasManager;
use crate::secrets::redact_private_keys;

/// Max blocks requested per `eth_feeHistory` call; execution clients
/// commonly reject anything past 1024.
const MAX_FEE_HISTORY_BLOCKCOUNT: u64 = 1024;

/// One submission's tunables, read once from configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub rpc_url: String,
    pub dry_run: bool,
    pub gas_limit_hard_cap: u64,
    pub high_gas_retry_delay: Duration,
}

#[derive(Debug, Error)]
pub enum ExecutorErrorKind {
    #[error("emulation (read-only dry-call) failed: {0}")]
    EmulationFailed(String),
    #[error("no signer configured, cannot submit")]
    NoSigner,
    #[error("estimated gas {estimated} (+20% buffer = {with_buffer}) exceeds hard limit {hard_limit}")]
    GasLimitExceeded { estimated: u64, with_buffer: u64, hard_limit: u64 },
    #[error("current gas price is not acceptable")]
    HighGasFee,
    #[error("failed to send or confirm transaction: {0}")]
    SendFailed(String),
}

pub type ExecutorError = LoggedError<ExecutorErrorKind>;

/// Result of one successful submission.
#[derive(Debug, Clone, Copy)]
pub struct Submission {
    pub tx_hash: B256,
    pub dry_run: bool,
}

/// Drives the populate -> emulate -> estimate -> cap -> sign -> submit ->
/// confirm sequence of one on-chain call, retrying on transient high-gas
/// conditions and logging every terminal error exactly once. The alloy
/// specifics (building the `sol!` call, signing, awaiting confirmations —
/// exactly the `ProviderBuilder`/`EthereumWallet`/`pending_tx
/// .with_required_confirmations().get_receipt()` sequence of the teacher's
/// `submit_claim`) stay with the caller, passed in as `estimate`/`submit`
/// closures, so this type owns only the retry and gas-acceptability policy
/// and can drive any contract call the same way.
pub struct TransactionExecutor {
    config: ExecutorConfig,
    signer: Option<PrivateKeySigner>,
    gas: GasManager,
}

impl TransactionExecutor {
    #[must_use]
    pub fn new(config: ExecutorConfig, signer: Option<PrivateKeySigner>, gas: GasManager) -> Self {
        Self { config, signer, gas }
    }

    #[must_use]
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Refreshes the gas-acceptability cache roughly once an hour
    /// (`GasManager::needs_refresh`), pulling `GasManager::history_window_blocks`
    /// worth of real per-block base fees via `eth_feeHistory`, chunked into
    /// calls of at most `MAX_FEE_HISTORY_BLOCKCOUNT` blocks each.
    pub async fn refresh_gas_if_needed<P: Provider>(&mut self, provider: &P) -> Result<(), String> {
        let block_number = provider.get_block_number().await.map_err(|e| e.to_string())?;
        if !self.gas.needs_refresh(block_number) {
            return Ok(());
        }

        let mut remaining = self.gas.history_window_blocks();
        let mut newest = BlockNumberOrTag::Number(block_number);
        while remaining > 0 {
            let batch = remaining.min(MAX_FEE_HISTORY_BLOCKCOUNT);
            let history = provider
                .get_fee_history(batch, newest, &[])
                .await
                .map_err(|e| e.to_string())?;
            if history.base_fee_per_gas.is_empty() {
                break;
            }
            self.gas.record_fee_history(&history.base_fee_per_gas, block_number);
            remaining = remaining.saturating_sub(batch);
            if history.oldest_block == 0 {
                break;
            }
            newest = BlockNumberOrTag::Number(history.oldest_block.saturating_sub(1));
        }
        Ok(())
    }

    /// Executes one submission end to end.
    ///
    /// - `populate` builds the call's arguments (pure, may fail on caller-side validation).
    /// - `emulate` performs the equivalent read-only dry-call.
    /// - `estimate` asks the execution client for `(estimated_gas, current_base_fee_wei)`.
    /// - `submit` signs, sends, and awaits confirmation, returning the tx hash.
    ///
    /// `HighGasFee` retries indefinitely, sleeping `high_gas_retry_delay`
    /// between attempts, until gas drops back under the acceptable
    /// percentile or the caller's own cancellation (process shutdown) wins
    /// the race — there is no retry cap for gas rejection.
    #[instrument(skip(self, populate, emulate, estimate, submit), fields(dry_run = self.config.dry_run))]
    pub async fn execute<P, E, G, S, PFut, EFut, GFut, SFut>(
        &self,
        mut populate: P,
        mut emulate: E,
        mut estimate: G,
        mut submit: S,
    ) -> Result<Submission, ExecutorError>
    where
        P: FnMut() -> PFut,
        E: FnMut() -> EFut,
        G: FnMut() -> GFut,
        S: FnMut(u64) -> SFut,
        PFut: Future<Output = Result<(), String>>,
        EFut: Future<Output = Result<(), String>>,
        GFut: Future<Output = Result<(u64, u128), String>>,
        SFut: Future<Output = Result<B256, String>>,
    {
        let mut high_gas_retries = 0u32;
        loop {
            match self.execute_once(&mut populate, &mut emulate, &mut estimate, &mut submit).await {
                Ok(submission) => return Ok(submission),
                Err(kind) => match kind {
                    ExecutorErrorKind::NoSigner => {
                        let mut err = LoggedError::new(kind);
                        log_once(&mut err, &self.config);
                        return Err(err);
                    }
                    ExecutorErrorKind::HighGasFee => {
                        high_gas_retries += 1;
                        warn!(retry = high_gas_retries, "gas unacceptable, retrying after delay");
                        tokio::time::sleep(self.config.high_gas_retry_delay).await;
                        continue;
                    }
                    other => {
                        let mut err = LoggedError::new(other);
                        log_once(&mut err, &self.config);
                        return Err(err);
                    }
                },
            }
        }
    }

    async fn execute_once<P, E, G, S, PFut, EFut, GFut, SFut>(
        &self,
        populate: &mut P,
        emulate: &mut E,
        estimate: &mut G,
        submit: &mut S,
    ) -> Result<Submission, ExecutorErrorKind>
    where
        P: FnMut() -> PFut,
        E: FnMut() -> EFut,
        G: FnMut() -> GFut,
        S: FnMut(u64) -> SFut,
        PFut: Future<Output = Result<(), String>>,
        EFut: Future<Output = Result<(), String>>,
        GFut: Future<Output = Result<(u64, u128), String>>,
        SFut: Future<Output = Result<B256, String>>,
    {
        // Step 1: populate.
        populate().await.map_err(ExecutorErrorKind::EmulationFailed)?;

        // Step 2: emulate.
        emulate().await.map_err(ExecutorErrorKind::EmulationFailed)?;

        // Step 3: dry-run short-circuit.
        if self.config.dry_run {
            info!("dry-run enabled, returning success without sending");
            return Ok(Submission { tx_hash: B256::ZERO, dry_run: true });
        }

        // Step 4: signer required from here on.
        if self.signer.is_none() {
            return Err(ExecutorErrorKind::NoSigner);
        }

        // Step 5: estimate gas, falling back to the hard cap on failure.
        let (estimated, current_base_fee_wei) =
            estimate().await.unwrap_or((self.config.gas_limit_hard_cap, 0));
        let with_buffer = (estimated as f64 * 1.2).floor() as u64;

        // Step 6: hard cap.
        if with_buffer > self.config.gas_limit_hard_cap {
            return Err(ExecutorErrorKind::GasLimitExceeded {
                estimated,
                with_buffer,
                hard_limit: self.config.gas_limit_hard_cap,
            });
        }

        // Step 7: gas acceptability, judged against the gas manager's
        // fee-history cache.
        if !self.gas.is_acceptable(current_base_fee_wei) {
            return Err(ExecutorErrorKind::HighGasFee);
        }

        // Step 8: sign, submit, confirm.
        let tx_hash = submit(with_buffer)
            .await
            .map_err(ExecutorErrorKind::SendFailed)?;

        Ok(Submission { tx_hash, dry_run: false })
    }
}

fn log_once(err: &mut ExecutorError, config: &ExecutorConfig) {
    if err.is_logged() {
        return;
    }
    let redacted = redact_private_keys(&format!("{}", err.source));
    tracing::error!(error_id = %err.id, rpc_url = %config.rpc_url, "{redacted}");
    err.mark_logged();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExecutorConfig {
        ExecutorConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            dry_run: true,
            gas_limit_hard_cap: 500_000,
            high_gas_retry_delay: Duration::from_millis(1),
        }
    }

    fn never_estimate() -> impl FnMut() -> std::future::Ready<Result<(u64, u128), String>> {
        || std::future::ready(Ok((21_000, 1)))
    }

    fn never_submit() -> impl FnMut(u64) -> std::future::Ready<Result<B256, String>> {
        |_| std::future::ready(Ok(B256::ZERO))
    }

    #[tokio::test]
    async fn dry_run_short_circuits_before_needing_a_signer() {
        let executor = TransactionExecutor::new(config(), None, GasManager::new(90.0, 1, 1, 32));
        let result = executor
            .execute(|| async { Ok(()) }, || async { Ok(()) }, never_estimate(), never_submit())
            .await
            .expect("dry run should succeed");
        assert!(result.dry_run);
    }

    #[tokio::test]
    async fn emulation_failure_is_not_retried() {
        let executor = TransactionExecutor::new(config(), None, GasManager::new(90.0, 1, 1, 32));
        let result = executor
            .execute(
                || async { Ok(()) },
                || async { Err("revert: not eligible".to_string()) },
                never_estimate(),
                never_submit(),
            )
            .await;
        assert!(matches!(result, Err(e) if matches!(e.source, ExecutorErrorKind::EmulationFailed(_))));
    }

    #[tokio::test]
    async fn no_signer_without_dry_run_is_terminal() {
        let mut cfg = config();
        cfg.dry_run = false;
        let executor = TransactionExecutor::new(cfg, None, GasManager::new(90.0, 1, 1, 32));
        let result = executor
            .execute(|| async { Ok(()) }, || async { Ok(()) }, never_estimate(), never_submit())
            .await;
        assert!(matches!(result, Err(e) if matches!(e.source, ExecutorErrorKind::NoSigner)));
    }

    #[tokio::test]
    async fn gas_limit_exceeded_is_terminal() {
        use alloy::signers::local::PrivateKeySigner;
        let signer: PrivateKeySigner =
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff8".parse().unwrap();
        let mut cfg = config();
        cfg.dry_run = false;
        cfg.gas_limit_hard_cap = 100;
        let executor = TransactionExecutor::new(cfg, Some(signer), GasManager::new(90.0, 1, 1, 32));
        let result = executor
            .execute(
                || async { Ok(()) },
                || async { Ok(()) },
                || async { Ok((1000, 1)) },
                never_submit(),
            )
            .await;
        assert!(matches!(result, Err(e) if matches!(e.source, ExecutorErrorKind::GasLimitExceeded { .. })));
    }
}
