//! Cycle Driver (C9)
//!
//! Single-threaded cooperative loop, the same shape as the teacher's
//! `Scanner::run`: poll, log-and-continue on error, sleep, repeat.
//! Generalized to the three-phase cycle (resolve roots, accumulate,
//! verify) and to persisting progress only after a cycle fully succeeds.

use std::time::Duration;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use prover_core::beacon_client::BeaconClient;
use prover_core::persistence::{LastProcessedRoot, Persistence};
use prover_core::prover::ProverCore;
use prover_core::root_provider::RootProvider;
use prover_core::ssz_types::BeaconBlockHeader;
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::state::CycleStatus;

/// Tunables read once at startup; everything [`CycleDriver`] needs beyond
/// its sub-components.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub el_rpc_url: String,
    pub sleep_interval: Duration,
    pub error_recovery_sleep: Duration,
    pub dry_run: bool,
    pub healthy_slots_behind: u64,
}

/// Drives [`RootProvider::next_roots`] -> resolve EL block range ->
/// [`ProverCore::accumulate`] + [`ProverCore::verify`] -> persist, forever.
pub struct CycleDriver<P> {
    config: CycleConfig,
    beacon: BeaconClient,
    root_provider: RootProvider<P>,
    persistence: P,
    prover: ProverCore,
    status: CycleStatus,
}

impl<P: Persistence + Clone> CycleDriver<P> {
    #[must_use]
    pub fn new(
        config: CycleConfig,
        beacon: BeaconClient,
        root_provider: RootProvider<P>,
        persistence: P,
        prover: ProverCore,
        status: CycleStatus,
    ) -> Self {
        Self { config, beacon, root_provider, persistence, prover, status }
    }

    /// Runs cycles until the process is asked to shut down. Callers spawn
    /// this as its own task and select it against a shutdown signal.
    #[instrument(skip(self))]
    pub async fn run_forever(&mut self) -> ! {
        info!("starting cycle driver");
        loop {
            let sleep_for = match self.run_once().await {
                Ok(()) => {
                    self.status.set_error(None);
                    self.config.sleep_interval
                }
                Err(e) => {
                    error!(error = %e, "cycle failed, progress not persisted");
                    self.status.set_error(Some(e.to_string()));
                    self.config.error_recovery_sleep
                }
            };
            sleep(sleep_for).await;
        }
    }

    async fn run_once(&mut self) -> Result<()> {
        let Some(roots) = self.root_provider.next_roots().await else {
            info!("no new finalized root to process, sleeping");
            return Ok(());
        };

        self.status.set_head_slot(roots.latest.header.slot);

        let from_block = self.resolve_block_number(roots.prev.header.slot).await?;
        let to_block = self.resolve_block_number(roots.latest.header.slot).await?;

        self.prover.accumulate(from_block, to_block).await.context("accumulation pass failed")?;
        let reported_before = self.prover.reported().len();
        self.prover.verify().await.context("verification pass failed")?;
        let reported_after = self.prover.reported().len();

        self.status.record_cycle();
        self.status.set_validators_tracked(self.prover.store().validator_count() as u64);
        if reported_after > reported_before {
            for _ in 0..(reported_after - reported_before) {
                self.status.record_submission();
            }
        }

        if self.config.dry_run {
            info!("dry-run enabled, not persisting progress");
            return Ok(());
        }

        let header: BeaconBlockHeader = roots.latest.header.into();
        let root = header.clone().hash_tree_root().context("compute latest header root")?;
        self.persistence
            .save(&LastProcessedRoot { root: root.into(), slot: roots.latest.header.slot })
            .await
            .context("persist last processed root")?;
        self.status.set_last_processed_slot(roots.latest.header.slot);

        Ok(())
    }

    /// `beaconBlock.executionPayload.blockHash -> getBlock(hash).number`.
    async fn resolve_block_number(&self, slot: u64) -> Result<u64> {
        let block_hash = self
            .beacon
            .get_execution_block_hash(&slot.to_string())
            .await
            .context("fetch execution payload block hash")?;

        let url: reqwest::Url =
            self.config.el_rpc_url.parse().context("invalid execution-layer RPC URL")?;
        let provider = ProviderBuilder::new().connect_http(url);
        let block = provider
            .get_block_by_hash(block_hash.into())
            .await
            .context("get_block_by_hash failed")?
            .with_context(|| format!("execution block {} not found", hex::encode(block_hash)))?;

        Ok(block.header.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_config_is_clone() {
        let config = CycleConfig {
            el_rpc_url: "http://127.0.0.1:8545".to_string(),
            sleep_interval: Duration::from_secs(300),
            error_recovery_sleep: Duration::from_secs(30),
            dry_run: true,
            healthy_slots_behind: 64,
        };
        let cloned = config.clone();
        assert_eq!(cloned.sleep_interval, Duration::from_secs(300));
    }
}
