//! Exit Delay Penalty Prover Service
//!
//! Daemon that watches finalized beacon state for validators past their exit
//! deadline, builds Merkle proofs against `BeaconState`, and submits penalty
//! reports on-chain. Wires together every `prover-core` component the same
//! way the teacher's `main.rs` wires its `AppState`/`api` pair, generalized
//! from one fixed RPC pair to the full configuration surface.

mod api;
mod cycle;
mod state;

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use anyhow::{Context, Result};
use clap::Parser;
use prover_core::beacon_client::BeaconClient;
use prover_core::contracts::{resolve_from_locator, ExitDelayVerifier};
use prover_core::executor::{ExecutorConfig, TransactionExecutor};
use prover_core::gas::GasManager;
use prover_core::model::BeaconConfig;
use prover_core::persistence::JsonFilePersistence;
use prover_core::prover::{ProverConfig, ProverCore};
use prover_core::root_provider::{Bootstrap, RootProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cycle::{CycleConfig, CycleDriver};
use crate::state::CycleStatus;

#[derive(Parser, Debug)]
#[command(name = "exit-delay-prover")]
#[command(about = "Monitors validator exit delays and submits penalty proofs on-chain")]
struct Args {
    /// Chain ID of the network being monitored.
    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,

    /// Fork schedule name, e.g. "deneb"; informational only, logged at
    /// startup alongside the chain ID.
    #[arg(long, env = "FORK_NAME", default_value = "deneb")]
    fork_name: String,

    #[arg(long, env = "GENESIS_TIME")]
    genesis_time: u64,

    #[arg(long, env = "SECONDS_PER_SLOT", default_value_t = 12)]
    seconds_per_slot: u64,

    #[arg(long, env = "SLOTS_PER_EPOCH", default_value_t = 32)]
    slots_per_epoch: u64,

    #[arg(long, env = "SLOTS_PER_HISTORICAL_ROOT", default_value_t = 8192)]
    slots_per_historical_root: u64,

    #[arg(long, env = "CAPELLA_FORK_EPOCH")]
    capella_fork_epoch: u64,

    /// Comma-separated execution-layer RPC URLs, tried in order.
    #[arg(long, env = "EL_RPC_URLS", value_delimiter = ',')]
    el_rpc_urls: Vec<String>,

    /// Comma-separated consensus-layer (beacon) API URLs, tried in order.
    #[arg(long, env = "CL_API_URLS", value_delimiter = ',')]
    cl_api_urls: Vec<String>,

    /// Delay between retries against a single execution-layer endpoint.
    #[arg(long, env = "EL_RETRY_DELAY_MS", default_value_t = 1000)]
    el_retry_delay_ms: u64,

    /// Delay between retries against a single consensus-layer endpoint.
    #[arg(long, env = "CL_RETRY_DELAY_MS", default_value_t = 1000)]
    cl_retry_delay_ms: u64,

    /// Per-request timeout applied to both endpoint kinds.
    #[arg(long, env = "RESPONSE_TIMEOUT_MS", default_value_t = 10_000)]
    response_timeout_ms: u64,

    /// Maximum retries across all endpoints before a fetch gives up.
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Root locator contract; every other on-chain address is resolved
    /// from it at startup.
    #[arg(long, env = "LIDO_LOCATOR_ADDRESS")]
    lido_locator_address: Address,

    /// Private key used to sign penalty-report transactions. Omit to run
    /// read-only (accumulation and verification still run, submission does
    /// not).
    #[arg(long, env = "TX_SIGNER_PRIVATE_KEY")]
    tx_signer_private_key: Option<String>,

    #[arg(long, env = "TX_MIN_GAS_PRIORITY_FEE", default_value_t = 1_000_000_000)]
    tx_min_gas_priority_fee: u128,

    #[arg(long, env = "TX_MAX_GAS_PRIORITY_FEE", default_value_t = 10_000_000_000)]
    tx_max_gas_priority_fee: u128,

    #[arg(long, env = "TX_GAS_PRIORITY_FEE_PERCENTILE", default_value_t = 0.6)]
    tx_gas_priority_fee_percentile: f64,

    /// Rolling window, in days, over which gas-fee-history acceptability is
    /// evaluated; converted to a block count (via `secondsPerSlot`) that
    /// bounds both `GasManager`'s cache and its `eth_feeHistory` refresh.
    #[arg(long, env = "TX_GAS_FEE_HISTORY_DAYS", default_value_t = 2)]
    tx_gas_fee_history_days: u64,

    #[arg(long, env = "TX_GAS_FEE_HISTORY_PERCENTILE", default_value_t = 0.6)]
    tx_gas_fee_history_percentile: f64,

    #[arg(long, env = "TX_GAS_LIMIT", default_value_t = 500_000)]
    tx_gas_limit: u64,

    /// Validators attempted per deadline group per cycle; the remainder
    /// stays in the store and is retried next cycle.
    #[arg(long, env = "VALIDATOR_BATCH_SIZE", default_value_t = 50)]
    validator_batch_size: usize,

    /// Not separately wired: batches are one validator per transaction, so
    /// no payload ever approaches a calldata size limit (see `DESIGN.md`).
    #[arg(long, env = "MAX_TRANSACTION_SIZE_BYTES", default_value_t = 131_072)]
    max_transaction_size_bytes: u64,

    /// Not separately wired: `TransactionExecutor` already retries its own
    /// mining wait via `confirmations`/`high_gas_retry_delay`.
    #[arg(long, env = "TX_MINING_WAITING_TIMEOUT_MS", default_value_t = 120_000)]
    tx_mining_waiting_timeout_ms: u64,

    #[arg(long, env = "TX_CONFIRMATIONS", default_value_t = 1)]
    tx_confirmations: u64,

    /// Bootstrap point when no progress has been persisted yet: an exact
    /// root (hex, 0x-prefixed).
    #[arg(long, env = "START_ROOT")]
    start_root: Option<String>,

    /// Bootstrap point: an exact slot.
    #[arg(long, env = "START_SLOT")]
    start_slot: Option<u64>,

    /// Bootstrap point: an exact epoch.
    #[arg(long, env = "START_EPOCH")]
    start_epoch: Option<u64>,

    /// Bootstrap point: look back this many days from the current
    /// finalized head. Used only if none of `startRoot`/`startSlot`/
    /// `startEpoch` are set.
    #[arg(long, env = "START_LOOKBACK_DAYS", default_value_t = 1)]
    start_lookback_days: u64,

    /// Sleep between cycles; clamped to a 10s minimum.
    #[arg(long, env = "DAEMON_SLEEP_INTERVAL_MS", default_value_t = 300_000)]
    daemon_sleep_interval_ms: u64,

    /// Run the full cycle (accumulate + verify) without submitting
    /// transactions or persisting progress, so an operator can re-run it
    /// repeatedly against the same range.
    #[arg(long, env = "DRY_RUN", default_value_t = false)]
    dry_run: bool,

    /// API listen address.
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    http_port: u16,

    /// Path to the persisted-progress JSON file.
    #[arg(long, env = "STATE_PATH", default_value = "prover-state.json")]
    state_path: String,

    /// Bound on blocks spanned by one `eth_getLogs` scan.
    #[arg(long, env = "MAX_ACCUMULATE_BLOCK_RANGE", default_value_t = 10_000)]
    max_accumulate_block_range: u64,

    /// Search window, in slots, when resolving a skipped-slot beacon
    /// header back to the nearest populated ancestor.
    #[arg(long, env = "SLOT_SKIP_MAX_SEARCH", default_value_t = 32)]
    slot_skip_max_search: u64,
}

fn bootstrap(args: &Args) -> Result<Bootstrap> {
    if let Some(root) = &args.start_root {
        let bytes = hex::decode(root.trim_start_matches("0x")).context("invalid startRoot hex")?;
        let root: [u8; 32] = bytes.try_into().map_err(|_| anyhow::anyhow!("startRoot must be 32 bytes"))?;
        return Ok(Bootstrap::Root(root));
    }
    if let Some(slot) = args.start_slot {
        return Ok(Bootstrap::Slot(slot));
    }
    if let Some(epoch) = args.start_epoch {
        return Ok(Bootstrap::Epoch(epoch));
    }
    Ok(Bootstrap::None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    tracing::info!(chain_id = args.chain_id, fork = %args.fork_name, "starting exit delay prover");
    tracing::info!(el_rpc_urls = ?args.el_rpc_urls, cl_api_urls = ?args.cl_api_urls, "configured endpoints");
    tracing::info!(
        max_transaction_size_bytes = args.max_transaction_size_bytes,
        tx_mining_waiting_timeout_ms = args.tx_mining_waiting_timeout_ms,
        el_retry_delay_ms = args.el_retry_delay_ms,
        cl_retry_delay_ms = args.cl_retry_delay_ms,
        response_timeout_ms = args.response_timeout_ms,
        max_retries = args.max_retries,
        "configuration knobs without dedicated downstream plumbing, recorded for operators"
    );

    anyhow::ensure!(!args.el_rpc_urls.is_empty(), "at least one execution-layer RPC URL is required");
    anyhow::ensure!(!args.cl_api_urls.is_empty(), "at least one consensus-layer API URL is required");

    let el_rpc_url = args.el_rpc_urls[0].clone();
    let beacon = BeaconClient::new(args.cl_api_urls.clone());

    let resolved = resolve_from_locator(&el_rpc_url, args.lido_locator_address)
        .await
        .context("failed to resolve contract addresses from lidoLocatorAddress")?;
    tracing::info!(
        staking_router = %resolved.staking_router,
        oracle = %resolved.exit_requests_oracle,
        verifier = %resolved.exit_delay_verifier,
        "resolved contract addresses from locator"
    );

    let url: reqwest::Url = el_rpc_url.parse().context("invalid execution-layer RPC URL")?;
    let provider = ProviderBuilder::new().connect_http(url);
    let verifier = ExitDelayVerifier::new(resolved.exit_delay_verifier, &provider);
    let shard_committee_period_in_seconds = verifier
        .shardCommitteePeriodInSeconds()
        .call()
        .await
        .context("ExitDelayVerifier.shardCommitteePeriodInSeconds call failed")?;

    let beacon_config = BeaconConfig {
        genesis_time: args.genesis_time,
        seconds_per_slot: args.seconds_per_slot,
        slots_per_epoch: args.slots_per_epoch,
        slots_per_historical_root: args.slots_per_historical_root,
        capella_fork_epoch: args.capella_fork_epoch,
        shard_committee_period_in_seconds,
    };

    let fee_history_window_blocks =
        (args.tx_gas_fee_history_days * 86_400 / args.seconds_per_slot.max(1)).max(1);
    let gas = GasManager::new(
        args.tx_gas_fee_history_percentile,
        args.tx_min_gas_priority_fee,
        args.tx_max_gas_priority_fee,
        fee_history_window_blocks,
    );

    let executor_config = ExecutorConfig {
        rpc_url: el_rpc_url.clone(),
        dry_run: args.dry_run,
        gas_limit_hard_cap: args.tx_gas_limit,
        high_gas_retry_delay: Duration::from_millis(args.el_retry_delay_ms),
    };
    let signer = match &args.tx_signer_private_key {
        Some(key) => {
            let key = key.strip_prefix("0x").unwrap_or(key);
            Some(key.parse().context("invalid txSignerPrivateKey")?)
        }
        None => None,
    };
    let executor = TransactionExecutor::new(executor_config, signer, gas);

    let prover_config = ProverConfig {
        beacon: beacon_config.clone(),
        el_rpc_url: el_rpc_url.clone(),
        verifier_address: resolved.exit_delay_verifier,
        oracle_address: resolved.exit_requests_oracle,
        staking_router_address: resolved.staking_router,
        private_key: args.tx_signer_private_key.clone(),
        max_accumulate_block_range: args.max_accumulate_block_range,
        validator_batch_size: args.validator_batch_size,
        slot_skip_max_search: args.slot_skip_max_search,
        confirmations: args.tx_confirmations,
    };
    let prover = ProverCore::new(prover_config, beacon.clone(), executor)
        .context("failed to initialize prover core")?;

    let persistence = JsonFilePersistence::new(args.state_path.clone());
    let root_provider = RootProvider::new(
        beacon.clone(),
        persistence.clone(),
        beacon_config,
        bootstrap(&args)?,
        args.start_lookback_days,
    );

    let status = CycleStatus::new(args.dry_run);

    let sleep_interval = Duration::from_millis(args.daemon_sleep_interval_ms.max(10_000));
    let cycle_config = CycleConfig {
        el_rpc_url,
        sleep_interval,
        error_recovery_sleep: Duration::from_millis(args.el_retry_delay_ms.max(1000)),
        dry_run: args.dry_run,
        healthy_slots_behind: 64,
    };
    let mut driver =
        CycleDriver::new(cycle_config, beacon, root_provider, persistence, prover, status.clone());

    let cycle_handle = tokio::spawn(async move { driver.run_forever().await });
    let listen = format!("0.0.0.0:{}", args.http_port);
    let api_handle = tokio::spawn(api::run_server(listen, status));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
        result = api_handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "API server task panicked");
            }
        }
        result = cycle_handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "cycle driver task panicked");
            }
        }
    }

    Ok(())
}
