//! Beacon API HTTP Client
//!
//! Generalizes the teacher's single-endpoint `BeaconClient` into a
//! multi-endpoint failover list (spec's ambient availability requirement —
//! a single flaky beacon node must not stall the cycle), and adds fork
//! dispatch off the `Eth-Consensus-Version` response header, the same
//! version-mismatch safeguard `risc0-labs-risc0-lido-accounting-oracle`'s
//! `VersionedResponse` wrapper uses for its JSON responses applied here to
//! the raw-SSZ debug-state endpoint.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::model::{BlockHeaderFields, Slot};
use crate::ssz_types::ForkName;

#[derive(Debug, Error)]
pub enum BeaconClientError {
    #[error("transport error against {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("all {0} configured endpoints failed")]
    AllEndpointsFailed(usize),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("state not found for slot {0}")]
    StateNotFound(Slot),
    #[error("header not found for slot {0}")]
    HeaderNotFound(Slot),
    #[error("validator {0} not found in state {1}")]
    ValidatorNotFound(u64, String),
    #[error("unsupported fork {0:?} reported by consensus version header")]
    UnsupportedFork(String),
    #[error("no available slot found within {0} skips of {1}")]
    SlotSkipSearchExhausted(u64, Slot),
}

impl BeaconClientError {
    /// Whether retrying against a different endpoint is worth attempting.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::AllEndpointsFailed(_) | Self::InvalidResponse(_)
        )
    }
}

/// A fetched beacon block header plus its fork name, needed to size the
/// state's own Merkle tree depth before a proof can be built.
#[derive(Debug, Clone)]
pub struct FetchedHeader {
    pub header: BlockHeaderFields,
    pub fork: ForkName,
}

/// Beacon API client with ordered endpoint failover.
#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: Client,
    endpoints: Vec<String>,
}

impl BeaconClient {
    /// # Panics
    /// Panics if `endpoints` is empty — a client with no backends configured
    /// is a configuration error, not a runtime one.
    #[must_use]
    pub fn new(endpoints: Vec<String>) -> Self {
        assert!(!endpoints.is_empty(), "beacon client needs at least one endpoint");
        Self { client: Client::new(), endpoints }
    }

    /// Try each endpoint in order until one succeeds; return the last error
    /// if all fail.
    async fn try_each<T, F, Fut>(&self, op: F) -> Result<T, BeaconClientError>
    where
        F: Fn(Client, String) -> Fut,
        Fut: std::future::Future<Output = Result<T, BeaconClientError>>,
    {
        let mut last_err = None;
        for base_url in &self.endpoints {
            match op(self.client.clone(), base_url.clone()).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    warn!(endpoint = %base_url, error = %e, "beacon endpoint failed, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(BeaconClientError::AllEndpointsFailed(self.endpoints.len())))
    }

    /// Fetch a beacon state as raw SSZ bytes, along with the fork name
    /// reported by the `Eth-Consensus-Version` header.
    #[instrument(skip(self))]
    pub async fn get_state_ssz(&self, state_id: &str) -> Result<(Vec<u8>, ForkName), BeaconClientError> {
        let state_id = state_id.to_string();
        self.try_each(move |client, base_url| {
            let state_id = state_id.clone();
            async move {
                let url = format!("{base_url}/eth/v2/debug/beacon/states/{state_id}");
                let response = client
                    .get(&url)
                    .header("Accept", "application/octet-stream")
                    .send()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url: url.clone(), source })?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(BeaconClientError::StateNotFound(state_id.parse().unwrap_or(0)));
                }
                if !response.status().is_success() {
                    return Err(BeaconClientError::InvalidResponse(format!(
                        "unexpected status {}",
                        response.status()
                    )));
                }

                let fork_header = response
                    .headers()
                    .get("Eth-Consensus-Version")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        BeaconClientError::InvalidResponse("missing Eth-Consensus-Version header".into())
                    })?;
                let fork = ForkName::parse(&fork_header)
                    .ok_or(BeaconClientError::UnsupportedFork(fork_header))?;

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url, source })?
                    .to_vec();
                Ok((bytes, fork))
            }
        })
        .await
    }

    /// Fetch a beacon block header by slot/`"head"`/`"finalized"`.
    #[instrument(skip(self))]
    pub async fn get_header(&self, block_id: &str) -> Result<FetchedHeader, BeaconClientError> {
        let block_id = block_id.to_string();
        self.try_each(move |client, base_url| {
            let block_id = block_id.clone();
            async move {
                let url = format!("{base_url}/eth/v1/beacon/headers/{block_id}");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url: url.clone(), source })?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(BeaconClientError::HeaderNotFound(block_id.parse().unwrap_or(0)));
                }

                let resp: HeaderResponse = response
                    .json()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url, source })?;
                let msg = resp.data.header.message;

                let header = BlockHeaderFields {
                    slot: parse_u64(&msg.slot)?,
                    proposer_index: parse_u64(&msg.proposer_index)?,
                    parent_root: parse_hex32(&msg.parent_root)?,
                    state_root: parse_hex32(&msg.state_root)?,
                    body_root: parse_hex32(&msg.body_root)?,
                };

                let fork_header = resp
                    .version
                    .ok_or_else(|| BeaconClientError::InvalidResponse("missing version field".into()))?;
                let fork = ForkName::parse(&fork_header)
                    .ok_or(BeaconClientError::UnsupportedFork(fork_header))?;

                Ok(FetchedHeader { header, fork })
            }
        })
        .await
    }

    pub async fn get_head_slot(&self) -> Result<Slot, BeaconClientError> {
        Ok(self.get_header("head").await?.header.slot)
    }

    pub async fn get_finalized_header(&self) -> Result<FetchedHeader, BeaconClientError> {
        self.get_header("finalized").await
    }

    /// Fetch a beacon block by slot/`"head"`/`"finalized"`/root and return
    /// its execution payload's block hash, the bridge the cycle driver uses
    /// to resolve a finalized beacon root to an execution-layer block
    /// number (`beaconBlock.executionPayload.blockHash -> getBlock(hash).number`).
    #[instrument(skip(self))]
    pub async fn get_execution_block_hash(&self, block_id: &str) -> Result<[u8; 32], BeaconClientError> {
        let block_id = block_id.to_string();
        self.try_each(move |client, base_url| {
            let block_id = block_id.clone();
            async move {
                let url = format!("{base_url}/eth/v2/beacon/blocks/{block_id}");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url: url.clone(), source })?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(BeaconClientError::HeaderNotFound(block_id.parse().unwrap_or(0)));
                }

                let resp: BlockResponse = response
                    .json()
                    .await
                    .map_err(|source| BeaconClientError::Transport { url, source })?;
                parse_hex32(&resp.data.message.body.execution_payload.block_hash)
            }
        })
        .await
    }

    /// Walk forward from `slot` until a non-missed (i.e. not 404) header is
    /// found, up to `max_skips` slots ahead. Beacon chains occasionally skip
    /// a slot when no block is proposed; callers that need "the block at or
    /// after slot X" (e.g. the deadline slot's own header in current mode)
    /// use this instead of failing outright on a skipped slot.
    #[instrument(skip(self))]
    pub async fn find_next_available_slot(
        &self,
        slot: Slot,
        max_skips: u64,
    ) -> Result<FetchedHeader, BeaconClientError> {
        for offset in 0..=max_skips {
            let candidate = slot + offset;
            match self.get_header(&candidate.to_string()).await {
                Ok(header) => return Ok(header),
                Err(BeaconClientError::HeaderNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(BeaconClientError::SlotSkipSearchExhausted(max_skips, slot))
    }
}

fn parse_u64(s: &str) -> Result<u64, BeaconClientError> {
    s.parse()
        .map_err(|e| BeaconClientError::InvalidResponse(format!("invalid integer {s:?}: {e}")))
}

fn parse_hex32(s: &str) -> Result<[u8; 32], BeaconClientError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| BeaconClientError::InvalidResponse(format!("invalid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| BeaconClientError::InvalidResponse("expected 32 bytes".to_string()))
}

#[derive(Deserialize)]
struct HeaderResponse {
    version: Option<String>,
    data: HeaderData,
}

#[derive(Deserialize)]
struct HeaderData {
    header: HeaderMessage,
}

#[derive(Deserialize)]
struct HeaderMessage {
    message: BeaconBlockHeaderJson,
}

#[derive(Deserialize)]
struct BeaconBlockHeaderJson {
    slot: String,
    proposer_index: String,
    parent_root: String,
    state_root: String,
    body_root: String,
}

#[derive(Deserialize)]
struct BlockResponse {
    data: BlockData,
}

#[derive(Deserialize)]
struct BlockData {
    message: BlockMessage,
}

#[derive(Deserialize)]
struct BlockMessage {
    body: BlockBody,
}

#[derive(Deserialize)]
struct BlockBody {
    execution_payload: ExecutionPayloadJson,
}

#[derive(Deserialize)]
struct ExecutionPayloadJson {
    block_hash: String,
}
