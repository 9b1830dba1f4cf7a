//! Root Provider (C10)
//!
//! Decides the `(prev, latest)` finalized-root pair the cycle driver works
//! on: `latest` is always the current finalized header; `prev` resolves
//! through three tiers in order — persisted progress, a configured
//! bootstrap point, or a lookback window — stopping at whichever tier
//! applies rather than cascading past a tier whose own fetch fails.

use tracing::{instrument, warn};

use crate::beacon_client::{BeaconClient, FetchedHeader};
use crate::model::{epoch_to_slot, BeaconConfig, Epoch, Root, Slot};
use crate::persistence::Persistence;

/// Where to anchor `prev` when no progress has been persisted yet.
#[derive(Debug, Clone, Copy)]
pub enum Bootstrap {
    Root(Root),
    Slot(Slot),
    Epoch(Epoch),
    None,
}

/// The pair of headers one cycle spans.
#[derive(Debug, Clone)]
pub struct RootPair {
    pub prev: FetchedHeader,
    pub latest: FetchedHeader,
}

pub struct RootProvider<P> {
    beacon: BeaconClient,
    persistence: P,
    config: BeaconConfig,
    bootstrap: Bootstrap,
    start_lookback_days: u64,
}

impl<P: Persistence> RootProvider<P> {
    #[must_use]
    pub fn new(
        beacon: BeaconClient,
        persistence: P,
        config: BeaconConfig,
        bootstrap: Bootstrap,
        start_lookback_days: u64,
    ) -> Self {
        Self { beacon, persistence, config, bootstrap, start_lookback_days }
    }

    /// `None` means the caller should sleep and try again next cycle —
    /// either because `prev == latest` already, or because the applicable
    /// tier's fetch failed.
    #[instrument(skip(self))]
    pub async fn next_roots(&self) -> Option<RootPair> {
        let latest = match self.beacon.get_finalized_header().await {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, "failed to fetch finalized header");
                return None;
            }
        };

        let prev = self.resolve_prev().await?;

        // `BlockHeaderFields` equality implies equal SSZ roots, since the
        // root is a pure function of these fields.
        if prev.header == latest.header {
            return None;
        }

        Some(RootPair { prev, latest })
    }

    async fn resolve_prev(&self) -> Option<FetchedHeader> {
        match self.persistence.load().await {
            Ok(Some(persisted)) => {
                return self.fetch_by_root(persisted.root).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to read persisted progress, falling back to bootstrap");
            }
        }

        match self.bootstrap {
            Bootstrap::Root(root) => self.fetch_by_root(root).await,
            Bootstrap::Slot(slot) => self.fetch_by_slot(slot).await,
            Bootstrap::Epoch(epoch) => {
                self.fetch_by_slot(epoch_to_slot(epoch, self.config.slots_per_epoch)).await
            }
            Bootstrap::None => self.fetch_by_slot(self.lookback_slot()).await,
        }
    }

    async fn fetch_by_root(&self, root: Root) -> Option<FetchedHeader> {
        let block_id = format!("0x{}", hex::encode(root));
        match self.beacon.get_header(&block_id).await {
            Ok(header) => Some(header),
            Err(e) => {
                warn!(error = %e, root = %block_id, "failed to fetch header for bootstrap root");
                None
            }
        }
    }

    async fn fetch_by_slot(&self, slot: Slot) -> Option<FetchedHeader> {
        match self.beacon.get_header(&slot.to_string()).await {
            Ok(header) => Some(header),
            Err(e) => {
                warn!(error = %e, slot, "failed to fetch header for bootstrap slot");
                None
            }
        }
    }

    /// Slot whose timestamp is closest to `now - startLookbackDays`,
    /// rounded down.
    fn lookback_slot(&self) -> Slot {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let lookback_seconds = self.start_lookback_days * 24 * 3600;
        let target_timestamp = now.saturating_sub(lookback_seconds).max(self.config.genesis_time);
        (target_timestamp - self.config.genesis_time) / self.config.seconds_per_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockHeaderFields;
    use crate::ssz_types::ForkName;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePersistence {
        value: Mutex<Option<crate::persistence::LastProcessedRoot>>,
    }

    #[async_trait]
    impl Persistence for FakePersistence {
        async fn load(&self) -> Result<Option<crate::persistence::LastProcessedRoot>, crate::persistence::PersistenceError> {
            Ok(*self.value.lock().unwrap())
        }
        async fn save(&self, value: &crate::persistence::LastProcessedRoot) -> Result<(), crate::persistence::PersistenceError> {
            *self.value.lock().unwrap() = Some(*value);
            Ok(())
        }
    }

    fn config() -> BeaconConfig {
        BeaconConfig {
            genesis_time: 1_606_824_023,
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            capella_fork_epoch: 0,
            shard_committee_period_in_seconds: 98_304,
        }
    }

    #[test]
    fn lookback_slot_clamps_to_genesis() {
        let provider = RootProvider::new(
            BeaconClient::new(vec!["http://127.0.0.1:1".to_string()]),
            FakePersistence::default(),
            config(),
            Bootstrap::None,
            1_000_000,
        );
        assert_eq!(provider.lookback_slot(), 0);
    }

    #[tokio::test]
    async fn next_roots_returns_none_when_finalized_fetch_fails() {
        let provider = RootProvider::new(
            BeaconClient::new(vec!["http://127.0.0.1:1".to_string()]),
            FakePersistence::default(),
            config(),
            Bootstrap::Slot(0),
            30,
        );
        assert!(provider.next_roots().await.is_none());
    }

    fn header(slot: Slot) -> FetchedHeader {
        FetchedHeader { header: BlockHeaderFields { slot, ..Default::default() }, fork: ForkName::Electra }
    }

    #[test]
    fn identical_headers_compare_equal() {
        assert_eq!(header(100).header, header(100).header);
        assert_ne!(header(100).header, header(101).header);
    }
}
