//! Cross-module scenarios that don't fit inside any single `prover-core`
//! file's own `#[cfg(test)]` module: beacon-client responses feeding the
//! root provider's bootstrap tiers, and the store/decoder/deadline chain
//! a real accumulate-then-verify pass walks through.

use prover_core::beacon_client::BeaconClient;
use prover_core::decoder::decode_exit_requests;
use prover_core::deadline::resolve_exit_deadline;
use prover_core::model::{
    BeaconConfig, DeadlineEntry, DeadlineGroup, ExitRequest, ProvableBeaconBlockHeader,
};
use prover_core::persistence::{JsonFilePersistence, LastProcessedRoot, Persistence};
use prover_core::root_provider::{Bootstrap, RootProvider};
use prover_core::store::{ReportedSet, ValidatorStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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

fn header_json(slot: &str) -> String {
    format!(
        r#"{{
            "version": "electra",
            "data": {{
                "header": {{
                    "message": {{
                        "slot": "{slot}",
                        "proposer_index": "1",
                        "parent_root": "0x0101010101010101010101010101010101010101010101010101010101010101",
                        "state_root": "0x0202020202020202020202020202020202020202020202020202020202020202",
                        "body_root": "0x0303030303030303030303030303030303030303030303030303030303030303"
                    }}
                }}
            }}
        }}"#
    )
}

/// Scenario: a fresh daemon with no persisted progress bootstraps from a
/// configured slot, then on its next restart picks up exactly where the
/// prior cycle's persisted root left off.
#[tokio::test]
async fn root_provider_bootstraps_then_resumes_from_persisted_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eth/v1/beacon/headers/finalized"))
        .respond_with(ResponseTemplate::new(200).set_body_string(header_json("500")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eth/v1/beacon/headers/100"))
        .respond_with(ResponseTemplate::new(200).set_body_string(header_json("100")))
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!(
        "integration-tests-root-provider-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let persistence = JsonFilePersistence::new(dir.join("bootstrap_then_resume.json"));

    let beacon = BeaconClient::new(vec![server.uri()]);
    let provider = RootProvider::new(
        beacon.clone(),
        persistence.clone(),
        config(),
        Bootstrap::Slot(100),
        30,
    );

    let pair = provider.next_roots().await.expect("bootstrap tier should resolve a pair");
    assert_eq!(pair.prev.header.slot, 100);
    assert_eq!(pair.latest.header.slot, 500);

    // The cycle driver only persists once a pass over this pair succeeds.
    persistence
        .save(&LastProcessedRoot { root: [9u8; 32], slot: pair.latest.header.slot })
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/eth/v1/beacon/headers/0x{}", hex::encode([9u8; 32]))))
        .respond_with(ResponseTemplate::new(200).set_body_string(header_json("500")))
        .mount(&server)
        .await;

    // Simulate a restart: a brand new provider pointed at the same file
    // must resolve `prev` from the persisted root rather than the slot
    // bootstrap, and find `prev == latest` (nothing new to do yet).
    let resumed = RootProvider::new(beacon, persistence, config(), Bootstrap::Slot(100), 30);
    assert!(resumed.next_roots().await.is_none());
}

/// Scenario 3 (skipped deadline slot): the slot right after a deadline is
/// missing; the header search advances to the next populated slot and the
/// submitted `rootsTimestamp` reflects that later slot, not the original one.
#[tokio::test]
async fn skipped_deadline_slot_resolves_to_next_available_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eth/v1/beacon/headers/101"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eth/v1/beacon/headers/102"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eth/v1/beacon/headers/103"))
        .respond_with(ResponseTemplate::new(200).set_body_string(header_json("103")))
        .mount(&server)
        .await;

    let client = BeaconClient::new(vec![server.uri()]);
    let fetched = client.find_next_available_slot(101, 5).await.unwrap();
    assert_eq!(fetched.header.slot, 103);

    let cfg = config();
    let provable = ProvableBeaconBlockHeader::new(fetched.header, &cfg);
    assert_eq!(provable.roots_timestamp, cfg.genesis_time + 104 * cfg.seconds_per_slot);
}

/// Scenario 1 + 6 chained: a validator's exit deadline is computed, it
/// enters the store as eligible once the head slot passes it, stays
/// tracked across a reported cycle, and once the chain reports it as no
/// longer penalty-applicable, cleanup removes it and the store shrinks by
/// exactly one validator.
#[tokio::test]
async fn deadline_to_store_to_cleanup_lifecycle() {
    let cfg = config();

    let packed = {
        let mut bytes = vec![0u8; 64];
        bytes[0..3].copy_from_slice(&42u32.to_be_bytes()[1..]); // moduleId = 42
        bytes[3..8].copy_from_slice(&7u64.to_be_bytes()[3..]); // nodeOpId = 7
        bytes[8..16].copy_from_slice(&1234u64.to_be_bytes()); // validatorIndex
        bytes[16..64].copy_from_slice(&[0x11u8; 48]); // pubkey
        bytes
    };
    let validators = decode_exit_requests(&packed).unwrap();
    assert_eq!(validators.len(), 1);
    let validator = validators[0].clone();
    assert_eq!(validator.module_id, 42);
    assert_eq!(validator.node_op_id, 7);

    let activation_epoch = 100;
    let delivered_timestamp = cfg.genesis_time + 100_000_000;
    let threshold = 4 * 86_400;
    let deadline = resolve_exit_deadline(&cfg, activation_epoch, delivered_timestamp, threshold);

    let mut store = ValidatorStore::new();
    store.add(
        deadline.exit_deadline_slot,
        DeadlineGroup {
            exit_request: ExitRequest {
                exit_requests_hash: [1u8; 32],
                packed_data: packed,
                data_format: 0,
                delivered_timestamp,
            },
            entries: vec![DeadlineEntry {
                validator: validator.clone(),
                activation_epoch,
                exit_deadline_epoch: deadline.exit_deadline_epoch,
            }],
        },
    );

    // Head slot hasn't reached the deadline yet: nothing eligible.
    assert!(store.eligible_entries(deadline.exit_deadline_slot - 1).is_empty());

    // Head slot passes the deadline: exactly one group becomes eligible.
    let eligible = store.eligible_entries(deadline.exit_deadline_slot + 10);
    assert_eq!(eligible.len(), 1);
    assert_eq!(store.validator_count(), 1);

    // Submission confirms on-chain: the pubkey enters ReportedSet, and
    // cleanup keeps it in the store so it can be re-checked next cycle.
    let head_slot = deadline.exit_deadline_slot + 10;
    let mut reported = ReportedSet::new();
    reported.insert(validator.pubkey);
    store.cleanup(head_slot, &reported);
    assert_eq!(store.validator_count(), 1, "reported pubkeys stay in the store for re-checking");

    // Next cycle's penalty-applicability check comes back false: the
    // verify pass removes the pubkey from ReportedSet, and cleanup then
    // drops the validator from the store entirely.
    reported.remove(&validator.pubkey);
    store.cleanup(head_slot, &reported);
    assert!(store.is_empty());
    assert_eq!(store.validator_count(), 0);

    // Idempotent: a second cleanup pass over an already-empty store is a
    // no-op, not an error.
    store.cleanup(head_slot, &reported);
    assert!(store.is_empty());
}
