//! REST API Endpoints
//!
//! Health, status, and metrics endpoints, directly mirroring the teacher's
//! `api.rs` router shape with `CycleStatus` swapped in for `AppState` and
//! the consolidation-record listing routes dropped (no per-validator
//! record endpoint in this system; `/status` carries the aggregate
//! counts `SPEC_FULL.md` §6 calls for).

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::state::{CycleStatus, StatusSnapshot};

/// Run the API server.
pub async fn run_server(listen: String, state: CycleStatus) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!(address = %listen, "API server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn create_router(state: CycleStatus) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .route("/metrics", get(metrics))
        .with_state(state)
}

const HEALTHY_SLOTS_BEHIND: u64 = 64;

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    slots_behind: u64,
}

async fn healthz(State(state): State<CycleStatus>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.is_healthy(HEALTHY_SLOTS_BEHIND);
    let status_code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        slots_behind: state.slots_behind(),
    };
    (status_code, Json(response))
}

async fn status(State(state): State<CycleStatus>) -> Json<StatusSnapshot> {
    Json(StatusSnapshot::from(&state))
}

/// Prometheus text-format exposition, hand-rolled the way the teacher's
/// `api.rs::metrics` is, rather than wired through
/// `metrics-exporter-prometheus`'s own HTTP listener.
async fn metrics(State(state): State<CycleStatus>) -> String {
    use metrics::{describe_counter, describe_gauge};

    describe_gauge!("prover_head_slot", "Current finalized beacon slot seen");
    describe_gauge!("prover_last_processed_slot", "Last beacon slot with a persisted processed root");
    describe_gauge!("prover_slots_behind", "Slots between head and last processed");
    describe_counter!("prover_cycles_total", "Total cycles run");
    describe_counter!("prover_submissions_total", "Total validators moved into the reported set");
    describe_gauge!("prover_validators_tracked", "Validators currently pending in the store");

    metrics::gauge!("prover_head_slot").set(state.head_slot() as f64);
    metrics::gauge!("prover_last_processed_slot").set(state.last_processed_slot() as f64);
    metrics::gauge!("prover_slots_behind").set(state.slots_behind() as f64);
    metrics::gauge!("prover_validators_tracked").set(state.validators_tracked() as f64);

    format!(
        "# HELP prover_head_slot Current finalized beacon slot seen\n\
         # TYPE prover_head_slot gauge\n\
         prover_head_slot {}\n\
         # HELP prover_last_processed_slot Last beacon slot with a persisted processed root\n\
         # TYPE prover_last_processed_slot gauge\n\
         prover_last_processed_slot {}\n\
         # HELP prover_slots_behind Slots between head and last processed\n\
         # TYPE prover_slots_behind gauge\n\
         prover_slots_behind {}\n\
         # HELP prover_cycles_total Total cycles run\n\
         # TYPE prover_cycles_total counter\n\
         prover_cycles_total {}\n\
         # HELP prover_submissions_total Total validators moved into the reported set\n\
         # TYPE prover_submissions_total counter\n\
         prover_submissions_total {}\n\
         # HELP prover_validators_tracked Validators currently pending in the store\n\
         # TYPE prover_validators_tracked gauge\n\
         prover_validators_tracked {}\n",
        state.head_slot(),
        state.last_processed_slot(),
        state.slots_behind(),
        state.cycles_total(),
        state.submissions_total(),
        state.validators_tracked(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_router_builds() {
        let state = CycleStatus::new(false);
        let _router = create_router(state);
    }

    #[tokio::test]
    async fn healthz_reports_degraded_past_threshold() {
        let state = CycleStatus::new(false);
        state.set_head_slot(200);
        state.set_last_processed_slot(100);

        let (status_code, Json(response)) = healthz(State(state)).await;

        assert_eq!(status_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, "degraded");
        assert_eq!(response.slots_behind, 100);
    }

    #[tokio::test]
    async fn status_endpoint_reflects_state() {
        let state = CycleStatus::new(true);
        state.set_head_slot(120);
        state.set_last_processed_slot(100);
        state.record_cycle();

        let Json(snapshot) = status(State(state)).await;

        assert_eq!(snapshot.head_slot, 120);
        assert_eq!(snapshot.slots_behind, 20);
        assert_eq!(snapshot.cycles_total, 1);
        assert!(snapshot.dry_run);
    }

    #[tokio::test]
    async fn metrics_endpoint_includes_gauges() {
        let state = CycleStatus::new(false);
        state.set_head_slot(100);
        state.set_last_processed_slot(50);

        let output = metrics(State(state)).await;

        assert!(output.contains("prover_head_slot 100"));
        assert!(output.contains("prover_slots_behind 50"));
    }
}
