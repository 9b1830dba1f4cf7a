//! Shared Cycle Status
//!
//! Thread-safe snapshot of the running daemon's progress, read by
//! `api.rs` and written once per cycle by `cycle.rs`. Structurally the
//! teacher's `AppState` (atomics for the hot counters, an `RwLock` for the
//! one string field, `Arc`-shared `Clone`), with consolidation-specific
//! fields replaced by the exit-delay-penalty cycle's own.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, cheaply cloned handle to the daemon's current status.
#[derive(Debug, Clone)]
pub struct CycleStatus {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    head_slot: AtomicU64,
    last_processed_slot: AtomicU64,
    cycles_total: AtomicU64,
    submissions_total: AtomicU64,
    validators_tracked: AtomicU64,
    dry_run: AtomicBool,
    start_time: std::time::Instant,
    last_error: parking_lot::RwLock<Option<String>>,
}

impl CycleStatus {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                head_slot: AtomicU64::new(0),
                last_processed_slot: AtomicU64::new(0),
                cycles_total: AtomicU64::new(0),
                submissions_total: AtomicU64::new(0),
                validators_tracked: AtomicU64::new(0),
                dry_run: AtomicBool::new(dry_run),
                start_time: std::time::Instant::now(),
                last_error: parking_lot::RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn head_slot(&self) -> u64 {
        self.inner.head_slot.load(Ordering::Relaxed)
    }

    pub fn set_head_slot(&self, slot: u64) {
        self.inner.head_slot.store(slot, Ordering::Relaxed);
    }

    #[must_use]
    pub fn last_processed_slot(&self) -> u64 {
        self.inner.last_processed_slot.load(Ordering::Relaxed)
    }

    pub fn set_last_processed_slot(&self, slot: u64) {
        self.inner.last_processed_slot.store(slot, Ordering::Relaxed);
    }

    #[must_use]
    pub fn slots_behind(&self) -> u64 {
        self.head_slot().saturating_sub(self.last_processed_slot())
    }

    pub fn record_cycle(&self) {
        self.inner.cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn cycles_total(&self) -> u64 {
        self.inner.cycles_total.load(Ordering::Relaxed)
    }

    pub fn record_submission(&self) {
        self.inner.submissions_total.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn submissions_total(&self) -> u64 {
        self.inner.submissions_total.load(Ordering::Relaxed)
    }

    pub fn set_validators_tracked(&self, count: u64) {
        self.inner.validators_tracked.store(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn validators_tracked(&self) -> u64 {
        self.inner.validators_tracked.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.inner.dry_run.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    pub fn set_error(&self, error: Option<String>) {
        *self.inner.last_error.write() = error;
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.read().clone()
    }

    /// Within `healthy_slots_behind` of head counts as healthy, same
    /// threshold shape as the teacher's hardcoded 64-slot check.
    #[must_use]
    pub fn is_healthy(&self, healthy_slots_behind: u64) -> bool {
        self.slots_behind() <= healthy_slots_behind
    }
}

/// Serializable view returned by the `/status` endpoint.
#[derive(Debug, Serialize)]
pub struct StatusSnapshot {
    pub head_slot: u64,
    pub last_processed_slot: u64,
    pub slots_behind: u64,
    pub cycles_total: u64,
    pub submissions_total: u64,
    pub validators_tracked: u64,
    pub dry_run: bool,
    pub uptime_secs: u64,
    pub last_error: Option<String>,
}

impl From<&CycleStatus> for StatusSnapshot {
    fn from(status: &CycleStatus) -> Self {
        Self {
            head_slot: status.head_slot(),
            last_processed_slot: status.last_processed_slot(),
            slots_behind: status.slots_behind(),
            cycles_total: status.cycles_total(),
            submissions_total: status.submissions_total(),
            validators_tracked: status.validators_tracked(),
            dry_run: status.dry_run(),
            uptime_secs: status.uptime_secs(),
            last_error: status.last_error(),
        }
    }
}
