//! Shared Error Infrastructure
//!
//! One place for the `ErrorId`/one-shot-logging discipline every component
//! that talks to the network (beacon client, executor) follows: an error
//! worth surfacing to an operator gets a stable synthetic id the first time
//! it's seen, is logged exactly once at that point, and is then returned to
//! the caller already marked `logged` so retry loops don't spam the same
//! failure on every attempt.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ERROR_ID: AtomicU64 = AtomicU64::new(1);

/// A synthetic identifier assigned the first time an error is observed,
/// stable for the lifetime of that occurrence (it is not persisted or
/// deduplicated across process restarts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorId(u64);

impl ErrorId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ERROR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "err-{}", self.0)
    }
}

/// Wraps an error with its one-shot-logging bookkeeping. `logged` starts
/// `false`; call [`LoggedError::mark_logged`] at the point the error is
/// actually emitted via `tracing` so later retries can check it and skip
/// re-logging.
#[derive(Debug, Clone)]
pub struct LoggedError<E> {
    pub id: ErrorId,
    pub source: E,
    logged: bool,
}

impl<E> LoggedError<E> {
    #[must_use]
    pub fn new(source: E) -> Self {
        Self { id: ErrorId::next(), source, logged: false }
    }

    #[must_use]
    pub fn is_logged(&self) -> bool {
        self.logged
    }

    pub fn mark_logged(&mut self) {
        self.logged = true;
    }
}

impl<E: std::fmt::Display> std::fmt::Display for LoggedError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.source)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for LoggedError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
