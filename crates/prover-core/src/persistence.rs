//! Progress Persistence
//!
//! The only state a restart needs to recover the cycle driver's position:
//! the last finalized root fully accumulated-and-verified. Behind a trait
//! so the on-disk encoding stays swappable without touching `root_provider`
//! or `cycle` — mirrors the teacher's preference for a small trait boundary
//! around I/O, the same shape `BeaconClient` gives the beacon API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::instrument;

use crate::model::{Root, Slot};

/// The one piece of durable state a restart needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastProcessedRoot {
    pub root: Root,
    pub slot: Slot,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed persisted state at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load(&self) -> Result<Option<LastProcessedRoot>, PersistenceError>;
    async fn save(&self, value: &LastProcessedRoot) -> Result<(), PersistenceError>;
}

/// JSON-file-backed implementation. Writes go to a sibling `.tmp` file
/// first and are renamed into place, so a crash mid-write never leaves a
/// half-written file for the next startup's `load()` to choke on.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: std::path::PathBuf,
}

impl JsonFilePersistence {
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Persistence for JsonFilePersistence {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Option<LastProcessedRoot>, PersistenceError> {
        let path = self.path.to_string_lossy().to_string();
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|source| PersistenceError::Malformed { path, source })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read { path, source }),
        }
    }

    #[instrument(skip(self, value))]
    async fn save(&self, value: &LastProcessedRoot) -> Result<(), PersistenceError> {
        let path = self.path.to_string_lossy().to_string();
        let tmp_path = self.path.with_extension("tmp");

        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|source| PersistenceError::Malformed { path: path.clone(), source })?;

        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| PersistenceError::Write { path: path.clone(), source })?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| PersistenceError::Write { path, source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_on_missing_file_returns_none() {
        let dir = tempfile_dir();
        let persistence = JsonFilePersistence::new(dir.join("last_root.json"));
        assert_eq!(persistence.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile_dir();
        let persistence = JsonFilePersistence::new(dir.join("last_root.json"));
        let value = LastProcessedRoot { root: [7u8; 32], slot: 12345 };

        persistence.save(&value).await.unwrap();
        assert_eq!(persistence.load().await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn save_overwrites_previous_value() {
        let dir = tempfile_dir();
        let persistence = JsonFilePersistence::new(dir.join("last_root.json"));

        persistence.save(&LastProcessedRoot { root: [1u8; 32], slot: 1 }).await.unwrap();
        persistence.save(&LastProcessedRoot { root: [2u8; 32], slot: 2 }).await.unwrap();

        assert_eq!(persistence.load().await.unwrap(), Some(LastProcessedRoot { root: [2u8; 32], slot: 2 }));
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "prover-core-persistence-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
