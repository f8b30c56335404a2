//! Run history persistence.
//!
//! The orchestrator hands every completed run to a [`HistoryStore`] and
//! never reads history back into pipeline state. When no store is
//! configured the no-op implementation keeps the contract without
//! persisting anything, so a missing history directory can never fail a
//! run.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

use sr_protocol::{HistoryItem, ScriptBlock};

/// Errors raised by a history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("history record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to traverse history directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Persistence contract for completed runs.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one completed run. Returns the stored item, or `None`
    /// when the store is not configured.
    async fn save(
        &self,
        topic: &str,
        model_id: &str,
        blocks: &[ScriptBlock],
    ) -> Result<Option<HistoryItem>, HistoryError>;

    /// All stored runs, newest first.
    async fn list(&self) -> Result<Vec<HistoryItem>, HistoryError>;

    /// Delete one run; returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool, HistoryError>;
}

/// The unconfigured store: saving degrades to a no-op.
pub struct NoopHistoryStore;

#[async_trait]
impl HistoryStore for NoopHistoryStore {
    async fn save(
        &self,
        _topic: &str,
        _model_id: &str,
        _blocks: &[ScriptBlock],
    ) -> Result<Option<HistoryItem>, HistoryError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: Uuid) -> Result<bool, HistoryError> {
        Ok(false)
    }
}

/// One pretty-printed JSON document per run under a directory.
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn save(
        &self,
        topic: &str,
        model_id: &str,
        blocks: &[ScriptBlock],
    ) -> Result<Option<HistoryItem>, HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| HistoryError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let item = HistoryItem {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            topic: topic.to_string(),
            model_id: model_id.to_string(),
            blocks: blocks.to_vec(),
        };

        let path = self.path_for(item.id);
        let encoded = serde_json::to_string_pretty(&item)?;
        std::fs::write(&path, encoded).map_err(|source| HistoryError::Io { path, source })?;

        Ok(Some(item))
    }

    async fn list(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(path).map_err(|source| HistoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            match serde_json::from_str::<HistoryItem>(&content) {
                Ok(item) => items.push(item),
                Err(error) => {
                    // One corrupt record must not hide the rest.
                    warn!(path = %path.display(), error = %error, "skipping unreadable history record");
                }
            }
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, HistoryError> {
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(HistoryError::Io { path, source }),
        }
    }
}
