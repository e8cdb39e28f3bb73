//! Disk-based checkpoint store.
//!
//! One JSON file per request, rewritten on every append. Trips are small
//! (a checkpoint per stop), so whole-file rewrites are fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkpoint::{Checkpoint, RequestId};

use super::{CheckpointStore, StoreError};

/// On-disk record for one request.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCheckpoints {
    request_id: String,
    checkpoints: Vec<Checkpoint>,
}

/// Configuration for the JSON checkpoint store.
#[derive(Debug, Clone)]
pub struct JsonStoreConfig {
    /// Directory holding one file per request.
    pub dir: PathBuf,
}

impl JsonStoreConfig {
    /// Create a config storing files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for JsonStoreConfig {
    fn default() -> Self {
        // Default to a directory under the current directory
        Self::new("checkpoints")
    }
}

/// Checkpoint store writing JSON files.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    config: JsonStoreConfig,
}

impl JsonCheckpointStore {
    /// Create a store with the given config.
    pub fn new(config: JsonStoreConfig) -> Self {
        Self { config }
    }

    /// Get the storage directory.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Path of the file for a request.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so a request id can
    /// never escape the storage directory.
    pub fn path_for(&self, request_id: &RequestId) -> PathBuf {
        let file: String = request_id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.config.dir.join(format!("{file}.json"))
    }

    fn read(&self, request_id: &RequestId) -> Result<Option<StoredCheckpoints>, StoreError> {
        let path = self.path_for(request_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    message: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let stored = serde_json::from_str(&contents).map_err(|e| StoreError::Json {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        Ok(Some(stored))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self, request_id: &RequestId) -> Result<Vec<Checkpoint>, StoreError> {
        Ok(self
            .read(request_id)?
            .map(|stored| stored.checkpoints)
            .unwrap_or_default())
    }

    fn append(&self, request_id: &RequestId, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let mut stored = self.read(request_id)?.unwrap_or_else(|| StoredCheckpoints {
            request_id: request_id.to_string(),
            checkpoints: Vec::new(),
        });
        stored.checkpoints.push(checkpoint.clone());

        // Create the directory if needed
        let dir = &self.config.dir;
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
                message: format!("failed to create checkpoint directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(&stored).map_err(|e| StoreError::Json {
            message: format!("failed to serialize checkpoints: {}", e),
        })?;

        let path = self.path_for(request_id);
        std::fs::write(&path, json).map_err(|e| StoreError::Io {
            message: format!("failed to write {}: {}", path.display(), e),
        })?;

        debug!(%request_id, order = checkpoint.order, path = %path.display(), "checkpoint persisted");
        Ok(())
    }
}
