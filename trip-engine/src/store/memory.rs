//! In-memory checkpoint store.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::checkpoint::{Checkpoint, RequestId};

use super::{CheckpointStore, StoreError};

/// Checkpoint store backed by a map, for tests and single-process use.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    records: Mutex<HashMap<RequestId, Vec<Checkpoint>>>,
}

impl MemoryCheckpointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of checkpoints stored for a request.
    pub fn count(&self, request_id: &RequestId) -> usize {
        self.records
            .lock()
            .map(|records| records.get(request_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, request_id: &RequestId) -> Result<Vec<Checkpoint>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Io {
            message: "checkpoint store lock poisoned".to_string(),
        })?;
        Ok(records.get(request_id).cloned().unwrap_or_default())
    }

    fn append(&self, request_id: &RequestId, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Io {
            message: "checkpoint store lock poisoned".to_string(),
        })?;
        records
            .entry(request_id.clone())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }
}
