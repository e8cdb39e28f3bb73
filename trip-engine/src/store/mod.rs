//! Checkpoint persistence.
//!
//! Progress is never stored directly: a trip is rebuilt from its persisted
//! checkpoints through [`TripProgress::initialize`](crate::checkpoint::TripProgress::initialize).
//! A store therefore only needs to load and append checkpoints per request.

mod json;
mod memory;

pub use json::{JsonCheckpointStore, JsonStoreConfig};
pub use memory::MemoryCheckpointStore;

use crate::checkpoint::{Checkpoint, RequestId};

/// Errors from a checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed
    #[error("storage error: {message}")]
    Io { message: String },

    /// Stored data could not be encoded or decoded
    #[error("JSON error: {message}")]
    Json { message: String },
}

/// Trait for persisting checkpoints.
///
/// This abstraction allows sessions to be tested without touching disk.
pub trait CheckpointStore: Send + Sync {
    /// Load every checkpoint recorded for a request, in any order.
    ///
    /// Returns an empty list for a request with no checkpoints.
    fn load(&self, request_id: &RequestId) -> Result<Vec<Checkpoint>, StoreError>;

    /// Append one checkpoint to a request's record.
    fn append(&self, request_id: &RequestId, checkpoint: &Checkpoint) -> Result<(), StoreError>;
}
