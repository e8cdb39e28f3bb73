//! Checkpoint progression engine.
//!
//! Drives a confirmed trip through its itinerary in order, accepting a
//! check-in only inside the geofence of the expected location and only with
//! supporting evidence. The trip completes when the destination is checked in.

mod error;
mod progress;
mod record;

#[cfg(test)]
mod progress_tests;

pub use error::CheckInError;
pub use progress::{
    CheckInReceipt, MAX_EVIDENCE_IMAGES, MIN_EVIDENCE_IMAGES, TripProgress, TripState,
};
pub use record::{CheckInAttempt, Checkpoint, ImageRef, RequestId};
