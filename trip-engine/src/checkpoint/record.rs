//! Checkpoint evidence records and identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Identifier of the booking request a trip belongs to.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an uploaded evidence image.
///
/// The engine counts and forwards these; it never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Evidence of having visited one itinerary location.
///
/// Created only for an accepted check-in and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Order of the location this checkpoint is for
    pub order: usize,
    pub reported_coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub images: Vec<ImageRef>,
    pub note: String,
}

/// A check-in request from the field.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInAttempt {
    /// Fresh position reading
    pub reported_coordinate: Coordinate,
    pub images: Vec<ImageRef>,
    pub note: String,
}

impl CheckInAttempt {
    pub fn new(
        reported_coordinate: Coordinate,
        images: Vec<ImageRef>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            reported_coordinate,
            images,
            note: note.into(),
        }
    }
}
