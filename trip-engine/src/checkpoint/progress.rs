//! Trip execution state machine.
//!
//! A driver moves through the itinerary one location at a time. A check-in
//! is accepted only when enough evidence is attached and the reported
//! position is inside the geofence around the expected location. Every
//! check is done before anything is written, so a rejected attempt leaves
//! the trip exactly as it was and the caller can simply retry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::geo::distance_km;
use crate::itinerary::{Itinerary, ItineraryError, LocationPoint};

use super::error::CheckInError;
use super::record::{CheckInAttempt, Checkpoint, RequestId};

/// Minimum number of evidence images per check-in.
pub const MIN_EVIDENCE_IMAGES: usize = 1;

/// Maximum number of evidence images per check-in.
pub const MAX_EVIDENCE_IMAGES: usize = 2;

/// Coarse state of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripState {
    /// No checkpoint recorded yet
    NotStarted,
    /// Waiting for a check-in at `current_index`
    InProgress { current_index: usize },
    /// The destination has been checked in
    Completed,
}

/// Result of an accepted check-in.
#[derive(Debug, Clone)]
pub struct CheckInReceipt {
    /// The checkpoint just recorded
    pub checkpoint: Checkpoint,
    /// State of the trip after recording it
    pub progress: TripProgress,
}

/// Execution-time state of one trip.
///
/// # Invariants
///
/// - At least two locations, sorted by order
/// - `current_index` never decreases and stays below `locations.len()`
/// - `checkpoints` holds exactly the orders of `locations[..current_index]`,
///   plus the last location's order once `completed`
/// - `completed` is true exactly when the last location has a checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TripProgress {
    request_id: RequestId,
    locations: Vec<LocationPoint>,
    current_index: usize,
    checkpoints: BTreeMap<usize, Checkpoint>,
    completed: bool,
}

impl TripProgress {
    /// Build progress for a trip, resuming from checkpoints already persisted.
    ///
    /// `current_index` is the number of existing checkpoints. This is the
    /// only way progress is rebuilt after a restart; nothing else about the
    /// position in the trip is stored.
    ///
    /// # Errors
    ///
    /// - `EmptyItinerary` if there are fewer than two locations
    /// - `InvalidItinerary` if location orders have gaps or duplicates
    /// - `UnexpectedCheckpoint` if the existing checkpoints are not exactly
    ///   the first locations of the itinerary in order
    pub fn initialize(
        request_id: RequestId,
        locations: Vec<LocationPoint>,
        existing: Vec<Checkpoint>,
    ) -> Result<Self, CheckInError> {
        let locations = match Itinerary::new(locations) {
            Ok(itinerary) => itinerary.into_locations(),
            Err(ItineraryError::TooFewLocations { count }) => {
                warn!(%request_id, count, "refusing to start trip without a route");
                return Err(CheckInError::EmptyItinerary { count });
            }
            Err(e) => {
                warn!(%request_id, error = %e, "refusing to start trip with malformed route");
                return Err(CheckInError::InvalidItinerary(e));
            }
        };

        let mut existing = existing;
        existing.sort_by_key(|c| c.order);

        let mut checkpoints = BTreeMap::new();
        for (idx, checkpoint) in existing.into_iter().enumerate() {
            let expected = locations.get(idx).map(|l| l.order);
            if expected != Some(checkpoint.order) {
                warn!(%request_id, order = checkpoint.order, "persisted checkpoints out of sequence");
                return Err(CheckInError::UnexpectedCheckpoint {
                    order: checkpoint.order,
                    expected: expected.unwrap_or(locations.len()),
                });
            }
            checkpoints.insert(checkpoint.order, checkpoint);
        }

        let last = locations.len() - 1;
        let completed = checkpoints.len() == locations.len();
        let current_index = checkpoints.len().min(last);

        debug!(%request_id, current_index, completed, "trip progress initialized");

        Ok(Self {
            request_id,
            locations,
            current_index,
            checkpoints,
            completed,
        })
    }

    /// Start progress for a finalized itinerary.
    pub fn for_itinerary(
        request_id: RequestId,
        itinerary: &Itinerary,
        existing: Vec<Checkpoint>,
    ) -> Result<Self, CheckInError> {
        Self::initialize(request_id, itinerary.locations().to_vec(), existing)
    }

    /// Returns the request this trip belongs to.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the locations in visiting order.
    pub fn locations(&self) -> &[LocationPoint] {
        &self.locations
    }

    /// Returns the index of the location awaiting check-in.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns recorded checkpoints keyed by location order.
    pub fn checkpoints(&self) -> &BTreeMap<usize, Checkpoint> {
        &self.checkpoints
    }

    /// Returns the checkpoint for a location order, if recorded.
    pub fn checkpoint(&self, order: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(&order)
    }

    /// Returns true once the destination has been checked in.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the coarse state.
    pub fn state(&self) -> TripState {
        if self.completed {
            TripState::Completed
        } else if self.checkpoints.is_empty() {
            TripState::NotStarted
        } else {
            TripState::InProgress {
                current_index: self.current_index,
            }
        }
    }

    /// Returns the number of locations still to be checked in.
    pub fn remaining(&self) -> usize {
        self.locations.len() - self.checkpoints.len()
    }

    /// Returns the location the driver must check in at next.
    pub fn current_target(&self) -> Result<&LocationPoint, CheckInError> {
        if self.completed {
            return Err(CheckInError::AlreadyCompleted);
        }
        Ok(&self.locations[self.current_index])
    }

    /// Check an attempt against the current target without changing anything.
    ///
    /// On success returns the checkpoint that [`record`](Self::record) would
    /// store, stamped with `at`.
    pub fn validate_check_in(
        &self,
        attempt: &CheckInAttempt,
        radius_km: f64,
        at: DateTime<Utc>,
    ) -> Result<Checkpoint, CheckInError> {
        let target = self.current_target()?;

        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(CheckInError::InvalidRadius { radius_km });
        }

        let count = attempt.images.len();
        if count < MIN_EVIDENCE_IMAGES {
            return Err(CheckInError::EvidenceMissing);
        }
        if count > MAX_EVIDENCE_IMAGES {
            return Err(CheckInError::EvidenceLimitExceeded {
                count,
                limit: MAX_EVIDENCE_IMAGES,
            });
        }

        let distance = distance_km(&target.coordinate, &attempt.reported_coordinate);
        if distance > radius_km {
            return Err(CheckInError::OutOfGeofence {
                distance_km: distance,
                limit_km: radius_km,
            });
        }

        Ok(Checkpoint {
            order: target.order,
            reported_coordinate: attempt.reported_coordinate,
            timestamp: at,
            images: attempt.images.clone(),
            note: attempt.note.clone(),
        })
    }

    /// Commit a checkpoint produced by [`validate_check_in`](Self::validate_check_in)
    /// and advance.
    ///
    /// The checkpoint must be for the current target; anything else is
    /// rejected without changing state.
    pub fn record(&mut self, checkpoint: Checkpoint) -> Result<CheckInReceipt, CheckInError> {
        let expected = self.current_target()?.order;
        if checkpoint.order != expected {
            return Err(CheckInError::UnexpectedCheckpoint {
                order: checkpoint.order,
                expected,
            });
        }

        self.checkpoints.insert(checkpoint.order, checkpoint.clone());

        if self.current_index == self.locations.len() - 1 {
            self.completed = true;
            info!(request_id = %self.request_id, order = expected, "trip completed");
        } else {
            self.current_index += 1;
            info!(
                request_id = %self.request_id,
                order = expected,
                next_index = self.current_index,
                "checkpoint recorded"
            );
        }

        Ok(CheckInReceipt {
            checkpoint,
            progress: self.clone(),
        })
    }

    /// Validate and record a check-in stamped with the current time.
    pub fn attempt_check_in(
        &mut self,
        attempt: &CheckInAttempt,
        radius_km: f64,
    ) -> Result<CheckInReceipt, CheckInError> {
        self.attempt_check_in_at(attempt, radius_km, Utc::now())
    }

    /// Validate and record a check-in stamped with `at`.
    pub fn attempt_check_in_at(
        &mut self,
        attempt: &CheckInAttempt,
        radius_km: f64,
        at: DateTime<Utc>,
    ) -> Result<CheckInReceipt, CheckInError> {
        let checkpoint = self
            .validate_check_in(attempt, radius_km, at)
            .inspect_err(|e| debug!(request_id = %self.request_id, error = %e, "check-in rejected"))?;
        self.record(checkpoint)
    }
}
