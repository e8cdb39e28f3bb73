//! Scenario replay.
//!
//! A scenario is a JSON description of one or more trips: the places to
//! compose into an itinerary and the check-ins reported while driving it.
//! Trips run concurrently; check-ins within a trip run strictly in order.

use futures::future::join_all;
use serde::Deserialize;
use tracing::{info, warn};

use crate::checkpoint::{CheckInAttempt, ImageRef, RequestId};
use crate::geo::Coordinate;
use crate::itinerary::{ComposeError, Composer, Itinerary, Place};
use crate::session::TripSessions;
use crate::store::CheckpointStore;

/// A set of trips to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub trips: Vec<TripScenario>,
}

impl Scenario {
    /// Parse a scenario from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One trip: its route and the check-ins reported along it.
#[derive(Debug, Clone, Deserialize)]
pub struct TripScenario {
    pub request_id: RequestId,
    pub origin: Place,
    #[serde(default)]
    pub stops: Vec<Place>,
    pub destination: Place,
    #[serde(default)]
    pub check_ins: Vec<ScenarioCheckIn>,
}

/// A reported check-in.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCheckIn {
    pub position: Coordinate,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub note: String,
}

impl TripScenario {
    /// Compose the trip's itinerary the way a requester would: origin and
    /// destination first, then each stop added and resolved in turn.
    pub fn compose(&self) -> Result<Itinerary, ComposeError> {
        let mut composer = Composer::new();
        composer.set_origin(self.origin.clone());
        composer.set_destination(self.destination.clone());
        for place in &self.stops {
            composer.add_stop(place.address.clone());
            let order = composer.stop_count();
            composer.resolve_stop(order, place.clone())?;
        }
        composer.finalize()
    }
}

/// Outcome of replaying one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripReport {
    pub request_id: RequestId,
    pub estimated_distance_km: f64,
    /// Orders checked in successfully, in sequence
    pub accepted: Vec<usize>,
    /// Rejection messages, in sequence
    pub rejected: Vec<String>,
    pub completed: bool,
    /// Set when the trip could not be composed or started
    pub error: Option<String>,
}

impl TripReport {
    fn failed(request_id: RequestId, error: impl ToString) -> Self {
        Self {
            request_id,
            estimated_distance_km: 0.0,
            accepted: Vec::new(),
            rejected: Vec::new(),
            completed: false,
            error: Some(error.to_string()),
        }
    }
}

/// Replay one trip.
pub async fn replay_trip<S: CheckpointStore>(
    sessions: &TripSessions<S>,
    trip: &TripScenario,
) -> TripReport {
    let request_id = trip.request_id.clone();

    let itinerary = match trip.compose() {
        Ok(itinerary) => itinerary,
        Err(e) => {
            warn!(%request_id, error = %e, "could not compose itinerary");
            return TripReport::failed(request_id, e);
        }
    };

    let progress = match sessions.start(request_id.clone(), &itinerary).await {
        Ok(progress) => progress,
        Err(e) => {
            warn!(%request_id, error = %e, "could not start trip");
            return TripReport::failed(request_id, e);
        }
    };

    let mut report = TripReport {
        request_id: request_id.clone(),
        estimated_distance_km: itinerary.estimated_total_distance_km(),
        accepted: Vec::new(),
        rejected: Vec::new(),
        completed: progress.is_completed(),
        error: None,
    };

    for check_in in &trip.check_ins {
        let attempt = CheckInAttempt::new(
            check_in.position,
            check_in.images.clone(),
            check_in.note.clone(),
        );
        match sessions.check_in(&request_id, &attempt).await {
            Ok(receipt) => {
                report.accepted.push(receipt.checkpoint.order);
                report.completed = receipt.progress.is_completed();
            }
            Err(e) => report.rejected.push(e.to_string()),
        }
    }

    info!(
        %request_id,
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        completed = report.completed,
        "trip replayed"
    );
    report
}

/// Replay every trip in a scenario concurrently.
pub async fn replay<S: CheckpointStore>(
    sessions: &TripSessions<S>,
    scenario: &Scenario,
) -> Vec<TripReport> {
    join_all(scenario.trips.iter().map(|trip| replay_trip(sessions, trip))).await
}
