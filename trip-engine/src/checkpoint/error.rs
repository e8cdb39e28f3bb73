//! Check-in error types.
//!
//! Every rejected precondition is its own variant so callers can show a
//! precise message. None of these leave the trip in a changed state.

use crate::itinerary::ItineraryError;

/// Errors from the checkpoint progression engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckInError {
    /// A trip needs at least an origin and a destination
    #[error("itinerary must have at least 2 locations, got {count}")]
    EmptyItinerary { count: usize },

    /// Location orders are not exactly `0..len`
    #[error("invalid itinerary: {0}")]
    InvalidItinerary(ItineraryError),

    /// Persisted checkpoints don't match the itinerary's visiting sequence
    #[error("unexpected checkpoint for order {order} (expected order {expected})")]
    UnexpectedCheckpoint { order: usize, expected: usize },

    /// No evidence images were supplied
    #[error("at least one evidence image is required")]
    EvidenceMissing,

    /// Too many evidence images were supplied
    #[error("too many evidence images: {count} (limit {limit})")]
    EvidenceLimitExceeded { count: usize, limit: usize },

    /// The geofence radius is negative or not a number
    #[error("invalid geofence radius {radius_km} km")]
    InvalidRadius { radius_km: f64 },

    /// The reported position is outside the target's geofence
    #[error("position is {distance_km:.2} km from the checkpoint (limit {limit_km:.2} km)")]
    OutOfGeofence { distance_km: f64, limit_km: f64 },

    /// The trip has already reached its destination
    #[error("trip already completed")]
    AlreadyCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CheckInError::EmptyItinerary { count: 1 };
        assert_eq!(
            err.to_string(),
            "itinerary must have at least 2 locations, got 1"
        );

        let err = CheckInError::UnexpectedCheckpoint {
            order: 3,
            expected: 1,
        };
        assert_eq!(
            err.to_string(),
            "unexpected checkpoint for order 3 (expected order 1)"
        );

        let err = CheckInError::InvalidItinerary(ItineraryError::DuplicateOrder(0));
        assert_eq!(err.to_string(), "invalid itinerary: duplicate order 0");

        let err = CheckInError::InvalidRadius { radius_km: -1.0 };
        assert_eq!(err.to_string(), "invalid geofence radius -1 km");

        let err = CheckInError::EvidenceMissing;
        assert_eq!(err.to_string(), "at least one evidence image is required");

        let err = CheckInError::EvidenceLimitExceeded { count: 3, limit: 2 };
        assert_eq!(err.to_string(), "too many evidence images: 3 (limit 2)");

        let err = CheckInError::OutOfGeofence {
            distance_km: 49.987,
            limit_km: 5.0,
        };
        assert_eq!(
            err.to_string(),
            "position is 49.99 km from the checkpoint (limit 5.00 km)"
        );

        assert_eq!(CheckInError::AlreadyCompleted.to_string(), "trip already completed");
    }
}
