//! Itinerary error types.
//!
//! `ComposeError` covers rejected composer operations; `ItineraryError`
//! covers a location list that violates the order-density invariant.

use super::point::StopId;
use super::resolver::ResolveError;

/// Errors from composer operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposeError {
    /// Some orders have no resolved point yet
    #[error("itinerary incomplete: unresolved orders {missing:?}")]
    Incomplete { missing: Vec<usize> },

    /// Origin and destination can only be swapped on a direct trip
    #[error("cannot swap origin and destination with {stop_count} intermediate stop(s)")]
    SwapWithStops { stop_count: usize },

    /// No waypoint carries this id
    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    /// The waypoint is the origin or destination
    #[error("{0} is not an intermediate stop")]
    NotAnIntermediateStop(StopId),

    /// Order is outside the range accepted by the operation
    #[error("order {order} out of range for itinerary of {len} waypoints")]
    OrderOutOfRange { order: usize, len: usize },

    /// Address resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The resolved points do not form a valid itinerary
    #[error(transparent)]
    Itinerary(#[from] ItineraryError),
}

/// Errors from validating a finalized location list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    /// An itinerary needs an origin and a destination
    #[error("itinerary needs at least 2 locations, got {count}")]
    TooFewLocations { count: usize },

    /// Two locations share an order
    #[error("duplicate order {0}")]
    DuplicateOrder(usize),

    /// The orders are not contiguous from zero
    #[error("missing order {0}")]
    MissingOrder(usize),
}
