//! Finalized itinerary.

use crate::geo::{distance_km, round_km};

use super::error::ItineraryError;
use super::point::LocationPoint;

/// Sum of great-circle distances between consecutive points, rounded to
/// two decimals. Points must already be sorted by order.
pub(crate) fn path_distance_km<'a>(points: impl IntoIterator<Item = &'a LocationPoint>) -> f64 {
    let mut total = 0.0;
    let mut prev: Option<&LocationPoint> = None;
    for point in points {
        if let Some(prev) = prev {
            total += distance_km(&prev.coordinate, &point.coordinate);
        }
        prev = Some(point);
    }
    round_km(total)
}

/// An ordered, fully resolved list of locations for one trip.
///
/// # Invariants
///
/// - At least two locations (origin and destination)
/// - Orders are exactly `0..len`, sorted, with no gaps or duplicates
/// - The estimated distance equals the rounded sum of consecutive
///   great-circle distances
///
/// An `Itinerary` is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    locations: Vec<LocationPoint>,
    estimated_total_distance_km: f64,
}

impl Itinerary {
    /// Build an itinerary, validating order density.
    ///
    /// Locations may be given in any sequence; they are sorted by order.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are fewer than two locations or the orders
    /// are not exactly `0..len`.
    pub fn new(mut locations: Vec<LocationPoint>) -> Result<Self, ItineraryError> {
        if locations.len() < 2 {
            return Err(ItineraryError::TooFewLocations {
                count: locations.len(),
            });
        }

        locations.sort_by_key(|l| l.order);

        for (expected, window) in locations.windows(2).enumerate() {
            if window[0].order == window[1].order {
                return Err(ItineraryError::DuplicateOrder(window[0].order));
            }
            if window[0].order != expected {
                return Err(ItineraryError::MissingOrder(expected));
            }
        }
        let last = locations.len() - 1;
        if locations[last].order != last {
            return Err(ItineraryError::MissingOrder(last));
        }

        let estimated_total_distance_km = path_distance_km(&locations);

        Ok(Self {
            locations,
            estimated_total_distance_km,
        })
    }

    /// Returns all locations in visiting order.
    pub fn locations(&self) -> &[LocationPoint] {
        &self.locations
    }

    /// Consumes the itinerary, returning its locations in visiting order.
    pub fn into_locations(self) -> Vec<LocationPoint> {
        self.locations
    }

    /// Returns the number of locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Always false: an itinerary has at least two locations.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns the trip origin.
    pub fn origin(&self) -> &LocationPoint {
        // Safe: at least two locations
        &self.locations[0]
    }

    /// Returns the trip destination.
    pub fn destination(&self) -> &LocationPoint {
        // Safe: at least two locations
        &self.locations[self.locations.len() - 1]
    }

    /// Returns the intermediate stops in visiting order.
    pub fn stops(&self) -> &[LocationPoint] {
        // Safe: at least two locations, so 1 <= len - 1
        &self.locations[1..self.locations.len() - 1]
    }

    /// Returns the estimated total distance in kilometres.
    pub fn estimated_total_distance_km(&self) -> f64 {
        self.estimated_total_distance_km
    }
}
