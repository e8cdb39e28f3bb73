//! Itinerary composition.
//!
//! The composer holds the draft route while a requester builds it: an origin,
//! any number of intermediate stops, and a destination. Every structural edit
//! re-labels the whole waypoint list from its position, so orders are always
//! exactly `0..len` no matter what sequence of edits produced them.

use tracing::{debug, trace, warn};

use super::error::ComposeError;
use super::finalized::{Itinerary, path_distance_km};
use super::point::{LocationPoint, Place, StopId, Waypoint};
use super::resolver::{AddressQuery, AddressResolver};

/// Mutable draft of an itinerary.
///
/// # Invariants
///
/// - At least two waypoints: index 0 is the origin, the last is the destination
/// - `waypoints[i].order() == i` for every waypoint
/// - `estimated_distance_km` is the rounded path distance over resolved
///   waypoints, refreshed after every change
#[derive(Debug, Clone)]
pub struct Composer {
    waypoints: Vec<Waypoint>,
    next_id: u64,
    estimated_distance_km: f64,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    /// Create a composer with an unresolved origin (order 0) and destination (order 1).
    pub fn new() -> Self {
        let mut composer = Self {
            waypoints: Vec::with_capacity(2),
            next_id: 0,
            estimated_distance_km: 0.0,
        };
        let origin = composer.allocate_id();
        let destination = composer.allocate_id();
        composer.waypoints.push(Waypoint::draft(origin, 0, ""));
        composer.waypoints.push(Waypoint::draft(destination, 1, ""));
        composer
    }

    fn allocate_id(&mut self) -> StopId {
        let id = StopId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns all waypoints in visiting order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Returns the total number of waypoints, origin and destination included.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false: origin and destination always exist.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Returns the number of intermediate stops.
    pub fn stop_count(&self) -> usize {
        self.waypoints.len() - 2
    }

    /// Returns the order currently held by the destination.
    pub fn destination_order(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Returns the origin waypoint.
    pub fn origin(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    /// Returns the destination waypoint.
    pub fn destination(&self) -> &Waypoint {
        &self.waypoints[self.destination_order()]
    }

    /// Returns the waypoint with the given id.
    pub fn get(&self, id: StopId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.id() == id)
    }

    /// Returns resolved points in visiting order, skipping drafts.
    pub fn locations(&self) -> impl Iterator<Item = &LocationPoint> {
        self.waypoints.iter().filter_map(|w| w.as_point())
    }

    /// Returns the last computed distance estimate in kilometres.
    pub fn estimated_distance_km(&self) -> f64 {
        self.estimated_distance_km
    }

    /// Resolve the origin.
    pub fn set_origin(&mut self, place: Place) -> &LocationPoint {
        self.resolve_at(0, place)
    }

    /// Resolve the destination, wherever it currently sits.
    pub fn set_destination(&mut self, place: Place) -> &LocationPoint {
        self.resolve_at(self.destination_order(), place)
    }

    /// Append a stop immediately before the destination.
    ///
    /// The new stop takes order `stop_count + 1` and the destination moves
    /// to `stop_count + 2`.
    pub fn add_stop(&mut self, address_text: impl Into<String>) -> StopId {
        let at = self.destination_order();
        self.insert_draft(at, address_text.into())
    }

    /// Insert a stop at a given visiting position.
    ///
    /// `order` must be an intermediate position: `1..=stop_count + 1`.
    /// Waypoints at or after `order` move back by one.
    pub fn insert_stop(
        &mut self,
        order: usize,
        address_text: impl Into<String>,
    ) -> Result<StopId, ComposeError> {
        if order == 0 || order > self.destination_order() {
            return Err(ComposeError::OrderOutOfRange {
                order,
                len: self.len(),
            });
        }
        Ok(self.insert_draft(order, address_text.into()))
    }

    fn insert_draft(&mut self, at: usize, address_text: String) -> StopId {
        let id = self.allocate_id();
        debug!(%id, order = at, "adding stop");
        self.waypoints.insert(at, Waypoint::draft(id, at, address_text));
        self.reindex();
        self.recompute_distance();
        id
    }

    /// Remove an intermediate stop.
    ///
    /// Every later waypoint moves forward by one, so the destination order
    /// shrinks by one.
    pub fn remove_stop(&mut self, id: StopId) -> Result<Waypoint, ComposeError> {
        let idx = self.intermediate_index(id)?;
        debug!(%id, order = idx, "removing stop");
        let removed = self.waypoints.remove(idx);
        self.reindex();
        self.recompute_distance();
        Ok(removed)
    }

    /// Move an intermediate stop to another intermediate position.
    pub fn move_stop(&mut self, id: StopId, to_order: usize) -> Result<(), ComposeError> {
        let from = self.intermediate_index(id)?;
        if to_order == 0 || to_order >= self.destination_order() {
            return Err(ComposeError::OrderOutOfRange {
                order: to_order,
                len: self.len(),
            });
        }
        debug!(%id, from, to = to_order, "moving stop");
        let waypoint = self.waypoints.remove(from);
        self.waypoints.insert(to_order, waypoint);
        self.reindex();
        self.recompute_distance();
        Ok(())
    }

    fn intermediate_index(&self, id: StopId) -> Result<usize, ComposeError> {
        let idx = self
            .waypoints
            .iter()
            .position(|w| w.id() == id)
            .ok_or(ComposeError::UnknownStop(id))?;
        if idx == 0 || idx == self.destination_order() {
            return Err(ComposeError::NotAnIntermediateStop(id));
        }
        Ok(idx)
    }

    /// Resolve the waypoint at `order` to a concrete point.
    ///
    /// Replaces whatever was there before, draft or resolved, keeping the
    /// waypoint's id. Resolving the same order twice keeps only the second point.
    pub fn resolve_stop(
        &mut self,
        order: usize,
        place: Place,
    ) -> Result<&LocationPoint, ComposeError> {
        if order >= self.len() {
            return Err(ComposeError::OrderOutOfRange {
                order,
                len: self.len(),
            });
        }
        Ok(self.resolve_at(order, place))
    }

    /// Resolve the waypoint at `order` through an address resolver.
    pub fn resolve_query<R: AddressResolver>(
        &mut self,
        order: usize,
        resolver: &R,
        query: &AddressQuery,
    ) -> Result<&LocationPoint, ComposeError> {
        if order >= self.len() {
            return Err(ComposeError::OrderOutOfRange {
                order,
                len: self.len(),
            });
        }
        let place = resolver.resolve(query)?;
        Ok(self.resolve_at(order, place))
    }

    fn resolve_at(&mut self, order: usize, place: Place) -> &LocationPoint {
        let id = self.waypoints[order].id();
        debug!(%id, order, name = %place.name, "resolving waypoint");
        self.waypoints[order] = Waypoint::Resolved {
            id,
            point: LocationPoint::from_place(order, place),
        };
        self.recompute_distance();

        match &self.waypoints[order] {
            Waypoint::Resolved { point, .. } => point,
            // Safe: assigned above
            Waypoint::Unresolved(_) => unreachable!("waypoint was just resolved"),
        }
    }

    /// Swap origin and destination.
    ///
    /// Only permitted on a direct trip. With intermediate stops present the
    /// visiting sequence would no longer make sense, so the swap is rejected
    /// and nothing changes.
    pub fn swap_origin_and_destination(&mut self) -> Result<(), ComposeError> {
        let stop_count = self.stop_count();
        if stop_count > 0 {
            debug!(stop_count, "rejecting origin/destination swap");
            return Err(ComposeError::SwapWithStops { stop_count });
        }
        self.waypoints.swap(0, 1);
        self.reindex();
        self.recompute_distance();
        Ok(())
    }

    /// Recompute the distance estimate from the resolved waypoints.
    ///
    /// Returns 0 when fewer than two waypoints are resolved.
    pub fn recompute_distance(&mut self) -> f64 {
        self.estimated_distance_km = path_distance_km(self.locations());
        trace!(km = self.estimated_distance_km, "recomputed distance");
        self.estimated_distance_km
    }

    /// Re-derive every order from its position.
    fn reindex(&mut self) {
        for (order, waypoint) in self.waypoints.iter_mut().enumerate() {
            waypoint.set_order(order);
        }
    }

    /// Produce the finalized itinerary.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::Incomplete` naming every unresolved order.
    pub fn finalize(&self) -> Result<Itinerary, ComposeError> {
        let missing: Vec<usize> = self
            .waypoints
            .iter()
            .filter(|w| !w.is_resolved())
            .map(|w| w.order())
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "finalize called on incomplete itinerary");
            return Err(ComposeError::Incomplete { missing });
        }

        let locations: Vec<LocationPoint> = self.locations().cloned().collect();
        Ok(Itinerary::new(locations)?)
    }
}
