//! Itinerary members: finalized points and composition-time drafts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Opaque identifier of a waypoint inside a [`Composer`](super::Composer).
///
/// Identifiers are never reused within one composer, so a stale id can only
/// miss, never hit a different waypoint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub(crate) u64);

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop-{}", self.0)
    }
}

/// A resolved place, as returned by address resolution.
///
/// This is the input needed to turn a waypoint into a [`LocationPoint`];
/// the order is supplied by the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub coordinate: Coordinate,
}

impl Place {
    /// Create a place with no note.
    pub fn new(name: impl Into<String>, address: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            note: None,
            coordinate,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A finalized itinerary member.
///
/// `order` is the zero-based visiting position: 0 is the origin, `len - 1`
/// the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub order: usize,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub coordinate: Coordinate,
}

impl LocationPoint {
    /// Build a point at `order` from a resolved place.
    pub fn from_place(order: usize, place: Place) -> Self {
        Self {
            order,
            name: place.name,
            address: place.address,
            note: place.note,
            coordinate: place.coordinate,
        }
    }
}

/// A waypoint that has not been geocoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStopPoint {
    pub id: StopId,
    pub address_text: String,
    pub order: usize,
}

/// A composer waypoint: either still a draft or resolved to a concrete point.
#[derive(Debug, Clone, PartialEq)]
pub enum Waypoint {
    /// Placeholder awaiting address resolution
    Unresolved(DraftStopPoint),
    /// Geocoded point
    Resolved { id: StopId, point: LocationPoint },
}

impl Waypoint {
    pub(crate) fn draft(id: StopId, order: usize, address_text: impl Into<String>) -> Self {
        Waypoint::Unresolved(DraftStopPoint {
            id,
            address_text: address_text.into(),
            order,
        })
    }

    /// Returns the waypoint id.
    pub fn id(&self) -> StopId {
        match self {
            Waypoint::Unresolved(draft) => draft.id,
            Waypoint::Resolved { id, .. } => *id,
        }
    }

    /// Returns the current visiting order.
    pub fn order(&self) -> usize {
        match self {
            Waypoint::Unresolved(draft) => draft.order,
            Waypoint::Resolved { point, .. } => point.order,
        }
    }

    pub(crate) fn set_order(&mut self, order: usize) {
        match self {
            Waypoint::Unresolved(draft) => draft.order = order,
            Waypoint::Resolved { point, .. } => point.order = order,
        }
    }

    /// Returns true if this waypoint has a concrete point.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Waypoint::Resolved { .. })
    }

    /// Returns the resolved point, if any.
    pub fn as_point(&self) -> Option<&LocationPoint> {
        match self {
            Waypoint::Unresolved(_) => None,
            Waypoint::Resolved { point, .. } => Some(point),
        }
    }

    /// Returns the free-text address the user entered, or the resolved address.
    pub fn address_text(&self) -> &str {
        match self {
            Waypoint::Unresolved(draft) => &draft.address_text,
            Waypoint::Resolved { point, .. } => &point.address,
        }
    }
}
