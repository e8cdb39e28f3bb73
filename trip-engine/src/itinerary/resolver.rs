//! Address resolution seam.
//!
//! The composer does not know how an address becomes a coordinate; search
//! APIs, reverse geocoding and manual entry all sit behind `AddressResolver`.

use crate::geo::Coordinate;

use super::point::Place;

/// What the user gave us to resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressQuery {
    /// Free text typed into a search box
    Text(String),
    /// A point tapped on a map
    Tapped(Coordinate),
}

/// Error from an address resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// Nothing matched the query
    #[error("no match for address {0:?}")]
    NotFound(String),

    /// The lookup backend failed
    #[error("address lookup failed: {0}")]
    Backend(String),
}

/// Trait for turning user input into a concrete place.
///
/// This abstraction allows the composer to be tested with canned lookups.
pub trait AddressResolver {
    /// Resolve a query to a single place.
    fn resolve(&self, query: &AddressQuery) -> Result<Place, ResolveError>;
}

impl<F> AddressResolver for F
where
    F: Fn(&AddressQuery) -> Result<Place, ResolveError>,
{
    fn resolve(&self, query: &AddressQuery) -> Result<Place, ResolveError> {
        self(query)
    }
}
