//! Itinerary model and composition.
//!
//! A requester builds a route with a [`Composer`]: origin, any number of
//! intermediate stops, destination. Waypoints start as drafts and become
//! [`LocationPoint`]s once resolved. [`Composer::finalize`] hands back an
//! immutable [`Itinerary`] only when every waypoint is resolved.

mod composer;
mod error;
mod finalized;
mod point;
mod resolver;

pub use composer::Composer;
pub use error::{ComposeError, ItineraryError};
pub use finalized::Itinerary;
pub use point::{DraftStopPoint, LocationPoint, Place, StopId, Waypoint};
pub use resolver::{AddressQuery, AddressResolver, ResolveError};
