//! Trip itinerary and checkpoint progression engine.
//!
//! Composes multi-stop routes (origin, intermediate stops, destination)
//! with live distance estimates, then drives a driver through the route
//! one geofenced, evidence-backed checkpoint at a time.

pub mod checkpoint;
pub mod config;
pub mod geo;
pub mod itinerary;
pub mod replay;
pub mod session;
pub mod store;
