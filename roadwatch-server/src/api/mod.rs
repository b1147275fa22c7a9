//! HTTP API handlers for roadwatch-server

pub mod health;
pub mod sightings;

pub use health::health_routes;
pub use sightings::sighting_routes;
