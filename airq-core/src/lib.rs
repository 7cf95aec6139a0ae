//! Core library for the `airq` air-quality client.
//!
//! This crate defines:
//! - Configuration handling
//! - Clients for the air-quality service and the geocoder
//! - Location resolution (text search, device position)
//! - The data orchestrator and the view state it maintains
//! - Display helpers (AQI bands, recommendations, local clock)
//!
//! It is used by `airq-cli`, but any other front end can drive the
//! orchestrator through [`OrchestratorHandle`] and render [`ViewState`].

pub mod api;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod pollutant;
pub mod positioning;
pub mod snapshot;
pub mod view_state;

#[cfg(test)]
mod testing;

pub use api::{AirQualityApi, HttpAirQualityApi, TimeLimitedApi};
pub use classify::{AqiBand, classify, data_source_label, health_recommendation};
pub use clock::LocalClock;
pub use config::Config;
pub use error::{ApiError, OrchestratorError, PositioningError};
pub use geocoding::{Geocoder, NominatimGeocoder};
pub use location::LocationResolver;
pub use model::{
    Alert, CandidateLocation, Coordinates, CurrentReading, ForecastPoint, Location,
    PollutantCatalogEntry, PollutantReading, Resource, Snapshot,
};
pub use orchestrator::{DataOrchestrator, OrchestratorHandle, OrchestratorSettings};
pub use pollutant::Pollutant;
pub use positioning::{ConfiguredPosition, PositionSource};
pub use view_state::{Phase, ViewState};
