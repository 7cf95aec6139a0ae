//! Turning user input into a [`Location`].
//!
//! Text search is advisory: geocoder failures are logged and produce an empty
//! candidate list. Device positioning failures are surfaced to the caller,
//! while a failed reverse lookup only costs the location its proper name.

use crate::{
    error::PositioningError,
    geocoding::Geocoder,
    model::{CandidateLocation, Location},
    positioning::PositionSource,
};

/// Queries shorter than this never reach the geocoder.
pub const MIN_QUERY_CHARS: usize = 3;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Name used when the device position cannot be reverse geocoded.
pub const FALLBACK_LOCATION_NAME: &str = "Current location";

#[derive(Debug)]
pub struct LocationResolver {
    geocoder: Box<dyn Geocoder>,
    position: Box<dyn PositionSource>,
    search_limit: usize,
}

impl LocationResolver {
    pub fn new(geocoder: Box<dyn Geocoder>, position: Box<dyn PositionSource>) -> Self {
        Self { geocoder, position, search_limit: DEFAULT_SEARCH_LIMIT }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub async fn search_by_text(&self, query: &str) -> Vec<CandidateLocation> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        match self.geocoder.search(query, self.search_limit).await {
            Ok(mut candidates) => {
                candidates.truncate(self.search_limit);
                tracing::debug!(query, found = candidates.len(), "geocoder search");
                candidates
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "location search failed");
                Vec::new()
            }
        }
    }

    pub async fn resolve_current_device_position(&self) -> Result<Location, PositioningError> {
        let coords = self.position.current_position().await?;

        let name = match self.geocoder.reverse(coords.lat, coords.lon).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::debug!(?coords, "reverse geocoding found no place name");
                FALLBACK_LOCATION_NAME.to_string()
            }
            Err(e) => {
                tracing::warn!(?coords, error = %e, "reverse geocoding failed");
                FALLBACK_LOCATION_NAME.to_string()
            }
        };

        Ok(Location::new(coords.lat, coords.lon, name))
    }

    pub fn select_candidate(candidate: &CandidateLocation) -> Location {
        let short = candidate.display_name.split(',').next().unwrap_or_default().trim();

        Location {
            lat: candidate.lat,
            lon: candidate.lon,
            name: short.to_string(),
            full_name: Some(candidate.display_name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ApiError,
        model::Coordinates,
        positioning::ConfiguredPosition,
    };
    use async_trait::async_trait;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: Arc<AtomicUsize>,
        fail: bool,
        place: Option<String>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<CandidateLocation>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Status { endpoint: "/search", status: 503, detail: "down".into() });
            }
            Ok((0..limit + 3)
                .map(|i| CandidateLocation {
                    lat: 48.0 + i as f64,
                    lon: 2.0,
                    display_name: format!("{query} {i}, France"),
                })
                .collect())
        }

        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Option<String>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Status { endpoint: "/reverse", status: 500, detail: "boom".into() });
            }
            Ok(self.place.clone())
        }
    }

    #[derive(Debug)]
    struct DeniedPosition;

    #[async_trait]
    impl PositionSource for DeniedPosition {
        async fn current_position(&self) -> Result<Coordinates, PositioningError> {
            Err(PositioningError::Denied)
        }
    }

    fn home() -> Box<ConfiguredPosition> {
        Box::new(ConfiguredPosition::new(Some(Coordinates { lat: 40.7, lon: -74.0 })))
    }

    #[tokio::test]
    async fn short_query_skips_network() {
        let geocoder = FakeGeocoder::default();
        let calls = geocoder.calls.clone();
        let resolver = LocationResolver::new(Box::new(geocoder), home());

        assert!(resolver.search_by_text("Pa").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn three_char_query_is_capped_at_five() {
        let geocoder = FakeGeocoder::default();
        let calls = geocoder.calls.clone();
        let resolver = LocationResolver::new(Box::new(geocoder), home());

        let found = resolver.search_by_text("Par").await;
        assert_eq!(found.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_failure_yields_empty_list() {
        let geocoder = FakeGeocoder { fail: true, ..Default::default() };
        let resolver = LocationResolver::new(Box::new(geocoder), home());

        assert!(resolver.search_by_text("Paris").await.is_empty());
    }

    #[tokio::test]
    async fn device_position_uses_reverse_name() {
        let geocoder = FakeGeocoder { place: Some("New York".into()), ..Default::default() };
        let resolver = LocationResolver::new(Box::new(geocoder), home());

        let loc = resolver.resolve_current_device_position().await.unwrap();
        assert_eq!(loc.name, "New York");
        assert_eq!((loc.lat, loc.lon), (40.7, -74.0));
    }

    #[tokio::test]
    async fn failed_reverse_lookup_falls_back_to_placeholder() {
        let geocoder = FakeGeocoder { fail: true, ..Default::default() };
        let resolver = LocationResolver::new(Box::new(geocoder), home());

        let loc = resolver.resolve_current_device_position().await.unwrap();
        assert_eq!(loc.name, FALLBACK_LOCATION_NAME);
    }

    #[tokio::test]
    async fn denied_positioning_is_surfaced() {
        let geocoder = FakeGeocoder::default();
        let calls = geocoder.calls.clone();
        let resolver = LocationResolver::new(Box::new(geocoder), Box::new(DeniedPosition));

        let err = resolver.resolve_current_device_position().await.unwrap_err();
        assert_eq!(err, PositioningError::Denied);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn select_candidate_splits_display_name() {
        let candidate = CandidateLocation {
            lat: 48.8566,
            lon: 2.3522,
            display_name: "Paris, Île-de-France, France métropolitaine, France".into(),
        };
        let loc = LocationResolver::select_candidate(&candidate);

        assert_eq!(loc.name, "Paris");
        assert_eq!(loc.full_name.as_deref(), Some(candidate.display_name.as_str()));
        assert_eq!((loc.lat, loc.lon), (48.8566, 2.3522));
    }
}
