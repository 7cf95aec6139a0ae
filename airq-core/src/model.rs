use serde::{Deserialize, Serialize};

/// A place the client is showing air quality for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub full_name: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self { lat, lon, name: name.into(), full_name: None }
    }
}

/// Raw device coordinates, before any naming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One geocoder search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLocation {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: String,
    pub value: f64,
    pub unit: String,
    pub aqi: i32,
    pub quality_level: String,
    pub available: bool,
    pub timestamp: String,
}

/// Result of `/air-quality` for one pollutant.
///
/// `reading` is `None` when the service reported the pollutant as unavailable
/// or returned no readings at all.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentReading {
    pub reading: Option<PollutantReading>,
    pub data_source: String,
}

/// Latest known state of one tracked pollutant.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Available(PollutantReading),
    Unavailable,
}

impl Snapshot {
    pub fn is_available(&self) -> bool {
        matches!(self, Snapshot::Available(_))
    }

    pub fn reading(&self) -> Option<&PollutantReading> {
        match self {
            Snapshot::Available(r) => Some(r),
            Snapshot::Unavailable => None,
        }
    }

    /// Numeric AQI, never derived from an unavailable snapshot.
    pub fn aqi(&self) -> Option<i32> {
        self.reading().map(|r| r.aqi)
    }
}

impl From<Option<PollutantReading>> for Snapshot {
    fn from(value: Option<PollutantReading>) -> Self {
        match value {
            Some(r) if r.available => Snapshot::Available(r),
            _ => Snapshot::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantCatalogEntry {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub health_effects: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub aqi: i32,
    pub primary_pollutant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: String,
    pub message: String,
    pub recommendation: String,
    pub expires_at: String,
}

/// Resources fetched alongside the current reading in a full cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Forecast,
    Alerts,
    Catalog,
    OverallAqi,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Forecast => "forecast",
            Resource::Alerts => "alerts",
            Resource::Catalog => "pollutant catalog",
            Resource::OverallAqi => "overall AQI",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared by tests that need a reading without caring about its contents.
#[cfg(test)]
pub(crate) fn sample_reading(pollutant: crate::Pollutant, aqi: i32) -> PollutantReading {
    PollutantReading {
        pollutant: pollutant.as_str().to_string(),
        value: 25.3,
        unit: "ppb".to_string(),
        aqi,
        quality_level: "Good".to_string(),
        available: true,
        timestamp: "2025-01-01T12:00:00Z".to_string(),
    }
}
