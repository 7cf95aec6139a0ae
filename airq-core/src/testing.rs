//! In-memory [`AirQualityApi`] with scripted responses, for unit tests.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    api::AirQualityApi,
    error::ApiError,
    model::{
        Alert, CurrentReading, ForecastPoint, Location, PollutantCatalogEntry, sample_reading,
    },
    pollutant::Pollutant,
};

#[derive(Debug, Clone)]
enum ReadingScript {
    Reading(i32),
    Unavailable(String),
    Fail,
}

#[derive(Debug)]
struct Script {
    readings: HashMap<Pollutant, ReadingScript>,
    readings_at: HashMap<(String, Pollutant), ReadingScript>,
    forecast: Option<Vec<ForecastPoint>>,
    alerts: Option<Vec<Alert>>,
    catalog: Option<Vec<PollutantCatalogEntry>>,
    overall_aqi: Option<i32>,
    delays: HashMap<String, Duration>,
    reading_delays: HashMap<Pollutant, Duration>,
    calls: Vec<(&'static str, String)>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            readings: HashMap::new(),
            readings_at: HashMap::new(),
            forecast: Some(vec![ForecastPoint {
                timestamp: "2025-01-01T13:00:00Z".into(),
                aqi: 55,
                primary_pollutant: "NO2".into(),
            }]),
            alerts: Some(Vec::new()),
            catalog: Some(vec![PollutantCatalogEntry {
                name: "NO2".into(),
                full_name: "Nitrogen dioxide".into(),
                sources: vec!["Traffic".into()],
                health_effects: "Airway irritation".into(),
            }]),
            overall_aqi: Some(60),
            delays: HashMap::new(),
            reading_delays: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedApi {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().expect("script lock poisoned")
    }

    pub(crate) fn set_reading(&self, pollutant: Pollutant, aqi: i32) {
        self.script().readings.insert(pollutant, ReadingScript::Reading(aqi));
    }

    pub(crate) fn set_reading_at(&self, location: &str, pollutant: Pollutant, aqi: i32) {
        self.script()
            .readings_at
            .insert((location.to_string(), pollutant), ReadingScript::Reading(aqi));
    }

    pub(crate) fn set_unavailable(&self, pollutant: Pollutant, data_source: &str) {
        self.script()
            .readings
            .insert(pollutant, ReadingScript::Unavailable(data_source.to_string()));
    }

    pub(crate) fn fail_pollutant(&self, pollutant: Pollutant) {
        self.script().readings.insert(pollutant, ReadingScript::Fail);
    }

    pub(crate) fn fail_forecast(&self) {
        self.script().forecast = None;
    }

    pub(crate) fn fail_overall_aqi(&self) {
        self.script().overall_aqi = None;
    }

    pub(crate) fn set_overall_aqi(&self, aqi: i32) {
        self.script().overall_aqi = Some(aqi);
    }

    pub(crate) fn set_delay(&self, location: &str, delay: Duration) {
        self.script().delays.insert(location.to_string(), delay);
    }

    pub(crate) fn clear_delay(&self, location: &str) {
        self.script().delays.remove(location);
    }

    /// Slow down `/air-quality` for one pollutant, on top of any location delay.
    pub(crate) fn set_reading_delay(&self, pollutant: Pollutant, delay: Duration) {
        self.script().reading_delays.insert(pollutant, delay);
    }

    pub(crate) fn calls(&self, endpoint: &str) -> usize {
        self.script().calls.iter().filter(|(e, _)| *e == endpoint).count()
    }

    pub(crate) fn calls_for(&self, endpoint: &str, location: &str) -> usize {
        self.script().calls.iter().filter(|(e, l)| *e == endpoint && l == location).count()
    }

    /// Record the call and return the configured delay for its location.
    fn record(&self, endpoint: &'static str, location: &str) -> Option<Duration> {
        let mut script = self.script();
        script.calls.push((endpoint, location.to_string()));
        script.delays.get(location).copied()
    }

    async fn pause(&self, endpoint: &'static str, location: &str) {
        if let Some(delay) = self.record(endpoint, location) {
            tokio::time::sleep(delay).await;
        }
    }
}

fn scripted_failure(endpoint: &'static str) -> ApiError {
    ApiError::Status { endpoint, status: 503, detail: "scripted failure".to_string() }
}

#[async_trait]
impl AirQualityApi for ScriptedApi {
    async fn air_quality(
        &self,
        location: &Location,
        pollutant: Pollutant,
    ) -> Result<CurrentReading, ApiError> {
        self.pause("/air-quality", &location.name).await;
        let extra = self.script().reading_delays.get(&pollutant).copied();
        if let Some(delay) = extra {
            tokio::time::sleep(delay).await;
        }

        let script = {
            let s = self.script();
            s.readings_at
                .get(&(location.name.clone(), pollutant))
                .or_else(|| s.readings.get(&pollutant))
                .cloned()
                .unwrap_or(ReadingScript::Unavailable("unsupported".to_string()))
        };

        match script {
            ReadingScript::Reading(aqi) => Ok(CurrentReading {
                reading: Some(sample_reading(pollutant, aqi)),
                data_source: "tempo_satellite".to_string(),
            }),
            ReadingScript::Unavailable(source) => {
                Ok(CurrentReading { reading: None, data_source: source })
            }
            ReadingScript::Fail => Err(scripted_failure("/air-quality")),
        }
    }

    async fn forecast(
        &self,
        location: &Location,
        _hours: u32,
    ) -> Result<Vec<ForecastPoint>, ApiError> {
        self.pause("/forecast", &location.name).await;
        self.script().forecast.clone().ok_or_else(|| scripted_failure("/forecast"))
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, ApiError> {
        self.pause("/alerts", &location.name).await;
        self.script().alerts.clone().ok_or_else(|| scripted_failure("/alerts"))
    }

    async fn pollutants(&self) -> Result<Vec<PollutantCatalogEntry>, ApiError> {
        self.record("/pollutants", "");
        self.script().catalog.clone().ok_or_else(|| scripted_failure("/pollutants"))
    }

    async fn overall_aqi(&self, location: &Location) -> Result<i32, ApiError> {
        self.pause("/overall-aqi", &location.name).await;
        self.script().overall_aqi.ok_or_else(|| scripted_failure("/overall-aqi"))
    }
}
