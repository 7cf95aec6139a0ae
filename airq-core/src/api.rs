use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    error::ApiError,
    model::{Alert, CurrentReading, ForecastPoint, Location, PollutantCatalogEntry, PollutantReading},
    pollutant::Pollutant,
};

/// The remote air-quality service, one method per endpoint.
#[async_trait]
pub trait AirQualityApi: Send + Sync + Debug {
    async fn air_quality(
        &self,
        location: &Location,
        pollutant: Pollutant,
    ) -> Result<CurrentReading, ApiError>;

    async fn forecast(&self, location: &Location, hours: u32)
    -> Result<Vec<ForecastPoint>, ApiError>;

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, ApiError>;

    async fn pollutants(&self) -> Result<Vec<PollutantCatalogEntry>, ApiError>;

    async fn overall_aqi(&self, location: &Location) -> Result<i32, ApiError>;
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration =
    Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS);

#[derive(Debug, Clone)]
pub struct HttpAirQualityApi {
    base_url: String,
    http: Client,
}

impl HttpAirQualityApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, ?query, "requesting");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ApiError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

fn coords(location: &Location) -> Vec<(&'static str, String)> {
    vec![("lat", location.lat.to_string()), ("lon", location.lon.to_string())]
}

#[derive(Debug, Deserialize)]
struct AqReading {
    pollutant: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
    aqi: Option<i32>,
    quality_level: Option<String>,
    #[serde(default)]
    available: bool,
    timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AqLocation {
    data_source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AqResponse {
    #[serde(default)]
    readings: Vec<AqReading>,
    #[serde(default)]
    location: AqLocation,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct PollutantsResponse {
    pollutants: Vec<PollutantCatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct OverallAqiResponse {
    overall_aqi: i32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl AqReading {
    /// Unavailable readings carry no meaningful numbers and map to `None`.
    fn into_reading(self, requested: Pollutant) -> Result<Option<PollutantReading>, ApiError> {
        if !self.available {
            return Ok(None);
        }

        let (Some(value), Some(aqi)) = (self.value, self.aqi) else {
            return Err(ApiError::Malformed {
                endpoint: "/air-quality",
                reason: format!("reading for {requested} is marked available but has no value/aqi"),
            });
        };

        Ok(Some(PollutantReading {
            pollutant: self.pollutant.unwrap_or_else(|| requested.as_str().to_string()),
            value,
            unit: self.unit.unwrap_or_default(),
            aqi,
            quality_level: self.quality_level.unwrap_or_else(|| "Unknown".to_string()),
            available: true,
            timestamp: self.timestamp.unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl AirQualityApi for HttpAirQualityApi {
    async fn air_quality(
        &self,
        location: &Location,
        pollutant: Pollutant,
    ) -> Result<CurrentReading, ApiError> {
        let mut query = coords(location);
        query.push(("pollutant", pollutant.as_str().to_string()));

        let parsed: AqResponse = self.get_json("/air-quality", &query).await?;

        let reading = match parsed.readings.into_iter().next() {
            Some(r) => r.into_reading(pollutant)?,
            None => None,
        };

        Ok(CurrentReading {
            reading,
            data_source: parsed.location.data_source.unwrap_or_else(|| "unavailable".to_string()),
        })
    }

    async fn forecast(
        &self,
        location: &Location,
        hours: u32,
    ) -> Result<Vec<ForecastPoint>, ApiError> {
        let mut query = coords(location);
        query.push(("hours", hours.to_string()));

        let parsed: ForecastResponse = self.get_json("/forecast", &query).await?;
        Ok(parsed.forecast)
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, ApiError> {
        let parsed: AlertsResponse = self.get_json("/alerts", &coords(location)).await?;
        Ok(parsed.alerts)
    }

    async fn pollutants(&self) -> Result<Vec<PollutantCatalogEntry>, ApiError> {
        let parsed: PollutantsResponse = self.get_json("/pollutants", &[]).await?;
        Ok(parsed.pollutants)
    }

    async fn overall_aqi(&self, location: &Location) -> Result<i32, ApiError> {
        let parsed: OverallAqiResponse = self.get_json("/overall-aqi", &coords(location)).await?;
        Ok(parsed.overall_aqi)
    }
}

/// Gives up on any call to `inner` that outlasts `limit`, whatever the
/// transport underneath does.
#[derive(Debug, Clone)]
pub struct TimeLimitedApi {
    inner: Arc<dyn AirQualityApi>,
    limit: Duration,
}

impl TimeLimitedApi {
    pub fn new(inner: Arc<dyn AirQualityApi>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bound<T>(
        &self,
        endpoint: &'static str,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        tokio::time::timeout(self.limit, call)
            .await
            .unwrap_or_else(|_| Err(ApiError::Timeout { endpoint, after: self.limit }))
    }
}

#[async_trait]
impl AirQualityApi for TimeLimitedApi {
    async fn air_quality(
        &self,
        location: &Location,
        pollutant: Pollutant,
    ) -> Result<CurrentReading, ApiError> {
        self.bound("/air-quality", self.inner.air_quality(location, pollutant)).await
    }

    async fn forecast(
        &self,
        location: &Location,
        hours: u32,
    ) -> Result<Vec<ForecastPoint>, ApiError> {
        self.bound("/forecast", self.inner.forecast(location, hours)).await
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, ApiError> {
        self.bound("/alerts", self.inner.alerts(location)).await
    }

    async fn pollutants(&self) -> Result<Vec<PollutantCatalogEntry>, ApiError> {
        self.bound("/pollutants", self.inner.pollutants()).await
    }

    async fn overall_aqi(&self, location: &Location) -> Result<i32, ApiError> {
        self.bound("/overall-aqi", self.inner.overall_aqi(location)).await
    }
}

/// Pull `detail` out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: serde_json::Value::String(s) }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => truncate_body(body),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
