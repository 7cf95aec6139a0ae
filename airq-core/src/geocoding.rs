use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{api::truncate_body, error::ApiError, model::CandidateLocation};

const USER_AGENT: &str = concat!("airq/", env!("CARGO_PKG_VERSION"));

/// Forward and reverse geocoding.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateLocation>, ApiError>;

    /// Coarse place name (city, town or village) for a coordinate pair.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, ApiError>;
}

/// Geocoder backed by a Nominatim-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder().user_agent(USER_AGENT).build().unwrap_or_default();
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http }
    }

    async fn get_text(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

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
                detail: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct NmSearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct NmAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmReverseResult {
    #[serde(default)]
    address: NmAddress,
}

impl NmSearchResult {
    fn into_candidate(self) -> Option<CandidateLocation> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(CandidateLocation { lat, lon, display_name: self.display_name })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateLocation>, ApiError> {
        let body = self
            .get_text(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let parsed: Vec<NmSearchResult> = serde_json::from_str(&body)
            .map_err(|source| ApiError::Decode { endpoint: "/search", source })?;

        let mut candidates = Vec::with_capacity(parsed.len());
        for result in parsed.into_iter().take(limit) {
            let name = result.display_name.clone();
            match result.into_candidate() {
                Some(c) => candidates.push(c),
                None => tracing::warn!(%name, "dropping geocoder result with unparseable coordinates"),
            }
        }

        Ok(candidates)
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, ApiError> {
        let body = self
            .get_text(
                "/reverse",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let parsed: NmReverseResult = serde_json::from_str(&body)
            .map_err(|source| ApiError::Decode { endpoint: "/reverse", source })?;

        let NmAddress { city, town, village } = parsed.address;
        Ok(city.or(town).or(village))
    }
}
