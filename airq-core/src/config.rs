use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::Coordinates, pollutant::Pollutant};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_REFRESH_SECS: u64 = 300;
pub const DEFAULT_FORECAST_HOURS: u32 = 24;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_base_url = "http://localhost:8000"
/// default_pollutant = "NO2"
/// tracked_pollutants = ["NO2", "O3", "HCHO"]
///
/// [home]
/// lat = 40.7128
/// lon = -74.006
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub geocoder_base_url: String,
    pub default_pollutant: Pollutant,
    pub tracked_pollutants: Vec<Pollutant>,
    pub refresh_interval_secs: u64,
    pub forecast_hours: u32,
    pub search_limit: usize,

    /// Upper bound on any single request to the air-quality service.
    pub request_timeout_secs: u64,

    /// Stand-in for the device position.
    pub home: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            geocoder_base_url: DEFAULT_GEOCODER_URL.to_string(),
            default_pollutant: Pollutant::default(),
            tracked_pollutants: Pollutant::all().to_vec(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            forecast_hours: DEFAULT_FORECAST_HOURS,
            search_limit: crate::location::DEFAULT_SEARCH_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            home: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// Environment overrides are applied on top, then the result is validated.
    pub fn load() -> Result<Self> {
        let cfg = Self::load_unvalidated()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`Config::load`] but accepts an invalid file, so it can be edited.
    pub fn load_unvalidated() -> Result<Self> {
        let mut cfg = Self::read_from(&Self::config_file_path()?)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "airq", "airq")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("AIRQ_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(url) = env::var("AIRQ_GEOCODER_URL") {
            self.geocoder_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.tracked_pollutants.is_empty(),
            "tracked_pollutants must list at least one pollutant"
        );
        ensure!(
            self.tracked_pollutants.contains(&self.default_pollutant),
            "default_pollutant {} is not one of tracked_pollutants",
            self.default_pollutant
        );
        ensure!(self.refresh_interval_secs > 0, "refresh_interval_secs must be positive");
        ensure!(self.forecast_hours > 0, "forecast_hours must be positive");
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Tracked pollutants in canonical order, without duplicates.
    pub fn tracked(&self) -> Vec<Pollutant> {
        let mut tracked = self.tracked_pollutants.clone();
        tracked.sort();
        tracked.dedup();
        tracked
    }
}
