use thiserror::Error;

/// Failure talking to the air-quality service or the geocoder.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}: {detail}")]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {endpoint} response: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },

    #[error("{endpoint} did not respond within {}s", .after.as_secs())]
    Timeout {
        endpoint: &'static str,
        after: std::time::Duration,
    },
}

impl ApiError {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::Decode { endpoint, .. }
            | ApiError::Malformed { endpoint, .. }
            | ApiError::Timeout { endpoint, .. } => endpoint,
        }
    }
}

/// Device positioning could not produce coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositioningError {
    #[error("location access was denied")]
    Denied,

    #[error("current position is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("the orchestrator is no longer running")]
    Stopped,

    #[error("pollutant {0} is not in the tracked set")]
    NotTracked(crate::Pollutant),

    #[error("at least one pollutant must be tracked")]
    NothingTracked,

    #[error("{0} interval must be positive")]
    ZeroInterval(&'static str),

    #[error("forecast horizon must be at least one hour")]
    ZeroForecastHours,
}
