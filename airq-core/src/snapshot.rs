use std::sync::Arc;

use crate::{
    api::AirQualityApi,
    model::{Location, Snapshot},
    pollutant::Pollutant,
};

/// Per-pollutant fetches. A failure never leaves this type as an error; it
/// becomes [`Snapshot::Unavailable`] for that pollutant only.
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    api: Arc<dyn AirQualityApi>,
}

impl SnapshotFetcher {
    pub fn new(api: Arc<dyn AirQualityApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_snapshot(&self, location: &Location, pollutant: Pollutant) -> Snapshot {
        match self.api.air_quality(location, pollutant).await {
            Ok(current) => Snapshot::from(current.reading),
            Err(e) => {
                tracing::warn!(%pollutant, location = %location.name, error = %e, "snapshot unavailable");
                Snapshot::Unavailable
            }
        }
    }

    /// Fetch every pollutant in `tracked`, one after another.
    pub async fn fetch_all(
        &self,
        location: &Location,
        tracked: &[Pollutant],
    ) -> Vec<(Pollutant, Snapshot)> {
        let mut out = Vec::with_capacity(tracked.len());
        for &pollutant in tracked {
            out.push((pollutant, self.fetch_snapshot(location, pollutant).await));
        }
        out
    }
}
