//! The consumer-facing aggregate and the only code allowed to change it.
//!
//! Consumers receive `ViewState` values by clone through the orchestrator's
//! watch channel; the `pub(crate)` reducer methods below are called by the
//! orchestrator actor alone.

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    clock::LocalClock,
    error::ApiError,
    model::{
        Alert, CurrentReading, ForecastPoint, Location, PollutantCatalogEntry, PollutantReading,
        Resource, Snapshot,
    },
    pollutant::Pollutant,
};

pub const UNAVAILABLE_SOURCE: &str = "unavailable";

/// Where the refresh state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Refreshing,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub location: Option<Location>,
    pub selected_pollutant: Pollutant,
    pub current_reading: Option<PollutantReading>,
    pub data_source: String,
    pub pollutant_snapshots: BTreeMap<Pollutant, Snapshot>,
    pub forecast: Vec<ForecastPoint>,
    pub alerts: Vec<Alert>,
    pub catalog: Vec<PollutantCatalogEntry>,
    pub overall_aqi: Option<i32>,
    pub loading: bool,
    pub pollutant_loading: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub local_clock: Option<DateTime<FixedOffset>>,

    /// Resources that failed in the most recent full cycle.
    pub degraded: BTreeSet<Resource>,
}

/// Everything one full refresh cycle produced, applied in a single step.
#[derive(Debug)]
pub(crate) struct CycleOutcome {
    pub pollutant: Pollutant,
    pub current: Result<CurrentReading, ApiError>,
    pub forecast: Result<Vec<ForecastPoint>, ApiError>,
    pub alerts: Result<Vec<Alert>, ApiError>,
    pub catalog: Result<Vec<PollutantCatalogEntry>, ApiError>,
    pub overall_aqi: Result<i32, ApiError>,
    pub snapshots: Vec<(Pollutant, Snapshot)>,
}

impl ViewState {
    pub fn new(selected_pollutant: Pollutant) -> Self {
        Self {
            location: None,
            selected_pollutant,
            current_reading: None,
            data_source: UNAVAILABLE_SOURCE.to_string(),
            pollutant_snapshots: BTreeMap::new(),
            forecast: Vec::new(),
            alerts: Vec::new(),
            catalog: Vec::new(),
            overall_aqi: None,
            loading: false,
            pollutant_loading: false,
            last_update: None,
            local_clock: None,
            degraded: BTreeSet::new(),
        }
    }

    /// Always `current_reading.is_some()`.
    pub fn data_available(&self) -> bool {
        self.current_reading.is_some()
    }

    pub fn phase(&self) -> Phase {
        match (&self.location, self.loading) {
            (None, _) => Phase::Idle,
            (Some(_), true) => Phase::Refreshing,
            (Some(_), false) => Phase::Ready,
        }
    }

    /// Snapshot for `pollutant`, if a cycle has produced one yet.
    pub fn snapshot(&self, pollutant: Pollutant) -> Option<&Snapshot> {
        self.pollutant_snapshots.get(&pollutant)
    }

    /// Drop everything bound to the previous location and adopt `location`.
    pub(crate) fn reset_for(&mut self, location: Option<Location>, now: DateTime<Utc>) {
        let selected = self.selected_pollutant;
        *self = ViewState::new(selected);
        self.local_clock = location.as_ref().map(|l| LocalClock::for_longitude(l.lon).at(now));
        self.location = location;
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.loading = true;
    }

    /// Apply a finished cycle. `apply_current` is false when the selection
    /// moved on while the cycle was in flight; the narrow refresh for the new
    /// selection owns the current-reading fields then.
    pub(crate) fn apply_cycle(
        &mut self,
        outcome: CycleOutcome,
        apply_current: bool,
        now: DateTime<Utc>,
    ) {
        let CycleOutcome { pollutant, current, forecast, alerts, catalog, overall_aqi, snapshots } =
            outcome;

        if apply_current {
            self.apply_current(pollutant, current);
        }

        self.degraded.clear();
        self.forecast = self.take_or_degrade(Resource::Forecast, forecast).unwrap_or_default();
        self.alerts = self.take_or_degrade(Resource::Alerts, alerts).unwrap_or_default();
        self.catalog = self.take_or_degrade(Resource::Catalog, catalog).unwrap_or_default();
        self.overall_aqi = self.take_or_degrade(Resource::OverallAqi, overall_aqi);

        for (p, snapshot) in snapshots {
            self.pollutant_snapshots.insert(p, snapshot);
        }

        self.loading = false;
        self.last_update = Some(now);
    }

    pub(crate) fn begin_narrow(&mut self, pollutant: Pollutant) {
        self.selected_pollutant = pollutant;
        if self.location.is_some() {
            self.pollutant_loading = true;
        }
    }

    /// Apply a narrow refresh. Only the current-reading fields and the one
    /// snapshot entry are touched.
    pub(crate) fn apply_narrow(
        &mut self,
        pollutant: Pollutant,
        current: Result<CurrentReading, ApiError>,
        finished: bool,
    ) {
        if pollutant == self.selected_pollutant {
            self.apply_current(pollutant, current);
        } else {
            let snapshot = current.map(|c| Snapshot::from(c.reading)).unwrap_or(Snapshot::Unavailable);
            self.pollutant_snapshots.insert(pollutant, snapshot);
        }

        if finished {
            self.pollutant_loading = false;
        }
    }

    pub(crate) fn tick_clock(&mut self, now: DateTime<Utc>) {
        if let Some(location) = &self.location {
            self.local_clock = Some(LocalClock::for_longitude(location.lon).at(now));
        }
    }

    fn apply_current(&mut self, pollutant: Pollutant, current: Result<CurrentReading, ApiError>) {
        match current {
            Ok(CurrentReading { reading, data_source }) => {
                let snapshot = Snapshot::from(reading);
                self.current_reading = snapshot.reading().cloned();
                self.data_source = data_source;
                self.pollutant_snapshots.insert(pollutant, snapshot);
            }
            Err(e) => {
                tracing::warn!(%pollutant, error = %e, "current reading unavailable");
                self.current_reading = None;
                self.data_source = UNAVAILABLE_SOURCE.to_string();
                self.pollutant_snapshots.insert(pollutant, Snapshot::Unavailable);
            }
        }
    }

    fn take_or_degrade<T>(&mut self, resource: Resource, result: Result<T, ApiError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%resource, error = %e, "resource failed, continuing cycle");
                self.degraded.insert(resource);
                None
            }
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Pollutant::default())
    }
}
