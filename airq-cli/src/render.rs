use std::fmt;

use airq_core::{
    AqiBand, LocalClock, PollutantCatalogEntry, PollutantReading, Snapshot, ViewState,
    data_source_label, health_recommendation,
};
use chrono::{DateTime, Utc};

const FORECAST_ROWS: usize = 8;

pub const WATCH_HELP: &str =
    "Type NO2, O3 or HCHO to switch pollutant, `r` to refresh, `t` for local time, `q` to quit.";

/// What a watch render depends on; clock ticks alone do not re-render.
#[derive(Debug, PartialEq)]
pub struct RenderKey {
    last_update: Option<DateTime<Utc>>,
    pollutant: airq_core::Pollutant,
    reading: Option<PollutantReading>,
}

impl RenderKey {
    pub fn of(state: &ViewState) -> Self {
        Self {
            last_update: state.last_update,
            pollutant: state.selected_pollutant,
            reading: state.current_reading.clone(),
        }
    }
}

fn band_text(aqi: i32) -> String {
    let band = AqiBand::from_aqi(aqi);
    format!("AQI {aqi:>3}  {} ({})", band.label(), band.color_hint())
}

pub fn clock_line(state: &ViewState) -> String {
    match (&state.location, state.local_clock) {
        (Some(loc), Some(now)) => format!(
            "Local time in {}: {} {}",
            loc.name,
            now.format("%H:%M:%S"),
            LocalClock::for_longitude(loc.lon).label()
        ),
        (Some(loc), None) => format!("Local time in {}: pending", loc.name),
        (None, _) => "No location selected.".to_string(),
    }
}

pub fn render(state: &ViewState) -> String {
    StateReport(state).to_string()
}

pub fn render_catalog(catalog: &[PollutantCatalogEntry]) -> String {
    CatalogReport(catalog).to_string()
}

struct StateReport<'a>(&'a ViewState);

impl fmt::Display for StateReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        let Some(location) = &state.location else {
            return writeln!(f, "No location selected.");
        };

        writeln!(f, "{} ({:.4}, {:.4})", location.name, location.lat, location.lon)?;
        if let Some(full) = &location.full_name {
            writeln!(f, "  {full}")?;
        }
        writeln!(f, "{}", clock_line(state))?;
        writeln!(f, "Source: {}", data_source_label(&state.data_source))?;
        if let Some(at) = state.last_update {
            writeln!(f, "Updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(f)?;

        match &state.current_reading {
            Some(r) => {
                writeln!(
                    f,
                    "{}: {:.2} {}  {}",
                    state.selected_pollutant,
                    r.value,
                    r.unit,
                    band_text(r.aqi)
                )?;
                writeln!(f, "  {}", health_recommendation(Some(&r.quality_level)))?;
            }
            None => {
                writeln!(f, "{}: no data available for this location", state.selected_pollutant)?;
                writeln!(f, "  {}", health_recommendation(None))?;
            }
        }

        if let Some(aqi) = state.overall_aqi {
            writeln!(f, "\nOverall: {}", band_text(aqi))?;
        }

        if !state.pollutant_snapshots.is_empty() {
            writeln!(f, "\nTracked pollutants:")?;
            for (pollutant, snapshot) in &state.pollutant_snapshots {
                let line = match snapshot {
                    Snapshot::Available(r) => band_text(r.aqi),
                    Snapshot::Unavailable => "unavailable".to_string(),
                };
                writeln!(f, "  {:<5} {line}", pollutant.as_str())?;
            }
        }

        if !state.forecast.is_empty() {
            writeln!(f, "\nForecast:")?;
            for point in state.forecast.iter().take(FORECAST_ROWS) {
                writeln!(
                    f,
                    "  {}  {}  ({})",
                    point.timestamp,
                    band_text(point.aqi),
                    point.primary_pollutant
                )?;
            }
        }

        if !state.alerts.is_empty() {
            writeln!(f, "\nAlerts:")?;
            for alert in &state.alerts {
                writeln!(
                    f,
                    "  [{}] {} - {} (until {})",
                    alert.level, alert.message, alert.recommendation, alert.expires_at
                )?;
            }
        }

        if !state.degraded.is_empty() {
            let names: Vec<&str> = state.degraded.iter().map(|r| r.as_str()).collect();
            writeln!(f, "\nUnavailable this cycle: {}", names.join(", "))?;
        }

        writeln!(f)
    }
}

struct CatalogReport<'a>(&'a [PollutantCatalogEntry]);

impl fmt::Display for CatalogReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.0 {
            writeln!(f, "{} - {}", entry.name, entry.full_name)?;
            if !entry.sources.is_empty() {
                writeln!(f, "  Sources: {}", entry.sources.join(", "))?;
            }
            writeln!(f, "  Health effects: {}", entry.health_effects)?;
        }
        Ok(())
    }
}
