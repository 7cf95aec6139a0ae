//! Display attributes derived from AQI values, quality levels and data-source
//! tags. Nothing here feeds back into control flow.

/// AQI severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AqiBand {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiBand {
    /// Upper bounds are inclusive: 50 is Good, 51 is Moderate.
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => AqiBand::Good,
            51..=100 => AqiBand::Moderate,
            101..=150 => AqiBand::UnhealthyForSensitiveGroups,
            151..=200 => AqiBand::Unhealthy,
            _ => AqiBand::VeryUnhealthy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::VeryUnhealthy => "Very Unhealthy",
        }
    }

    pub fn color_hint(&self) -> &'static str {
        match self {
            AqiBand::Good => "green",
            AqiBand::Moderate => "yellow",
            AqiBand::UnhealthyForSensitiveGroups => "orange",
            AqiBand::Unhealthy => "red",
            AqiBand::VeryUnhealthy => "purple",
        }
    }

    pub const fn all() -> &'static [AqiBand] {
        &[
            AqiBand::Good,
            AqiBand::Moderate,
            AqiBand::UnhealthyForSensitiveGroups,
            AqiBand::Unhealthy,
            AqiBand::VeryUnhealthy,
        ]
    }
}

impl std::fmt::Display for AqiBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify(aqi: i32) -> AqiBand {
    AqiBand::from_aqi(aqi)
}

pub const UNAVAILABLE_RECOMMENDATION: &str =
    "Air quality data is unavailable for this location right now.";

/// Health advice for a service-reported quality level. Unknown levels get the
/// "data unavailable" message.
pub fn health_recommendation(quality_level: Option<&str>) -> &'static str {
    let Some(level) = quality_level.map(str::trim) else {
        return UNAVAILABLE_RECOMMENDATION;
    };

    if level.eq_ignore_ascii_case("good") {
        "Air quality is satisfactory. Enjoy your usual outdoor activities."
    } else if level.eq_ignore_ascii_case("moderate") {
        "Unusually sensitive people should consider reducing prolonged outdoor exertion."
    } else if level.eq_ignore_ascii_case("unhealthy for sensitive groups") {
        "Children, older adults and people with heart or lung disease should limit prolonged outdoor exertion."
    } else if level.eq_ignore_ascii_case("unhealthy") {
        "Everyone should reduce prolonged outdoor exertion; sensitive groups should avoid it."
    } else if level.eq_ignore_ascii_case("very unhealthy") {
        "Avoid outdoor activity. Keep windows closed and use air filtration if available."
    } else if level.eq_ignore_ascii_case("hazardous") {
        "Health warning of emergency conditions. Stay indoors."
    } else {
        UNAVAILABLE_RECOMMENDATION
    }
}

/// Display string for a data-source tag; unknown tags are returned as-is.
pub fn data_source_label(tag: &str) -> &str {
    match tag {
        "tempo_satellite" => "NASA TEMPO satellite",
        "unavailable" => "Data unavailable",
        "unsupported" => "Outside TEMPO coverage",
        "simulated" => "Simulated data",
        other => other,
    }
}
