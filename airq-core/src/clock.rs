use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Approximate UTC offset in whole hours for a longitude.
pub fn utc_offset_hours(lon: f64) -> i32 {
    (lon / 15.0).round().clamp(-12.0, 14.0) as i32
}

/// Cosmetic local clock for a location, derived only from its longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset_hours: i32,
}

impl LocalClock {
    pub fn for_longitude(lon: f64) -> Self {
        Self { offset_hours: utc_offset_hours(lon) }
    }

    pub fn offset_hours(&self) -> i32 {
        self.offset_hours
    }

    fn offset(&self) -> FixedOffset {
        // |offset_hours| <= 14, always within FixedOffset's range.
        FixedOffset::east_opt(self.offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset())
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.at(Utc::now())
    }

    pub fn label(&self) -> String {
        format!("UTC{:+}", self.offset_hours)
    }

    pub fn render(&self, instant: DateTime<Utc>) -> String {
        format!("{} {}", self.at(instant).format("%H:%M:%S"), self.label())
    }
}
