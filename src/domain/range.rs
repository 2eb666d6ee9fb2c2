// Reporting window selected by the user
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeSelection {
    #[default]
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
}

/// How much of a timestamp an axis label shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelGranularity {
    ClockTime,
    DateTime,
}

impl RangeSelection {
    pub const ALL: [RangeSelection; 3] = [
        RangeSelection::LastHour,
        RangeSelection::LastDay,
        RangeSelection::LastWeek,
    ];

    /// Value of the `range` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSelection::LastHour => "1h",
            RangeSelection::LastDay => "24h",
            RangeSelection::LastWeek => "7d",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    /// Unknown values fall back to the last hour, as the metrics API does.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn granularity(&self) -> LabelGranularity {
        match self {
            RangeSelection::LastHour => LabelGranularity::ClockTime,
            RangeSelection::LastDay | RangeSelection::LastWeek => LabelGranularity::DateTime,
        }
    }

    /// Axis label for a sample taken at `timestamp`.
    pub fn format_label(&self, timestamp: &DateTime<Utc>) -> String {
        match self.granularity() {
            LabelGranularity::ClockTime => timestamp.format("%H:%M:%S").to_string(),
            LabelGranularity::DateTime => timestamp.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

impl fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
