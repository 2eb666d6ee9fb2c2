// Metric domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of the host a series originates from (usually an IP address).
pub type MachineId = String;

/// One of the fixed resource types the dashboard charts.
///
/// The derived ordering is the display order used for chart sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [
        MetricCategory::Cpu,
        MetricCategory::Memory,
        MetricCategory::Disk,
        MetricCategory::Network,
    ];

    /// Path segment used by the metrics API.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Cpu => "cpu",
            MetricCategory::Memory => "memory",
            MetricCategory::Disk => "disk",
            MetricCategory::Network => "network",
        }
    }

    /// Series label shown on the chart legend.
    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::Cpu => "CPU Usage",
            MetricCategory::Memory => "Memory Usage",
            MetricCategory::Disk => "Disk Usage",
            MetricCategory::Network => "Network Usage",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading. `value` is `None` when the machine reported nothing,
/// which is not the same as a reading of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    pub fn is_reading(&self) -> bool {
        self.value.is_some()
    }
}

/// Ordered samples for one (machine, category) pair over the selected range.
pub type MetricSeries = Vec<Sample>;

/// Everything one machine reported during a single cycle, keyed by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineSnapshot {
    series: BTreeMap<MetricCategory, MetricSeries>,
}

impl MachineSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: MetricCategory, series: MetricSeries) {
        self.series.insert(category, series);
    }

    /// Samples for `category`, empty when the category contributed nothing.
    pub fn series(&self, category: MetricCategory) -> &[Sample] {
        self.series.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricCategory, &[Sample])> {
        self.series.iter().map(|(c, s)| (*c, s.as_slice()))
    }
}
