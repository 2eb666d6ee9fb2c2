// Chart domain models
use super::metric::{MachineId, MetricCategory, Sample};
use super::range::RangeSelection;
use serde::Serialize;

/// Identity of one rendered chart: at most one live chart exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartKey {
    pub machine: MachineId,
    pub category: MetricCategory,
}

impl ChartKey {
    pub fn new(machine: impl Into<MachineId>, category: MetricCategory) -> Self {
        Self {
            machine: machine.into(),
            category,
        }
    }
}

/// Opaque reference to a chart issued by a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChartHandle(u64);

impl ChartHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Parallel label/value arrays handed to the drawing primitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Build plot points from samples. Null readings are gaps and are skipped.
    pub fn from_samples(samples: &[Sample], range: RangeSelection) -> Self {
        let (labels, values) = samples
            .iter()
            .filter_map(|s| s.value.map(|v| (range.format_label(&s.timestamp), v)))
            .unzip();
        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
