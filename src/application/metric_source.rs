// Metric source trait for fetching one category at a time
use crate::application::error::FetchError;
use crate::domain::metric::{MachineId, MetricCategory, MetricSeries};
use crate::domain::range::RangeSelection;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Per-machine series returned for a single category.
pub type MachineSeries = BTreeMap<MachineId, MetricSeries>;

#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch every machine's series for `category` over `range`.
    ///
    /// An empty mapping is a success. Implementations do not retry.
    async fn fetch_metric(
        &self,
        category: MetricCategory,
        range: RangeSelection,
    ) -> Result<MachineSeries, FetchError>;
}
