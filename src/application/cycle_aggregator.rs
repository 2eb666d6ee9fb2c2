// Cycle aggregator - Fans out one fetch per category and joins the results
use crate::application::metric_source::{MachineSeries, MetricSource};
use crate::domain::metric::{MachineId, MachineSnapshot, MetricCategory};
use crate::domain::range::RangeSelection;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Consolidated outcome of one refresh cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub seq: u64,
    pub range: RangeSelection,
    pub snapshots: BTreeMap<MachineId, MachineSnapshot>,
    pub failures: Vec<MetricCategory>,
}

#[derive(Clone)]
pub struct CycleAggregator {
    source: Arc<dyn MetricSource>,
    categories: Vec<MetricCategory>,
}

impl CycleAggregator {
    pub fn new(source: Arc<dyn MetricSource>, mut categories: Vec<MetricCategory>) -> Self {
        categories.sort();
        categories.dedup();
        Self { source, categories }
    }

    pub fn categories(&self) -> &[MetricCategory] {
        &self.categories
    }

    /// Fetch every configured category concurrently and wait for all of them.
    ///
    /// A failed category contributes nothing and is listed in
    /// [`CycleReport::failures`]; it never cancels the other fetches.
    pub async fn run_cycle(&self, seq: u64, range: RangeSelection) -> CycleReport {
        let fetches = self.categories.iter().map(|&category| {
            let source = self.source.clone();
            async move {
                match source.fetch_metric(category, range).await {
                    Ok(machines) => (category, Some(machines)),
                    Err(e) => {
                        tracing::warn!(
                            cycle = seq,
                            category = %e.category(),
                            shape = e.is_shape(),
                            "Skipping category for this cycle: {}",
                            e
                        );
                        (category, None)
                    }
                }
            }
        });

        let mut snapshots: BTreeMap<MachineId, MachineSnapshot> = BTreeMap::new();
        let mut failures = Vec::new();

        for (category, outcome) in join_all(fetches).await {
            match outcome {
                Some(machines) => merge_category(&mut snapshots, category, machines),
                None => failures.push(category),
            }
        }

        tracing::debug!(
            cycle = seq,
            range = %range,
            machines = snapshots.len(),
            failed = failures.len(),
            "Cycle fetches settled"
        );

        CycleReport {
            seq,
            range,
            snapshots,
            failures,
        }
    }
}

fn merge_category(
    snapshots: &mut BTreeMap<MachineId, MachineSnapshot>,
    category: MetricCategory,
    machines: MachineSeries,
) {
    for (machine, series) in machines {
        snapshots.entry(machine).or_default().insert(category, series);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{machine_series, Script, ScriptedSource};
    use std::time::Duration;

    fn aggregator(source: Arc<ScriptedSource>) -> CycleAggregator {
        CycleAggregator::new(source, MetricCategory::ALL.to_vec())
    }

    #[tokio::test]
    async fn test_merges_categories_per_machine() {
        let source = Arc::new(ScriptedSource::new());
        source.set(MetricCategory::Cpu, Script::Data(machine_series("10.0.0.1", &[(1_000, Some(1.0))])));
        source.set(MetricCategory::Memory, Script::Data(machine_series("10.0.0.1", &[(1_000, Some(40.0))])));
        source.set(MetricCategory::Disk, Script::Data(machine_series("10.0.0.2", &[(1_000, Some(3.0))])));

        let report = aggregator(source.clone()).run_cycle(7, RangeSelection::LastHour).await;

        assert_eq!(report.seq, 7);
        assert!(report.failures.is_empty());
        assert_eq!(report.snapshots.len(), 2);
        let first = &report.snapshots["10.0.0.1"];
        assert_eq!(first.series(MetricCategory::Cpu).len(), 1);
        assert_eq!(first.series(MetricCategory::Memory).len(), 1);
        assert!(first.series(MetricCategory::Disk).is_empty());
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_category_does_not_penalise_others() {
        let source = Arc::new(ScriptedSource::new());
        source.set(MetricCategory::Cpu, Script::Fail);
        source.set(MetricCategory::Memory, Script::Shape);
        source.set(MetricCategory::Network, Script::Data(machine_series("db-1", &[(1_000, Some(9.0))])));

        let report = aggregator(source).run_cycle(1, RangeSelection::LastHour).await;

        assert_eq!(report.failures, vec![MetricCategory::Cpu, MetricCategory::Memory]);
        let snapshot = &report.snapshots["db-1"];
        assert_eq!(snapshot.series(MetricCategory::Network).len(), 1);
        assert!(snapshot.series(MetricCategory::Cpu).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_slowest_category() {
        let source = Arc::new(ScriptedSource::new());
        source.set(MetricCategory::Cpu, Script::Data(machine_series("a", &[(1_000, Some(1.0))])));
        source.set(
            MetricCategory::Disk,
            Script::Delayed(
                Duration::from_secs(30),
                Box::new(Script::Data(machine_series("b", &[(1_000, Some(2.0))]))),
            ),
        );

        let started = tokio::time::Instant::now();
        let report = aggregator(source).run_cycle(1, RangeSelection::LastHour).await;

        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(report.snapshots.contains_key("a"));
        assert!(report.snapshots.contains_key("b"));
    }

    #[tokio::test]
    async fn test_forwards_range_to_source() {
        let source = Arc::new(ScriptedSource::new());
        aggregator(source.clone()).run_cycle(1, RangeSelection::LastWeek).await;
        assert_eq!(source.last_range(), Some(RangeSelection::LastWeek));
    }

    #[test]
    fn test_categories_are_deduplicated_in_display_order() {
        let source = Arc::new(ScriptedSource::new());
        let aggregator = CycleAggregator::new(
            source,
            vec![MetricCategory::Network, MetricCategory::Cpu, MetricCategory::Network],
        );
        assert_eq!(aggregator.categories(), &[MetricCategory::Cpu, MetricCategory::Network]);
    }
}
