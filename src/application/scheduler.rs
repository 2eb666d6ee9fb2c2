// Refresh scheduler - Drives cycles on a timer and on range changes
use crate::application::cycle_aggregator::{CycleAggregator, CycleReport};
use crate::application::drawing_surface::DrawingSurface;
use crate::application::reconciler::{ChartReconciler, ReconcileSummary};
use crate::application::validity::partition_valid;
use crate::domain::metric::{MachineId, MetricCategory};
use crate::domain::range::RangeSelection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Dashboard-level state published after every applied cycle or range change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStatus {
    pub range: RangeSelection,
    pub applied_cycle: Option<u64>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub unreachable: Vec<MachineId>,
    pub failed_categories: Vec<MetricCategory>,
}

impl DashboardStatus {
    fn pending(range: RangeSelection) -> Self {
        Self {
            range,
            applied_cycle: None,
            refreshed_at: None,
            unreachable: Vec::new(),
            failed_categories: Vec::new(),
        }
    }
}

/// Sole owner of the chart registry and the active range.
///
/// Fetches run in spawned tasks; their reports come back over a channel and
/// are applied on the scheduler's own task, one at a time. Only the report of
/// the most recently started cycle is applied. Timer ticks are skipped while
/// that cycle is still in flight; range changes always start a new one.
pub struct RefreshScheduler<S: DrawingSurface> {
    aggregator: CycleAggregator,
    reconciler: ChartReconciler<S>,
    range: RangeSelection,
    interval: Duration,
    latest_seq: u64,
    in_flight: bool,
    status: watch::Sender<DashboardStatus>,
}

impl<S: DrawingSurface + 'static> RefreshScheduler<S> {
    pub fn new(
        aggregator: CycleAggregator,
        surface: S,
        range: RangeSelection,
        interval: Duration,
    ) -> (Self, watch::Receiver<DashboardStatus>) {
        let (status, status_rx) = watch::channel(DashboardStatus::pending(range));
        let scheduler = Self {
            aggregator,
            reconciler: ChartReconciler::new(surface),
            range,
            interval,
            latest_seq: 0,
            in_flight: false,
            status,
        };
        (scheduler, status_rx)
    }

    /// Run until the command channel closes. The first cycle starts immediately.
    pub async fn run(mut self, mut commands: mpsc::Receiver<RangeSelection>) {
        let (report_tx, mut report_rx) = mpsc::channel::<CycleReport>(8);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            range = %self.range,
            interval_secs = self.interval.as_secs(),
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.in_flight {
                        tracing::debug!(cycle = self.latest_seq, "Previous cycle still in flight, skipping tick");
                    } else {
                        self.begin_cycle(&report_tx);
                    }
                }
                command = commands.recv() => match command {
                    Some(range) => {
                        if self.select_range(range) {
                            self.begin_cycle(&report_tx);
                        }
                    }
                    None => break,
                },
                Some(report) = report_rx.recv() => {
                    self.apply(report);
                }
            }
        }

        tracing::info!("Command channel closed, refresh scheduler stopping");
    }

    fn begin_cycle(&mut self, reports: &mpsc::Sender<CycleReport>) {
        self.latest_seq += 1;
        self.in_flight = true;
        let seq = self.latest_seq;
        let range = self.range;
        let aggregator = self.aggregator.clone();
        let reports = reports.clone();

        tokio::spawn(async move {
            let report = aggregator.run_cycle(seq, range).await;
            let _ = reports.send(report).await;
        });
    }

    /// Switch ranges, tearing down every chart. Returns false when `range`
    /// is already active.
    fn select_range(&mut self, range: RangeSelection) -> bool {
        if range == self.range {
            return false;
        }

        let removed = self.reconciler.reset();
        tracing::info!(from = %self.range, to = %range, removed, "Range changed, charts cleared");
        self.range = range;
        self.status.send_replace(DashboardStatus::pending(range));
        true
    }

    fn apply(&mut self, report: CycleReport) -> Option<ReconcileSummary> {
        if report.seq == self.latest_seq {
            self.in_flight = false;
        }
        if report.seq != self.latest_seq || report.range != self.range {
            tracing::debug!(
                cycle = report.seq,
                latest = self.latest_seq,
                "Discarding report from superseded cycle"
            );
            return None;
        }

        let partition = partition_valid(report.snapshots);
        let summary = self
            .reconciler
            .reconcile(&partition.valid, self.aggregator.categories(), report.range);

        tracing::info!(
            cycle = report.seq,
            range = %report.range,
            created = summary.created,
            updated = summary.updated,
            removed = summary.removed,
            actions = summary.total(),
            charts = self.reconciler.chart_count(),
            unreachable = partition.unreachable.len(),
            failed = report.failures.len(),
            "Cycle applied"
        );

        self.status.send_replace(DashboardStatus {
            range: report.range,
            applied_cycle: Some(report.seq),
            refreshed_at: Some(Utc::now()),
            unreachable: partition.unreachable,
            failed_categories: report.failures,
        });

        Some(summary)
    }
}
