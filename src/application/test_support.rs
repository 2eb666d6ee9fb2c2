// Test doubles for the metric source and drawing surface
use crate::application::drawing_surface::DrawingSurface;
use crate::application::error::{FetchError, RenderError};
use crate::application::metric_source::{MachineSeries, MetricSource};
use crate::domain::chart::{ChartHandle, ChartKey, ChartSeries};
use crate::domain::metric::{MachineId, MachineSnapshot, MetricCategory, Sample};
use crate::domain::range::RangeSelection;
use async_trait::async_trait;
use chrono::DateTime;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn sample(ms: i64, value: Option<f64>) -> Sample {
    Sample::new(DateTime::from_timestamp_millis(ms).unwrap(), value)
}

pub fn machine_series(machine: &str, points: &[(i64, Option<f64>)]) -> MachineSeries {
    let series = points.iter().map(|(ms, v)| sample(*ms, *v)).collect();
    MachineSeries::from([(machine.to_string(), series)])
}

pub fn snapshot(entries: Vec<(MetricCategory, Vec<(i64, Option<f64>)>)>) -> MachineSnapshot {
    let mut snapshot = MachineSnapshot::new();
    for (category, points) in entries {
        snapshot.insert(category, points.into_iter().map(|(ms, v)| sample(ms, v)).collect());
    }
    snapshot
}

/// What a scripted category fetch should do.
#[derive(Debug, Clone)]
pub enum Script {
    Data(MachineSeries),
    Fail,
    Shape,
    Delayed(Duration, Box<Script>),
}

/// Metric source answering from per-category scripts. Unscripted categories
/// return an empty mapping.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<MetricCategory, Script>>,
    range_delays: Mutex<HashMap<RangeSelection, Duration>>,
    last_range: Mutex<Option<RangeSelection>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, category: MetricCategory, script: Script) {
        self.scripts.lock().unwrap().insert(category, script);
    }

    pub fn set_all(&self, script: Script) {
        for category in MetricCategory::ALL {
            self.set(category, script.clone());
        }
    }

    /// Delay every fetch made for `range`.
    pub fn delay_range(&self, range: RangeSelection, delay: Duration) {
        self.range_delays.lock().unwrap().insert(range, delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_range(&self) -> Option<RangeSelection> {
        *self.last_range.lock().unwrap()
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    async fn fetch_metric(
        &self,
        category: MetricCategory,
        range: RangeSelection,
    ) -> Result<MachineSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_range.lock().unwrap() = Some(range);

        let mut script = self
            .scripts
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .unwrap_or_else(|| Script::Data(MachineSeries::new()));
        let delay = self.range_delays.lock().unwrap().get(&range).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        loop {
            match script {
                Script::Data(machines) => return Ok(machines),
                Script::Fail => {
                    return Err(FetchError::Status {
                        category,
                        status: 503,
                        body: "service unavailable".to_string(),
                    });
                }
                Script::Shape => {
                    return Err(FetchError::Shape {
                        category,
                        reason: "expected an object keyed by machine".to_string(),
                    });
                }
                Script::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    script = *inner;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    CreateSection(MachineId),
    RemoveSection(MachineId),
    CreateChart(ChartKey, ChartHandle),
    UpdateChart(ChartHandle),
    DestroyChart(ChartHandle),
}

/// Drawing surface that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    sections: BTreeSet<MachineId>,
    charts: HashMap<ChartHandle, (ChartKey, usize)>,
    next_handle: u64,
    failing_sections: HashSet<MachineId>,
    failing_charts: HashSet<ChartKey>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn fail_section(&mut self, machine: &str) {
        self.failing_sections.insert(machine.to_string());
    }

    pub fn fail_chart(&mut self, key: ChartKey) {
        self.failing_charts.insert(key);
    }

    pub fn clear_failures(&mut self) {
        self.failing_sections.clear();
        self.failing_charts.clear();
    }

    pub fn has_section(&self, machine: &str) -> bool {
        self.sections.contains(machine)
    }

    pub fn live_charts(&self) -> usize {
        self.charts.len()
    }

    /// Number of plotted points on the live chart for `key`.
    pub fn points(&self, key: &ChartKey) -> Option<usize> {
        self.charts
            .values()
            .find(|(k, _)| k == key)
            .map(|(_, points)| *points)
    }
}

impl DrawingSurface for RecordingSurface {
    fn create_section(&mut self, machine: &str) -> Result<(), RenderError> {
        if self.failing_sections.contains(machine) {
            return Err(RenderError::Surface {
                operation: "create_section",
                reason: "no container element".to_string(),
            });
        }
        self.sections.insert(machine.to_string());
        self.ops.push(SurfaceOp::CreateSection(machine.to_string()));
        Ok(())
    }

    fn remove_section(&mut self, machine: &str) {
        self.sections.remove(machine);
        self.charts.retain(|_, (key, _)| key.machine != machine);
        self.ops.push(SurfaceOp::RemoveSection(machine.to_string()));
    }

    fn create_chart(
        &mut self,
        key: &ChartKey,
        _series_label: &str,
        series: &ChartSeries,
    ) -> Result<ChartHandle, RenderError> {
        if !self.sections.contains(&key.machine) {
            return Err(RenderError::SectionMissing {
                machine: key.machine.clone(),
            });
        }
        if self.failing_charts.contains(key) {
            return Err(RenderError::Surface {
                operation: "create_chart",
                reason: "canvas unavailable".to_string(),
            });
        }
        self.next_handle += 1;
        let handle = ChartHandle::new(self.next_handle);
        self.charts.insert(handle, (key.clone(), series.len()));
        self.ops.push(SurfaceOp::CreateChart(key.clone(), handle));
        Ok(handle)
    }

    fn update_chart(&mut self, handle: ChartHandle, series: &ChartSeries) -> Result<(), RenderError> {
        let (_, points) = self
            .charts
            .get_mut(&handle)
            .ok_or(RenderError::ChartMissing { handle })?;
        *points = series.len();
        self.ops.push(SurfaceOp::UpdateChart(handle));
        Ok(())
    }

    fn destroy_chart(&mut self, handle: ChartHandle) {
        self.charts.remove(&handle);
        self.ops.push(SurfaceOp::DestroyChart(handle));
    }
}
