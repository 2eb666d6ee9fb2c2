// In-memory drawing surface shared with the HTTP view
use crate::application::drawing_surface::DrawingSurface;
use crate::application::error::RenderError;
use crate::domain::chart::{ChartHandle, ChartKey, ChartSeries};
use crate::domain::metric::{MachineId, MetricCategory};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub category: MetricCategory,
    pub handle: ChartHandle,
    pub label: String,
    #[serde(flatten)]
    pub series: ChartSeries,
    /// Set when the chart has nothing to plot; clients show a placeholder.
    pub no_data: bool,
    /// Number of in-place updates since the chart was created.
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub machine: MachineId,
    pub charts: Vec<ChartView>,
}

#[cfg(test)]
impl SectionView {
    pub fn chart(&self, category: MetricCategory) -> Option<&ChartView> {
        self.charts.iter().find(|c| c.category == category)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    next_handle: u64,
    sections: BTreeMap<MachineId, BTreeMap<MetricCategory, ChartView>>,
    charts: HashMap<ChartHandle, ChartKey>,
}

/// Drawing surface that keeps rendered charts in memory.
///
/// Clones share the same state: the scheduler draws through one clone while
/// request handlers read snapshots through another.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface {
    state: Arc<RwLock<SurfaceState>>,
}

impl SharedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> DashboardView {
        let state = self.read();
        let sections = state
            .sections
            .iter()
            .map(|(machine, charts)| SectionView {
                machine: machine.clone(),
                charts: charts.values().cloned().collect(),
            })
            .collect();
        DashboardView { sections }
    }

    // A panic mid-draw leaves plain data behind, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, SurfaceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SurfaceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl SharedSurface {
    pub fn live_charts(&self) -> usize {
        self.read().charts.len()
    }
}

impl DrawingSurface for SharedSurface {
    fn create_section(&mut self, machine: &str) -> Result<(), RenderError> {
        self.write().sections.entry(machine.to_string()).or_default();
        Ok(())
    }

    fn remove_section(&mut self, machine: &str) {
        let mut state = self.write();
        if let Some(charts) = state.sections.remove(machine) {
            for chart in charts.values() {
                state.charts.remove(&chart.handle);
            }
        }
    }

    fn create_chart(
        &mut self,
        key: &ChartKey,
        series_label: &str,
        series: &ChartSeries,
    ) -> Result<ChartHandle, RenderError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let section = state
            .sections
            .get_mut(&key.machine)
            .ok_or_else(|| RenderError::SectionMissing {
                machine: key.machine.clone(),
            })?;

        state.next_handle += 1;
        let handle = ChartHandle::new(state.next_handle);
        let replaced = section.insert(
            key.category,
            ChartView {
                category: key.category,
                handle,
                label: series_label.to_string(),
                series: series.clone(),
                no_data: series.is_empty(),
                revision: 0,
            },
        );
        if let Some(old) = replaced {
            state.charts.remove(&old.handle);
        }
        state.charts.insert(handle, key.clone());
        Ok(handle)
    }

    fn update_chart(&mut self, handle: ChartHandle, series: &ChartSeries) -> Result<(), RenderError> {
        let mut guard = self.write();
        let state = &mut *guard;
        let chart = state
            .charts
            .get(&handle)
            .and_then(|key| state.sections.get_mut(&key.machine)?.get_mut(&key.category))
            .ok_or(RenderError::ChartMissing { handle })?;

        chart.series = series.clone();
        chart.no_data = series.is_empty();
        chart.revision += 1;
        Ok(())
    }

    fn destroy_chart(&mut self, handle: ChartHandle) {
        let mut state = self.write();
        if let Some(key) = state.charts.remove(&handle) {
            if let Some(section) = state.sections.get_mut(&key.machine) {
                section.remove(&key.category);
            }
        }
    }
}
