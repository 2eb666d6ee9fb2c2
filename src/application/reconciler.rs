// Chart state reconciler - Creates, updates and removes charts per machine
use crate::application::drawing_surface::DrawingSurface;
use crate::domain::chart::{ChartHandle, ChartKey, ChartSeries};
use crate::domain::metric::{MachineId, MachineSnapshot, MetricCategory};
use crate::domain::range::RangeSelection;
use std::collections::BTreeMap;

/// Section-level actions taken by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ReconcileSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.removed
    }
}

/// Owns the chart registry and the surface it draws on.
///
/// The registry is the single source of truth for which charts exist: a
/// machine has an entry exactly when its section was created, and each
/// category maps to at most one handle.
pub struct ChartReconciler<S: DrawingSurface> {
    surface: S,
    registry: BTreeMap<MachineId, BTreeMap<MetricCategory, ChartHandle>>,
}

impl<S: DrawingSurface> ChartReconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            registry: BTreeMap::new(),
        }
    }

    pub fn machines(&self) -> impl Iterator<Item = &MachineId> {
        self.registry.keys()
    }

    pub fn chart_count(&self) -> usize {
        self.registry.values().map(BTreeMap::len).sum()
    }

    /// Bring the surface in line with this cycle's valid machines.
    ///
    /// Every registered machine missing from `valid` is torn down, whether it
    /// was reported as empty or not reported at all.
    pub fn reconcile(
        &mut self,
        valid: &BTreeMap<MachineId, MachineSnapshot>,
        categories: &[MetricCategory],
        range: RangeSelection,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        let stale: Vec<MachineId> = self
            .registry
            .keys()
            .filter(|machine| !valid.contains_key(*machine))
            .cloned()
            .collect();
        for machine in stale {
            self.remove_machine(&machine);
            summary.removed += 1;
        }

        for (machine, snapshot) in valid {
            if self.registry.contains_key(machine) {
                self.refresh_machine(machine, snapshot, categories, range);
                summary.updated += 1;
            } else if self.create_machine(machine, snapshot, categories, range) {
                summary.created += 1;
            }
        }

        summary
    }

    /// Remove every section and chart. Returns the number of machines removed.
    pub fn reset(&mut self) -> usize {
        let machines: Vec<MachineId> = self.machines().cloned().collect();
        for machine in &machines {
            self.remove_machine(machine);
        }
        machines.len()
    }

    fn create_machine(
        &mut self,
        machine: &MachineId,
        snapshot: &MachineSnapshot,
        categories: &[MetricCategory],
        range: RangeSelection,
    ) -> bool {
        if let Err(e) = self.surface.create_section(machine) {
            tracing::warn!(machine = %machine, "Could not create chart section: {}", e);
            return false;
        }

        let mut charts = BTreeMap::new();
        for &category in categories {
            let series = ChartSeries::from_samples(snapshot.series(category), range);
            if let Some(handle) = draw_chart(&mut self.surface, machine, category, &series) {
                charts.insert(category, handle);
            }
        }
        self.registry.insert(machine.clone(), charts);
        true
    }

    fn refresh_machine(
        &mut self,
        machine: &MachineId,
        snapshot: &MachineSnapshot,
        categories: &[MetricCategory],
        range: RangeSelection,
    ) {
        let Self { surface, registry } = self;
        let Some(charts) = registry.get_mut(machine) else {
            return;
        };

        for &category in categories {
            let series = ChartSeries::from_samples(snapshot.series(category), range);
            match charts.get(&category).copied() {
                Some(handle) => {
                    if let Err(e) = surface.update_chart(handle, &series) {
                        tracing::warn!(
                            machine = %machine,
                            category = %category,
                            "Could not update chart, dropping it for recreation: {}",
                            e
                        );
                        surface.destroy_chart(handle);
                        charts.remove(&category);
                    }
                }
                // Creation failed on an earlier cycle; try again.
                None => {
                    if let Some(handle) = draw_chart(surface, machine, category, &series) {
                        charts.insert(category, handle);
                    }
                }
            }
        }
    }

    fn remove_machine(&mut self, machine: &str) {
        if let Some(charts) = self.registry.remove(machine) {
            for handle in charts.into_values() {
                self.surface.destroy_chart(handle);
            }
            self.surface.remove_section(machine);
        }
    }
}

#[cfg(test)]
impl<S: DrawingSurface> ChartReconciler<S> {
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn handle(&self, key: &ChartKey) -> Option<ChartHandle> {
        self.registry
            .get(&key.machine)
            .and_then(|charts| charts.get(&key.category))
            .copied()
    }
}

fn draw_chart<S: DrawingSurface>(
    surface: &mut S,
    machine: &MachineId,
    category: MetricCategory,
    series: &ChartSeries,
) -> Option<ChartHandle> {
    let key = ChartKey::new(machine.clone(), category);
    match surface.create_chart(&key, category.label(), series) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(
                machine = %machine,
                category = %category,
                "Could not create chart: {}",
                e
            );
            None
        }
    }
}
