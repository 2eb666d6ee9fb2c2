// Drawing surface trait - The rendering primitive the reconciler drives
use crate::application::error::RenderError;
use crate::domain::chart::{ChartHandle, ChartKey, ChartSeries};

/// Container sections (one per machine) holding one chart per category.
///
/// All calls are synchronous; the reconciler is the only caller.
pub trait DrawingSurface: Send {
    fn create_section(&mut self, machine: &str) -> Result<(), RenderError>;

    /// Drop the section and anything still drawn inside it.
    fn remove_section(&mut self, machine: &str);

    /// Draw a new chart in the section of `key.machine`.
    fn create_chart(
        &mut self,
        key: &ChartKey,
        series_label: &str,
        series: &ChartSeries,
    ) -> Result<ChartHandle, RenderError>;

    /// Replace the chart's labels and values in place.
    fn update_chart(&mut self, handle: ChartHandle, series: &ChartSeries) -> Result<(), RenderError>;

    fn destroy_chart(&mut self, handle: ChartHandle);
}
