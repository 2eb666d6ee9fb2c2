// Application state for HTTP handlers
use crate::application::scheduler::DashboardStatus;
use crate::domain::range::RangeSelection;
use crate::infrastructure::memory_surface::SharedSurface;
use tokio::sync::{mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    pub surface: SharedSurface,
    pub status: watch::Receiver<DashboardStatus>,
    pub range_commands: mpsc::Sender<RangeSelection>,
}
