// Domain layer - Pure data model for the dashboard
pub mod chart;
pub mod metric;
pub mod range;
