// Application layer - Polling and reconciliation use cases
pub mod cycle_aggregator;
pub mod drawing_surface;
pub mod error;
pub mod metric_source;
pub mod reconciler;
pub mod scheduler;
pub mod validity;

#[cfg(test)]
pub mod test_support;
