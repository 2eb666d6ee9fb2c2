// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::cycle_aggregator::CycleAggregator;
use crate::application::scheduler::RefreshScheduler;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_metric_source::HttpMetricSource;
use crate::infrastructure::memory_surface::SharedSurface;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_range, health_check, put_range};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create metric source (infrastructure layer)
    let source = Arc::new(HttpMetricSource::new(
        config.api.base_url.clone(),
        config.api.timeout(),
        config.api.token.clone(),
    )?);

    // Create scheduler (application layer); it owns the chart registry
    let surface = SharedSurface::new();
    let aggregator = CycleAggregator::new(source, config.refresh.categories.clone());
    let (scheduler, status) = RefreshScheduler::new(
        aggregator,
        surface.clone(),
        config.refresh.initial_range(),
        config.refresh.interval(),
    );
    let (range_commands, command_rx) = mpsc::channel(16);
    tokio::spawn(scheduler.run(command_rx));

    let state = Arc::new(AppState {
        surface,
        status,
        range_commands,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/range", get(get_range).put(put_range))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(api = %config.api.base_url, "Starting metrics dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
