// HTTP request handlers
use crate::application::scheduler::DashboardStatus;
use crate::domain::range::RangeSelection;
use crate::infrastructure::memory_surface::SectionView;
use crate::presentation::app_state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeBody {
    pub range: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    #[serde(flatten)]
    pub status: DashboardStatus,
    pub sections: Vec<SectionView>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current charts plus the status of the last applied cycle
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardPage> {
    let status = state.status.borrow().clone();
    let sections = state.surface.view().sections;
    Json(DashboardPage { status, sections })
}

pub async fn get_range(State(state): State<Arc<AppState>>) -> Json<RangeBody> {
    let range = state.status.borrow().range;
    Json(RangeBody {
        range: range.as_str().to_string(),
    })
}

/// Queue a range change; the scheduler clears the charts and refreshes
pub async fn put_range(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RangeBody>,
) -> Result<(StatusCode, Json<RangeBody>), ApiError> {
    let range = RangeSelection::parse(&body.range).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid range {:?}, expected one of 1h, 24h, 7d", body.range),
        )
    })?;

    state.range_commands.send(range).await.map_err(|_| {
        tracing::error!("Range change for {} dropped, scheduler is not running", range);
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Refresh scheduler is not running")
    })?;

    Ok((StatusCode::ACCEPTED, Json(body)))
}
