// Error types for fetching and drawing
use crate::domain::chart::ChartHandle;
use crate::domain::metric::{MachineId, MetricCategory};
use thiserror::Error;

/// Failure to obtain one category's data for a cycle.
///
/// Every variant is scoped to a single category; the aggregator logs it and
/// carries on with the others.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for {category} metrics failed: {source}")]
    Transport {
        category: MetricCategory,
        #[source]
        source: reqwest::Error,
    },

    #[error("{category} metrics endpoint returned {status}: {body}")]
    Status {
        category: MetricCategory,
        status: u16,
        body: String,
    },

    #[error("{category} metrics response is not valid JSON: {source}")]
    Decode {
        category: MetricCategory,
        #[source]
        source: serde_json::Error,
    },

    #[error("{category} metrics response has an unexpected shape: {reason}")]
    Shape {
        category: MetricCategory,
        reason: String,
    },
}

impl FetchError {
    pub fn category(&self) -> MetricCategory {
        match self {
            FetchError::Transport { category, .. }
            | FetchError::Status { category, .. }
            | FetchError::Decode { category, .. }
            | FetchError::Shape { category, .. } => *category,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, FetchError::Shape { .. })
    }
}

/// Failure reported by a drawing surface.
#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("no drawing section for machine {machine}")]
    SectionMissing { machine: MachineId },

    #[error("chart {handle:?} is not attached to the surface")]
    ChartMissing { handle: ChartHandle },

    #[error("drawing surface failed during {operation}: {reason}")]
    Surface {
        operation: &'static str,
        reason: String,
    },
}
