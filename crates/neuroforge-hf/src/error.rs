use std::time::Duration;

use neuroforge_core::{NeuroError, Task};
use reqwest::StatusCode;

/// Every failure mode of the Inference API client.
#[derive(Debug, thiserror::Error)]
pub enum HfError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("couldn’t (de)serialise body: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Inference API returned non-success status {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// HTTP 503 while the hosted model is still warming up.
    #[error("model is still loading (estimated {estimated_time:.1}s)")]
    ModelLoading { estimated_time: f32 },

    #[error("`{model_id}` did not come up within {waited:?}")]
    LoadTimeout { model_id: String, waited: Duration },

    #[error("Inference API format error: {0}")]
    Format(String),
}

impl HfError {
    /// Attribute the error to `task`: shape errors become
    /// [`NeuroError::MalformedOutput`], everything else is a backend failure.
    pub fn for_task(self, task: Task) -> NeuroError {
        match self {
            HfError::Format(reason) => NeuroError::MalformedOutput { task, reason },
            HfError::Serde(err) => NeuroError::MalformedOutput {
                task,
                reason: err.to_string(),
            },
            other => other.into(),
        }
    }
}

impl From<HfError> for NeuroError {
    fn from(value: HfError) -> Self {
        NeuroError::Backend(Box::new(value))
    }
}
