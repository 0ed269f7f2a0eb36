//! Unified error type exposed by **`neuroforge-core`**.
//!
//! Engine crates convert their internal errors into one of these variants
//! before handing them to the session. The session never lets an engine error
//! escape: it turns them into [`crate::TaskState::Error`] transitions and only
//! returns `Err` for API misuse such as [`NeuroError::SwapUnsupported`].

use thiserror::Error;

use crate::task::Task;

/// Convenient alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NeuroError>;

#[derive(Debug, Error)]
pub enum NeuroError {
    /// An inference call targeted a task whose pipeline is not resident.
    #[error("no model loaded for task `{task}`")]
    ModelNotLoaded { task: Task },

    /// The engine could not bring `model_id` up for `task`.
    #[error("failed to load `{model_id}` for task `{task}`: {reason}")]
    LoadFailed {
        task: Task,
        model_id: String,
        reason: String,
    },

    /// The engine answered, but the payload did not have the expected shape.
    #[error("malformed `{task}` output: {reason}")]
    MalformedOutput { task: Task, reason: String },

    /// `swap_model` was called for a task that only ever has one backing model,
    /// or swapping is disabled for the session.
    #[error("task `{task}` does not support model swapping")]
    SwapUnsupported { task: Task },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A session was built outside a tokio runtime without being handed one.
    #[error("no tokio runtime to schedule background work on")]
    NoRuntime,

    /// Failure while serialising or deserialising JSON payloads.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic forwarding of any backend-specific error that doesn’t fit another
    /// category.
    #[error("backend returned an error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),
}
