//! Engine-agnostic building blocks of the NeuroForge text workspace.
//!
//! Nothing in here performs I/O or spawns tasks. The crate only defines the
//! vocabulary shared by the session controllers and the inference back-ends:
//!
//! * [`task`] – the inference tasks and their observable [`task::ModelStatus`].
//! * [`engine`] – the [`engine::InferenceEngine`] trait every back-end implements.
//! * [`analysis`] – validated sentiment / conflict results and the published
//!   [`analysis::AnalysisSnapshot`].
//! * [`settings`] – user-facing [`settings::AppSettings`].
//! * [`log`] – the fixed-capacity telemetry ring.
//! * [`catalog`] – known model identifiers per task.
pub mod analysis;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod log;
pub mod settings;
pub mod task;

pub use engine::InferenceEngine;
pub use error::{NeuroError, Result};
pub use task::{ModelStatus, Task, TaskState};
