//! Orchestration layer of the NeuroForge text workspace.
//!
//! A [`Session`] coordinates independently loading, independently failing
//! inference tasks against one continuously edited text buffer:
//!
//! | Component                              | Responsibility                                          |
//! |----------------------------------------|---------------------------------------------------------|
//! | [`lifecycle::ModelLifecycle`]          | per-task status, concurrent loading, classifier swap    |
//! | [`analysis::AnalysisOrchestrator`]     | trailing debounce, one cycle at a time, versioned snapshots |
//! | [`generation::GenerationTrigger`]      | guarded on-demand completion                            |
//! | [`telemetry::EventLog`]                | five-entry log ring mirrored to `tracing`               |
//!
//! Engine failures never surface as `Err`; they become
//! [`neuroforge_core::TaskState::Error`] on the affected task only.
use std::sync::{Mutex, MutexGuard, PoisonError};

use neuroforge_core::{Task, TaskState};

pub mod analysis;
pub mod debounce;
pub mod generation;
pub mod lifecycle;
pub mod session;
pub mod telemetry;

pub use analysis::DEFAULT_DEBOUNCE;
pub use generation::GenerateOutcome;
pub use session::{Session, SessionBuilder};

/// Result of forwarding an edit to the analysis orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// The debounce timer was (re)started.
    Scheduled,
    Skipped(SkipReason),
}

/// Why a guard dropped a request. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The edit's version is not newer than one already seen.
    StaleVersion { version: u64, latest: u64 },
    /// Fewer than five characters.
    TextTooShort,
    /// Nothing but whitespace to complete.
    EmptyPrompt,
    /// The task is not in a state that accepts work.
    ModelNotReady { task: Task, state: TaskState },
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
