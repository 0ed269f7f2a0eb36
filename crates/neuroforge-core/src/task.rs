//! Inference tasks and their observable lifecycle state.
//!
//! Every task owns exactly one [`ModelStatus`]. The status is what the
//! presentation layer renders; the session controllers are the only writers.
//!
//! ```text
//!            load / swap                 success
//!   Idle ──────────────────► Loading ───────────► Ready ◄──┐
//!     ▲                         │                   │      │ done
//!     │                         │ failure           │ work │
//!     │                         ▼                   ▼      │
//!     └──── (never) ────────  Error ◄─────────── Working ──┘
//! ```
//!
//! `Error` is sticky: only a new load or swap leaves it.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Independently managed inference capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Text completion.
    Generator,
    /// Sentiment / toxicity classification of the buffer.
    Classifier,
    /// Zero-shot probe for contradicting statements.
    #[serde(rename = "conflict")]
    ConflictDetector,
}

impl Task {
    /// All tasks in declaration order.
    pub const ALL: [Task; 3] = [Task::Generator, Task::Classifier, Task::ConflictDetector];

    /// Only the classifier can be re-bound to a different model at runtime.
    pub fn supports_swap(self) -> bool {
        matches!(self, Task::Classifier)
    }

    /// Log line emitted once the task's model is resident.
    pub fn online_message(self) -> &'static str {
        match self {
            Task::Generator => "Neural Generator Online",
            Task::Classifier => "Analysis Engine Online",
            Task::ConflictDetector => "Conflict Scanner Online",
        }
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Generator => write!(f, "generator"),
            Task::Classifier => write!(f, "classifier"),
            Task::ConflictDetector => write!(f, "conflict"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Loading,
    Ready,
    Working,
    Error,
}

impl Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Idle => write!(f, "idle"),
            TaskState::Loading => write!(f, "loading"),
            TaskState::Ready => write!(f, "ready"),
            TaskState::Working => write!(f, "working"),
            TaskState::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of one task's lifecycle.
///
/// The fields are private so the invariants hold by construction:
/// `progress` is only `Some` while loading, `message` only while errored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    task: Task,
    state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ModelStatus {
    pub fn idle(task: Task) -> Self {
        Self {
            task,
            state: TaskState::Idle,
            progress: None,
            message: None,
        }
    }

    pub fn loading(task: Task, progress: u8) -> Self {
        Self {
            task,
            state: TaskState::Loading,
            progress: Some(progress.min(100)),
            message: None,
        }
    }

    pub fn ready(task: Task) -> Self {
        Self {
            task,
            state: TaskState::Ready,
            progress: None,
            message: None,
        }
    }

    pub fn working(task: Task) -> Self {
        Self {
            task,
            state: TaskState::Working,
            progress: None,
            message: None,
        }
    }

    pub fn error(task: Task, message: impl Into<String>) -> Self {
        Self {
            task,
            state: TaskState::Error,
            progress: None,
            message: Some(message.into()),
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Load progress in percent. `None` unless the task is loading.
    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    /// Raise the load progress, never lowering it. Ignored outside `Loading`.
    ///
    /// Returns `true` if the stored value changed.
    pub fn advance_progress(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        match (self.state, self.progress) {
            (TaskState::Loading, Some(current)) if percent > current => {
                self.progress = Some(percent);
                true
            }
            (TaskState::Loading, None) => {
                self.progress = Some(percent);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_only_moves_forward_while_loading() {
        let mut status = ModelStatus::loading(Task::Classifier, 0);
        assert!(status.advance_progress(40));
        assert!(!status.advance_progress(20));
        assert_eq!(status.progress(), Some(40));
        assert!(status.advance_progress(250));
        assert_eq!(status.progress(), Some(100));

        let mut ready = ModelStatus::ready(Task::Classifier);
        assert!(!ready.advance_progress(50));
        assert_eq!(ready.progress(), None);
    }

    #[test]
    fn error_status_carries_message_only() {
        let status = ModelStatus::error(Task::Generator, "weights missing");
        assert_eq!(status.state(), TaskState::Error);
        assert_eq!(status.message(), Some("weights missing"));
        assert_eq!(status.progress(), None);
    }

    #[test]
    fn only_the_classifier_swaps() {
        assert!(Task::Classifier.supports_swap());
        assert!(!Task::Generator.supports_swap());
        assert!(!Task::ConflictDetector.supports_swap());
    }

    #[test]
    fn serializes_with_short_task_names() {
        let json = serde_json::to_value(ModelStatus::loading(Task::ConflictDetector, 12)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "task": "conflict", "state": "loading", "progress": 12 })
        );
    }
}
