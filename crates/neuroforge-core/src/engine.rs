use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{error::Result, task::Task};

/// Boxed future returned by every [`InferenceEngine`] operation.
///
/// Returning a [`Pin<Box<dyn Future>>`] keeps the trait object-safe without
/// pulling in `async_trait`.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Load progress callback. Receives a percentage in `0.0..=100.0`; engines
/// may report it out of order or repeat values, the caller smooths it out.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// An **engine** owns the resident model pipelines, keyed by [`Task`], and
/// runs inference against them.
///
/// The session holds a single engine instance and only ever addresses a
/// pipeline through its task, never touching another task's slot.
///
/// * `load_model` brings a model up if the task has none resident.
/// * `set_model` discards whatever the task had and loads `model_id`.
/// * `generate` / `analyze` fail with
///   [`crate::NeuroError::ModelNotLoaded`] when the task has no pipeline.
pub trait InferenceEngine: Send + Sync {
    /// Whether `task` currently has a resident pipeline.
    fn is_model_loaded(&self, task: Task) -> bool;

    fn load_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()>;

    fn set_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()>;

    /// Complete `prompt`. The returned string holds only the new text.
    fn generate<'a>(&'a self, prompt: &'a str, config: GenerationConfig)
    -> EngineFuture<'a, String>;

    /// Classify `input` with the pipeline of `task`.
    fn analyze<'a>(&'a self, task: Task, input: AnalysisInput<'a>)
    -> EngineFuture<'a, Vec<LabelScore>>;
}

/// Forwarding impl so a caller can keep a handle on an engine it passed to a
/// session.
impl<E: InferenceEngine + ?Sized> InferenceEngine for Arc<E> {
    fn is_model_loaded(&self, task: Task) -> bool {
        (**self).is_model_loaded(task)
    }

    fn load_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        (**self).load_model(task, model_id, on_progress)
    }

    fn set_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        (**self).set_model(task, model_id, on_progress)
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        config: GenerationConfig,
    ) -> EngineFuture<'a, String> {
        (**self).generate(prompt, config)
    }

    fn analyze<'a>(
        &'a self,
        task: Task,
        input: AnalysisInput<'a>,
    ) -> EngineFuture<'a, Vec<LabelScore>> {
        (**self).analyze(task, input)
    }
}

/// What to classify.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisInput<'a> {
    /// Plain classification against the model's own label set.
    Text(&'a str),
    /// Zero-shot classification against an ad hoc label set.
    ZeroShot {
        text: &'a str,
        candidate_labels: &'a [&'a str],
    },
}

impl<'a> AnalysisInput<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            AnalysisInput::Text(text) => text,
            AnalysisInput::ZeroShot { text, .. } => text,
        }
    }
}

/// One `(label, probability)` pair as reported by a classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Sampling parameters forwarded verbatim to [`InferenceEngine::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}
