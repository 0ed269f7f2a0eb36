//! The editing session: owns the text buffer and wires the controllers to a
//! single injected engine.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use neuroforge_core::{
    InferenceEngine, ModelStatus, NeuroError, Result, Task, analysis::AnalysisSnapshot, catalog,
    log::LogEntry, settings::AppSettings,
};
use tokio::runtime::Handle;

use crate::{
    Schedule,
    analysis::{AnalysisOrchestrator, DEFAULT_DEBOUNCE},
    generation::{GenerateOutcome, GenerationTrigger},
    lifecycle::ModelLifecycle,
    lock,
    telemetry::EventLog,
};

#[derive(Debug, Default)]
struct TextBuffer {
    text: String,
    version: u64,
}

impl TextBuffer {
    fn replace(&mut self, text: String) -> (String, u64) {
        self.text = text;
        self.version += 1;
        (self.text.clone(), self.version)
    }

    fn append(&mut self, completion: &str) -> (String, u64) {
        self.text.push_str(completion);
        self.version += 1;
        (self.text.clone(), self.version)
    }
}

/// One editing session.
///
/// Presentation code forwards intents (`edit`, `generate`, `apply_settings`)
/// and renders `statuses`, `snapshot`, `logs` and `text`.
///
/// ```rust,ignore
/// let session = Session::builder(engine).build()?;
/// session.initialize().await;
/// session.edit("this is good but also bad");
/// let outcome = session.generate().await;
/// ```
pub struct Session<E> {
    engine: Arc<E>,
    lifecycle: Arc<ModelLifecycle<E>>,
    analysis: Arc<AnalysisOrchestrator<E>>,
    generation: GenerationTrigger<E>,
    buffer: Mutex<TextBuffer>,
    settings: Mutex<AppSettings>,
    tasks: Vec<Task>,
    log: EventLog,
}

impl<E: InferenceEngine + 'static> Session<E> {
    pub fn builder(engine: E) -> SessionBuilder<E> {
        SessionBuilder::new(engine)
    }

    /// Access the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycle<E>> {
        &self.lifecycle
    }

    pub fn analysis(&self) -> &Arc<AnalysisOrchestrator<E>> {
        &self.analysis
    }

    /// Load every enabled task that is not resident yet.
    pub async fn initialize(&self) {
        self.lifecycle.initialize(&self.tasks).await;
        self.analysis.on_classifier_ready();
    }

    /// Replace the buffer with `text` (one user edit).
    ///
    /// Does not block and may be called from any thread; the analysis runs on
    /// the session's runtime.
    pub fn edit(&self, text: impl Into<String>) -> Schedule {
        let (text, version) = lock(&self.buffer).replace(text.into());
        self.analysis.on_text_changed(&text, version)
    }

    pub fn text(&self) -> String {
        lock(&self.buffer).text.clone()
    }

    /// Version of the current buffer content; grows with every edit.
    pub fn version(&self) -> u64 {
        lock(&self.buffer).version
    }

    /// Complete the buffer with the generator and append the result.
    ///
    /// The buffer is only touched on success; the append counts as a new
    /// edit and is analysed like any other.
    pub async fn generate(&self) -> GenerateOutcome {
        let prompt = self.text();
        let config = lock(&self.settings).generation_config();

        let outcome = self.generation.generate(&prompt, config).await;
        if let GenerateOutcome::Completed(completion) = &outcome {
            let (text, version) = lock(&self.buffer).append(completion);
            self.analysis.on_text_changed(&text, version);
        }
        outcome
    }

    /// Re-bind `task` to `model_id`, see [`ModelLifecycle::swap_model`].
    ///
    /// Any pending analysis is cancelled first; once the classifier is ready
    /// again the current buffer is re-analysed.
    pub async fn swap_model(&self, task: Task, model_id: &str) -> Result<ModelStatus> {
        if !self.lifecycle.can_swap(task) {
            return Err(NeuroError::SwapUnsupported { task });
        }

        if task == Task::Classifier {
            self.analysis.cancel_pending();
            lock(&self.settings).analysis.model_id = model_id.to_string();
        }

        let status = self.lifecycle.swap_model(task, model_id).await?;
        if task == Task::Classifier && status.is_ready() {
            self.analysis.on_classifier_ready();
        }
        Ok(status)
    }

    /// Take over settings from the settings panel. A changed classifier model
    /// triggers a swap.
    ///
    /// # Errors
    ///
    /// * [`NeuroError::InvalidSettings`] – a value is out of range.
    /// * [`NeuroError::SwapUnsupported`] – the classifier model changed but
    ///   swapping is disabled for this session.
    pub async fn apply_settings(&self, settings: AppSettings) -> Result<()> {
        settings.validate()?;

        let previous = lock(&self.settings).clone();
        let model_changed = previous.analysis.model_id != settings.analysis.model_id;
        if model_changed && !self.lifecycle.can_swap(Task::Classifier) {
            return Err(NeuroError::SwapUnsupported {
                task: Task::Classifier,
            });
        }

        if previous.generation != settings.generation {
            self.log.user(format!(
                "Generator set to temp {}, {} tokens",
                settings.generation.temperature, settings.generation.max_tokens
            ));
        }

        self.analysis.set_threshold(settings.analysis.threshold);
        let model_id = settings.analysis.model_id.clone();
        *lock(&self.settings) = settings;

        if model_changed {
            self.swap_model(Task::Classifier, &model_id).await?;
        }
        Ok(())
    }

    pub fn settings(&self) -> AppSettings {
        lock(&self.settings).clone()
    }

    pub fn status(&self, task: Task) -> ModelStatus {
        self.lifecycle.status(task)
    }

    pub fn statuses(&self) -> Vec<ModelStatus> {
        self.lifecycle.statuses()
    }

    /// Latest published analysis, if any.
    pub fn snapshot(&self) -> Option<AnalysisSnapshot> {
        self.analysis.snapshot()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.entries()
    }
}

/// Builder for [`Session`].
///
/// Conflict detection and classifier swapping are on by default; turn them
/// off to get the simpler two-task workspace.
pub struct SessionBuilder<E> {
    engine: E,
    runtime: Option<Handle>,
    settings: AppSettings,
    debounce: Duration,
    conflict_detection: bool,
    model_swap: bool,
    generator_model: String,
    conflict_model: String,
}

impl<E: InferenceEngine + 'static> SessionBuilder<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            runtime: None,
            settings: AppSettings::default(),
            debounce: DEFAULT_DEBOUNCE,
            conflict_detection: true,
            model_swap: true,
            generator_model: catalog::default_model(Task::Generator).to_string(),
            conflict_model: catalog::default_model(Task::ConflictDetector).to_string(),
        }
    }

    /// Initial settings; the classifier starts on `settings.analysis.model_id`.
    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runtime for debounce timers and analysis cycles. Defaults to the
    /// runtime `build` is called on.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_conflict_detection(mut self, enabled: bool) -> Self {
        self.conflict_detection = enabled;
        self
    }

    pub fn with_model_swap(mut self, enabled: bool) -> Self {
        self.model_swap = enabled;
        self
    }

    /// Override the model a task starts with.
    pub fn with_model(mut self, task: Task, model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        match task {
            Task::Generator => self.generator_model = model_id,
            Task::Classifier => self.settings.analysis.model_id = model_id,
            Task::ConflictDetector => self.conflict_model = model_id,
        }
        self
    }

    /// # Errors
    ///
    /// * [`NeuroError::InvalidSettings`] – the initial settings are out of range.
    /// * [`NeuroError::NoRuntime`] – called outside a tokio runtime and no
    ///   runtime was given via [`Self::with_runtime`].
    pub fn build(self) -> Result<Session<E>> {
        self.settings.validate()?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| NeuroError::NoRuntime)?,
        };

        let engine = Arc::new(self.engine);
        let log = EventLog::new();

        let mut models = vec![
            (Task::Generator, self.generator_model),
            (Task::Classifier, self.settings.analysis.model_id.clone()),
        ];
        if self.conflict_detection {
            models.push((Task::ConflictDetector, self.conflict_model));
        }
        let tasks: Vec<Task> = models.iter().map(|(task, _)| *task).collect();

        let lifecycle = Arc::new(ModelLifecycle::new(
            Arc::clone(&engine),
            models,
            self.model_swap,
            log.clone(),
        ));
        let analysis = Arc::new(AnalysisOrchestrator::new(
            Arc::clone(&engine),
            Arc::clone(&lifecycle),
            runtime,
            self.debounce,
            self.conflict_detection,
            self.settings.analysis.threshold,
            log.clone(),
        ));
        let generation =
            GenerationTrigger::new(Arc::clone(&engine), Arc::clone(&lifecycle), log.clone());

        Ok(Session {
            engine,
            lifecycle,
            analysis,
            generation,
            buffer: Mutex::new(TextBuffer::default()),
            settings: Mutex::new(self.settings),
            tasks,
            log,
        })
    }
}
