//! Turns a stream of buffer edits into a bounded stream of analysis calls.
//!
//! * **Trailing debounce** – every accepted edit restarts a
//!   [`DEFAULT_DEBOUNCE`] timer; only the last edit of a burst is analysed.
//! * **One cycle at a time** – if the timer fires while a cycle is still
//!   waiting on the engine, the new cycle is deferred and runs as soon as the
//!   outstanding one resolves, on the latest text at that moment. If that text
//!   still has its own timer pending, the timer runs it instead.
//! * **No regressions** – a result is only published if its version is still
//!   the latest edit and no newer snapshot exists.
use std::{
    sync::{Arc, Mutex, Weak},
    time::Duration,
};

use futures_util::future::join;
use neuroforge_core::{
    InferenceEngine, Result, Task, TaskState,
    analysis::{
        AnalysisSnapshot, CONFLICT_PROBE_LABELS, ConflictResult, SentimentResult, is_analyzable,
        truncate_for_analysis,
    },
    engine::{AnalysisInput, LabelScore},
};
use tokio::runtime::Handle;

use crate::{
    Schedule, SkipReason, debounce::PendingTimer, lifecycle::ModelLifecycle, lock,
    telemetry::EventLog,
};

/// Quiet period after the last edit before the buffer is analysed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
struct Edit {
    text: String,
    version: u64,
}

#[derive(Debug, Default)]
struct AnalysisState {
    latest: Option<Edit>,
    in_flight: bool,
    rerun: bool,
    threshold: f32,
    snapshot: Option<AnalysisSnapshot>,
}

impl AnalysisState {
    fn latest_analyzable(&self) -> Option<Edit> {
        self.latest
            .as_ref()
            .filter(|edit| is_analyzable(&edit.text))
            .cloned()
    }
}

pub struct AnalysisOrchestrator<E> {
    engine: Arc<E>,
    lifecycle: Arc<ModelLifecycle<E>>,
    timer: PendingTimer,
    debounce: Duration,
    conflict_detection: bool,
    state: Mutex<AnalysisState>,
    log: EventLog,
}

impl<E: InferenceEngine + 'static> AnalysisOrchestrator<E> {
    pub fn new(
        engine: Arc<E>,
        lifecycle: Arc<ModelLifecycle<E>>,
        runtime: Handle,
        debounce: Duration,
        conflict_detection: bool,
        threshold: f32,
        log: EventLog,
    ) -> Self {
        Self {
            engine,
            lifecycle,
            timer: PendingTimer::new(runtime),
            debounce,
            conflict_detection,
            state: Mutex::new(AnalysisState {
                threshold,
                ..AnalysisState::default()
            }),
            log,
        }
    }

    /// Record an edit and (re)start the debounce timer if it is worth
    /// analysing.
    ///
    /// `version` must grow with every edit; older or repeated versions are
    /// ignored. Text shorter than five characters, or a classifier that is
    /// neither `Ready` nor `Working`, cancels any pending timer instead.
    pub fn on_text_changed(self: &Arc<Self>, text: &str, version: u64) -> Schedule {
        {
            let mut state = lock(&self.state);
            if let Some(latest) = state.latest.as_ref().map(|edit| edit.version) {
                if version <= latest {
                    tracing::debug!(version, latest, "ignoring out-of-order edit");
                    return Schedule::Skipped(SkipReason::StaleVersion { version, latest });
                }
            }
            state.latest = Some(Edit {
                text: text.to_owned(),
                version,
            });
        }

        if !is_analyzable(text) {
            self.timer.cancel();
            return Schedule::Skipped(SkipReason::TextTooShort);
        }

        match self.lifecycle.state(Task::Classifier) {
            TaskState::Ready | TaskState::Working => {
                self.schedule();
                Schedule::Scheduled
            }
            state => {
                self.timer.cancel();
                Schedule::Skipped(SkipReason::ModelNotReady {
                    task: Task::Classifier,
                    state,
                })
            }
        }
    }

    /// Re-analyse the latest edit after the classifier (re)loaded.
    pub fn on_classifier_ready(self: &Arc<Self>) {
        let has_text = lock(&self.state).latest_analyzable().is_some();
        if has_text && self.lifecycle.state(Task::Classifier) == TaskState::Ready {
            self.schedule();
        }
    }

    /// Drop the pending debounce timer. A cycle already talking to the engine
    /// is not interrupted.
    pub fn cancel_pending(&self) {
        self.timer.cancel();
    }

    pub fn has_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn snapshot(&self) -> Option<AnalysisSnapshot> {
        lock(&self.state).snapshot.clone()
    }

    pub fn set_threshold(&self, threshold: f32) {
        lock(&self.state).threshold = threshold;
    }

    fn schedule(self: &Arc<Self>) {
        let this = Arc::downgrade(self);
        self.timer.schedule(self.debounce, async move {
            if let Some(this) = Weak::upgrade(&this) {
                this.fire().await;
            }
        });
    }

    async fn fire(&self) {
        let mut next = self.claim_cycle();
        while let Some(edit) = next {
            self.run_cycle(edit).await;
            next = self.next_cycle();
        }
    }

    fn claim_cycle(&self) -> Option<Edit> {
        let mut state = lock(&self.state);
        if state.in_flight {
            tracing::debug!("analysis in flight, deferring the next cycle");
            state.rerun = true;
            return None;
        }

        let edit = state.latest_analyzable()?;
        state.in_flight = true;
        Some(edit)
    }

    fn next_cycle(&self) -> Option<Edit> {
        let mut state = lock(&self.state);
        // A pending timer owns the latest edit; it must wait out its quiet
        // period.
        if std::mem::take(&mut state.rerun) && !self.timer.is_pending() {
            if let Some(edit) = state.latest_analyzable() {
                return Some(edit);
            }
        }
        state.in_flight = false;
        None
    }

    async fn run_cycle(&self, edit: Edit) {
        let Some(ticket) = self.lifecycle.begin_work(Task::Classifier) else {
            tracing::debug!(version = edit.version, "classifier unavailable, dropping analysis");
            return;
        };

        let input = truncate_for_analysis(&edit.text);
        let with_conflict = self.conflict_detection
            && self.lifecycle.state(Task::ConflictDetector) == TaskState::Ready;
        let threshold = lock(&self.state).threshold;

        tracing::debug!(version = edit.version, chars = input.chars().count(), with_conflict, "analysing");

        let sentiment = self.engine.analyze(Task::Classifier, AnalysisInput::Text(input));
        let conflict = async {
            if !with_conflict {
                return None;
            }
            let probe = AnalysisInput::ZeroShot {
                text: input,
                candidate_labels: &CONFLICT_PROBE_LABELS,
            };
            Some(self.engine.analyze(Task::ConflictDetector, probe).await)
        };
        let (sentiment, conflict) = join(sentiment, conflict).await;

        let merged = merge(sentiment, conflict, threshold);

        if !self.lifecycle.is_current(&ticket) {
            tracing::debug!(version = edit.version, "classifier swapped mid-analysis, discarding");
            return;
        }

        match merged {
            Ok((sentiment, conflict)) => {
                self.publish(edit.version, sentiment, conflict);
                self.lifecycle.finish_work(ticket, Ok(()));
            }
            Err(err) => {
                tracing::warn!(version = edit.version, error = %err, "analysis failed");
                self.lifecycle.finish_work(ticket, Err(err.to_string()));
                self.log.system("Analysis failed");
            }
        }
    }

    fn publish(&self, version: u64, sentiment: SentimentResult, conflict: Option<ConflictResult>) {
        let mut state = lock(&self.state);

        let superseded = state.latest.as_ref().is_some_and(|edit| edit.version > version);
        let regresses = state
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.produced_at_version > version);

        if superseded || regresses {
            tracing::debug!(version, "analysis superseded by a newer edit, discarding");
            return;
        }

        state.snapshot = Some(AnalysisSnapshot::new(sentiment, conflict, version));
    }
}

fn merge(
    sentiment: Result<Vec<LabelScore>>,
    conflict: Option<Result<Vec<LabelScore>>>,
    threshold: f32,
) -> Result<(SentimentResult, Option<ConflictResult>)> {
    let sentiment = SentimentResult::from_scores(sentiment?)?;
    let conflict = conflict
        .map(|scores| ConflictResult::from_probe(scores?, threshold))
        .transpose()?;
    Ok((sentiment, conflict))
}
