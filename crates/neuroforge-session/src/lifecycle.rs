//! Per-task model lifecycle: loading, swapping and the `Ready ⇄ Working`
//! gate used by the analysis and generation controllers.
//!
//! Every load or swap bumps the task's *epoch*. Progress reports, load
//! completions and [`WorkTicket`]s carry the epoch they were issued under and
//! are ignored once it is stale, so a superseded load or an analysis issued
//! before a swap can never flip the task's state.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures_util::future::join_all;
use neuroforge_core::{
    InferenceEngine, ModelStatus, NeuroError, Result, Task, TaskState, catalog,
    engine::ProgressFn,
};

use crate::{lock, telemetry::EventLog};

#[derive(Debug)]
struct TaskSlot {
    status: ModelStatus,
    model_id: String,
    epoch: u64,
}

/// Proof that a task was moved from `Ready` to `Working`.
///
/// Hand it back to [`ModelLifecycle::finish_work`]; if a swap happened in
/// between, the ticket is stale and the task's state is left alone.
#[derive(Debug)]
#[must_use]
pub struct WorkTicket {
    task: Task,
    epoch: u64,
}

impl WorkTicket {
    pub fn task(&self) -> Task {
        self.task
    }
}

pub struct ModelLifecycle<E> {
    engine: Arc<E>,
    slots: Arc<Mutex<HashMap<Task, TaskSlot>>>,
    allow_swap: bool,
    log: EventLog,
}

impl<E: InferenceEngine> ModelLifecycle<E> {
    /// Track `models`, one `(task, model id)` pair per enabled task. Tasks not
    /// listed stay disabled and report `Idle` forever.
    pub fn new(
        engine: Arc<E>,
        models: impl IntoIterator<Item = (Task, String)>,
        allow_swap: bool,
        log: EventLog,
    ) -> Self {
        let slots = models
            .into_iter()
            .map(|(task, model_id)| {
                let slot = TaskSlot {
                    status: ModelStatus::idle(task),
                    model_id,
                    epoch: 0,
                };
                (task, slot)
            })
            .collect();

        Self {
            engine,
            slots: Arc::new(Mutex::new(slots)),
            allow_swap,
            log,
        }
    }

    pub fn is_enabled(&self, task: Task) -> bool {
        lock(&self.slots).contains_key(&task)
    }

    /// Whether [`Self::swap_model`] would accept `task`.
    pub fn can_swap(&self, task: Task) -> bool {
        self.allow_swap && task.supports_swap() && self.is_enabled(task)
    }

    pub fn status(&self, task: Task) -> ModelStatus {
        lock(&self.slots)
            .get(&task)
            .map(|slot| slot.status.clone())
            .unwrap_or_else(|| ModelStatus::idle(task))
    }

    pub fn state(&self, task: Task) -> TaskState {
        lock(&self.slots)
            .get(&task)
            .map_or(TaskState::Idle, |slot| slot.status.state())
    }

    /// Statuses of all enabled tasks in declaration order.
    pub fn statuses(&self) -> Vec<ModelStatus> {
        let slots = lock(&self.slots);
        Task::ALL
            .iter()
            .filter_map(|task| slots.get(task).map(|slot| slot.status.clone()))
            .collect()
    }

    pub fn active_model(&self, task: Task) -> Option<String> {
        lock(&self.slots).get(&task).map(|slot| slot.model_id.clone())
    }

    /// Load every listed task that is enabled and not yet resident.
    ///
    /// Loads run concurrently; a failing task ends in `Error` without
    /// affecting the others.
    pub async fn initialize(&self, tasks: &[Task]) {
        join_all(tasks.iter().map(|task| self.load(*task))).await;
    }

    async fn load(&self, task: Task) {
        let (model_id, epoch) = {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.get_mut(&task) else {
                return;
            };

            match slot.status.state() {
                TaskState::Loading | TaskState::Working => return,
                _ if self.engine.is_model_loaded(task) => {
                    slot.status = ModelStatus::ready(task);
                    return;
                }
                _ => {}
            }

            slot.epoch += 1;
            slot.status = ModelStatus::loading(task, 0);
            (slot.model_id.clone(), slot.epoch)
        };

        tracing::debug!(%task, %model_id, "loading model");
        let result = self
            .engine
            .load_model(task, &model_id, self.progress_fn(task, epoch))
            .await;

        let status = self.finish_load(task, epoch, &model_id, result);
        if status.is_ready() {
            self.log.system(task.online_message());
        }
    }

    /// Re-bind `task` to `model_id`.
    ///
    /// A no-op when `model_id` is already active and the task is `Ready`.
    /// Otherwise the task reports `Loading` until the engine has discarded the
    /// old pipeline and loaded the new one. Engine failures end in `Error`
    /// and are not returned.
    ///
    /// # Errors
    ///
    /// [`NeuroError::SwapUnsupported`] if the task has a single backing model
    /// or swapping is disabled.
    pub async fn swap_model(&self, task: Task, model_id: &str) -> Result<ModelStatus> {
        if !self.can_swap(task) {
            return Err(NeuroError::SwapUnsupported { task });
        }

        let epoch = {
            let mut slots = lock(&self.slots);
            let slot = slots
                .get_mut(&task)
                .ok_or(NeuroError::SwapUnsupported { task })?;

            if slot.model_id == model_id && slot.status.is_ready() {
                return Ok(slot.status.clone());
            }

            slot.model_id = model_id.to_string();
            slot.epoch += 1;
            slot.status = ModelStatus::loading(task, 0);
            slot.epoch
        };

        self.log
            .system(format!("Switching to {}", catalog::short_name(model_id)));

        let result = self
            .engine
            .set_model(task, model_id, self.progress_fn(task, epoch))
            .await;

        Ok(self.finish_load(task, epoch, model_id, result))
    }

    /// `Ready → Working`. Returns `None` if the task is in any other state.
    pub fn begin_work(&self, task: Task) -> Option<WorkTicket> {
        let mut slots = lock(&self.slots);
        let slot = slots.get_mut(&task)?;

        if !slot.status.is_ready() {
            tracing::debug!(%task, state = %slot.status.state(), "task busy or unavailable");
            return None;
        }

        slot.status = ModelStatus::working(task);
        Some(WorkTicket {
            task,
            epoch: slot.epoch,
        })
    }

    /// Whether no load or swap started since `ticket` was issued.
    pub fn is_current(&self, ticket: &WorkTicket) -> bool {
        lock(&self.slots)
            .get(&ticket.task)
            .is_some_and(|slot| slot.epoch == ticket.epoch)
    }

    /// `Working → Ready` on success, `Working → Error` on failure.
    ///
    /// Returns `false` and changes nothing if the ticket is stale.
    pub fn finish_work(&self, ticket: WorkTicket, outcome: std::result::Result<(), String>) -> bool {
        let mut slots = lock(&self.slots);
        let Some(slot) = slots.get_mut(&ticket.task) else {
            return false;
        };

        if slot.epoch != ticket.epoch || slot.status.state() != TaskState::Working {
            return false;
        }

        slot.status = match outcome {
            Ok(()) => ModelStatus::ready(ticket.task),
            Err(message) => ModelStatus::error(ticket.task, message),
        };
        true
    }

    fn finish_load(&self, task: Task, epoch: u64, model_id: &str, result: Result<()>) -> ModelStatus {
        let status = {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.get_mut(&task) else {
                return ModelStatus::idle(task);
            };

            if slot.epoch != epoch {
                tracing::debug!(%task, %model_id, "load superseded by a newer one");
                return slot.status.clone();
            }

            slot.status = match &result {
                Ok(()) => ModelStatus::ready(task),
                Err(err) => ModelStatus::error(task, err.to_string()),
            };
            slot.status.clone()
        };

        if let Err(err) = result {
            tracing::warn!(%task, %model_id, error = %err, "model failed to load");
            self.log
                .system(format!("Failed to load {}", catalog::short_name(model_id)));
        }
        status
    }

    fn progress_fn(&self, task: Task, epoch: u64) -> ProgressFn {
        let slots = Arc::clone(&self.slots);
        Arc::new(move |percent: f32| {
            if !percent.is_finite() {
                return;
            }
            let percent = percent.clamp(0.0, 100.0).round() as u8;

            let mut table = lock(&slots);
            if let Some(slot) = table.get_mut(&task) {
                if slot.epoch == epoch {
                    slot.status.advance_progress(percent);
                }
            }
        })
    }
}
