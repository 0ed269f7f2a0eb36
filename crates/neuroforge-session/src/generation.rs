use std::sync::Arc;

use neuroforge_core::{InferenceEngine, Task, engine::GenerationConfig};

use crate::{SkipReason, lifecycle::ModelLifecycle, telemetry::EventLog};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// The engine answered; holds the completion text (new text only).
    Completed(String),
    /// Guard rejection: nothing was sent to the engine.
    Skipped(SkipReason),
    /// The engine failed; the generator is now in `Error`.
    Failed(String),
}

/// On-demand completion, gated by the generator's `Ready` state.
///
/// The gate is a guard, not a queue: a request arriving while the generator
/// is `Working` is dropped.
pub struct GenerationTrigger<E> {
    engine: Arc<E>,
    lifecycle: Arc<ModelLifecycle<E>>,
    log: EventLog,
}

impl<E: InferenceEngine> GenerationTrigger<E> {
    pub fn new(engine: Arc<E>, lifecycle: Arc<ModelLifecycle<E>>, log: EventLog) -> Self {
        Self {
            engine,
            lifecycle,
            log,
        }
    }

    pub async fn generate(&self, prompt: &str, config: GenerationConfig) -> GenerateOutcome {
        if prompt.trim().is_empty() {
            tracing::debug!("empty prompt, skipping generation");
            return GenerateOutcome::Skipped(SkipReason::EmptyPrompt);
        }

        let Some(ticket) = self.lifecycle.begin_work(Task::Generator) else {
            let state = self.lifecycle.state(Task::Generator);
            tracing::debug!(%state, "generator not ready, dropping request");
            return GenerateOutcome::Skipped(SkipReason::ModelNotReady {
                task: Task::Generator,
                state,
            });
        };

        self.log
            .ai(format!("Synthesizing (Temp: {})...", config.temperature));

        match self.engine.generate(prompt, config).await {
            Ok(completion) => {
                self.lifecycle.finish_work(ticket, Ok(()));
                self.log.ai("Sequence completed");
                GenerateOutcome::Completed(completion)
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation failed");
                let message = err.to_string();
                self.lifecycle.finish_work(ticket, Err(message.clone()));
                self.log.system("Generation failed");
                GenerateOutcome::Failed(message)
            }
        }
    }
}
