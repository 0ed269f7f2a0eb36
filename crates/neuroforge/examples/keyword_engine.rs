//! # Bring your own engine
//!
//! Everything in a [`Session`] goes through the [`InferenceEngine`] trait, so
//! any backend works as long as it can load, generate and classify per task.
//! This example plugs in a toy keyword engine that runs fully offline and
//! walks through one editing session.
//!
//! ```bash
//! cargo run -p neuroforge --example keyword_engine --no-default-features
//! ```
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use neuroforge::{
    InferenceEngine, NeuroError, Task,
    analysis::{CONFLICTING_LABEL, CONSISTENT_LABEL},
    engine::{AnalysisInput, EngineFuture, GenerationConfig, LabelScore, ProgressFn},
    session::Session,
};
use tracing_subscriber::EnvFilter;

const POSITIVE: &[&str] = &["good", "great", "bright", "calm"];
const NEGATIVE: &[&str] = &["bad", "awful", "dark", "storm"];

#[derive(Default)]
struct KeywordEngine {
    resident: Mutex<HashMap<Task, String>>,
}

impl KeywordEngine {
    fn count(text: &str, words: &[&str]) -> usize {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| words.contains(&word.to_lowercase().as_str()))
            .count()
    }

    fn ensure(&self, task: Task) -> neuroforge::Result<()> {
        if self.is_model_loaded(task) {
            Ok(())
        } else {
            Err(NeuroError::ModelNotLoaded { task })
        }
    }
}

impl InferenceEngine for KeywordEngine {
    fn is_model_loaded(&self, task: Task) -> bool {
        self.resident.lock().unwrap().contains_key(&task)
    }

    fn load_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            for percent in [25.0, 50.0, 75.0] {
                on_progress(percent);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.resident.lock().unwrap().insert(task, model_id.to_owned());
            Ok(())
        })
    }

    fn set_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        self.resident.lock().unwrap().remove(&task);
        self.load_model(task, model_id, on_progress)
    }

    fn generate<'a>(&'a self, _prompt: &'a str, _config: GenerationConfig) -> EngineFuture<'a, String> {
        Box::pin(async move {
            self.ensure(Task::Generator)?;
            Ok(" Then the sky turned bright again.".to_owned())
        })
    }

    fn analyze<'a>(&'a self, task: Task, input: AnalysisInput<'a>) -> EngineFuture<'a, Vec<LabelScore>> {
        Box::pin(async move {
            self.ensure(task)?;

            let text = input.text();
            let positive = Self::count(text, POSITIVE) as f32;
            let negative = Self::count(text, NEGATIVE) as f32;
            let total = (positive + negative).max(1.0);

            Ok(match input {
                AnalysisInput::Text(_) => vec![
                    LabelScore::new("POSITIVE", positive / total),
                    LabelScore::new("NEGATIVE", negative / total),
                ],
                AnalysisInput::ZeroShot { .. } => {
                    let mixed = if positive > 0.0 && negative > 0.0 { 0.8 } else { 0.1 };
                    vec![
                        LabelScore::new(CONFLICTING_LABEL, mixed),
                        LabelScore::new(CONSISTENT_LABEL, 1.0 - mixed),
                    ]
                }
            })
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session = Session::builder(Arc::new(KeywordEngine::default()))
        .with_debounce(Duration::from_millis(200))
        .build()?;

    session.initialize().await;

    session.edit("A great morning turned into an awful storm.");
    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);

    session.generate().await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    println!("{}", session.text());
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    println!("{}", serde_json::to_string_pretty(&session.logs())?);
    Ok(())
}
