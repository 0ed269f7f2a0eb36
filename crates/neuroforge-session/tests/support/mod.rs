//! Scripted in-memory engine driven by tokio's (paused) clock.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use neuroforge_core::{
    NeuroError, Task,
    analysis::{CONFLICTING_LABEL, CONSISTENT_LABEL},
    engine::{AnalysisInput, EngineFuture, GenerationConfig, InferenceEngine, LabelScore, ProgressFn},
};
use neuroforge_session::Session;

pub const LOAD_LATENCY: Duration = Duration::from_millis(100);
pub const ANALYZE_LATENCY: Duration = Duration::from_millis(100);
pub const GENERATE_LATENCY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load { task: Task, model_id: String },
    SetModel { task: Task, model_id: String },
    Analyze { task: Task, model_id: Option<String>, text: String, labels: Vec<String> },
    Generate { prompt: String, config: GenerationConfig },
}

struct Script {
    resident: HashMap<Task, String>,
    failing_models: HashSet<String>,
    load_latency: Duration,
    progress_steps: Vec<f32>,
    analyze_latencies: VecDeque<Duration>,
    sentiment: Vec<LabelScore>,
    sentiment_by_model: HashMap<String, Vec<LabelScore>>,
    conflict: Vec<LabelScore>,
    fail_analysis: bool,
    completion: String,
    generate_latency: Duration,
    fail_generation: bool,
    calls: Vec<Call>,
}

pub struct ScriptedEngine {
    script: Mutex<Script>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                resident: HashMap::new(),
                failing_models: HashSet::new(),
                load_latency: LOAD_LATENCY,
                progress_steps: Vec::new(),
                analyze_latencies: VecDeque::new(),
                sentiment: vec![
                    LabelScore::new("POSITIVE", 0.91),
                    LabelScore::new("NEGATIVE", 0.09),
                ],
                sentiment_by_model: HashMap::new(),
                conflict: vec![
                    LabelScore::new(CONFLICTING_LABEL, 0.72),
                    LabelScore::new(CONSISTENT_LABEL, 0.28),
                ],
                fail_analysis: false,
                completion: " and then it rained.".to_string(),
                generate_latency: GENERATE_LATENCY,
                fail_generation: false,
                calls: Vec::new(),
            }),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn fail_model(&self, model_id: &str) {
        self.script().failing_models.insert(model_id.to_string());
    }

    pub fn preload(&self, task: Task, model_id: &str) {
        self.script().resident.insert(task, model_id.to_string());
    }

    pub fn set_load_latency(&self, latency: Duration) {
        self.script().load_latency = latency;
    }

    /// Progress values emitted during a load, evenly spread over its latency.
    pub fn set_progress_steps(&self, steps: &[f32]) {
        self.script().progress_steps = steps.to_vec();
    }

    /// Latencies of the next analyze calls, in call order.
    pub fn queue_analyze_latencies(&self, latencies: &[Duration]) {
        self.script().analyze_latencies.extend(latencies.iter().copied());
    }

    pub fn set_sentiment(&self, scores: Vec<LabelScore>) {
        self.script().sentiment = scores;
    }

    pub fn set_sentiment_for(&self, model_id: &str, scores: Vec<LabelScore>) {
        self.script()
            .sentiment_by_model
            .insert(model_id.to_string(), scores);
    }

    pub fn set_conflict(&self, scores: Vec<LabelScore>) {
        self.script().conflict = scores;
    }

    pub fn fail_analysis(&self, fail: bool) {
        self.script().fail_analysis = fail;
    }

    pub fn set_completion(&self, completion: &str) {
        self.script().completion = completion.to_string();
    }

    pub fn set_generate_latency(&self, latency: Duration) {
        self.script().generate_latency = latency;
    }

    pub fn fail_generation(&self, fail: bool) {
        self.script().fail_generation = fail;
    }

    pub fn resident(&self, task: Task) -> Option<String> {
        self.script().resident.get(&task).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn analyze_calls(&self, task: Task) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Analyze { task: t, .. } if *t == task))
            .collect()
    }

    pub fn analyzed_texts(&self, task: Task) -> Vec<String> {
        self.analyze_calls(task)
            .into_iter()
            .filter_map(|call| match call {
                Call::Analyze { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn generate_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Generate { .. }))
            .count()
    }

    async fn bring_up(&self, task: Task, model_id: &str, on_progress: ProgressFn) -> neuroforge_core::Result<()> {
        let (latency, steps, fails) = {
            let script = self.script();
            (
                script.load_latency,
                script.progress_steps.clone(),
                script.failing_models.contains(model_id),
            )
        };

        let pause = latency / (steps.len() as u32 + 1);
        for step in steps {
            on_progress(step);
            tokio::time::sleep(pause).await;
        }
        tokio::time::sleep(pause).await;

        if fails {
            return Err(NeuroError::LoadFailed {
                task,
                model_id: model_id.to_string(),
                reason: "scripted failure".into(),
            });
        }

        on_progress(100.0);
        self.script().resident.insert(task, model_id.to_string());
        Ok(())
    }
}

impl InferenceEngine for ScriptedEngine {
    fn is_model_loaded(&self, task: Task) -> bool {
        self.script().resident.contains_key(&task)
    }

    fn load_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.script().calls.push(Call::Load {
                task,
                model_id: model_id.to_string(),
            });
            self.bring_up(task, model_id, on_progress).await
        })
    }

    fn set_model<'a>(
        &'a self,
        task: Task,
        model_id: &'a str,
        on_progress: ProgressFn,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            {
                let mut script = self.script();
                script.calls.push(Call::SetModel {
                    task,
                    model_id: model_id.to_string(),
                });
                script.resident.remove(&task);
            }
            self.bring_up(task, model_id, on_progress).await
        })
    }

    fn generate<'a>(&'a self, prompt: &'a str, config: GenerationConfig) -> EngineFuture<'a, String> {
        Box::pin(async move {
            let latency = {
                let mut script = self.script();
                script.calls.push(Call::Generate {
                    prompt: prompt.to_string(),
                    config,
                });
                script.generate_latency
            };
            tokio::time::sleep(latency).await;

            let script = self.script();
            if !script.resident.contains_key(&Task::Generator) {
                return Err(NeuroError::ModelNotLoaded {
                    task: Task::Generator,
                });
            }
            if script.fail_generation {
                return Err(NeuroError::Backend("scripted generation failure".into()));
            }
            Ok(script.completion.clone())
        })
    }

    fn analyze<'a>(&'a self, task: Task, input: AnalysisInput<'a>) -> EngineFuture<'a, Vec<LabelScore>> {
        Box::pin(async move {
            let (latency, model_id) = {
                let mut script = self.script();
                let model_id = script.resident.get(&task).cloned();
                let labels = match input {
                    AnalysisInput::Text(_) => Vec::new(),
                    AnalysisInput::ZeroShot {
                        candidate_labels, ..
                    } => candidate_labels.iter().map(|label| label.to_string()).collect(),
                };
                script.calls.push(Call::Analyze {
                    task,
                    model_id: model_id.clone(),
                    text: input.text().to_string(),
                    labels,
                });
                let latency = script.analyze_latencies.pop_front().unwrap_or(ANALYZE_LATENCY);
                (latency, model_id)
            };
            tokio::time::sleep(latency).await;

            let Some(model_id) = model_id else {
                return Err(NeuroError::ModelNotLoaded { task });
            };

            let script = self.script();
            if script.fail_analysis {
                return Err(NeuroError::Backend("scripted analysis failure".into()));
            }
            Ok(match task {
                Task::ConflictDetector => script.conflict.clone(),
                _ => script
                    .sentiment_by_model
                    .get(&model_id)
                    .unwrap_or(&script.sentiment)
                    .clone(),
            })
        })
    }
}

pub fn session(engine: ScriptedEngine) -> Session<ScriptedEngine> {
    Session::builder(engine).build().unwrap()
}

/// Let every timer and engine call run to completion on the paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(30)).await;
}

pub async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
