//! Known model identifiers per task.
//!
//! Identifiers are hub-style `"owner/name"` strings and stay opaque to the
//! core; engines decide what they mean. The first entry of each list is the
//! task's default.
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

pub const GENERATOR_MODELS: &[ModelInfo] = &[ModelInfo {
    id: "distilbert/distilgpt2",
    name: "DistilGPT-2",
}];

/// Offered by the settings panel's classifier selector.
pub const CLASSIFIER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "distilbert/distilbert-base-uncased-finetuned-sst-2-english",
        name: "Sentiment (SST-2)",
    },
    ModelInfo {
        id: "unitary/toxic-bert",
        name: "Toxicity (Toxic-BERT)",
    },
    ModelInfo {
        id: "cardiffnlp/twitter-roberta-base-sentiment-latest",
        name: "Sentiment (Twitter RoBERTa)",
    },
];

pub const CONFLICT_MODELS: &[ModelInfo] = &[ModelInfo {
    id: "typeform/mobilebert-uncased-mnli",
    name: "Zero-Shot (MobileBERT MNLI)",
}];

pub fn models(task: Task) -> &'static [ModelInfo] {
    match task {
        Task::Generator => GENERATOR_MODELS,
        Task::Classifier => CLASSIFIER_MODELS,
        Task::ConflictDetector => CONFLICT_MODELS,
    }
}

pub fn default_model(task: Task) -> &'static str {
    models(task)[0].id
}

/// Last path segment of a model id, used in log lines.
///
/// ```rust
/// use neuroforge_core::catalog::short_name;
/// assert_eq!(short_name("unitary/toxic-bert"), "toxic-bert");
/// assert_eq!(short_name("local-model"), "local-model");
/// ```
pub fn short_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}
