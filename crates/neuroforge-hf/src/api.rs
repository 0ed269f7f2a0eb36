//! Request and response payloads of the Inference API pipelines used by the
//! workspace.
//!
//! The hosted API is loose about response shapes (a classifier may answer
//! with a nested or a flat list, zero-shot with columns or rows), so every
//! response type is an untagged enum normalised by `into_*`.
use std::time::Duration;

use neuroforge_core::engine::{GenerationConfig, LabelScore};
use serde::{Deserialize, Serialize};

use crate::error::HfError;

/// `top_k` sent with every generation request.
pub const GENERATION_TOP_K: u32 = 40;

#[derive(Debug, Serialize, Clone)]
pub struct ClassificationRequest<'a> {
    pub inputs: &'a str,
}

#[derive(Debug, Serialize, Clone)]
pub struct ZeroShotRequest<'a> {
    pub inputs: &'a str,
    pub parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ZeroShotParameters<'a> {
    pub candidate_labels: &'a [&'a str],
}

impl<'a> ZeroShotRequest<'a> {
    pub fn new(inputs: &'a str, candidate_labels: &'a [&'a str]) -> Self {
        Self {
            inputs,
            parameters: ZeroShotParameters { candidate_labels },
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct GenerationRequest<'a> {
    pub inputs: &'a str,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Serialize, Clone, Copy)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub do_sample: bool,
    pub top_k: u32,
    pub return_full_text: bool,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(inputs: &'a str, config: GenerationConfig) -> Self {
        Self {
            inputs,
            parameters: GenerationParameters {
                max_new_tokens: config.max_tokens,
                temperature: config.temperature,
                do_sample: true,
                top_k: GENERATION_TOP_K,
                return_full_text: false,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    /// Scores for the single input that was sent.
    pub fn into_scores(self) -> Result<Vec<LabelScore>, HfError> {
        let scores = match self {
            ClassificationResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            ClassificationResponse::Flat(scores) => scores,
        };
        if scores.is_empty() {
            return Err(HfError::Format("classification response has no labels".into()));
        }
        Ok(scores)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ZeroShotResponse {
    Columns {
        labels: Vec<String>,
        scores: Vec<f32>,
    },
    Rows(Vec<LabelScore>),
}

impl ZeroShotResponse {
    pub fn into_scores(self) -> Result<Vec<LabelScore>, HfError> {
        match self {
            ZeroShotResponse::Columns { labels, scores } => {
                if labels.len() != scores.len() {
                    return Err(HfError::Format(format!(
                        "zero-shot response has {} labels but {} scores",
                        labels.len(),
                        scores.len()
                    )));
                }
                Ok(labels
                    .into_iter()
                    .zip(scores)
                    .map(|(label, score)| LabelScore::new(label, score))
                    .collect())
            }
            ZeroShotResponse::Rows(rows) => Ok(rows),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratedText {
    pub generated_text: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum GenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl GenerationResponse {
    /// The completion for `prompt`, without the prompt itself.
    ///
    /// `return_full_text: false` is not honoured by every deployment, so an
    /// echoed prompt prefix is stripped here.
    pub fn into_completion(self, prompt: &str) -> Result<String, HfError> {
        let generated = match self {
            GenerationResponse::Batch(batch) => batch.into_iter().next(),
            GenerationResponse::Single(single) => Some(single),
        }
        .ok_or_else(|| HfError::Format("generation response is empty".into()))?
        .generated_text;

        Ok(match generated.strip_prefix(prompt) {
            Some(rest) if !prompt.is_empty() => rest.to_string(),
            _ => generated,
        })
    }
}

/// Body of an HTTP 503 answer while a model is being loaded.
#[derive(Debug, Deserialize, Clone)]
pub struct LoadingStatus {
    #[serde(default)]
    pub estimated_time: Option<f32>,
}

/// Load progress in percent after waiting `elapsed` for a model the API
/// estimated at `estimated_secs`. Capped at 99 until the model answers.
pub fn loading_progress(elapsed: Duration, estimated_secs: f32) -> f32 {
    if !estimated_secs.is_finite() || estimated_secs <= 0.0 {
        return 0.0;
    }
    (elapsed.as_secs_f32() / estimated_secs * 100.0).clamp(0.0, 99.0)
}
