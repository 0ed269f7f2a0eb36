//! Validated classification results and the snapshot the session publishes.
//!
//! Engines hand back a loose list of [`LabelScore`]s. The constructors in this
//! module are the boundary check: anything that is empty, non-finite or
//! outside `[0, 1]` becomes [`NeuroError::MalformedOutput`] instead of
//! reaching the presentation layer.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::LabelScore,
    error::{NeuroError, Result},
    task::Task,
};

/// Shortest buffer, in characters, that is worth classifying.
pub const MIN_ANALYSIS_CHARS: usize = 5;

/// Longer inputs are cut to this many characters before submission.
pub const MAX_ANALYSIS_CHARS: usize = 500;

/// Probe label whose probability is read as the conflict score.
pub const CONFLICTING_LABEL: &str = "conflicting information";
pub const CONSISTENT_LABEL: &str = "consistent information";

/// Zero-shot label set submitted to the conflict detector.
pub const CONFLICT_PROBE_LABELS: [&str; 2] = [CONFLICTING_LABEL, CONSISTENT_LABEL];

pub const CONFLICT_LABEL: &str = "CONFLICT";
pub const CONSISTENT_RESULT_LABEL: &str = "CONSISTENT";

/// First [`MAX_ANALYSIS_CHARS`] characters of `text`, cut on a char boundary.
pub fn truncate_for_analysis(text: &str) -> &str {
    match text.char_indices().nth(MAX_ANALYSIS_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Whether `text` is long enough to schedule an analysis for.
pub fn is_analyzable(text: &str) -> bool {
    text.chars().nth(MIN_ANALYSIS_CHARS - 1).is_some()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
}

impl SentimentResult {
    /// Pick the highest scoring label.
    pub fn from_scores(scores: Vec<LabelScore>) -> Result<Self> {
        validate(Task::Classifier, &scores)?;

        let best = scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| malformed(Task::Classifier, "no labels returned"))?;

        Ok(Self {
            label: best.label,
            score: best.score,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResult {
    pub label: String,
    /// Probability mass on [`CONFLICTING_LABEL`].
    pub score: f32,
}

impl ConflictResult {
    /// Read the conflict probability out of a zero-shot answer and label it
    /// against `threshold`.
    pub fn from_probe(scores: Vec<LabelScore>, threshold: f32) -> Result<Self> {
        validate(Task::ConflictDetector, &scores)?;

        let score = scores
            .iter()
            .find(|entry| entry.label == CONFLICTING_LABEL)
            .map(|entry| entry.score)
            .ok_or_else(|| {
                malformed(
                    Task::ConflictDetector,
                    format!("probe label `{CONFLICTING_LABEL}` missing"),
                )
            })?;

        let label = if score > threshold {
            CONFLICT_LABEL
        } else {
            CONSISTENT_RESULT_LABEL
        };

        Ok(Self {
            label: label.to_string(),
            score,
        })
    }

    pub fn is_conflict(&self) -> bool {
        self.label == CONFLICT_LABEL
    }
}

/// Merged result of one completed analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub sentiment: SentimentResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictResult>,
    /// Buffer version the analysed text belonged to.
    pub produced_at_version: u64,
    pub produced_at: DateTime<Utc>,
}

impl AnalysisSnapshot {
    pub fn new(sentiment: SentimentResult, conflict: Option<ConflictResult>, version: u64) -> Self {
        Self {
            sentiment,
            conflict,
            produced_at_version: version,
            produced_at: Utc::now(),
        }
    }
}

fn validate(task: Task, scores: &[LabelScore]) -> Result<()> {
    if scores.is_empty() {
        return Err(malformed(task, "no labels returned"));
    }

    for entry in scores {
        if entry.label.trim().is_empty() {
            return Err(malformed(task, "empty label"));
        }
        if !entry.score.is_finite() || !(0.0..=1.0).contains(&entry.score) {
            return Err(malformed(
                task,
                format!("score {} for `{}` is outside [0, 1]", entry.score, entry.label),
            ));
        }
    }

    Ok(())
}

fn malformed(task: Task, reason: impl Into<String>) -> NeuroError {
    NeuroError::MalformedOutput {
        task,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_input_to_first_500_chars() {
        let text = "a".repeat(10_000);
        assert_eq!(truncate_for_analysis(&text).len(), MAX_ANALYSIS_CHARS);

        let short = "short text";
        assert_eq!(truncate_for_analysis(short), short);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(600);
        let cut = truncate_for_analysis(&text);
        assert_eq!(cut.chars().count(), MAX_ANALYSIS_CHARS);
    }

    #[test]
    fn length_gate_counts_chars() {
        assert!(!is_analyzable("good"));
        assert!(is_analyzable("good!"));
        assert!(!is_analyzable("éééé"));
    }

    #[test]
    fn sentiment_picks_highest_score() {
        let result = SentimentResult::from_scores(vec![
            LabelScore::new("NEGATIVE", 0.09),
            LabelScore::new("POSITIVE", 0.91),
        ])
        .unwrap();

        assert_eq!(result.label, "POSITIVE");
        assert_eq!(result.score, 0.91);
    }

    #[test]
    fn sentiment_rejects_malformed_scores() {
        assert!(matches!(
            SentimentResult::from_scores(vec![]),
            Err(NeuroError::MalformedOutput { .. })
        ));
        assert!(SentimentResult::from_scores(vec![LabelScore::new("POSITIVE", 1.7)]).is_err());
        assert!(SentimentResult::from_scores(vec![LabelScore::new("POSITIVE", f32::NAN)]).is_err());
        assert!(SentimentResult::from_scores(vec![LabelScore::new(" ", 0.5)]).is_err());
    }

    #[test]
    fn conflict_reads_the_conflicting_probe() {
        let result = ConflictResult::from_probe(
            vec![
                LabelScore::new(CONSISTENT_LABEL, 0.28),
                LabelScore::new(CONFLICTING_LABEL, 0.72),
            ],
            0.5,
        )
        .unwrap();

        assert_eq!(result.label, CONFLICT_LABEL);
        assert_eq!(result.score, 0.72);
        assert!(result.is_conflict());
    }

    #[test]
    fn conflict_below_threshold_is_consistent() {
        let result = ConflictResult::from_probe(
            vec![
                LabelScore::new(CONFLICTING_LABEL, 0.4),
                LabelScore::new(CONSISTENT_LABEL, 0.6),
            ],
            0.5,
        )
        .unwrap();

        assert_eq!(result.label, CONSISTENT_RESULT_LABEL);
    }

    #[test]
    fn conflict_without_probe_label_is_malformed() {
        let err = ConflictResult::from_probe(vec![LabelScore::new("entailment", 0.9)], 0.5)
            .unwrap_err();
        assert!(matches!(
            err,
            NeuroError::MalformedOutput {
                task: Task::ConflictDetector,
                ..
            }
        ));
    }
}
