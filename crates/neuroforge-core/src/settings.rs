//! User-facing settings produced by the settings panel.
//!
//! ```rust
//! use neuroforge_core::settings::AppSettings;
//!
//! let settings = AppSettings::from_json(r#"{ "generation": { "temperature": 1.2 } }"#).unwrap();
//! assert_eq!(settings.generation.temperature, 1.2);
//! assert_eq!(settings.generation.max_tokens, 50);
//! ```
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{
    catalog,
    engine::GenerationConfig,
    error::{NeuroError, Result},
    task::Task,
};

pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.1..=1.5;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 10..=200;
pub const THRESHOLD_RANGE: RangeInclusive<f32> = 0.0..=1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub generation: GenerationSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 50,
        }
    }
}

impl From<GenerationSettings> for GenerationConfig {
    fn from(value: GenerationSettings) -> Self {
        GenerationConfig {
            temperature: value.temperature,
            max_tokens: value.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Classifier model; opaque to the core.
    pub model_id: String,
    /// Conflict scores above this are labelled as a conflict.
    pub threshold: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model_id: catalog::default_model(Task::Classifier).to_string(),
            threshold: 0.5,
        }
    }
}

impl AppSettings {
    /// Parse settings from JSON, filling missing fields with defaults, and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: AppSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// [`NeuroError::InvalidSettings`] if a value lies outside the range the
    /// settings panel allows.
    pub fn validate(&self) -> Result<()> {
        let GenerationSettings {
            temperature,
            max_tokens,
        } = self.generation;

        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(NeuroError::InvalidSettings(format!(
                "temperature {temperature} outside {TEMPERATURE_RANGE:?}"
            )));
        }
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(NeuroError::InvalidSettings(format!(
                "max_tokens {max_tokens} outside {MAX_TOKENS_RANGE:?}"
            )));
        }
        if !THRESHOLD_RANGE.contains(&self.analysis.threshold) {
            return Err(NeuroError::InvalidSettings(format!(
                "threshold {} outside {THRESHOLD_RANGE:?}",
                self.analysis.threshold
            )));
        }
        if self.analysis.model_id.trim().is_empty() {
            return Err(NeuroError::InvalidSettings(
                "classifier model id is empty".into(),
            ));
        }

        Ok(())
    }

    pub fn generation_config(&self) -> GenerationConfig {
        self.generation.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_settings_panel() {
        let settings = AppSettings::default();
        assert_eq!(settings.generation.temperature, 0.8);
        assert_eq!(settings.generation.max_tokens, 50);
        assert_eq!(settings.analysis.threshold, 0.5);
        assert_eq!(
            settings.analysis.model_id,
            catalog::default_model(Task::Classifier)
        );
        settings.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut settings = AppSettings::default();
        settings.generation.temperature = 2.0;
        assert!(matches!(
            settings.validate(),
            Err(NeuroError::InvalidSettings(_))
        ));

        let mut settings = AppSettings::default();
        settings.generation.max_tokens = 5;
        assert!(settings.validate().is_err());

        let mut settings = AppSettings::default();
        settings.analysis.model_id = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings =
            AppSettings::from_json(r#"{ "analysis": { "model_id": "unitary/toxic-bert" } }"#)
                .unwrap();
        assert_eq!(settings.analysis.model_id, "unitary/toxic-bert");
        assert_eq!(settings.analysis.threshold, 0.5);
        assert_eq!(settings.generation, GenerationSettings::default());
    }

    #[test]
    fn invalid_json_values_are_rejected() {
        assert!(AppSettings::from_json(r#"{ "generation": { "max_tokens": 500 } }"#).is_err());
        assert!(matches!(
            AppSettings::from_json("not json"),
            Err(NeuroError::Serialization(_))
        ));
    }
}
