use crate::error::ConfigError;
use crate::models::{AnswerLimits, ConversationOptions, RetrievalOptions, Settings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything tunable, as read from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QaConfig {
    pub settings: Settings,
    pub retrieval: RetrievalOptions,
    pub answer: AnswerLimits,
    pub conversation: ConversationOptions,
}

impl QaConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: QaConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let retrieval = &self.retrieval;
        if retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be at least 1".to_string()));
        }
        for (name, weight) in [
            ("retrieval.coverage_weight", retrieval.coverage_weight),
            ("retrieval.density_weight", retrieval.density_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if retrieval.coverage_weight + retrieval.density_weight <= 0.0 {
            return Err(ConfigError::Invalid(
                "retrieval weights cannot both be zero".to_string(),
            ));
        }
        if self.answer.primary_chars == 0 || self.answer.citation_chars == 0 {
            return Err(ConfigError::Invalid(
                "answer.primary_chars and answer.citation_chars must be positive".to_string(),
            ));
        }
        if self.settings.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("settings.base_url is empty".to_string()));
        }
        if self.settings.model.trim().is_empty() {
            return Err(ConfigError::Invalid("settings.model is empty".to_string()));
        }
        if self.conversation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "conversation.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.conversation.temperature) {
            return Err(ConfigError::Invalid(format!(
                "conversation.temperature must be within 0..=2, got {}",
                self.conversation.temperature
            )));
        }
        Ok(())
    }
}
