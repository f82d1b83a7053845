use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{Content, ContentValue};
use std::collections::BTreeMap;

/// How a version's content was produced.
///
/// Captured from the caller's own provider bookkeeping and attached to a
/// version at creation. Never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    /// The natural-language instruction sent to the provider.
    pub prompt_text: String,
    /// Provider name (e.g. `ollama`, `claude`).
    pub ai_provider: String,
    pub model_name: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Named safety/config tier (e.g. `moderate`).
    pub safety_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Character sheet the prompt was conditioned on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_context: Option<Content>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_parameters: BTreeMap<String, ContentValue>,
    pub generation_timestamp: DateTime<Utc>,
}

impl GenerationContext {
    /// Context with the required fields; optional fields empty.
    pub fn new(
        prompt_text: impl Into<String>,
        ai_provider: impl Into<String>,
        model_name: impl Into<String>,
        temperature: f64,
        safety_level: impl Into<String>,
        generation_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            ai_provider: ai_provider.into(),
            model_name: model_name.into(),
            temperature,
            safety_level: safety_level.into(),
            genre: None,
            character_context: None,
            additional_parameters: BTreeMap::new(),
            generation_timestamp,
        }
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_character_context(mut self, character: Content) -> Self {
        self.character_context = Some(character);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<ContentValue>) -> Self {
        self.additional_parameters.insert(key.into(), value.into());
        self
    }

    /// Prompt length in characters.
    #[must_use]
    pub fn prompt_len(&self) -> usize {
        self.prompt_text.chars().count()
    }
}
