//! Flags shared by `create` and `commit`: the content payload, its
//! generation context and the optional version metadata.

use chrono::Utc;
use clap::Args;
use verso_core::config::EngineConfig;
use verso_core::model::{Content, ContentValue, GenerationContext, VersionDraft};

use super::read_arg_file;
use crate::output::CliError;

#[derive(Args, Debug, Clone)]
pub struct DraftArgs {
    /// Content payload as a JSON object, or `@path` to read it from a file.
    #[arg(long)]
    pub content: String,

    /// Prompt text sent to the provider.
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Provider name. Defaults to `[analytics] provider`.
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name.
    #[arg(long, default_value = "default")]
    pub model: String,

    /// Sampling temperature. Defaults to `[analytics] temperature`.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Safety tier. Defaults to `[analytics] safety_level`.
    #[arg(long)]
    pub safety: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    /// Character sheet (JSON object or `@path`) the prompt was conditioned on.
    #[arg(long)]
    pub character: Option<String>,

    /// Extra provider parameter, `key=value`. Values that parse as JSON keep
    /// their type; anything else is stored as text. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Human description of the change.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Tag to attach. Repeatable.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Numeric metric, `name=value` (e.g. `overall_score=8.5`). Repeatable.
    #[arg(long = "metric", value_name = "NAME=VALUE")]
    pub metrics: Vec<String>,
}

fn invalid(message: String, suggestion: &str) -> anyhow::Error {
    CliError::with_details(message, suggestion, "invalid_input").into()
}

/// Parse a JSON object given inline or as `@path`.
pub fn parse_content(raw: &str, flag: &str) -> anyhow::Result<Content> {
    let text = match raw.strip_prefix('@') {
        Some(path) => read_arg_file(path)?,
        None => raw.to_string(),
    };
    serde_json::from_str::<Content>(&text).map_err(|err| {
        invalid(
            format!("{flag} is not a JSON object: {err}"),
            "pass an object such as '{\"text\": \"...\"}' or @file.json",
        )
    })
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> anyhow::Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .map(|(k, v)| (k.trim(), v))
        .ok_or_else(|| invalid(format!("{flag} '{raw}' must be key=value"), "e.g. max_tokens=512"))
}

fn parse_param_value(raw: &str) -> ContentValue {
    serde_json::from_str::<ContentValue>(raw).unwrap_or_else(|_| ContentValue::from(raw))
}

impl DraftArgs {
    /// Build the version draft, filling unspecified context settings from
    /// the project's `[analytics]` defaults.
    pub fn to_draft(&self, config: &EngineConfig) -> anyhow::Result<VersionDraft> {
        let content = parse_content(&self.content, "--content")?;
        let defaults = &config.analytics;
        if let Some(t) = self.temperature.filter(|t| !t.is_finite()) {
            return Err(invalid(format!("--temperature must be finite, got {t}"), "e.g. --temperature 0.7"));
        }

        let mut context = GenerationContext::new(
            self.prompt.clone(),
            self.provider.clone().unwrap_or_else(|| defaults.provider.clone()),
            self.model.clone(),
            self.temperature.unwrap_or(defaults.temperature),
            self.safety.clone().unwrap_or_else(|| defaults.safety_level.clone()),
            Utc::now(),
        );
        if let Some(genre) = &self.genre {
            context = context.with_genre(genre.clone());
        }
        if let Some(character) = &self.character {
            context = context.with_character_context(parse_content(character, "--character")?);
        }
        for raw in &self.params {
            let (key, value) = split_pair(raw, "--param")?;
            context = context.with_parameter(key, parse_param_value(value));
        }

        let mut draft = VersionDraft::new(content, context)
            .description(self.description.clone())
            .notes(self.notes.clone());
        for tag in &self.tags {
            draft = draft.tag(tag.clone());
        }
        for raw in &self.metrics {
            let (name, value) = split_pair(raw, "--metric")?;
            let value: f64 = value.trim().parse().map_err(|_| {
                invalid(format!("--metric {name} value '{value}' is not a number"), "e.g. overall_score=8.5")
            })?;
            if !value.is_finite() {
                return Err(invalid(format!("--metric {name} must be finite"), "e.g. overall_score=8.5"));
            }
            draft = draft.metric(name, value);
        }
        Ok(draft)
    }
}
