//! Aggregate statistics over how a lineage's versions were generated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Lineage, Version};

/// Metric consulted when estimating the most effective settings.
pub const OVERALL_SCORE: &str = "overall_score";

/// Min/max/mean of a sample; all zero for an empty sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Stats {
    #[allow(clippy::cast_precision_loss)]
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Self { min, max, avg }
    }
}

/// Provider/temperature/safety triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub provider: String,
    pub temperature: f64,
    pub safety_level: String,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            temperature: 0.7,
            safety_level: "moderate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_versions: usize,
    pub provider_usage: BTreeMap<String, usize>,
    pub temperature_stats: Stats,
    pub safety_level_usage: BTreeMap<String, usize>,
    /// Prompt lengths in characters.
    pub prompt_length_stats: Stats,
    pub most_effective_settings: EffectiveSettings,
    /// True when `most_effective_settings` came from a scored version
    /// rather than the fallback.
    pub scored: bool,
}

/// Aggregate generation settings across every version in `lineage`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn prompt_analytics(lineage: &Lineage, fallback: &EffectiveSettings) -> AnalyticsSummary {
    let mut provider_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut safety_level_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut temperatures = Vec::with_capacity(lineage.versions.len());
    let mut prompt_lengths = Vec::with_capacity(lineage.versions.len());

    for version in lineage.versions.values() {
        let ctx = &version.prompt_context;
        *provider_usage.entry(ctx.ai_provider.clone()).or_default() += 1;
        *safety_level_usage.entry(ctx.safety_level.clone()).or_default() += 1;
        temperatures.push(ctx.temperature);
        prompt_lengths.push(ctx.prompt_len() as f64);
    }

    let best = best_scored(lineage.versions.values());
    AnalyticsSummary {
        total_versions: lineage.versions.len(),
        provider_usage,
        temperature_stats: Stats::of(&temperatures),
        safety_level_usage,
        prompt_length_stats: Stats::of(&prompt_lengths),
        most_effective_settings: best.map_or_else(
            || fallback.clone(),
            |v| EffectiveSettings {
                provider: v.prompt_context.ai_provider.clone(),
                temperature: v.prompt_context.temperature,
                safety_level: v.prompt_context.safety_level.clone(),
            },
        ),
        scored: best.is_some(),
    }
}

/// Highest finite `overall_score`; the earliest version wins ties.
fn best_scored<'a>(versions: impl Iterator<Item = &'a Version>) -> Option<&'a Version> {
    let mut best: Option<(&Version, f64)> = None;
    for version in versions {
        let Some(score) = version.metrics.get(OVERALL_SCORE).copied() else {
            continue;
        };
        if !score.is_finite() {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((version, score));
        }
    }
    best.map(|(v, _)| v)
}
