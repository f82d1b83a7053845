//! `verso analytics`: generation-setting statistics for one lineage.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use verso_core::analytics::{AnalyticsSummary, Stats};
use verso_core::model::ContentId;

use super::open_engine;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Content id of the lineage.
    pub content_id: String,
}

fn stats_line(s: &Stats) -> String {
    format!("min {:.2}  max {:.2}  avg {:.2}", s.min, s.max, s.avg)
}

fn usage_line(usage: &BTreeMap<String, usize>) -> String {
    usage
        .iter()
        .map(|(k, n)| format!("{k}={n}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_analytics_text(s: &AnalyticsSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "total_versions\t{}", s.total_versions)?;
    writeln!(w, "provider_usage\t{}", usage_line(&s.provider_usage))?;
    writeln!(w, "safety_level_usage\t{}", usage_line(&s.safety_level_usage))?;
    writeln!(w, "temperature\t{}", stats_line(&s.temperature_stats))?;
    writeln!(w, "prompt_length\t{}", stats_line(&s.prompt_length_stats))?;
    let best = &s.most_effective_settings;
    writeln!(
        w,
        "most_effective\t{}\t{}\t{}\t{}",
        best.provider,
        best.temperature,
        best.safety_level,
        if s.scored { "scored" } else { "default" }
    )
}

fn render_analytics_human(s: &AnalyticsSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Generation analytics")?;
    pretty_kv(w, "Versions", s.total_versions.to_string())?;
    pretty_kv(w, "Providers", usage_line(&s.provider_usage))?;
    pretty_kv(w, "Safety", usage_line(&s.safety_level_usage))?;
    pretty_kv(w, "Temperature", stats_line(&s.temperature_stats))?;
    pretty_kv(w, "Prompt len", stats_line(&s.prompt_length_stats))?;
    writeln!(w)?;

    let best = &s.most_effective_settings;
    let source = if s.scored { "highest overall_score" } else { "no scored versions; defaults" };
    pretty_section(w, &format!("Most effective settings ({source})"))?;
    pretty_kv(w, "Provider", &best.provider)?;
    pretty_kv(w, "Temperature", format!("{}", best.temperature))?;
    pretty_kv(w, "Safety", &best.safety_level)
}

/// Execute `verso analytics <content-id>`.
///
/// # Errors
///
/// Returns an error if the content id is unknown.
pub fn run_analytics(
    args: &AnalyticsArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let summary = engine.get_prompt_analytics(&ContentId::from(args.content_id.as_str()))?;
    render_mode(output, &summary, render_analytics_text, render_analytics_human)
}
