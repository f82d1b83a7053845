//! `verso create`: start a new lineage from its first version.

use std::io::Write;
use std::path::Path;

use clap::Args;
use tracing::info;
use verso_core::model::ContentType;

use super::draft::DraftArgs;
use super::open_engine;
use super::commit::{VersionReport, render_version_report};
use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Content type: `character_analysis`, `story_content`, `beat_sheet`,
    /// `power_system`, `style_analysis` or `trope_analysis`.
    pub content_type: ContentType,

    #[command(flatten)]
    pub draft: DraftArgs,
}

/// Execute `verso create`.
///
/// # Errors
///
/// Returns an error for malformed input or when the journal append fails.
pub fn run_create(
    args: &CreateArgs,
    actor: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(project_root, actor)?;
    let draft = args.draft.to_draft(engine.config())?;
    let (content_id, version_id) = engine.create_initial_version(args.content_type, draft)?;
    info!(%content_id, %version_id, "lineage created");

    let version = engine.get_version(&version_id)?;
    let report = VersionReport::new(content_id, &version);
    render_version_report(output, &report, |w| writeln!(w, "✓ Created lineage {}", report.content_id))
}
