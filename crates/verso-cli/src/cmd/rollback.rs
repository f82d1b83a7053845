//! `verso rollback`: restore an earlier version's content as a new version.

use std::io::Write;
use std::path::Path;

use clap::Args;
use verso_core::model::VersionId;

use super::commit::{VersionReport, render_version_report};
use super::open_engine;
use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Version whose content to restore.
    pub target: String,

    #[arg(short, long, default_value = "")]
    pub description: String,
}

/// Execute `verso rollback`. History is never rewritten: the restored
/// content becomes a new `rollback` version on top of the current one.
///
/// # Errors
///
/// Returns an error when the target is unknown or the journal append fails.
pub fn run_rollback(
    args: &RollbackArgs,
    actor: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(project_root, actor)?;
    let target = VersionId::from(args.target.as_str());
    let version_id = engine.rollback_to_version(&target, &args.description)?;

    let version = engine.get_version(&version_id)?;
    let report = VersionReport::new(engine.get_version_lineage_id(&version_id)?, &version);
    render_version_report(output, &report, |w| {
        writeln!(w, "✓ Rolled back to {}", target.short())
    })
}
