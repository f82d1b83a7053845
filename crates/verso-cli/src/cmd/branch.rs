//! `verso branch`: fork a named branch from an existing version.

use std::io::Write;
use std::path::Path;

use clap::Args;
use verso_core::model::VersionId;

use super::commit::{VersionReport, render_version_report};
use super::open_engine;
use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct BranchArgs {
    /// Version to fork from.
    pub base: String,

    /// Branch name. Re-using a name replaces that branch's version list.
    pub name: String,

    #[arg(short, long, default_value = "")]
    pub description: String,
}

/// Execute `verso branch`.
///
/// # Errors
///
/// Returns an error when the base version is unknown or the journal append
/// fails.
pub fn run_branch(
    args: &BranchArgs,
    actor: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(project_root, actor)?;
    let base = VersionId::from(args.base.as_str());
    let version_id = engine.create_branch(&base, &args.name, &args.description)?;

    let version = engine.get_version(&version_id)?;
    let report = VersionReport::new(engine.get_version_lineage_id(&version_id)?, &version);
    render_version_report(output, &report, |w| {
        writeln!(w, "✓ Branched '{}' from {}", args.name, base.short())
    })
}
