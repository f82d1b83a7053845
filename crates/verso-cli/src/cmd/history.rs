//! `verso history`: the versions of one branch, oldest first.

use std::io::Write;
use std::path::Path;

use clap::Args;
use verso_core::model::{ContentId, MAIN_BRANCH};
use verso_core::tree::VersionSummary;

use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_section, render_mode, truncate};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Content id of the lineage.
    pub content_id: String,

    #[arg(short, long, default_value = MAIN_BRANCH)]
    pub branch: String,
}

/// Execute `verso history <content-id> [--branch NAME]`.
///
/// # Errors
///
/// Returns an error if the content id or branch is unknown.
pub fn run_history(args: &HistoryArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let versions =
        engine.get_branch_history(&ContentId::from(args.content_id.as_str()), &args.branch)?;
    let rows: Vec<VersionSummary> = versions.iter().map(VersionSummary::from).collect();

    render_mode(
        output,
        &rows,
        |rows, w| {
            for r in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    r.version_id,
                    r.created_at.to_rfc3339(),
                    r.change_type,
                    r.description
                )?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("Branch {} ({} versions)", args.branch, rows.len()))?;
            for r in rows {
                writeln!(
                    w,
                    "{}  {}  {:<12} {:<8} {}",
                    r.version_id.short(),
                    local_time(r.created_at),
                    r.change_type.as_str(),
                    r.ai_provider,
                    truncate(&r.description, 40)
                )?;
            }
            Ok(())
        },
    )
}
