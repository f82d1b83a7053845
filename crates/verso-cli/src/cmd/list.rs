//! `verso list`: every lineage in the project, oldest first.

use std::io::Write;
use std::path::Path;

use clap::Args;
use verso_core::model::ContentType;

use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list lineages of this content type.
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,
}

/// Execute `verso list`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let lineages = engine.list_lineages(args.content_type);

    render_mode(
        output,
        &lineages,
        |rows, w| {
            for l in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    l.content_id,
                    l.content_type,
                    l.total_versions,
                    l.current_version,
                    l.branches.join(",")
                )?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No lineages yet. Start one with `verso create`.");
            }
            pretty_section(w, &format!("{} lineage(s)", rows.len()))?;
            for l in rows {
                writeln!(
                    w,
                    "{}  {:<20} {:>3} versions  current {}  updated {}",
                    l.content_id.short(),
                    l.content_type.as_str(),
                    l.total_versions,
                    l.current_version.short(),
                    local_time(l.updated_at)
                )?;
            }
            Ok(())
        },
    )
}
