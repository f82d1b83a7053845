//! `verso search`: case-insensitive substring search across all versions.

use std::io::Write;
use std::path::Path;

use clap::Args;
use verso_core::model::ContentType;

use super::open_engine;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for in content, descriptions, tags and notes.
    pub query: String,

    /// Only search lineages of this content type.
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,
}

/// Execute `verso search <query>`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened.
pub fn run_search(args: &SearchArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let hits = engine.search_versions(&args.query, args.content_type);

    render_mode(
        output,
        &hits,
        |hits, w| {
            for h in hits {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    h.version_id,
                    h.content_id,
                    h.content_type,
                    h.relevance_snippet.replace('\n', " ")
                )?;
            }
            Ok(())
        },
        |hits, w| {
            if hits.is_empty() {
                return writeln!(w, "No versions match '{}'.", args.query);
            }
            pretty_section(w, &format!("{} match(es) for '{}'", hits.len(), args.query))?;
            for h in hits {
                writeln!(w, "{}  {}  {}", h.version_id.short(), h.content_type, h.change_description)?;
                writeln!(w, "    {}", h.relevance_snippet.replace('\n', " "))?;
            }
            Ok(())
        },
    )
}
