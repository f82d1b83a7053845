//! `verso tree`: the lineage as an indented version tree.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use verso_core::model::{ContentId, VersionId};
use verso_core::tree::LineageView;

use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, truncate};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Content id of the lineage.
    pub content_id: String,
}

fn render_tree_text(view: &LineageView, w: &mut dyn Write) -> io::Result<()> {
    for (depth, node) in view.lineage_tree.walk() {
        writeln!(
            w,
            "{depth}\t{}\t{}\t{}\t{}",
            node.id,
            node.parent.as_ref().map_or("-", VersionId::as_str),
            node.change_type,
            node.branch
        )?;
    }
    Ok(())
}

fn render_tree_human(view: &LineageView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Lineage {} ({})", view.content_id, view.content_type))?;
    pretty_kv(w, "Versions", view.total_versions.to_string())?;
    pretty_kv(w, "Branches", view.branches.join(", "))?;
    pretty_kv(w, "Current", view.current_version.as_str())?;
    pretty_kv(w, "Updated", local_time(view.updated_at))?;
    writeln!(w)?;

    for (depth, node) in view.lineage_tree.walk() {
        let mark = if node.id == view.current_version { '*' } else { 'o' };
        writeln!(
            w,
            "{:indent$}{mark} {}  [{}] {:<12} {}",
            "",
            node.id.short(),
            node.branch,
            node.change_type.as_str(),
            truncate(&node.description, 48),
            indent = depth * 2
        )?;
    }
    Ok(())
}

/// Execute `verso tree <content-id>`.
///
/// # Errors
///
/// Returns an error if the content id is unknown.
pub fn run_tree(args: &TreeArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let view = engine.get_version_lineage(&ContentId::from(args.content_id.as_str()))?;
    render_mode(output, &view, render_tree_text, render_tree_human)
}
