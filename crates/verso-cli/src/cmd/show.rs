//! `verso show`: display one version in full.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use verso_core::model::{ContentId, Version, VersionId};

use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Version id.
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ShowVersion {
    pub content_id: ContentId,
    #[serde(flatten)]
    pub version: Version,
}

fn render_show_text(item: &ShowVersion, w: &mut dyn Write) -> std::io::Result<()> {
    let v = &item.version;
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        v.version_id,
        item.content_id,
        v.content_type,
        v.change_type,
        v.branch,
        v.change_description
    )?;
    for (field, value) in &v.content_data {
        writeln!(w, "{field}\t{}", value.to_string().replace('\n', "\\n"))?;
    }
    Ok(())
}

fn render_show_human(item: &ShowVersion, w: &mut dyn Write) -> std::io::Result<()> {
    let v = &item.version;
    let ctx = &v.prompt_context;

    pretty_section(w, &format!("Version {}", v.version_id))?;
    pretty_kv(w, "Content", item.content_id.as_str())?;
    pretty_kv(w, "Type", v.content_type.as_str())?;
    pretty_kv(w, "Change", v.change_type.as_str())?;
    pretty_kv(w, "Branch", &v.branch)?;
    if let Some(parent) = &v.parent_version_id {
        pretty_kv(w, "Parent", parent.as_str())?;
    }
    pretty_kv(w, "Created", format!("{} by {}", local_time(v.created_at), v.created_by))?;
    if !v.change_description.is_empty() {
        pretty_kv(w, "Description", &v.change_description)?;
    }
    if !v.tags.is_empty() {
        let tags: Vec<&str> = v.tags.iter().map(String::as_str).collect();
        pretty_kv(w, "Tags", tags.join(", "))?;
    }
    for (name, value) in &v.metrics {
        pretty_kv(w, name, format!("{value}"))?;
    }

    writeln!(w)?;
    pretty_section(w, "Generation")?;
    pretty_kv(w, "Provider", format!("{} / {}", ctx.ai_provider, ctx.model_name))?;
    pretty_kv(w, "Temperature", format!("{}", ctx.temperature))?;
    pretty_kv(w, "Safety", &ctx.safety_level)?;
    if let Some(genre) = &ctx.genre {
        pretty_kv(w, "Genre", genre)?;
    }
    for (key, value) in &ctx.additional_parameters {
        pretty_kv(w, key, value.to_string())?;
    }
    if !ctx.prompt_text.is_empty() {
        writeln!(w)?;
        for line in ctx.prompt_text.lines() {
            writeln!(w, "  > {line}")?;
        }
    }

    writeln!(w)?;
    pretty_section(w, "Content")?;
    for (field, value) in &v.content_data {
        let rendered = value.to_string();
        if rendered.contains('\n') {
            writeln!(w, "{field}:")?;
            for line in rendered.lines() {
                writeln!(w, "  {line}")?;
            }
        } else {
            pretty_kv(w, field, rendered)?;
        }
    }

    if !v.notes.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Notes")?;
        writeln!(w, "{}", v.notes)?;
    }
    Ok(())
}

/// Execute `verso show <id>`.
///
/// # Errors
///
/// Returns an error if the version does not exist.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let id = VersionId::from(args.id.as_str());
    let item = ShowVersion {
        content_id: engine.get_version_lineage_id(&id)?,
        version: engine.get_version(&id)?,
    };
    render_mode(output, &item, render_show_text, render_show_human)
}
