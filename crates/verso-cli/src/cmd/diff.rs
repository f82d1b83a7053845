//! `verso diff`: structural comparison of two versions.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use verso_core::diff::{DiffResult, FieldChange, FieldChangeKind};
use verso_core::model::{ContentValue, VersionId};

use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, truncate};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Older version.
    pub from: String,
    /// Newer version.
    pub to: String,
}

const VALUE_WIDTH: usize = 60;

const fn marker(kind: FieldChangeKind) -> char {
    match kind {
        FieldChangeKind::Addition => '+',
        FieldChangeKind::Deletion => '-',
        FieldChangeKind::Modification => '~',
    }
}

fn value_text(change: &FieldChange) -> (String, String) {
    let show = |v: Option<&ContentValue>| {
        v.map_or_else(String::new, |v| v.to_string().replace('\n', "\\n"))
    };
    (show(change.old_value.as_ref()), show(change.new_value.as_ref()))
}

fn render_diff_text(diff: &DiffResult, w: &mut dyn Write) -> io::Result<()> {
    for change in &diff.content_changes {
        let (old, new) = value_text(change);
        writeln!(w, "{}\t{}\t{old}\t{new}", marker(change.kind), change.field)?;
    }
    let p = &diff.prompt_changes;
    if let Some(t) = &p.ai_provider {
        writeln!(w, "~\tprompt.ai_provider\t{}\t{}", t.from, t.to)?;
    }
    if let Some(t) = &p.temperature {
        writeln!(w, "~\tprompt.temperature\t{}\t{}", t.from, t.to)?;
    }
    if let Some(t) = &p.safety_level {
        writeln!(w, "~\tprompt.safety_level\t{}\t{}", t.from, t.to)?;
    }
    if p.prompt_text.is_some() {
        writeln!(w, "~\tprompt.prompt_text\t\t")?;
    }
    for tag in &diff.metadata_changes.tags.added {
        writeln!(w, "+\ttag\t\t{tag}")?;
    }
    for tag in &diff.metadata_changes.tags.removed {
        writeln!(w, "-\ttag\t{tag}\t")?;
    }
    Ok(())
}

fn render_diff_human(diff: &DiffResult, w: &mut dyn Write) -> io::Result<()> {
    for (label, side) in [("From", &diff.version_1), ("To", &diff.version_2)] {
        pretty_kv(
            w,
            label,
            format!("{}  {}  {}", side.id.short(), local_time(side.created_at), side.change_description),
        )?;
    }
    let types = &diff.metadata_changes.change_type;
    pretty_kv(w, "Change", format!("{} -> {}", types.from, types.to))?;

    if diff.is_identical() {
        writeln!(w)?;
        writeln!(w, "No differences.")?;
        return Ok(());
    }

    if !diff.content_changes.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Content")?;
        for change in &diff.content_changes {
            let (old, new) = value_text(change);
            match (change.kind, &change.text_diff) {
                (FieldChangeKind::Modification, Some(lines)) => {
                    writeln!(w, "~ {}", change.field)?;
                    for line in lines {
                        writeln!(w, "    {line}")?;
                    }
                }
                (FieldChangeKind::Modification, None) => writeln!(
                    w,
                    "~ {}: {} -> {}",
                    change.field,
                    truncate(&old, VALUE_WIDTH),
                    truncate(&new, VALUE_WIDTH)
                )?,
                (FieldChangeKind::Addition, _) => {
                    writeln!(w, "+ {}: {}", change.field, truncate(&new, VALUE_WIDTH))?;
                }
                (FieldChangeKind::Deletion, _) => {
                    writeln!(w, "- {}: {}", change.field, truncate(&old, VALUE_WIDTH))?;
                }
            }
        }
    }

    let p = &diff.prompt_changes;
    if !p.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Generation")?;
        if let Some(t) = &p.ai_provider {
            pretty_kv(w, "Provider", format!("{} -> {}", t.from, t.to))?;
        }
        if let Some(t) = &p.temperature {
            pretty_kv(w, "Temperature", format!("{} -> {}", t.from, t.to))?;
        }
        if let Some(t) = &p.safety_level {
            pretty_kv(w, "Safety", format!("{} -> {}", t.from, t.to))?;
        }
        if let Some(lines) = &p.prompt_text {
            writeln!(w, "Prompt:")?;
            for line in lines {
                writeln!(w, "    {line}")?;
            }
        }
    }

    let tags = &diff.metadata_changes.tags;
    if !tags.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Tags")?;
        for tag in &tags.added {
            writeln!(w, "+ {tag}")?;
        }
        for tag in &tags.removed {
            writeln!(w, "- {tag}")?;
        }
    }
    Ok(())
}

/// Execute `verso diff <from> <to>`.
///
/// # Errors
///
/// Returns an error if either version does not exist.
pub fn run_diff(args: &DiffArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let engine = open_engine(project_root, None)?;
    let diff = engine.get_version_diff(
        &VersionId::from(args.from.as_str()),
        &VersionId::from(args.to.as_str()),
    )?;
    render_mode(output, &diff, render_diff_text, render_diff_human)
}
