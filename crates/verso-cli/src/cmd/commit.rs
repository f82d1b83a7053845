//! `verso commit`: record a new version under an existing parent.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use serde::Serialize;
use verso_core::model::{ChangeType, ContentId, MAIN_BRANCH, Version, VersionId};

use super::draft::DraftArgs;
use super::{local_time, open_engine};
use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Parent version id.
    #[arg(long)]
    pub parent: String,

    /// modification or regeneration.
    #[arg(long, default_value = "modification")]
    pub change_type: ChangeType,

    /// Branch to record the version on.
    #[arg(long, default_value = MAIN_BRANCH)]
    pub branch: String,

    #[command(flatten)]
    pub draft: DraftArgs,
}

/// Result of any command that creates a version.
#[derive(Debug, Serialize)]
pub struct VersionReport {
    pub content_id: ContentId,
    pub version_id: VersionId,
    pub parent_version_id: Option<VersionId>,
    pub change_type: ChangeType,
    pub branch: String,
    pub change_description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: String,
}

impl VersionReport {
    pub fn new(content_id: ContentId, version: &Version) -> Self {
        Self {
            content_id,
            version_id: version.version_id.clone(),
            parent_version_id: version.parent_version_id.clone(),
            change_type: version.change_type,
            branch: version.branch.clone(),
            change_description: version.change_description.clone(),
            created_at: version.created_at,
            created_by: version.created_by.clone(),
        }
    }
}

/// Shared rendering for create/commit/branch/rollback.
pub fn render_version_report(
    output: OutputMode,
    report: &VersionReport,
    headline: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    render_mode(
        output,
        report,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                r.version_id, r.content_id, r.change_type, r.branch
            )
        },
        |r, w| {
            headline(w)?;
            pretty_kv(w, "Version", r.version_id.as_str())?;
            pretty_kv(w, "Content", r.content_id.as_str())?;
            if let Some(parent) = &r.parent_version_id {
                pretty_kv(w, "Parent", parent.as_str())?;
            }
            pretty_kv(w, "Change", r.change_type.as_str())?;
            pretty_kv(w, "Branch", &r.branch)?;
            if !r.change_description.is_empty() {
                pretty_kv(w, "Description", &r.change_description)?;
            }
            pretty_kv(w, "Created", format!("{} by {}", local_time(r.created_at), r.created_by))
        },
    )
}

/// Execute `verso commit`.
///
/// # Errors
///
/// Returns an error when the parent is unknown, the change type cannot be
/// created directly, or the journal append fails.
pub fn run_commit(
    args: &CommitArgs,
    actor: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let engine = open_engine(project_root, actor)?;
    let draft = args.draft.to_draft(engine.config())?;
    let parent = VersionId::from(args.parent.as_str());
    let version_id = engine.create_new_version(&parent, draft, args.change_type, &args.branch)?;

    let version = engine.get_version(&version_id)?;
    let report = VersionReport::new(engine.get_version_lineage_id(&version_id)?, &version);
    render_version_report(output, &report, |w| {
        writeln!(w, "✓ Committed {} on {}", version_id.short(), report.branch)
    })
}
