//! `verso init`: create the `.verso/` state directory, a default config and
//! an empty journal.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use verso_core::config::{self, ProjectPaths, STATE_DIR};

use super::open_engine;
use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
pub struct InitReport {
    pub state_dir: String,
    pub config_written: bool,
    pub journal_enabled: bool,
    pub journal: String,
    /// Versions already recorded when re-running `init` on an existing project.
    pub versions: usize,
}

/// Execute `verso init`. Safe to re-run: an existing config is left alone
/// and the journal is only validated.
///
/// # Errors
///
/// Returns an error if the state directory cannot be written or an existing
/// journal fails to replay.
pub fn run_init(_args: &InitArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let state_dir = project_root.join(STATE_DIR);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("Failed to create {}", state_dir.display()))?;
    let config_written = config::write_default_config(project_root)?;

    let engine = open_engine(project_root, None)?;
    let paths = ProjectPaths::new(project_root, engine.config());

    let report = InitReport {
        state_dir: state_dir.display().to_string(),
        config_written,
        journal_enabled: engine.config().journal.enabled,
        journal: paths.journal.display().to_string(),
        versions: engine.version_count(),
    };

    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "initialized\t{}\t{}", r.state_dir, r.versions),
        |r, w| {
            writeln!(w, "✓ Initialized {STATE_DIR}/")?;
            writeln!(w)?;
            pretty_kv(w, "Config", if r.config_written { "written" } else { "kept existing" })?;
            pretty_kv(
                w,
                "Journal",
                if r.journal_enabled { r.journal.as_str() } else { "disabled (in-memory)" },
            )?;
            pretty_kv(w, "Versions", r.versions.to_string())?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  verso create story_content --content '{{\"text\": \"...\"}}'")
        },
    )
}
