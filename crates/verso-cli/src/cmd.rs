//! Subcommand handlers plus the pieces they share: project opening and
//! timestamp formatting.

pub mod analytics;
pub mod branch;
pub mod commit;
pub mod create;
pub mod diff;
pub mod draft;
pub mod history;
pub mod init;
pub mod list;
pub mod rollback;
pub mod search;
pub mod show;
pub mod tree;

use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Local, Utc};
use tracing::debug;
use verso_core::LineageEngine;
use verso_core::config::{self, STATE_DIR};

use crate::actor;
use crate::output::CliError;

/// Open the engine for an initialized project, replaying its journal.
///
/// # Errors
///
/// Fails when the project has no state directory, the config cannot be
/// parsed, or the journal cannot be replayed.
pub fn open_engine(project_root: &Path, actor_flag: Option<&str>) -> anyhow::Result<LineageEngine> {
    if !project_root.join(STATE_DIR).is_dir() {
        return Err(CliError::with_details(
            format!("no {STATE_DIR}/ directory in {}", project_root.display()),
            "run `verso init` first",
            "not_initialized",
        )
        .into());
    }

    let mut engine_config = config::load_project_config(project_root).map_err(|err| {
        CliError::with_details(
            format!("{err:#}"),
            verso_core::ErrorCode::ConfigParseError
                .hint()
                .unwrap_or_default(),
            verso_core::ErrorCode::ConfigParseError.code(),
        )
    })?;
    if let Some(actor) = actor::resolve_actor(actor_flag) {
        debug!(%actor, "actor override");
        engine_config.identity.default_actor = actor;
    }

    let engine = LineageEngine::open(project_root, engine_config)?;
    Ok(engine)
}

/// Read a file named by an `@path` argument.
pub fn read_arg_file(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}

/// Local `YYYY-MM-DD HH:MM:SS` for human output.
pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
