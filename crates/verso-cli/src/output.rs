//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for agents, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config (`<config dir>/verso/config.toml`)
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use tracing::warn;
use verso_core::LineageError;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    fn from_resolved(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// Resolve the output mode from CLI flags, environment, user config and TTY.
///
/// An unreadable user config is logged and skipped rather than failing the
/// command.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let flag = format_flag.or(json_flag.then_some(OutputMode::Json));
    verso_core::config::resolve_output(flag.map(OutputMode::as_str)).map_or_else(
        |err| {
            warn!("ignoring user config: {err:#}");
            flag.unwrap_or(if io::stdout().is_terminal() {
                OutputMode::Pretty
            } else {
                OutputMode::Text
            })
        },
        |raw| OutputMode::from_resolved(&raw),
    )
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####` for engine errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<&LineageError> for CliError {
    fn from(err: &LineageError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        if let Some(lineage) = err.downcast_ref::<LineageError>() {
            return Self::from(lineage);
        }
        if let Some(cli) = err.downcast_ref::<Self>() {
            return cli.clone();
        }
        Self::new(format!("{err:#}"))
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Truncate `s` to at most `max` characters, appending `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::model::VersionId;

    #[test]
    fn resolved_strings_map_back_to_modes() {
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
    }

    #[test]
    fn pretty_kv_pads_key() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "Branch", "main").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Branch:      main\n");
    }

    #[test]
    fn pretty_section_writes_rule() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Versions").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Versions\n"));
        assert!(text.contains(&"-".repeat(PRETTY_RULE_WIDTH)));
    }

    #[test]
    fn lineage_error_carries_code_and_hint() {
        let engine = verso_core::LineageEngine::in_memory();
        let err = engine.get_version(&VersionId::from("missing")).unwrap_err();
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.suggestion.is_some());
        assert!(cli.message.contains("missing"));
    }

    #[test]
    fn anyhow_wrapping_preserves_lineage_code() {
        let engine = verso_core::LineageEngine::in_memory();
        let err: anyhow::Error = engine
            .get_version(&VersionId::from("missing"))
            .unwrap_err()
            .into();
        assert_eq!(CliError::from(&err).error_code.as_deref(), Some("E2001"));
    }

    #[test]
    fn anyhow_wrapping_preserves_cli_error() {
        let err: anyhow::Error =
            CliError::with_details("bad", "fix it", "invalid_input").into();
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("invalid_input"));
        assert_eq!(cli.suggestion.as_deref(), Some("fix it"));
    }

    #[test]
    fn plain_errors_have_no_code() {
        let err = anyhow::anyhow!("boom");
        let cli = CliError::from(&err);
        assert_eq!(cli.message, "boom");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn error_json_shape() {
        let err = CliError::with_details("not found", "try list", "E2001");
        let json = serde_json::to_value(serde_json::json!({ "error": err })).unwrap();
        assert_eq!(json["error"]["message"], "not found");
        assert_eq!(json["error"]["error_code"], "E2001");
    }
}
