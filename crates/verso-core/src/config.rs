use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::EffectiveSettings;
use crate::model::DEFAULT_ACTOR;
use crate::search::{DEFAULT_FALLBACK_LEN, DEFAULT_SNIPPET_RADIUS, SnippetOptions};

/// Per-project state directory.
pub const STATE_DIR: &str = ".verso";

const CONFIG_FILE: &str = "config.toml";
const LOCK_FILE: &str = "lock";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_journal_file")]
    pub file: String,
    /// fsync after every append.
    #[serde(default)]
    pub durable: bool,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            file: default_journal_file(),
            durable: false,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl JournalConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_snippet_radius")]
    pub snippet_radius: usize,
    #[serde(default = "default_fallback_snippet_len")]
    pub fallback_snippet_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_radius: default_snippet_radius(),
            fallback_snippet_len: default_fallback_snippet_len(),
        }
    }
}

impl From<&SearchConfig> for SnippetOptions {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            radius: cfg.snippet_radius,
            fallback_len: cfg.fallback_snippet_len,
        }
    }
}

/// Settings reported when no version carries an `overall_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_safety_level")]
    pub safety_level: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            temperature: default_temperature(),
            safety_level: default_safety_level(),
        }
    }
}

impl From<&AnalyticsConfig> for EffectiveSettings {
    fn from(cfg: &AnalyticsConfig) -> Self {
        Self {
            provider: cfg.provider.clone(),
            temperature: cfg.temperature,
            safety_level: cfg.safety_level.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_actor")]
    pub default_actor: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_actor: default_actor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Where a project keeps its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub state_dir: PathBuf,
    pub config: PathBuf,
    pub journal: PathBuf,
    pub lock: PathBuf,
}

impl ProjectPaths {
    #[must_use]
    pub fn new(project_root: &Path, config: &EngineConfig) -> Self {
        let state_dir = project_root.join(STATE_DIR);
        Self {
            config: state_dir.join(CONFIG_FILE),
            journal: state_dir.join(&config.journal.file),
            lock: state_dir.join(LOCK_FILE),
            state_dir,
        }
    }
}

/// Load `.verso/config.toml`, or defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<EngineConfig> {
    let path = project_root.join(STATE_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config dir, if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("verso").join(CONFIG_FILE);
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the output mode: flag, then `FORMAT`, then user config, then TTY.
///
/// Returns one of `"pretty"`, `"text"` or `"json"`.
///
/// # Errors
///
/// Returns an error if the user config cannot be loaded.
pub fn resolve_output(cli_flag: Option<&str>) -> Result<String> {
    let user = load_user_config()?;
    Ok(pick_output(
        cli_flag,
        env::var("FORMAT").ok().as_deref(),
        user.output.as_deref(),
        std::io::stdout().is_terminal(),
    ))
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "plain" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn pick_output(
    cli_flag: Option<&str>,
    env_format: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> String {
    [cli_flag, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .unwrap_or(if is_tty { "pretty" } else { "text" })
        .to_string()
}

/// Write a default config file if the project has none yet.
///
/// Returns `true` when a file was written.
///
/// # Errors
///
/// Returns an error if the state directory or file cannot be written.
pub fn write_default_config(project_root: &Path) -> Result<bool> {
    let dir = project_root.join(STATE_DIR);
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let body = toml::to_string_pretty(&EngineConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

const fn default_true() -> bool {
    true
}

fn default_journal_file() -> String {
    "journal.log".to_string()
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

const fn default_snippet_radius() -> usize {
    DEFAULT_SNIPPET_RADIUS
}

const fn default_fallback_snippet_len() -> usize {
    DEFAULT_FALLBACK_LEN
}

fn default_provider() -> String {
    "ollama".to_string()
}

const fn default_temperature() -> f64 {
    0.7
}

fn default_safety_level() -> String {
    "moderate".to_string()
}

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert!(cfg.journal.enabled);
        assert_eq!(cfg.journal.file, "journal.log");
        assert!(!cfg.journal.durable);
        assert_eq!(cfg.journal.lock_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.search.snippet_radius, 30);
        assert_eq!(cfg.search.fallback_snippet_len, 100);
        assert_eq!(cfg.analytics.provider, "ollama");
        assert_eq!(cfg.identity.default_actor, "user");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(STATE_DIR).join(CONFIG_FILE),
            "[journal]\ndurable = true\n\n[search]\nsnippet_radius = 12\n",
        )
        .unwrap();

        let cfg = load_project_config(dir.path()).unwrap();
        assert!(cfg.journal.durable);
        assert!(cfg.journal.enabled);
        assert_eq!(cfg.search.snippet_radius, 12);
        assert_eq!(cfg.search.fallback_snippet_len, 100);
        assert_eq!(cfg.analytics, AnalyticsConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        std::fs::write(dir.path().join(STATE_DIR).join(CONFIG_FILE), "[journal\n").unwrap();
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_default_config(dir.path()).unwrap());
        assert!(!write_default_config(dir.path()).unwrap());
        assert_eq!(load_project_config(dir.path()).unwrap(), EngineConfig::default());
    }

    #[test]
    fn paths_live_under_state_dir() {
        let cfg = EngineConfig::default();
        let paths = ProjectPaths::new(Path::new("/proj"), &cfg);
        assert_eq!(paths.journal, PathBuf::from("/proj/.verso/journal.log"));
        assert_eq!(paths.lock, PathBuf::from("/proj/.verso/lock"));
    }

    #[test]
    fn output_precedence() {
        assert_eq!(pick_output(Some("json"), Some("text"), Some("pretty"), true), "json");
        assert_eq!(pick_output(None, Some("plain"), Some("json"), true), "text");
        assert_eq!(pick_output(None, Some("bogus"), Some("json"), true), "json");
        assert_eq!(pick_output(None, None, None, true), "pretty");
        assert_eq!(pick_output(None, None, None, false), "text");
    }
}
