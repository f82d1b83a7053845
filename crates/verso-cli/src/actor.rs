//! Actor identity resolution for CLI commands.
//!
//! The resolution chain: `--actor` flag > `VERSO_ACTOR` env > `[identity]
//! default_actor` from the project config. The last step is applied by the
//! engine itself, so this module only reports an override when one exists.

use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

fn resolve_actor_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(actor) = cli_flag.map(str::trim).filter(|a| !a.is_empty()) {
        return Some(actor.to_string());
    }

    env.get("VERSO_ACTOR")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve an actor override from `--actor` or `VERSO_ACTOR`.
///
/// Returns `None` when neither is set, leaving the config default in place.
pub fn resolve_actor(cli_flag: Option<&str>) -> Option<String> {
    resolve_actor_with(cli_flag, &RealEnv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv(HashMap<&'static str, &'static str>);

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| (*v).to_string())
        }
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> MockEnv {
        MockEnv(pairs.iter().copied().collect())
    }

    #[test]
    fn flag_wins_over_env() {
        let e = env(&[("VERSO_ACTOR", "from-env")]);
        assert_eq!(
            resolve_actor_with(Some("from-flag"), &e).as_deref(),
            Some("from-flag")
        );
    }

    #[test]
    fn env_used_without_flag() {
        let e = env(&[("VERSO_ACTOR", "writer-2")]);
        assert_eq!(resolve_actor_with(None, &e).as_deref(), Some("writer-2"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let e = env(&[("VERSO_ACTOR", "  ")]);
        assert_eq!(resolve_actor_with(Some(""), &e), None);
    }

    #[test]
    fn nothing_set_defers_to_config() {
        assert_eq!(resolve_actor_with(None, &env(&[])), None);
    }
}
