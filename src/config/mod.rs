pub mod generate;
pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use parse::{load_config, parse_config, ConfigError};
pub use types::{Config, DeliveryConfig, PipelineConfig, SourceConfig};

const USER_CONFIG: &str = ".config/journalmon/config.yml";
const SYSTEM_CONFIG: &str = "/etc/journalmon/config.yml";

/// Matches `$env{VAR_NAME}` references.
pub(crate) fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Expands environment variables in a string.
/// Supports $env{VAR_NAME} syntax; unset variables are left unchanged.
pub fn expand_env_vars(text: &str) -> String {
    env_var_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            caps.get(1)
                .and_then(|name| std::env::var(name.as_str()).ok())
                .unwrap_or_else(|| whole.to_string())
        })
        .to_string()
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path. Returns the first of:
/// 1. Explicit path (tilde-expanded)
/// 2. ~/.config/journalmon/config.yml
/// 3. /etc/journalmon/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(USER_CONFIG);
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from(SYSTEM_CONFIG);
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Where `config init` writes by default.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(USER_CONFIG))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_single() {
        std::env::set_var("JOURNALMON_TEST_RECIPIENT", "ops@example.com");
        let result = expand_env_vars("recipient: $env{JOURNALMON_TEST_RECIPIENT}");
        assert_eq!(result, "recipient: ops@example.com");
        std::env::remove_var("JOURNALMON_TEST_RECIPIENT");
    }

    #[test]
    fn test_expand_env_vars_unset() {
        let result = expand_env_vars("url: $env{JOURNALMON_NONEXISTENT_VAR}/hook");
        assert_eq!(result, "url: $env{JOURNALMON_NONEXISTENT_VAR}/hook");
    }

    #[test]
    fn test_expand_env_vars_ignores_placeholders() {
        // argv placeholders use plain braces and must survive untouched
        let result = expand_env_vars("--subject {subject} ${other}");
        assert_eq!(result, "--subject {subject} ${other}");
    }

    #[test]
    fn test_expand_tilde_with_path() {
        let expanded = expand_tilde(Path::new("~/bin/mailer"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("bin/mailer"));
        }
    }

    #[test]
    fn test_expand_tilde_no_expansion() {
        assert_eq!(
            expand_tilde(Path::new("/usr/local/bin/mailer")),
            Path::new("/usr/local/bin/mailer")
        );
        assert_eq!(expand_tilde(Path::new("mailer")), Path::new("mailer"));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let resolved = resolve_config_path(Some(Path::new("/tmp/journalmon.yml")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/journalmon.yml")));
    }
}
