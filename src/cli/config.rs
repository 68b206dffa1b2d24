use crate::alert::severity_name;
use crate::cli::run::RunError;
use crate::config::generate::generate_starter_config;
use crate::config::types::duration_format::format_duration;
use crate::config::{load_config, user_config_path, Config, SourceConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SYSTEM_CONFIG_DIR: &str = "/etc/journalmon";

pub fn init(stdout: bool) -> Result<(), RunError> {
    let content = generate_starter_config();
    if stdout {
        print!("{}", content);
        return Ok(());
    }

    let path = default_write_path();
    write_config(&content, &path)?;
    println!("Config file written to {}", path.display());
    Ok(())
}

/// Load and validate the resolved config, then print what it will do.
pub fn check(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let path = config_path.ok_or(RunError::ConfigNotFound)?;
    let config = load_config(&path)?;
    println!("{} is valid", path.display());
    print!("{}", summarize(&config));
    Ok(())
}

/// ~/.config/journalmon/config.yml when its directory can be created,
/// /etc/journalmon/config.yml otherwise.
fn default_write_path() -> PathBuf {
    if let Some(user_config) = user_config_path() {
        match user_config.parent().map(fs::create_dir_all) {
            Some(Ok(())) => return user_config,
            Some(Err(_)) | None => {
                eprintln!("Warning: Could not create {}", user_config.display());
                eprintln!("Falling back to {}/config.yml", SYSTEM_CONFIG_DIR);
            }
        }
    }
    Path::new(SYSTEM_CONFIG_DIR).join("config.yml")
}

fn write_config(content: &str, path: &Path) -> Result<(), RunError> {
    if path.exists() {
        return Err(RunError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "config file already exists at {}; remove it first or use --stdout",
                path.display()
            ),
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn summarize(config: &Config) -> String {
    let filters = if config.filters.is_empty() {
        "(all services)".to_string()
    } else {
        config.filters.patterns().join(", ")
    };
    let window = if config.batch_window.is_zero() {
        "disabled".to_string()
    } else {
        format_duration(config.batch_window)
    };
    let source = match &config.source {
        SourceConfig::Journal { journalctl, .. } => {
            format!("journal via {}", journalctl.display())
        }
        SourceConfig::Stdin => "stdin".to_string(),
        SourceConfig::File { path } => format!("file {}", path.display()),
    };

    format!(
        "  recipient:    {}\n  min_priority: {} ({})\n  batch_window: {}\n  filters:      {}\n  source:       {}\n  delivery:     {}\n",
        config.recipient,
        config.min_priority,
        severity_name(config.min_priority),
        window,
        filters,
        source,
        config.delivery.describe(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_write_config_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "recipient: a@b\n").unwrap();

        let err = write_config("recipient: c@d\n", &path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "recipient: a@b\n");
    }

    #[test]
    fn test_write_config_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/journalmon/config.yml");

        write_config(&generate_starter_config(), &path).unwrap();
        assert!(load_config(&path).is_ok());
    }

    #[test]
    fn test_check_reports_validation_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "recipient: \"\"\n").unwrap();

        let err = check(Some(path)).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn test_summary_names_filters_and_window() {
        let config =
            parse_config("recipient: ops@example.com\nbatch_window: 0\nfilters: nginx,sshd\n")
                .unwrap();
        let summary = summarize(&config);
        assert!(summary.contains("ops@example.com"));
        assert!(summary.contains("disabled"));
        assert!(summary.contains("3 (Error)"));
        assert!(summary.contains("nginx, sshd"));
        assert!(summary.contains("command mailer"));
    }
}
