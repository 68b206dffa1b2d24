use crate::filter::FilterSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Opaque to the pipeline, handed to the delivery transport.
    pub recipient: String,
    #[serde(default = "default_min_priority")]
    pub min_priority: u8,
    /// Priority assumed for records that carry none (or an unparsable one).
    #[serde(default = "default_priority")]
    pub default_priority: u8,
    #[serde(default = "default_batch_window", with = "duration_format")]
    pub batch_window: Duration,
    #[serde(default)]
    pub filters: FilterSet,
    /// Overrides the host name shown in alerts.
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_min_priority() -> u8 {
    3
}

fn default_priority() -> u8 {
    3
}

fn default_batch_window() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Follow the systemd journal through `journalctl -f -o json`.
    Journal {
        #[serde(default = "default_journalctl")]
        journalctl: PathBuf,
        #[serde(default)]
        extra_args: Vec<String>,
    },
    Stdin,
    File { path: PathBuf },
}

fn default_journalctl() -> PathBuf {
    PathBuf::from("journalctl")
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Journal {
            journalctl: default_journalctl(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveryConfig {
    /// Run an external program; every argument is passed as a discrete argv entry.
    Command {
        #[serde(default = "default_program")]
        program: PathBuf,
        #[serde(default = "default_command_args")]
        args: Vec<String>,
        #[serde(default = "default_command_timeout", with = "duration_format")]
        timeout: Duration,
    },
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout", with = "duration_format")]
        timeout: Duration,
    },
}

fn default_program() -> PathBuf {
    PathBuf::from("mailer")
}

fn default_command_args() -> Vec<String> {
    ["--to", "{recipient}", "--subject", "{subject}", "--body-file", "{body_file}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig::Command {
            program: default_program(),
            args: default_command_args(),
            timeout: default_command_timeout(),
        }
    }
}

impl DeliveryConfig {
    /// Short human description used in startup logs and `config check`.
    pub fn describe(&self) -> String {
        match self {
            DeliveryConfig::Command { program, .. } => format!("command {}", program.display()),
            DeliveryConfig::Webhook { url, .. } => format!("webhook {}", url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How often open batches are checked for expiry, independent of record arrival.
    #[serde(default = "default_tick_interval", with = "duration_format")]
    pub tick_interval: Duration,
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_line_bytes() -> usize {
    64 * 1024
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

// Durations accept a bare integer (seconds, negative clamps to zero) or a
// suffixed string: "500ms", "30s", "5m", "1h".
pub(crate) mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(i64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs.max(0) as u64)),
            RawDuration::Text(s) => parse_duration(&s).map_err(serde::de::Error::custom),
        }
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        if let Ok(secs) = s.parse::<i64>() {
            return Ok(Duration::from_secs(secs.max(0) as u64));
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else if let Some(v) = s.strip_suffix('h') {
            (v, "h")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let secs = match unit {
            "ms" => return Ok(Duration::from_millis(value)),
            "s" => Some(value),
            "m" => value.checked_mul(60),
            _ => value.checked_mul(3600),
        };

        secs.map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {}", s))
    }

    pub fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if d.subsec_millis() != 0 || secs == 0 {
            format!("{}ms", d.as_millis())
        } else if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::duration_format::{format_duration, parse_duration};
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_negative_seconds_disable_window() {
        assert_eq!(parse_duration("-5").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        let err = parse_duration("5124095576030432h").unwrap_err();
        assert!(err.contains("out of range"));
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)).unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("recipient: ops@example.com\n").unwrap();
        assert_eq!(config.min_priority, 3);
        assert_eq!(config.default_priority, 3);
        assert_eq!(config.batch_window, Duration::from_secs(60));
        assert!(config.filters.is_empty());
        assert!(matches!(config.source, SourceConfig::Journal { .. }));
        match config.delivery {
            DeliveryConfig::Command { program, args, .. } => {
                assert_eq!(program, PathBuf::from("mailer"));
                assert_eq!(args.len(), 6);
                assert!(args.iter().any(|a| a == "{body_file}"));
            }
            other => panic!("unexpected delivery: {:?}", other),
        }
        assert_eq!(config.pipeline.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_tagged_source_and_delivery() {
        let yaml = r#"
recipient: ops@example.com
batch_window: 0
source:
  type: file
  path: /var/log/replay.jsonl
delivery:
  type: webhook
  url: https://hooks.example.com/alert
  timeout: 5s
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.batch_window, Duration::ZERO);
        assert!(matches!(config.source, SourceConfig::File { .. }));
        match config.delivery {
            DeliveryConfig::Webhook { url, timeout } => {
                assert_eq!(url, "https://hooks.example.com/alert");
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("unexpected delivery: {:?}", other),
        }
    }
}
