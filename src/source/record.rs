use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One journal entry, reduced to the fields alerting cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the source says the event happened, or when we saw it.
    pub timestamp: DateTime<Utc>,
    /// Syslog severity: 0 (emerg) is most severe, 7 (debug) least.
    pub priority: u8,
    /// `SYSLOG_IDENTIFIER`, may be empty.
    pub service_id: String,
    /// Supervisor unit name, may be empty.
    pub unit: String,
    /// Untrusted free text, never empty.
    pub message: String,
}
