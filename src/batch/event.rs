use crate::source::record::LogRecord;
use chrono::{DateTime, Utc};

/// Identifies a burst: records from the same unit and service coalesce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub unit: String,
    pub service_id: String,
}

impl BatchKey {
    pub fn for_record(record: &LogRecord) -> Self {
        Self {
            unit: record.unit.clone(),
            service_id: record.service_id.clone(),
        }
    }
}

/// What gets rendered and dispatched: one record, or a whole flushed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    /// First record seen for the key.
    pub representative: LogRecord,
    /// Number of records this event stands for, at least 1.
    pub count: u64,
    /// Worst (numerically lowest) priority among them.
    pub priority: u8,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl AlertEvent {
    pub fn single(record: LogRecord, now: DateTime<Utc>) -> Self {
        Self {
            priority: record.priority,
            representative: record,
            count: 1,
            first_seen: now,
            last_seen: now,
        }
    }

    pub fn is_batched(&self) -> bool {
        self.count > 1
    }
}
