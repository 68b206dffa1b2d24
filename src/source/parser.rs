use crate::source::record::LogRecord;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no MESSAGE")]
    MissingMessage,
}

/// Decodes `journalctl -o json` lines into [`LogRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    default_priority: u8,
}

impl RecordParser {
    pub fn new(default_priority: u8) -> Self {
        Self { default_priority }
    }

    /// Parse one line. `observed_at` is used when the entry has no usable
    /// `__REALTIME_TIMESTAMP`.
    pub fn parse(
        &self,
        line: &[u8],
        observed_at: DateTime<Utc>,
    ) -> Result<LogRecord, ParseError> {
        let value: Value = serde_json::from_slice(line)?;
        let fields = value.as_object().ok_or(ParseError::NotAnObject)?;

        let message = field_text(fields, "MESSAGE")
            .filter(|m| !m.is_empty())
            .ok_or(ParseError::MissingMessage)?;

        let service_id = field_text(fields, "SYSLOG_IDENTIFIER")
            .or_else(|| field_text(fields, "_COMM"))
            .unwrap_or_default();

        let unit = field_text(fields, "_SYSTEMD_UNIT")
            .or_else(|| field_text(fields, "_SYSTEMD_USER_UNIT"))
            .unwrap_or_default();

        let priority = field_text(fields, "PRIORITY")
            .and_then(|p| p.trim().parse::<u8>().ok())
            .unwrap_or(self.default_priority);

        let timestamp = field_text(fields, "__REALTIME_TIMESTAMP")
            .and_then(|ts| ts.trim().parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_micros)
            .unwrap_or(observed_at);

        Ok(LogRecord {
            timestamp,
            priority,
            service_id,
            unit,
            message,
        })
    }
}

/// Journal fields arrive as strings, numbers, byte arrays (non-UTF-8
/// payloads) or arrays of strings (repeated fields, first one wins).
fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    value_text(fields.get(key)?)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_u64) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            bytes.map(|b| String::from_utf8_lossy(&b).into_owned())
        }
        Value::Array(items) => items.first().and_then(value_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<LogRecord, ParseError> {
        RecordParser::new(3).parse(line.as_bytes(), observed())
    }

    fn observed() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_full_journal_entry() {
        let line = r#"{"__REALTIME_TIMESTAMP":"1733306400123456","PRIORITY":"3","SYSLOG_IDENTIFIER":"nginx","_SYSTEMD_UNIT":"nginx.service","MESSAGE":"upstream timed out"}"#;
        let record = parse(line).unwrap();
        assert_eq!(record.priority, 3);
        assert_eq!(record.service_id, "nginx");
        assert_eq!(record.unit, "nginx.service");
        assert_eq!(record.message, "upstream timed out");
        assert_eq!(record.timestamp.timestamp_micros(), 1_733_306_400_123_456);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let record = parse(r#"{"MESSAGE":"disk full"}"#).unwrap();
        assert_eq!(record.priority, 3);
        assert_eq!(record.service_id, "");
        assert_eq!(record.unit, "");
        assert_eq!(record.timestamp, observed());
    }

    #[test]
    fn test_non_numeric_priority_uses_default() {
        let record = RecordParser::new(5)
            .parse(br#"{"MESSAGE":"x","PRIORITY":"high"}"#, observed())
            .unwrap();
        assert_eq!(record.priority, 5);
    }

    #[test]
    fn test_numeric_priority_and_timestamp() {
        let record =
            parse(r#"{"MESSAGE":"x","PRIORITY":2,"__REALTIME_TIMESTAMP":1000000}"#).unwrap();
        assert_eq!(record.priority, 2);
        assert_eq!(record.timestamp.timestamp(), 1);
    }

    #[test]
    fn test_unparsable_timestamp_falls_back() {
        let record = parse(r#"{"MESSAGE":"x","__REALTIME_TIMESTAMP":"yesterday"}"#).unwrap();
        assert_eq!(record.timestamp, observed());
    }

    #[test]
    fn test_missing_or_empty_message_rejected() {
        assert!(matches!(
            parse(r#"{"PRIORITY":"3","SYSLOG_IDENTIFIER":"nginx"}"#),
            Err(ParseError::MissingMessage)
        ));
        assert!(matches!(parse(r#"{"MESSAGE":""}"#), Err(ParseError::MissingMessage)));
        assert!(matches!(parse(r#"{"MESSAGE":null}"#), Err(ParseError::MissingMessage)));
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(matches!(parse("not json"), Err(ParseError::Json(_))));
        assert!(matches!(parse(r#"{"MESSAGE":"trunc"#), Err(ParseError::Json(_))));
        assert!(matches!(parse(r#"["MESSAGE","x"]"#), Err(ParseError::NotAnObject)));
    }

    #[test]
    fn test_message_with_quotes_and_markup() {
        let record = parse(r#"{"MESSAGE":"said \"hi\" <b>&</b>"}"#).unwrap();
        assert_eq!(record.message, "said \"hi\" <b>&</b>");
    }

    #[test]
    fn test_binary_message_is_decoded_lossily() {
        let record = parse(r#"{"MESSAGE":[104,105,255]}"#).unwrap();
        assert_eq!(record.message, "hi\u{fffd}");
    }

    #[test]
    fn test_repeated_field_takes_first() {
        let record = parse(r#"{"MESSAGE":"x","SYSLOG_IDENTIFIER":["first","second"]}"#).unwrap();
        assert_eq!(record.service_id, "first");
    }

    #[test]
    fn test_falls_back_to_comm_and_user_unit() {
        let record =
            parse(r#"{"MESSAGE":"x","_COMM":"backup.sh","_SYSTEMD_USER_UNIT":"backup.service"}"#)
                .unwrap();
        assert_eq!(record.service_id, "backup.sh");
        assert_eq!(record.unit, "backup.service");
    }
}
