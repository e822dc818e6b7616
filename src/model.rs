//! Shared log record types (used by the pipeline, the UI panes and the server journal).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Any other level name, kept uppercased (e.g. `CRITICAL`, `TRACE`).
    Other(String),
}

impl LogLevel {
    /// Parse a level name case-insensitively. Blank input is treated as INFO.
    pub fn from_string(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "" | "INFO" => LogLevel::Info,
            "DEBUG" => LogLevel::Debug,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Other(name) => name,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Error)
    }

    pub fn display_class(&self) -> &'static str {
        match self {
            LogLevel::Debug => "level-debug",
            LogLevel::Info => "level-info",
            LogLevel::Warn => "level-warn",
            LogLevel::Error => "level-error",
            LogLevel::Other(_) => "level-other",
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        LogLevel::from_string(&s)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

/// One normalized log entry. Never mutated after it enters a buffer.
///
/// Serialized field names follow the server's JSON-lines journal so a record
/// written by [`crate::journal::append_record`] reads back identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "ts", default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "exc", default, skip_serializing_if = "Option::is_none")]
    pub exception_text: Option<String>,
    #[serde(rename = "stack", default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl LogRecord {
    pub fn new(
        timestamp: impl Into<String>,
        level: LogLevel,
        category: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            category: category.into(),
            event: event.into(),
            ..Self::default()
        }
    }

    /// Best-effort normalization of one server item. Never fails: absent or
    /// oddly-typed fields default instead of rejecting the record.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                message: text(value),
                ..Self::default()
            };
        };

        let message = field(obj, &["message"]);
        let event = field(obj, &["event", "msg"])
            .or_else(|| message.clone())
            .unwrap_or_default();

        Self {
            timestamp: field(obj, &["ts", "timestamp", "time"]).unwrap_or_default(),
            level: LogLevel::from_string(&field(obj, &["level", "levelname"]).unwrap_or_default()),
            category: field(obj, &["category"]).unwrap_or_default(),
            event,
            request_id: field(obj, &["request_id", "requestId"]),
            path: field(obj, &["path"]),
            status_code: field(obj, &["status_code", "statusCode"]),
            duration_ms: field(obj, &["duration_ms", "durationMs", "ms"]),
            action: field(obj, &["action"]),
            reason: field(obj, &["reason"]),
            message,
            exception_text: field(obj, &["exc", "exception", "exceptionText", "exception_text"]),
            stack_trace: field(obj, &["stack", "stack_trace", "stackTrace"]),
        }
    }

    /// Contextual `key=value` pairs that are present, in display order.
    pub fn context_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("request_id", &self.request_id),
            ("path", &self.path),
            ("status", &self.status_code),
            ("ms", &self.duration_ms),
            ("action", &self.action),
            ("reason", &self.reason),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
        .collect()
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text))
}

/// Response of the fetch collaborator: the last `tail` journal lines that parsed as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    pub returned: usize,
    pub tail: usize,
    pub items: Vec<Value>,
}

impl LogBatch {
    /// Normalize every item, preserving server order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.items.iter().map(LogRecord::from_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!(LogLevel::from_string("error"), LogLevel::Error);
        assert_eq!(LogLevel::from_string(" Warning "), LogLevel::Warn);
        assert_eq!(LogLevel::from_string(""), LogLevel::Info);
        assert_eq!(
            LogLevel::from_string("critical"),
            LogLevel::Other("CRITICAL".to_string())
        );
        assert!(!LogLevel::from_string("critical").is_error());
    }

    #[test]
    fn from_value_maps_server_journal_keys() {
        let rec = LogRecord::from_value(&json!({
            "ts": "2024-05-01T10:00:00Z",
            "level": "info",
            "logger": "assistant.access",
            "msg": "request.end",
            "category": "http",
            "event": "request.end",
            "request_id": "abc",
            "path": "/api/tasks",
            "status_code": 200,
            "duration_ms": 12.5
        }));
        assert_eq!(rec.timestamp, "2024-05-01T10:00:00Z");
        assert_eq!(rec.level, LogLevel::Info);
        assert_eq!(rec.category, "http");
        assert_eq!(rec.event, "request.end");
        assert_eq!(rec.request_id.as_deref(), Some("abc"));
        assert_eq!(rec.status_code.as_deref(), Some("200"));
        assert_eq!(rec.duration_ms.as_deref(), Some("12.5"));
        assert_eq!(rec.message, None);
    }

    #[test]
    fn event_falls_back_to_msg_then_message() {
        let rec = LogRecord::from_value(&json!({"msg": "system.start"}));
        assert_eq!(rec.event, "system.start");

        let rec = LogRecord::from_value(&json!({"message": "hello", "ms": 3}));
        assert_eq!(rec.event, "hello");
        assert_eq!(rec.message.as_deref(), Some("hello"));
        assert_eq!(rec.duration_ms.as_deref(), Some("3"));
    }

    #[test]
    fn malformed_items_still_normalize() {
        let rec = LogRecord::from_value(&json!(42));
        assert_eq!(rec.message.as_deref(), Some("42"));
        assert_eq!(rec.level, LogLevel::Info);

        let rec = LogRecord::from_value(&json!({"level": null, "path": null, "reason": {"a": 1}}));
        assert_eq!(rec.timestamp, "");
        assert_eq!(rec.path, None);
        assert_eq!(rec.reason.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn serialized_record_reads_back_through_from_value() {
        let mut rec = LogRecord::new("t9", LogLevel::Error, "ui", "ui.fault");
        rec.exception_text = Some("boom".into());
        rec.duration_ms = Some("4".into());
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["ts"], "t9");
        assert_eq!(value["level"], "ERROR");
        assert_eq!(LogRecord::from_value(&value), rec);
    }
}
