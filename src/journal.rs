//! Server-side JSON-lines journal: tail reads for the poll endpoint and appends
//! for forwarded client events.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::JournalError;
use crate::model::{LogBatch, LogRecord};

pub const JOURNAL_FILE: &str = "assistant.jsonl";
pub const MAX_TAIL_LINES: usize = 5000;

/// Where the journal lives. `LOG_DIR` overrides the default `./logs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        match std::env::var("LOG_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Self {
                log_dir: PathBuf::from(dir.trim()),
            },
            _ => Self::default(),
        }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.log_dir.join(JOURNAL_FILE)
    }
}

/// The last `tail` lines of the journal that parse as JSON, oldest first.
/// `tail` is clamped to `1..=5000`; unparseable lines are skipped.
pub fn read_tail(path: &Path, tail: usize) -> Result<LogBatch, JournalError> {
    if !path.exists() {
        return Err(JournalError::NotFound(path.display().to_string()));
    }
    let tail = tail.clamp(1, MAX_TAIL_LINES);
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(tail);
    let items: Vec<Value> = lines[start..]
        .iter()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    Ok(LogBatch {
        returned: items.len(),
        tail,
        items,
    })
}

/// Append one record as a JSON line, creating the directory if needed.
pub fn append_record(path: &Path, record: &LogRecord) -> Result<(), JournalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;

    fn write_lines(path: &Path, lines: &[&str]) {
        fs::write(path, lines.join("\n")).unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_tail(&dir.path().join(JOURNAL_FILE), 10).unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
        assert!(err.to_string().starts_with("Log file not found"));
    }

    #[test]
    fn returns_last_lines_in_order_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JOURNAL_FILE);
        write_lines(
            &path,
            &[
                r#"{"ts":"t1","event":"a"}"#,
                r#"{"ts":"t2","event":"b"}"#,
                "not json",
                r#"{"ts":"t3","event":"c"}"#,
            ],
        );

        let batch = read_tail(&path, 3).unwrap();
        assert_eq!(batch.tail, 3);
        assert_eq!(batch.returned, 2);
        let events: Vec<_> = batch.records().into_iter().map(|r| r.event).collect();
        assert_eq!(events, vec!["b", "c"]);
    }

    #[test]
    fn tail_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JOURNAL_FILE);
        write_lines(&path, &[r#"{"event":"a"}"#, r#"{"event":"b"}"#]);

        let batch = read_tail(&path, 0).unwrap();
        assert_eq!(batch.tail, 1);
        assert_eq!(batch.returned, 1);

        let batch = read_tail(&path, 1_000_000).unwrap();
        assert_eq!(batch.tail, MAX_TAIL_LINES);
        assert_eq!(batch.returned, 2);
    }

    #[test]
    fn appended_records_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(JOURNAL_FILE);
        let mut record = LogRecord::new("t1", LogLevel::Error, "ui", "ui.action");
        record.action = Some("copy_live".into());

        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let batch = read_tail(&path, 10).unwrap();
        assert_eq!(batch.returned, 2);
        assert_eq!(batch.records()[1], record);
    }

    #[test]
    fn config_defaults_to_local_logs_dir() {
        let config = ServerConfig::default();
        assert_eq!(config.journal_path(), PathBuf::from("./logs/assistant.jsonl"));
    }
}
