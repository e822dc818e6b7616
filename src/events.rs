//! Locally synthesized client events and their best-effort forwarding.
//!
//! Forwarding is a side channel: records go onto an unbounded queue drained by
//! a background task, and a failed delivery is logged at debug and dropped.
//! Nothing here can fail or block the caller.

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::model::{LogLevel, LogRecord};

pub const CLIENT_CATEGORY: &str = "ui";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

/// One user-triggered action, as it is recorded in the live feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEvent {
    pub action: String,
    pub outcome: Outcome,
    pub duration_ms: i64,
    pub message: Option<String>,
}

impl ClientEvent {
    pub fn into_record(self, at: DateTime<Utc>) -> LogRecord {
        let (level, reason) = match self.outcome {
            Outcome::Ok => (LogLevel::Info, "ok"),
            Outcome::Failed => (LogLevel::Error, "failed"),
        };
        let mut record = LogRecord::new(timestamp(at), level, CLIENT_CATEGORY, "ui.action");
        record.action = Some(self.action);
        record.reason = Some(reason.to_string());
        record.message = self.message;
        record.duration_ms = Some(self.duration_ms.to_string());
        record
    }
}

/// A client-side fault that did not come from a user action.
pub fn fault_record(message: impl Into<String>, at: DateTime<Utc>) -> LogRecord {
    let mut record = LogRecord::new(timestamp(at), LogLevel::Error, CLIENT_CATEGORY, "ui.fault");
    record.message = Some(message.into());
    record
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Default)]
pub struct EventForwarder {
    tx: Option<UnboundedSender<LogRecord>>,
}

impl EventForwarder {
    /// A forwarder with no sink; every record is dropped.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, UnboundedReceiver<LogRecord>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// Queue `record` if forwarding is `enabled`. Returns whether it was queued.
    pub fn forward(&self, record: LogRecord, enabled: bool) -> bool {
        match &self.tx {
            Some(tx) if enabled => tx.unbounded_send(record).is_ok(),
            _ => false,
        }
    }
}

/// Drain the queue into `sink` until every sender is gone.
pub async fn run_forwarder<S, Fut, E>(mut rx: UnboundedReceiver<LogRecord>, mut sink: S)
where
    S: FnMut(LogRecord) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    while let Some(record) = rx.next().await {
        let action = record.action.clone().unwrap_or_default();
        if let Err(err) = sink(record).await {
            debug!(%err, action, "client event not forwarded");
        }
    }
}
