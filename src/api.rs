//! Server functions bridging the client console to the server-side journal.
//! These are callable from both web (WASM) and desktop clients.

use std::future::Future;

use dioxus::prelude::*;

use crate::error::ConsoleError;
use crate::model::{LogBatch, LogRecord};
use crate::scheduler::LogSource;

/// The last `tail` journal records (JSON objects, oldest first).
#[server]
pub async fn fetch_logs(tail: usize) -> Result<LogBatch, ServerFnError> {
    let path = crate::journal::ServerConfig::from_env().journal_path();
    tokio::task::spawn_blocking(move || crate::journal::read_tail(&path, tail))
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?
        .map_err(|e| ServerFnError::new(e.to_string()))
}

/// Sink for forwarded client events: logged and appended to the journal.
#[server]
pub async fn record_client_event(record: LogRecord) -> Result<(), ServerFnError> {
    tracing::info!(
        source = "client",
        level = record.level.as_str(),
        event = %record.event,
        action = ?record.action,
        "client event"
    );
    let path = crate::journal::ServerConfig::from_env().journal_path();
    tokio::task::spawn_blocking(move || crate::journal::append_record(&path, &record))
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?
        .map_err(|e| ServerFnError::new(e.to_string()))
}

/// Fetch collaborator backed by [`fetch_logs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerLogSource;

impl LogSource for ServerLogSource {
    fn fetch_recent(
        &self,
        tail: usize,
    ) -> impl Future<Output = Result<Vec<LogRecord>, ConsoleError>> {
        async move {
            fetch_logs(tail)
                .await
                .map(|batch| batch.records())
                .map_err(|e| ConsoleError::Transport(e.to_string()))
        }
    }
}
