use thiserror::Error;

/// Failures the console surfaces to the status line. None of them stop polling.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConsoleError {
    /// The fetch collaborator failed; the cycle is skipped.
    #[error("log fetch failed: {0}")]
    Transport(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("{action} failed: {message}")]
    Action { action: String, message: String },
}

/// Server-side journal access errors.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Log file not found: {0}")]
    NotFound(String),

    #[error("journal io: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal encode: {0}")]
    Encode(#[from] serde_json::Error),
}
