//! User-visible status messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Status {
    Text(String),
    /// Structured payload, shown pretty-printed.
    Structured(Value),
}

impl Status {
    pub fn render(&self) -> String {
        match self {
            Status::Text(s) => s.clone(),
            Status::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::Text(s)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::Text(s.to_string())
    }
}

impl From<Value> for Status {
    fn from(v: Value) -> Self {
        Status::Structured(v)
    }
}

pub trait StatusSink {
    fn report(&self, status: Status);
}

impl<F: Fn(Status)> StatusSink for F {
    fn report(&self, status: Status) {
        self(status)
    }
}
