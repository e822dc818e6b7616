//! Runtime settings: what the poll loop and the pipeline read fresh each cycle.
//!
//! Defaults can be baked in at build time through `LOG_CONSOLE_*` keys in `.env`
//! (see `build.rs`), so the WASM client carries deployment defaults.

use serde::{Deserialize, Serialize};

use crate::buffer::LIVE_CAPACITY;

pub const MIN_TAIL: usize = 10;
pub const MAX_TAIL: usize = 5000;
pub const MIN_INTERVAL_MS: u64 = 300;
pub const MIN_ERROR_CAPACITY: usize = 5;

pub const DEFAULT_TAIL: usize = 300;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_ERROR_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// How many journal lines each poll requests.
    pub tail: usize,
    pub interval_ms: u64,
    pub max_error_capacity: usize,
    pub live_capacity: usize,
    /// Forward locally synthesized client events to the server journal.
    pub forward_client_events: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tail: baked("LOG_CONSOLE_TAIL", option_env!("LOG_CONSOLE_TAIL"))
                .map_or(DEFAULT_TAIL, clamp_tail),
            interval_ms: baked("LOG_CONSOLE_INTERVAL_MS", option_env!("LOG_CONSOLE_INTERVAL_MS"))
                .map_or(DEFAULT_INTERVAL_MS, |v| (v as u64).max(MIN_INTERVAL_MS)),
            max_error_capacity: baked(
                "LOG_CONSOLE_ERROR_CAPACITY",
                option_env!("LOG_CONSOLE_ERROR_CAPACITY"),
            )
            .map_or(DEFAULT_ERROR_CAPACITY, |v| v.max(MIN_ERROR_CAPACITY)),
            live_capacity: LIVE_CAPACITY,
            forward_client_events: option_env!("LOG_CONSOLE_FORWARD_EVENTS")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
        }
    }
}

fn baked(key: &str, value: Option<&str>) -> Option<usize> {
    let raw = value?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, raw, "ignoring non-numeric baked setting");
            None
        }
    }
}

fn clamp_tail(v: usize) -> usize {
    v.clamp(MIN_TAIL, MAX_TAIL)
}

impl Settings {
    /// Build a snapshot from raw settings-field text. Out-of-range numbers are
    /// clamped to their limits; non-numeric text clamps to the minimum.
    pub fn from_inputs(tail: &str, interval_ms: &str, max_errors: &str, forward: bool) -> Self {
        Self {
            tail: parse_number(tail).map_or(MIN_TAIL, |v| clamp_tail(saturate(v))),
            interval_ms: parse_number(interval_ms)
                .map_or(MIN_INTERVAL_MS, |v| v.max(MIN_INTERVAL_MS as i64) as u64),
            max_error_capacity: parse_number(max_errors)
                .map_or(MIN_ERROR_CAPACITY, |v| saturate(v).max(MIN_ERROR_CAPACITY)),
            live_capacity: LIVE_CAPACITY,
            forward_client_events: forward,
        }
    }
}

fn parse_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn saturate(v: i64) -> usize {
    usize::try_from(v).unwrap_or(0)
}

/// Source of fresh settings snapshots.
pub trait SettingsProvider {
    fn snapshot(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn snapshot(&self) -> Settings {
        self.clone()
    }
}

impl<F: Fn() -> Settings> SettingsProvider for F {
    fn snapshot(&self) -> Settings {
        self()
    }
}
