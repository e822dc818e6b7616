//! Cooperative poll loop: fetch the journal tail, hand the batch over, sleep, repeat.
//!
//! The scheduler does not spawn anything itself. [`PollScheduler::start`] returns
//! the loop as a future and the host runs it (Dioxus `spawn` in the app, a tokio
//! task in tests). A generation counter makes a loop from an earlier `start`
//! exit at its next tick, so at most one timer is ever live.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ConsoleError;
use crate::model::LogRecord;
use crate::settings::{MIN_INTERVAL_MS, SettingsProvider};
use crate::status::{Status, StatusSink};

/// Timer backend for the poll loop.
pub trait Ticker: Clone {
    fn sleep(&self, dur: Duration) -> impl Future<Output = ()>;
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTicker;

#[cfg(not(target_arch = "wasm32"))]
impl Ticker for TokioTicker {
    fn sleep(&self, dur: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(dur)
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTicker;

#[cfg(target_arch = "wasm32")]
impl Ticker for BrowserTicker {
    fn sleep(&self, dur: Duration) -> impl Future<Output = ()> {
        gloo_timers::future::sleep(dur)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type DefaultTicker = TokioTicker;
#[cfg(target_arch = "wasm32")]
pub type DefaultTicker = BrowserTicker;

/// The fetch collaborator: returns the last `tail` records in server order.
pub trait LogSource {
    fn fetch_recent(
        &self,
        tail: usize,
    ) -> impl Future<Output = Result<Vec<LogRecord>, ConsoleError>>;
}

impl<F, Fut> LogSource for F
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<Vec<LogRecord>, ConsoleError>>,
{
    fn fetch_recent(
        &self,
        tail: usize,
    ) -> impl Future<Output = Result<Vec<LogRecord>, ConsoleError>> {
        self(tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Result of [`PollScheduler::start`]. `Started` carries the loop to spawn.
#[must_use]
pub enum StartOutcome<L> {
    Started(L),
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone)]
pub struct PollScheduler<T = DefaultTicker> {
    ticker: T,
    running: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl<T: Ticker + Default> Default for PollScheduler<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Ticker> PollScheduler<T> {
    pub fn new(ticker: T) -> Self {
        Self {
            ticker,
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_running() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Idle -> Running. The returned loop runs one cycle immediately, then one
    /// per `interval_ms` (read fresh from `settings` every cycle).
    pub fn start<P, L, S, B>(
        &self,
        settings: P,
        source: L,
        status: S,
        mut on_batch: B,
    ) -> StartOutcome<impl Future<Output = ()> + use<T, P, L, S, B>>
    where
        P: SettingsProvider,
        L: LogSource,
        S: StatusSink,
        B: FnMut(Vec<LogRecord>),
    {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("start ignored: poll loop already running");
            return StartOutcome::AlreadyRunning;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let running = Arc::clone(&self.running);
        let current = Arc::clone(&self.generation);
        let ticker = self.ticker.clone();
        info!(generation, "poll loop started");

        StartOutcome::Started(async move {
            loop {
                let snapshot = settings.snapshot();
                run_cycle(&source, &status, &mut on_batch, snapshot.tail).await;

                let interval = snapshot.interval_ms.max(MIN_INTERVAL_MS);
                ticker.sleep(Duration::from_millis(interval)).await;

                if !running.load(Ordering::SeqCst) || current.load(Ordering::SeqCst) != generation {
                    debug!(generation, "poll loop exiting");
                    break;
                }
            }
        })
    }

    /// Running -> Idle. Only future ticks are cancelled; a fetch already in
    /// flight still delivers its batch.
    pub fn stop(&self) -> StopOutcome {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("poll loop stopped");
            StopOutcome::Stopped
        } else {
            StopOutcome::NotRunning
        }
    }
}

/// One fetch-and-consolidate cycle. Transport failures are reported and the
/// cycle is skipped; they never end the loop.
async fn run_cycle<L, S, B>(source: &L, status: &S, on_batch: &mut B, tail: usize) -> Option<usize>
where
    L: LogSource,
    S: StatusSink,
    B: FnMut(Vec<LogRecord>),
{
    match source.fetch_recent(tail).await {
        Ok(records) => {
            let n = records.len();
            debug!(tail, returned = n, "poll cycle fetched");
            on_batch(records);
            Some(n)
        }
        Err(err) => {
            warn!(%err, "poll cycle skipped");
            status.report(Status::Text(err.to_string()));
            None
        }
    }
}
