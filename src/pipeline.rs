//! Consolidation of fetched records into the live feed and the error vault.

use tracing::{debug, info};

use crate::buffer::{BoundedBuffer, LIVE_CAPACITY};
use crate::dedupe::DedupeIndex;
use crate::model::LogRecord;
use crate::settings::{DEFAULT_ERROR_CAPACITY, Settings};

/// What happened to one record on ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Duplicate,
    Live,
    LiveAndErrors,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub errors: usize,
}

/// All mutable pipeline state, owned by one controller.
#[derive(Debug)]
pub struct PipelineState {
    dedupe: DedupeIndex,
    live: BoundedBuffer<LogRecord>,
    errors: BoundedBuffer<LogRecord>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(LIVE_CAPACITY, DEFAULT_ERROR_CAPACITY)
    }
}

impl PipelineState {
    pub fn new(live_capacity: usize, error_capacity: usize) -> Self {
        Self {
            dedupe: DedupeIndex::new(),
            live: BoundedBuffer::new(live_capacity),
            errors: BoundedBuffer::new(error_capacity),
        }
    }

    /// Capacities follow the latest settings snapshot (enforced on the next push).
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.live.set_capacity(settings.live_capacity);
        self.errors.set_capacity(settings.max_error_capacity);
    }

    pub fn ingest(&mut self, record: LogRecord) -> IngestOutcome {
        let sig = self.dedupe.signature(&record);
        if self.dedupe.has_seen(&sig) {
            return IngestOutcome::Duplicate;
        }
        self.dedupe.mark_seen(sig);

        if record.level.is_error() {
            self.errors.push(record.clone());
            self.live.push(record);
            IngestOutcome::LiveAndErrors
        } else {
            self.live.push(record);
            IngestOutcome::Live
        }
    }

    /// Ingest in input order; that order becomes render and eviction order.
    pub fn ingest_batch(&mut self, records: impl IntoIterator<Item = LogRecord>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for record in records {
            summary.received += 1;
            match self.ingest(record) {
                IngestOutcome::Duplicate => summary.duplicates += 1,
                IngestOutcome::Live => summary.admitted += 1,
                IngestOutcome::LiveAndErrors => {
                    summary.admitted += 1;
                    summary.errors += 1;
                }
            }
        }
        debug!(
            received = summary.received,
            admitted = summary.admitted,
            duplicates = summary.duplicates,
            live = self.live.len(),
            errors = self.errors.len(),
            "batch ingested"
        );
        summary
    }

    /// Empties the live feed and forgets every signature, so earlier records
    /// can be admitted again.
    pub fn clear_live(&mut self) {
        info!(cleared = self.live.len(), "live feed cleared");
        self.live.clear();
        self.dedupe.reset();
    }

    /// Empties the error vault only; signatures stay known.
    pub fn clear_errors(&mut self) {
        info!(cleared = self.errors.len(), "error vault cleared");
        self.errors.clear();
    }

    pub fn live(&self) -> &BoundedBuffer<LogRecord> {
        &self.live
    }

    pub fn errors(&self) -> &BoundedBuffer<LogRecord> {
        &self.errors
    }
}
