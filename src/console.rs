//! The controller: one owner for pipeline state, both views and the poll scheduler.

use tracing::debug;

use crate::events::EventForwarder;
use crate::model::LogRecord;
use crate::pipeline::{BatchSummary, IngestOutcome, PipelineState};
use crate::render::{RenderCoordinator, ScrollMetrics, ViewKind, ViewPane, export_text};
use crate::scheduler::{DefaultTicker, PollScheduler, Ticker};
use crate::settings::Settings;

#[derive(Debug)]
pub struct LogConsole<T = DefaultTicker> {
    pipeline: PipelineState,
    scheduler: PollScheduler<T>,
    coordinator: RenderCoordinator,
    live_view: ViewPane,
    error_view: ViewPane,
    forwarder: EventForwarder,
}

impl<T: Ticker> LogConsole<T> {
    pub fn new(
        scheduler: PollScheduler<T>,
        forwarder: EventForwarder,
        settings: &Settings,
    ) -> Self {
        let mut console = Self {
            pipeline: PipelineState::new(settings.live_capacity, settings.max_error_capacity),
            scheduler,
            coordinator: RenderCoordinator::default(),
            live_view: ViewPane::default(),
            error_view: ViewPane::default(),
            forwarder,
        };
        console.refresh_views();
        console
    }

    /// Continuation of every successful poll cycle.
    pub fn on_batch(&mut self, records: Vec<LogRecord>, settings: &Settings) -> BatchSummary {
        self.pipeline.apply_settings(settings);
        let summary = self.pipeline.ingest_batch(records);
        self.refresh_views();
        summary
    }

    /// Ingest a locally synthesized record and hand it to the forwarding side channel.
    pub fn record_client_event(&mut self, record: LogRecord, settings: &Settings) -> IngestOutcome {
        let queued = self
            .forwarder
            .forward(record.clone(), settings.forward_client_events);
        debug!(queued, event = %record.event, "client event recorded");
        self.pipeline.apply_settings(settings);
        let outcome = self.pipeline.ingest(record);
        self.refresh_views();
        outcome
    }

    /// Forward a client event without showing it locally.
    pub fn forward_only(&self, record: LogRecord, settings: &Settings) -> bool {
        self.forwarder.forward(record, settings.forward_client_events)
    }

    pub fn clear_live(&mut self) {
        self.pipeline.clear_live();
        self.refresh_views();
    }

    pub fn clear_errors(&mut self) {
        self.pipeline.clear_errors();
        self.refresh_views();
    }

    pub fn refresh_views(&mut self) {
        self.coordinator
            .refresh(&mut self.live_view, ViewKind::Live, self.pipeline.live().items());
        self.coordinator
            .refresh(&mut self.error_view, ViewKind::Errors, self.pipeline.errors().items());
    }

    pub fn export(&self, kind: ViewKind) -> String {
        match kind {
            ViewKind::Live => export_text(self.pipeline.live().items()),
            ViewKind::Errors => export_text(self.pipeline.errors().items()),
        }
    }

    /// Latest scroll measurements reported by the UI for one view.
    pub fn set_scroll_metrics(&mut self, kind: ViewKind, metrics: ScrollMetrics) {
        match kind {
            ViewKind::Live => self.live_view.metrics = metrics,
            ViewKind::Errors => self.error_view.metrics = metrics,
        }
    }

    pub fn view(&self, kind: ViewKind) -> &ViewPane {
        match kind {
            ViewKind::Live => &self.live_view,
            ViewKind::Errors => &self.error_view,
        }
    }

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    pub fn scheduler(&self) -> &PollScheduler<T> {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;
    use crate::scheduler::TokioTicker;

    fn console(settings: &Settings) -> LogConsole<TokioTicker> {
        LogConsole::new(
            PollScheduler::new(TokioTicker),
            EventForwarder::disabled(),
            settings,
        )
    }

    fn rec(ts: &str, level: LogLevel, event: &str) -> LogRecord {
        LogRecord::new(ts, level, "", event)
    }

    #[test]
    fn starts_with_placeholders() {
        let console = console(&Settings::default());
        assert!(console.view(ViewKind::Live).lines[0].placeholder);
        assert!(console.view(ViewKind::Errors).lines[0].placeholder);
    }

    #[test]
    fn batch_updates_both_views_once() {
        let settings = Settings::default();
        let mut console = console(&settings);
        let before = console.view(ViewKind::Errors).scroll_requests;

        let summary = console.on_batch(
            vec![
                rec("t1", LogLevel::Info, "a"),
                rec("t1", LogLevel::Info, "a"),
                rec("t2", LogLevel::Error, "b"),
            ],
            &settings,
        );

        assert_eq!(summary.admitted, 2);
        let live: Vec<_> = console
            .view(ViewKind::Live)
            .lines
            .iter()
            .map(|l| l.text.clone())
            .collect();
        assert_eq!(live, vec!["t1 INFO a", "t2 ERROR b"]);
        assert_eq!(console.view(ViewKind::Errors).lines.len(), 1);
        assert_eq!(console.view(ViewKind::Errors).scroll_requests, before + 1);
    }

    #[test]
    fn error_capacity_follows_settings() {
        let mut settings = Settings::default();
        let mut console = console(&settings);
        settings.max_error_capacity = 5;
        let batch = (0..8).map(|i| rec(&i.to_string(), LogLevel::Error, "e")).collect();
        console.on_batch(batch, &settings);
        assert_eq!(console.pipeline().errors().len(), 5);
        assert_eq!(console.export(ViewKind::Errors).lines().next(), Some("3 ERROR e"));
    }

    #[test]
    fn scrolled_up_live_view_is_not_pinned() {
        let settings = Settings::default();
        let mut console = console(&settings);
        console.set_scroll_metrics(
            ViewKind::Live,
            ScrollMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                client_height: 300.0,
            },
        );
        let before = console.view(ViewKind::Live).scroll_requests;
        console.on_batch(vec![rec("t1", LogLevel::Info, "a")], &settings);
        assert_eq!(console.view(ViewKind::Live).scroll_requests, before);
    }

    #[test]
    fn clears_redraw_views() {
        let settings = Settings::default();
        let mut console = console(&settings);
        console.on_batch(vec![rec("t1", LogLevel::Error, "x")], &settings);

        console.clear_errors();
        assert!(console.view(ViewKind::Errors).lines[0].placeholder);
        assert_eq!(console.export(ViewKind::Errors), "");

        console.clear_live();
        assert!(console.view(ViewKind::Live).lines[0].placeholder);
        console.on_batch(vec![rec("t1", LogLevel::Error, "x")], &settings);
        assert_eq!(console.pipeline().live().len(), 1);
    }

    #[test]
    fn client_events_are_ingested_and_forwarded_when_enabled() {
        let settings = Settings {
            forward_client_events: true,
            ..Settings::default()
        };
        let (forwarder, mut rx) = EventForwarder::channel();
        let mut console = LogConsole::new(PollScheduler::new(TokioTicker), forwarder, &settings);

        let outcome =
            console.record_client_event(rec("t5", LogLevel::Error, "ui.fault"), &settings);
        assert_eq!(outcome, IngestOutcome::LiveAndErrors);
        assert_eq!(rx.try_recv().unwrap().event, "ui.fault");
    }
}
