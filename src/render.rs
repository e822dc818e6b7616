//! Full-redraw rendering of a buffer into a view, with bottom-pinning.
//!
//! The live feed only follows new records when the reader is already near the
//! bottom, so scrolling back through history is not interrupted. The error
//! vault is an alert tray and always snaps to the newest entry.

use crate::model::LogRecord;

/// Distance from the bottom (in px) that still counts as "following".
pub const PIN_THRESHOLD_PX: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Live,
    Errors,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }

    pub fn is_near_bottom(&self, threshold_px: f64) -> bool {
        self.distance_from_bottom() <= threshold_px
    }
}

/// A render target with its own scroll position.
pub trait LineView {
    type Line;

    fn scroll_metrics(&self) -> ScrollMetrics;
    fn clear_view(&mut self);
    fn append_line(&mut self, line: Self::Line);
    fn scroll_to_bottom(&mut self);
}

/// Per-line render collaborator.
pub trait LineRenderer {
    type Line;

    fn render_line(&self, record: &LogRecord) -> Self::Line;
    /// Shown instead of an empty view, so "no data yet" differs from "nothing rendered".
    fn placeholder(&self, kind: ViewKind) -> Self::Line;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub text: String,
    pub level_class: &'static str,
    pub placeholder: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl LineRenderer for TextRenderer {
    type Line = RenderedLine;

    fn render_line(&self, record: &LogRecord) -> RenderedLine {
        RenderedLine {
            text: format_line(record),
            level_class: record.level.display_class(),
            placeholder: false,
        }
    }

    fn placeholder(&self, kind: ViewKind) -> RenderedLine {
        let text = match kind {
            ViewKind::Live => "No log records yet.",
            ViewKind::Errors => "No errors captured.",
        };
        RenderedLine {
            text: text.to_string(),
            level_class: "line-placeholder",
            placeholder: true,
        }
    }
}

/// `timestamp LEVEL [category] event key=value ...`, followed by the
/// exception text and stack trace on their own lines when present.
pub fn format_line(record: &LogRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !record.timestamp.is_empty() {
        parts.push(record.timestamp.clone());
    }
    parts.push(record.level.as_str().to_string());
    if !record.category.is_empty() {
        parts.push(format!("[{}]", record.category));
    }
    if !record.event.is_empty() {
        parts.push(record.event.clone());
    }
    for (k, v) in record.context_pairs() {
        parts.push(format!("{}={}", k, v));
    }
    if let Some(msg) = record.message.as_deref().filter(|m| *m != record.event) {
        parts.push(format!("message={}", msg));
    }

    let mut line = parts.join(" ");
    for extra in [&record.exception_text, &record.stack_trace].into_iter().flatten() {
        line.push('\n');
        line.push_str(extra);
    }
    line
}

/// Newline-joined text of a buffer, oldest first (used by the copy actions).
pub fn export_text<'a>(items: impl IntoIterator<Item = &'a LogRecord>) -> String {
    items.into_iter().map(format_line).collect::<Vec<_>>().join("\n")
}

/// In-memory view state the UI draws from.
///
/// `scroll_requests` increments on every scroll-to-bottom so the UI can tell a
/// new request from one it already honoured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewPane {
    pub lines: Vec<RenderedLine>,
    pub metrics: ScrollMetrics,
    pub scroll_requests: u64,
}

impl LineView for ViewPane {
    type Line = RenderedLine;

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    fn clear_view(&mut self) {
        self.lines.clear();
    }

    fn append_line(&mut self, line: RenderedLine) {
        self.lines.push(line);
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_requests += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub lines: usize,
    pub pinned: bool,
}

#[derive(Debug, Clone)]
pub struct RenderCoordinator<R = TextRenderer> {
    renderer: R,
    threshold_px: f64,
}

impl Default for RenderCoordinator {
    fn default() -> Self {
        Self::new(TextRenderer)
    }
}

impl<R: LineRenderer> RenderCoordinator<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            threshold_px: PIN_THRESHOLD_PX,
        }
    }

    /// Redraw `view` from `items`. Pinning is decided before the view changes.
    pub fn refresh<'a, V>(
        &self,
        view: &mut V,
        kind: ViewKind,
        items: impl IntoIterator<Item = &'a LogRecord>,
    ) -> RefreshReport
    where
        V: LineView<Line = R::Line>,
    {
        let pinned = match kind {
            ViewKind::Live => view.scroll_metrics().is_near_bottom(self.threshold_px),
            ViewKind::Errors => true,
        };

        view.clear_view();
        let mut lines = 0;
        for record in items {
            view.append_line(self.renderer.render_line(record));
            lines += 1;
        }
        if lines == 0 {
            view.append_line(self.renderer.placeholder(kind));
        }

        if pinned {
            view.scroll_to_bottom();
        }
        RefreshReport { lines, pinned }
    }
}
