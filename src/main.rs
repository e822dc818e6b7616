#![allow(non_snake_case)]

mod actions;
mod api;
mod buffer;
mod console;
mod dedupe;
mod error;
mod events;
mod journal;
mod model;
mod pipeline;
mod render;
mod scheduler;
mod settings;
mod status;

use std::rc::Rc;

use dioxus::prelude::*;

use actions::{UserAction, clear_view, dispatch, export_view};
use api::{ServerLogSource, record_client_event};
use console::LogConsole;
use error::ConsoleError;
use events::{EventForwarder, fault_record, run_forwarder};
use model::LogRecord;
use render::{ScrollMetrics, ViewKind};
use scheduler::{PollScheduler, StartOutcome};
use settings::Settings;
use status::Status;

// ============================================================================
// Entry & root component
// ============================================================================

fn main() {
    #[cfg(feature = "server")]
    dotenvy::dotenv().ok();

    let level = option_env!("LOG_CONSOLE_LOG_LEVEL")
        .and_then(|v| v.parse().ok())
        .unwrap_or(tracing::Level::INFO);
    if let Err(err) = dioxus::logger::init(level) {
        eprintln!("logger already initialised: {}", err);
    }
    dioxus::launch(App);
}

/// Status collaborator writing into the status line signal.
fn status_reporter(line: Signal<Option<Status>>) -> impl Fn(Status) + Copy + 'static {
    move |status: Status| {
        let mut line = line;
        line.set(Some(status));
    }
}

#[component]
fn App() -> Element {
    let defaults = use_hook(Settings::default);
    let mut tail_input = use_signal(|| defaults.tail.to_string());
    let mut interval_input = use_signal(|| defaults.interval_ms.to_string());
    let mut max_errors_input = use_signal(|| defaults.max_error_capacity.to_string());
    let mut forward_events = use_signal(|| defaults.forward_client_events);
    let status_line = use_signal(|| None::<Status>);
    let mut running = use_signal(|| false);

    // Fresh snapshot from the settings fields; read by every poll cycle.
    let settings = move || {
        Settings::from_inputs(
            &tail_input.peek(),
            &interval_input.peek(),
            &max_errors_input.peek(),
            *forward_events.peek(),
        )
    };
    let report = status_reporter(status_line);

    let forwarder = use_hook(|| {
        let (forwarder, rx) = EventForwarder::channel();
        spawn(run_forwarder(rx, |record: LogRecord| record_client_event(record)));
        forwarder
    });
    let mut console = use_signal(|| {
        LogConsole::new(PollScheduler::default(), forwarder.clone(), &settings())
    });

    let mut start_polling = move || {
        let current = settings();
        let mut target = console;
        let on_batch = move |records: Vec<LogRecord>| {
            let snapshot = settings();
            target.write().on_batch(records, &snapshot);
        };
        let outcome = dispatch(&mut *console.write(), UserAction::Start, &current, &report, |c| {
            match c.scheduler().start(settings, ServerLogSource, report, on_batch) {
                StartOutcome::Started(poll) => {
                    spawn(poll);
                    Ok("Polling started.".to_string())
                }
                StartOutcome::AlreadyRunning => Ok("Already running.".to_string()),
            }
        });
        if outcome.is_ok() {
            running.set(console.peek().scheduler().is_running());
        }
    };

    let mut stop_polling = move || {
        let current = settings();
        let outcome = dispatch(
            &mut *console.write(),
            UserAction::Stop,
            &current,
            &report,
            actions::stop_polling,
        );
        if outcome.is_ok() {
            running.set(console.peek().scheduler().is_running());
        }
    };

    let mut clear = move |kind: ViewKind| {
        let current = settings();
        let action = UserAction::clear(kind);
        if let Err(err) =
            dispatch(&mut *console.write(), action, &current, &report, |c| clear_view(c, kind))
        {
            tracing::debug!(%err, action = action.name(), "clear rejected");
        }
    };

    let mut copy = move |kind: ViewKind| {
        let current = settings();
        let action = UserAction::copy(kind);
        let mut text = String::new();
        let outcome = dispatch(&mut *console.write(), action, &current, &report, |c| {
            text = export_view(c, kind)?;
            Ok(format!("Copied {} lines.", text.lines().count()))
        });
        if outcome.is_err() {
            return;
        }
        spawn(async move {
            if let Err(err) = write_clipboard(&text).await {
                report(Status::Text(err.to_string()));
                let snapshot = settings();
                let fault = fault_record(err.to_string(), chrono::Utc::now());
                console.write().record_client_event(fault, &snapshot);
            }
        });
    };

    // Poll from page load.
    use_effect(move || start_polling());

    let is_running = running();
    let status_text = status_line.read().as_ref().map(|s| s.render());

    rsx! {
        document::Stylesheet { href: asset!("/assets/styles.css") }

        div { class: "console min-h-screen",
            nav { class: "nav-console px-6 py-4",
                div { class: "flex items-center justify-between flex-wrap gap-3",
                    div { class: "flex items-center gap-4",
                        h1 { class: "text-2xl font-bold", "Log Console" }
                        div { class: if is_running { "live-indicator" } else { "live-indicator paused" },
                            span { class: "live-dot" }
                            span { class: "text-sm", if is_running { "Live" } else { "Paused" } }
                        }
                    }
                    div { class: "flex items-center gap-3",
                        button {
                            class: "btn",
                            disabled: is_running,
                            onclick: move |_| start_polling(),
                            "Start"
                        }
                        button {
                            class: "btn",
                            disabled: !is_running,
                            onclick: move |_| stop_polling(),
                            "Stop"
                        }
                    }
                }
            }

            div { class: "settings-bar px-6 py-3 flex flex-wrap items-center gap-4",
                SettingField {
                    label: "Tail",
                    value: tail_input(),
                    oninput: move |v: String| tail_input.set(v)
                }
                SettingField {
                    label: "Interval (ms)",
                    value: interval_input(),
                    oninput: move |v: String| interval_input.set(v)
                }
                SettingField {
                    label: "Error vault size",
                    value: max_errors_input(),
                    oninput: move |v: String| max_errors_input.set(v)
                }
                label { class: "text-sm flex items-center gap-2",
                    input {
                        r#type: "checkbox",
                        checked: forward_events(),
                        onchange: move |evt| forward_events.set(evt.checked())
                    }
                    "Forward client events"
                }
            }

            {if let Some(text) = status_text {
                rsx! { pre { class: "status-line px-6 py-2 text-sm", "{text}" } }
            } else {
                rsx! { }
            }}

            div { class: "panes px-6 py-4",
                LogPane {
                    title: "Live feed",
                    kind: ViewKind::Live,
                    console,
                    on_clear: move |_| clear(ViewKind::Live),
                    on_copy: move |_| copy(ViewKind::Live),
                }
                LogPane {
                    title: "Error vault",
                    kind: ViewKind::Errors,
                    console,
                    on_clear: move |_| clear(ViewKind::Errors),
                    on_copy: move |_| copy(ViewKind::Errors),
                }
            }
        }
    }
}

#[component]
fn SettingField(label: String, value: String, oninput: EventHandler<String>) -> Element {
    rsx! {
        label { class: "text-sm flex items-center gap-2",
            "{label}"
            input {
                r#type: "number",
                class: "setting-input",
                value: "{value}",
                oninput: move |evt| oninput.call(evt.value())
            }
        }
    }
}

#[component]
fn LogPane(
    title: String,
    kind: ViewKind,
    console: Signal<LogConsole>,
    on_clear: EventHandler<MouseEvent>,
    on_copy: EventHandler<MouseEvent>,
) -> Element {
    let mut container = use_signal(|| None::<Rc<MountedData>>);
    let mut bottom = use_signal(|| None::<Rc<MountedData>>);
    let pane = console.read().view(kind).clone();

    // Honour each new scroll-to-bottom request once the redraw is on screen.
    use_effect(use_reactive((&pane.scroll_requests,), move |(_requests,)| {
        spawn(async move {
            let target = bottom.peek().clone();
            if let Some(target) = target {
                if let Err(err) = target.scroll_to(ScrollBehavior::Instant).await {
                    tracing::debug!(?err, "scroll to bottom failed");
                }
            }
            remeasure(container, console, kind).await;
        });
    }));

    rsx! {
        section { class: "log-pane card",
            div { class: "flex items-center justify-between mb-2",
                h2 { class: "text-lg font-semibold", "{title}" }
                div { class: "flex gap-2",
                    button { class: "btn btn-small", onclick: move |evt| on_copy.call(evt), "Copy" }
                    button { class: "btn btn-small", onclick: move |evt| on_clear.call(evt), "Clear" }
                }
            }
            div {
                class: "log-lines font-mono text-xs",
                onmounted: move |evt| container.set(Some(evt.data())),
                onscroll: move |_| remeasure(container, console, kind),
                for (idx, line) in pane.lines.iter().enumerate() {
                    div {
                        key: "{idx}",
                        class: if line.placeholder { "log-line placeholder" } else { "log-line" },
                        span { class: "{line.level_class}", "{line.text}" }
                    }
                }
                div { onmounted: move |evt| bottom.set(Some(evt.data())) }
            }
        }
    }
}

/// Read the container's scroll position back into the console.
async fn remeasure(
    container: Signal<Option<Rc<MountedData>>>,
    mut console: Signal<LogConsole>,
    kind: ViewKind,
) {
    let Some(el) = container.peek().clone() else {
        return;
    };
    let (Ok(offset), Ok(size), Ok(rect)) = (
        el.get_scroll_offset().await,
        el.get_scroll_size().await,
        el.get_client_rect().await,
    ) else {
        return;
    };
    console.write().set_scroll_metrics(
        kind,
        ScrollMetrics {
            scroll_top: offset.y,
            scroll_height: size.height,
            client_height: rect.size.height,
        },
    );
}

async fn write_clipboard(text: &str) -> Result<(), ConsoleError> {
    let payload =
        serde_json::to_string(text).map_err(|e| ConsoleError::Clipboard(e.to_string()))?;
    document::eval(&format!(
        "await navigator.clipboard.writeText({}); return true;",
        payload
    ))
    .join::<bool>()
    .await
    .map(|_| ())
    .map_err(|e| ConsoleError::Clipboard(format!("{:?}", e)))
}
