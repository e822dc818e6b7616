//! Dispatch boundary for user-triggered actions.
//!
//! Every action is timed and its outcome is reported to the status line and to
//! the client-event log. A failure stops only that action: it is recorded as an
//! ERROR client event (so it shows up in the error vault) and returned.

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::console::LogConsole;
use crate::error::ConsoleError;
use crate::events::{ClientEvent, Outcome};
use crate::render::ViewKind;
use crate::scheduler::{StopOutcome, Ticker};
use crate::settings::Settings;
use crate::status::{Status, StatusSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Start,
    Stop,
    ClearLive,
    ClearErrors,
    CopyLive,
    CopyErrors,
}

impl UserAction {
    pub fn name(&self) -> &'static str {
        match self {
            UserAction::Start => "start",
            UserAction::Stop => "stop",
            UserAction::ClearLive => "clear_live",
            UserAction::ClearErrors => "clear_errors",
            UserAction::CopyLive => "copy_live",
            UserAction::CopyErrors => "copy_errors",
        }
    }

    pub fn clear(kind: ViewKind) -> Self {
        match kind {
            ViewKind::Live => UserAction::ClearLive,
            ViewKind::Errors => UserAction::ClearErrors,
        }
    }

    pub fn copy(kind: ViewKind) -> Self {
        match kind {
            ViewKind::Live => UserAction::CopyLive,
            ViewKind::Errors => UserAction::CopyErrors,
        }
    }
}

pub fn stop_polling<T: Ticker>(console: &mut LogConsole<T>) -> Result<String, ConsoleError> {
    Ok(match console.scheduler().stop() {
        StopOutcome::Stopped => "Polling stopped.".to_string(),
        StopOutcome::NotRunning => "Not running.".to_string(),
    })
}

pub fn clear_view<T: Ticker>(
    console: &mut LogConsole<T>,
    kind: ViewKind,
) -> Result<String, ConsoleError> {
    match kind {
        ViewKind::Live => {
            console.clear_live();
            Ok("Live feed cleared.".to_string())
        }
        ViewKind::Errors => {
            console.clear_errors();
            Ok("Error vault cleared.".to_string())
        }
    }
}

/// Text of one view for the clipboard. An empty buffer fails the copy.
pub fn export_view<T: Ticker>(
    console: &LogConsole<T>,
    kind: ViewKind,
) -> Result<String, ConsoleError> {
    let text = console.export(kind);
    if text.is_empty() {
        return Err(ConsoleError::Action {
            action: UserAction::copy(kind).name().to_string(),
            message: "nothing to copy".to_string(),
        });
    }
    Ok(text)
}

/// Run `op` against the console. `Ok` carries the confirmation shown to the user.
pub fn dispatch<T, S, F>(
    console: &mut LogConsole<T>,
    action: UserAction,
    settings: &Settings,
    status: &S,
    op: F,
) -> Result<String, ConsoleError>
where
    T: Ticker,
    S: StatusSink,
    F: FnOnce(&mut LogConsole<T>) -> Result<String, ConsoleError>,
{
    let started = Utc::now();
    let result = op(console);
    let finished = Utc::now();
    let duration_ms = (finished - started).num_milliseconds();

    match &result {
        Ok(confirmation) => {
            status.report(Status::Text(confirmation.clone()));
            let record = ClientEvent {
                action: action.name().to_string(),
                outcome: Outcome::Ok,
                duration_ms,
                message: None,
            }
            .into_record(finished);
            console.forward_only(record, settings);
        }
        Err(err) => {
            warn!(action = action.name(), %err, duration_ms, "action failed");
            status.report(Status::Structured(json!({
                "action": action.name(),
                "outcome": "failed",
                "durationMs": duration_ms,
                "message": err.to_string(),
            })));
            let record = ClientEvent {
                action: action.name().to_string(),
                outcome: Outcome::Failed,
                duration_ms,
                message: Some(err.to_string()),
            }
            .into_record(finished);
            console.record_client_event(record, settings);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventForwarder;
    use crate::model::{LogLevel, LogRecord};
    use crate::scheduler::{PollScheduler, StartOutcome, TokioTicker};
    use futures::channel::mpsc::UnboundedReceiver;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn setup(settings: &Settings) -> (LogConsole<TokioTicker>, UnboundedReceiver<LogRecord>) {
        let (forwarder, rx) = EventForwarder::channel();
        (
            LogConsole::new(PollScheduler::new(TokioTicker), forwarder, settings),
            rx,
        )
    }

    #[test]
    fn success_reports_confirmation_and_leaves_buffers_alone() {
        let settings = Settings::default();
        let (mut console, _rx) = setup(&settings);
        console.on_batch(vec![LogRecord::new("t1", LogLevel::Info, "", "a")], &settings);

        let seen = RefCell::new(Vec::new());
        let status = |s: Status| seen.borrow_mut().push(s);
        let result = dispatch(&mut console, UserAction::ClearLive, &settings, &status, |c| {
            c.clear_live();
            Ok("Live feed cleared.".to_string())
        });

        assert_eq!(result, Ok("Live feed cleared.".to_string()));
        assert_eq!(*seen.borrow(), vec![Status::Text("Live feed cleared.".into())]);
        assert!(console.pipeline().live().is_empty());
    }

    #[test]
    fn failure_is_reported_recorded_and_returned() {
        let settings = Settings {
            forward_client_events: true,
            ..Settings::default()
        };
        let (mut console, mut rx) = setup(&settings);

        let seen = RefCell::new(Vec::new());
        let status = |s: Status| seen.borrow_mut().push(s);
        let result = dispatch(&mut console, UserAction::CopyErrors, &settings, &status, |_| {
            Err(ConsoleError::Clipboard("permission denied".into()))
        });

        assert_eq!(
            result,
            Err(ConsoleError::Clipboard("permission denied".into()))
        );
        let Status::Structured(payload) = &seen.borrow()[0] else {
            panic!("expected structured status");
        };
        assert_eq!(payload["action"], "copy_errors");
        assert_eq!(payload["outcome"], "failed");

        let vault = console.export(ViewKind::Errors);
        assert!(vault.contains("action=copy_errors reason=failed"));
        assert!(vault.contains("message=clipboard write failed: permission denied"));

        let forwarded = rx.try_recv().unwrap();
        assert_eq!(forwarded.action.as_deref(), Some("copy_errors"));
    }

    #[test]
    fn successful_actions_are_only_forwarded() {
        let settings = Settings {
            forward_client_events: true,
            ..Settings::default()
        };
        let (mut console, mut rx) = setup(&settings);
        let status = |_: Status| {};
        dispatch(&mut console, UserAction::Stop, &settings, &status, |_| {
            Ok("Polling stopped.".into())
        })
        .unwrap();

        assert!(console.pipeline().live().is_empty());
        let forwarded = rx.try_recv().unwrap();
        assert_eq!(forwarded.reason.as_deref(), Some("ok"));
        assert_eq!(forwarded.level, LogLevel::Info);
    }

    #[test]
    fn clear_and_stop_ops_confirm() {
        let settings = Settings::default();
        let (mut console, _rx) = setup(&settings);
        console.on_batch(vec![LogRecord::new("t1", LogLevel::Error, "", "x")], &settings);

        let status = |_: Status| {};
        let action = UserAction::clear(ViewKind::Errors);
        let result = dispatch(&mut console, action, &settings, &status, |c| {
            clear_view(c, ViewKind::Errors)
        });
        assert_eq!(result, Ok("Error vault cleared.".to_string()));
        assert!(console.pipeline().errors().is_empty());
        assert_eq!(console.pipeline().live().len(), 1);

        let result = dispatch(&mut console, UserAction::Stop, &settings, &status, stop_polling);
        assert_eq!(result, Ok("Not running.".to_string()));
    }

    #[test]
    fn copying_an_empty_view_fails_into_the_vault() {
        let settings = Settings::default();
        let (mut console, _rx) = setup(&settings);

        let status = |_: Status| {};
        let action = UserAction::copy(ViewKind::Live);
        let result = dispatch(&mut console, action, &settings, &status, |c| {
            export_view(c, ViewKind::Live).map(|text| text.lines().count().to_string())
        });

        assert_eq!(
            result,
            Err(ConsoleError::Action {
                action: "copy_live".into(),
                message: "nothing to copy".into(),
            })
        );
        assert!(console.export(ViewKind::Errors).contains("action=copy_live reason=failed"));
        let copied = export_view(&console, ViewKind::Live).unwrap();
        assert!(copied.contains("ui.action"));
    }

    #[tokio::test(start_paused = true)]
    async fn started_loop_feeds_the_console_it_was_dispatched_on() {
        let settings = Settings::default();
        let (console, _rx) = setup(&settings);
        let console = Rc::new(RefCell::new(console));

        // The batch continuation holds its own handle, built before the
        // dispatch borrow is taken.
        let target = Rc::clone(&console);
        let on_batch = move |records: Vec<LogRecord>| {
            target.borrow_mut().on_batch(records, &Settings::default());
        };
        let source = |_tail: usize| async {
            Ok::<_, ConsoleError>(vec![LogRecord::new("t1", LogLevel::Error, "", "boom")])
        };
        let status = |_: Status| {};

        let mut poll = None;
        let start = |c: &mut LogConsole<TokioTicker>| {
            match c.scheduler().start(settings.clone(), source, status, on_batch) {
                StartOutcome::Started(fut) => {
                    poll = Some(fut);
                    Ok("Polling started.".to_string())
                }
                StartOutcome::AlreadyRunning => Ok("Already running.".to_string()),
            }
        };
        let result = dispatch(
            &mut *console.borrow_mut(),
            UserAction::Start,
            &settings,
            &status,
            start,
        );
        assert_eq!(result, Ok("Polling started.".to_string()));

        let poll = poll.expect("loop future");
        let _ = tokio::time::timeout(Duration::from_millis(10), poll).await;

        assert!(console.borrow().scheduler().is_running());
        assert_eq!(console.borrow().pipeline().errors().len(), 1);
        assert!(console.borrow().export(ViewKind::Live).contains("boom"));
    }
}
