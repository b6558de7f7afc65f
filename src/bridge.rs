//! Backend event bridge
//!
//! The device backend pushes events as JSON lines:
//!
//! ```text
//! {"event": "hid-error", "payload": "Scanner disconnected"}
//! {"event": "hid-data", "payload": "0012345678"}
//! {"event": "app-error", "payload": {"source": "network", "message": "Server unreachable", "severity": "high"}}
//! {"event": "reset"}
//! ```
//!
//! Each line is decoded and dispatched to the shared `ErrorNotifier`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::context::{ErrorSource, Severity};
use crate::error::Result;
use crate::notifier::ErrorNotifier;

/// Payload of an `app-error` event
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppErrorPayload {
    pub source: ErrorSource,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

/// Events understood by the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    HidError(String),
    HidData(String),
    AppError(AppErrorPayload),
    Reset,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    payload: Value,
}

fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode one line. Unknown event names yield `Ok(None)`.
pub fn parse_event(line: &str) -> Result<Option<BridgeEvent>> {
    let raw: RawEvent = serde_json::from_str(line)?;

    let event = match raw.event.as_str() {
        "hid-error" => BridgeEvent::HidError(payload_text(raw.payload)),
        "hid-data" => BridgeEvent::HidData(payload_text(raw.payload)),
        "app-error" => BridgeEvent::AppError(serde_json::from_value(raw.payload)?),
        "reset" => BridgeEvent::Reset,
        other => {
            crate::debug_context!("Bridge", "Ignoring unknown event: {}", other);
            return Ok(None);
        }
    };

    Ok(Some(event))
}

/// Route one event to the notifier
pub fn dispatch(notifier: &ErrorNotifier, event: BridgeEvent) {
    match event {
        BridgeEvent::HidError(message) => {
            notifier.handle_hid_error(&message);
        }
        BridgeEvent::HidData(data) => {
            notifier.handle_hid_data(&data);
        }
        BridgeEvent::AppError(payload) => {
            notifier.handle_application_error(payload.source, &payload.message, payload.severity);
        }
        BridgeEvent::Reset => notifier.reset_error_counts(),
    }
}

/// Counters for one run of the event loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventStats {
    pub dispatched: usize,
    pub ignored: usize,
    pub malformed: usize,
}

/// Read events until EOF, dispatching each one. Malformed lines are logged
/// and skipped.
pub async fn run_event_loop<R>(reader: R, notifier: Arc<ErrorNotifier>) -> Result<EventStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = EventStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_event(line) {
            Ok(Some(event)) => {
                crate::debug_context!("Bridge", "Dispatching {:?}", event);
                dispatch(&notifier, event);
                stats.dispatched += 1;
            }
            Ok(None) => stats.ignored += 1,
            Err(e) => {
                tracing::warn!("Skipping malformed event line: {}", e);
                stats.malformed += 1;
            }
        }
    }

    tracing::info!(
        "Event stream closed ({} dispatched, {} ignored, {} malformed)",
        stats.dispatched,
        stats.ignored,
        stats.malformed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::cues::SilentCuePlayer;
    use crate::display::{Banner, StatusBoard, StatusIndicator};
    use crate::sink::NullSink;

    #[test]
    fn test_parse_hid_error() {
        let event = parse_event(r#"{"event": "hid-error", "payload": "Scanner disconnected"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, BridgeEvent::HidError("Scanner disconnected".to_string()));
    }

    #[test]
    fn test_parse_app_error_default_severity() {
        let event = parse_event(
            r#"{"event": "app-error", "payload": {"source": "magtek", "message": "Bad card"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            event,
            BridgeEvent::AppError(AppErrorPayload {
                source: ErrorSource::Magstripe,
                message: "Bad card".to_string(),
                severity: Severity::Medium,
            })
        );
    }

    #[test]
    fn test_parse_reset_and_unknown() {
        assert_eq!(
            parse_event(r#"{"event": "reset"}"#).unwrap(),
            Some(BridgeEvent::Reset)
        );
        assert_eq!(
            parse_event(r#"{"event": "magtek-data", "payload": {"name": "A"}}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_event("not json").is_err());
        assert!(parse_event(r#"{"payload": "x"}"#).is_err());
        assert!(parse_event(r#"{"event": "app-error", "payload": {"source": "printer", "message": "x"}}"#).is_err());
    }

    #[test]
    fn test_non_string_payload_is_stringified() {
        let event = parse_event(r#"{"event": "hid-data", "payload": 42}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, BridgeEvent::HidData("42".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_loop_dispatches_lines() {
        let config = AppConfig::default();
        let board = Arc::new(StatusBoard::new(Banner::idle(&config)));
        let notifier = Arc::new(ErrorNotifier::new(
            &config,
            Arc::new(SilentCuePlayer),
            board.clone(),
            Arc::new(NullSink),
        ));

        let input = concat!(
            "{\"event\": \"hid-error\", \"payload\": \"Barcode scanner read failed\"}\n",
            "\n",
            "{\"event\": \"hid-error\", \"payload\": \"Barcode scanner read failed\"}\n",
            "{\"event\": \"something-else\"}\n",
            "garbage\n",
            "{\"event\": \"reset\"}\n",
        );

        let stats = run_event_loop(input.as_bytes(), notifier.clone())
            .await
            .unwrap();
        assert_eq!(
            stats,
            EventStats {
                dispatched: 3,
                ignored: 1,
                malformed: 1,
            }
        );
        assert!(board.current().is_error());
        assert!(!notifier.is_error_suppressed(ErrorSource::Barcode, Severity::High));

        notifier.flush(std::time::Duration::from_secs(10)).await;
        assert!(!board.current().is_error());
    }
}
