//! Error classification and rate-limited notifications for guestbook kiosks
//!
//! Device errors pushed by the kiosk backend and errors reported by the
//! application are classified, rate-limited per source and severity, and
//! surfaced as a feedback cue plus a status banner. Every occurrence is
//! forwarded to a logging sink.

pub mod bridge;
pub mod classifier;
pub mod config;
pub mod context;
pub mod cues;
pub mod display;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod notifier;
pub mod sink;

pub use bridge::{dispatch, parse_event, run_event_loop, AppErrorPayload, BridgeEvent, EventStats};
pub use classifier::{classify, classify_severity, classify_source};
pub use config::*;
pub use context::{ErrorContext, ErrorSource, Severity, SuppressionKey};
pub use cues::{Cue, CuePlan, CuePlayer, SilentCuePlayer, SystemCuePlayer};
pub use display::{Banner, BannerKind, ConsoleIndicator, DesktopIndicator, StatusBoard, StatusIndicator};
pub use error::{CueError, NotifierError, Result, SinkError};
pub use limiter::{Decision, RateLimiter, SuppressionState};
pub use notifier::ErrorNotifier;
pub use sink::{FileLogSink, HttpLogSink, LogRecord, LogSink, NullSink};
