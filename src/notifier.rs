//! Error notifier
//!
//! `ErrorNotifier` ties the pieces together. Every occurrence is logged
//! locally and forwarded to the log sink; the rate limiter then decides
//! whether the kiosk should beep and show a banner. One instance is built at
//! startup and shared as `Arc<ErrorNotifier>` with everything that reports
//! errors.
//!
//! Handlers are synchronous and must be called from inside a Tokio runtime:
//! sink delivery, the second critical cue and the banner revert run as
//! background tasks.

use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::classifier;
use crate::config::AppConfig;
use crate::context::{ErrorContext, ErrorSource, Severity};
use crate::cues::{build_player, Cue, CuePlan, CuePlayer};
use crate::display::{build_indicator, Banner, StatusIndicator};
use crate::error::Result;
use crate::limiter::{Decision, RateLimiter};
use crate::sink::{build_sink, LogRecord, LogSink};

pub struct ErrorNotifier {
    limiter: Mutex<RateLimiter>,
    cues: Arc<dyn CuePlayer>,
    indicator: Arc<dyn StatusIndicator>,
    sink: Arc<dyn LogSink>,
    idle_banner: Banner,
    banner_revert: Duration,
    critical_cue_gap: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ErrorNotifier {
    pub fn new(
        config: &AppConfig,
        cues: Arc<dyn CuePlayer>,
        indicator: Arc<dyn StatusIndicator>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            limiter: Mutex::new(RateLimiter::new(
                config.max_before_silent,
                config.cooldown(),
            )),
            cues,
            indicator,
            sink,
            idle_banner: Banner::idle(config),
            banner_revert: config.banner_revert(),
            critical_cue_gap: config.critical_cue_gap(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Build a notifier with the cue player, indicator and sink named in
    /// the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sink = build_sink(&config.sink)?;
        crate::debug_context!("ErrorNotifier", "Using {} log sink", sink.name());

        Ok(Self::new(
            config,
            Arc::from(build_player(&config.cues)),
            Arc::from(build_indicator(config)),
            Arc::from(sink),
        ))
    }

    /// Handle raw error text pushed by the device backend (`hid-error`)
    pub fn handle_hid_error(&self, raw: &str) -> Decision {
        self.handle_error(classifier::context_from_raw(raw))
    }

    /// Report an error with a known source and severity
    pub fn handle_application_error(
        &self,
        source: ErrorSource,
        message: &str,
        severity: Severity,
    ) -> Decision {
        self.handle_error(ErrorContext::new(source, severity, message, true))
    }

    /// Inspect raw scanner data (`hid-data`). Data that looks like a device
    /// error, or is too short to be a card number, is logged as a low
    /// severity barcode error without any cue or banner. Returns whether the
    /// data was flagged.
    pub fn handle_hid_data(&self, data: &str) -> bool {
        let suspicious =
            data.contains("ERROR") || data.contains("FAIL") || data.chars().count() < 3;
        if !suspicious {
            return false;
        }

        let context = ErrorContext::new(
            ErrorSource::Barcode,
            Severity::Low,
            format!("Invalid HID data received: {}", data),
            false,
        );
        self.log_error(&context);
        true
    }

    /// Log, rate-limit and (when allowed) surface one error occurrence
    pub fn handle_error(&self, context: ErrorContext) -> Decision {
        self.log_error(&context);

        let decision = self
            .limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check(&context, Instant::now());

        match decision {
            Decision::Allow => {
                self.play_cues(CuePlan::for_context(&context));
                self.update_display(&context);
            }
            Decision::Silenced => {
                tracing::warn!(
                    "Suppressing {} error notifications due to high error count",
                    context.source
                );
            }
            Decision::CoolingDown { remaining } => {
                crate::debug_context!(
                    "ErrorNotifier",
                    "Suppressing {} error due to cooldown ({:?} left)",
                    context.key(),
                    remaining
                );
            }
        }

        decision
    }

    /// Clear all per-key counters, e.g. after the hardware recovered
    pub fn reset_error_counts(&self) {
        self.limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        tracing::info!("Error counts reset");
    }

    /// True once `source`/`severity` has reached the silence threshold
    pub fn is_error_suppressed(&self, source: ErrorSource, severity: Severity) -> bool {
        self.limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_suppressed(source, severity)
    }

    pub fn indicator(&self) -> &Arc<dyn StatusIndicator> {
        &self.indicator
    }

    /// Wait for outstanding background work (sink delivery, delayed cues,
    /// banner reverts), giving up after `timeout`.
    pub async fn flush(&self, timeout: Duration) {
        let handles: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if handles.is_empty() {
            return;
        }

        let count = handles.len();
        if tokio::time::timeout(timeout, join_all(handles)).await.is_err() {
            tracing::warn!("Timed out waiting for {} background tasks", count);
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Local structured log line plus fire-and-forget forward to the sink
    fn log_error(&self, context: &ErrorContext) {
        let line = context.log_line();
        match context.severity {
            Severity::Critical | Severity::High => tracing::error!(
                source = %context.source,
                severity = %context.severity,
                user_actionable = context.user_actionable,
                "{}",
                line
            ),
            Severity::Medium => tracing::warn!(
                source = %context.source,
                severity = %context.severity,
                user_actionable = context.user_actionable,
                "{}",
                line
            ),
            Severity::Low => tracing::info!(
                source = %context.source,
                severity = %context.severity,
                user_actionable = context.user_actionable,
                "{}",
                line
            ),
        }

        let sink = Arc::clone(&self.sink);
        let record = LogRecord::from(context);
        self.spawn(async move {
            if let Err(e) = sink.send(&record).await {
                tracing::warn!("Failed to log error to {} sink: {}", sink.name(), e);
            }
        });
    }

    fn play_cues(&self, plan: CuePlan) {
        let (cue, repeat) = match plan {
            CuePlan::Silent => return,
            CuePlan::Once(cue) => (cue, false),
            CuePlan::Twice(cue) => (cue, true),
        };

        let player = Arc::clone(&self.cues);
        let gap = self.critical_cue_gap;
        self.spawn(async move {
            play_logged(player.as_ref(), cue).await;
            if repeat {
                tokio::time::sleep(gap).await;
                play_logged(player.as_ref(), cue).await;
            }
        });
    }

    fn update_display(&self, context: &ErrorContext) {
        self.indicator.show(&Banner::error(context));

        let indicator = Arc::clone(&self.indicator);
        let idle = self.idle_banner.clone();
        let delay = self.banner_revert;
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            // Leave newer non-error content alone
            if indicator.current().is_error() {
                indicator.show(&idle);
            }
        });
    }
}

async fn play_logged(player: &dyn CuePlayer, cue: Cue) {
    if let Err(e) = player.play(cue).await {
        tracing::warn!("Failed to play {:?} cue: {}", cue, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{BannerKind, StatusBoard};
    use crate::error::{CueError, SinkError};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingPlayer {
        played: Mutex<Vec<(Cue, Instant)>>,
    }

    impl RecordingPlayer {
        fn played(&self) -> Vec<(Cue, Instant)> {
            self.played.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CuePlayer for RecordingPlayer {
        async fn play(&self, cue: Cue) -> std::result::Result<(), CueError> {
            self.played.lock().unwrap().push((cue, Instant::now()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<LogRecord>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn records(&self) -> Vec<LogRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, record: &LogRecord) -> std::result::Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::HttpError("backend unavailable".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct Harness {
        notifier: ErrorNotifier,
        player: Arc<RecordingPlayer>,
        board: Arc<StatusBoard>,
        sink: Arc<RecordingSink>,
        config: AppConfig,
    }

    fn harness_with_sink(sink: RecordingSink) -> Harness {
        let config = AppConfig::default();
        let player = Arc::new(RecordingPlayer::default());
        let board = Arc::new(StatusBoard::new(Banner::idle(&config)));
        let sink = Arc::new(sink);
        let notifier = ErrorNotifier::new(
            &config,
            player.clone(),
            board.clone(),
            sink.clone(),
        );
        Harness {
            notifier,
            player,
            board,
            sink,
            config,
        }
    }

    fn harness() -> Harness {
        harness_with_sink(RecordingSink::default())
    }

    const FLUSH: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_scanner_disconnected_scenario() {
        let h = harness();

        let first = h.notifier.handle_hid_error("Scanner disconnected");
        assert_eq!(first, Decision::Allow);
        let banner = h.board.current();
        assert_eq!(banner.kind, BannerKind::Error(Severity::Medium));
        assert_eq!(banner.color, "#FF8C00");
        assert_eq!(banner.text, "Device Error: Scanner disconnected");

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(h.notifier.handle_hid_error("Scanner disconnected").is_allowed());
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(h.notifier.handle_hid_error("Scanner disconnected").is_allowed());
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(
            h.notifier.handle_hid_error("Scanner disconnected"),
            Decision::Silenced
        );
        assert!(h
            .notifier
            .is_error_suppressed(ErrorSource::Barcode, Severity::Medium));

        h.notifier.flush(FLUSH).await;

        let played = h.player.played();
        assert_eq!(played.len(), 3);
        assert!(played.iter().all(|(cue, _)| *cue == Cue::Quiet));

        // Suppressed occurrences are still forwarded to the sink
        let records = h.sink.records();
        assert_eq!(records.len(), 4);
        assert!(records
            .iter()
            .all(|r| r.source == ErrorSource::Barcode && r.level == Severity::Medium));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_suppresses_burst() {
        let h = harness();

        assert!(h.notifier.handle_hid_error("HTTP request failed").is_allowed());
        tokio::time::advance(Duration::from_millis(10_000)).await;
        assert!(matches!(
            h.notifier.handle_hid_error("HTTP request failed"),
            Decision::CoolingDown { .. }
        ));
        assert!(!h
            .notifier
            .is_error_suppressed(ErrorSource::Network, Severity::High));

        tokio::time::advance(Duration::from_millis(21_000)).await;
        assert!(h.notifier.handle_hid_error("HTTP request failed").is_allowed());

        h.notifier.flush(FLUSH).await;
        assert_eq!(h.player.played().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_plays_two_cues_apart() {
        let h = harness();

        h.notifier.handle_application_error(
            ErrorSource::System,
            "Database corrupted",
            Severity::Critical,
        );
        h.notifier.flush(FLUSH).await;

        let played = h.player.played();
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].0, Cue::Prominent);
        assert_eq!(played[1].0, Cue::Prominent);
        let gap = played[1].1 - played[0].1;
        assert!(gap >= Duration::from_millis(500) && gap < Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_and_non_device_medium_are_silent() {
        let h = harness();

        h.notifier.handle_hid_error("Read timeout, will retry");
        h.notifier
            .handle_application_error(ErrorSource::Keypad, "Invalid card number", Severity::Medium);
        h.notifier.flush(FLUSH).await;

        assert!(h.player.played().is_empty());
        assert_eq!(h.sink.records().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_reverts_after_delay() {
        let h = harness();

        h.notifier
            .handle_application_error(ErrorSource::Network, "Server unreachable", Severity::High);
        assert!(h.board.current().is_error());

        h.notifier.flush(FLUSH).await;
        assert_eq!(h.board.current(), Banner::idle(&h.config));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_leaves_newer_content_alone() {
        let h = harness();

        h.notifier
            .handle_application_error(ErrorSource::Network, "Server unreachable", Severity::High);

        tokio::time::advance(Duration::from_secs(2)).await;
        let welcome = Banner {
            kind: BannerKind::Idle,
            text: "Welcome, guest".to_string(),
            color: "#007A33".to_string(),
        };
        h.board.show(&welcome);

        h.notifier.flush(FLUSH).await;
        assert_eq!(h.board.current(), welcome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_unsilences_exhausted_key() {
        let h = harness();
        let report = || {
            h.notifier
                .handle_application_error(ErrorSource::Config, "Config unreadable", Severity::High)
        };

        for _ in 0..3 {
            assert!(report().is_allowed());
            tokio::time::advance(Duration::from_secs(31)).await;
        }
        assert_eq!(report(), Decision::Silenced);
        assert!(h
            .notifier
            .is_error_suppressed(ErrorSource::Config, Severity::High));

        h.notifier.reset_error_counts();
        assert!(!h
            .notifier
            .is_error_suppressed(ErrorSource::Config, Severity::High));
        assert!(report().is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_severity_bypasses_classifier() {
        let h = harness();

        h.notifier
            .handle_application_error(ErrorSource::Keypad, "Button stuck", Severity::Low);
        h.notifier.handle_hid_error("Keypad button stuck");
        h.notifier.flush(FLUSH).await;

        let records = h.sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Severity::Low);
        assert_eq!(records[1].level, Severity::Medium);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_does_not_affect_notification() {
        let h = harness_with_sink(RecordingSink::failing());

        let decision = h.notifier.handle_hid_error("MagTek swipe failed");
        assert!(decision.is_allowed());
        assert_eq!(h.board.current().kind, BannerKind::Error(Severity::High));

        h.notifier.flush(FLUSH).await;
        assert_eq!(h.player.played().len(), 1);
        assert!(h.sink.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hid_data_inspection() {
        let h = harness();

        assert!(h.notifier.handle_hid_data("ERROR 17"));
        assert!(h.notifier.handle_hid_data("READ FAIL"));
        assert!(h.notifier.handle_hid_data("12"));
        assert!(!h.notifier.handle_hid_data("0012345678"));
        h.notifier.flush(FLUSH).await;

        let records = h.sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "Invalid HID data received: ERROR 17");
        assert!(records
            .iter()
            .all(|r| r.source == ErrorSource::Barcode && r.level == Severity::Low));

        // Bypasses cues, banner and the rate limiter
        assert!(h.player.played().is_empty());
        assert!(!h.board.current().is_error());
        assert!(!h
            .notifier
            .is_error_suppressed(ErrorSource::Barcode, Severity::Low));
    }

    #[tokio::test]
    async fn test_flush_without_pending_work() {
        let h = harness();
        h.notifier.flush(Duration::from_millis(10)).await;
        assert!(h.sink.records().is_empty());
    }
}
