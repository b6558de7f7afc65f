//! Status indicator
//!
//! The kiosk shows one banner at a time: either the idle prompt or the most
//! recent error. Indicators remember what they currently show so the
//! notifier can check, before reverting, that an error is still on screen.

use notify_rust::{Notification, Timeout};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::config::{AppConfig, IndicatorKind};
use crate::context::{ErrorContext, Severity};

/// What a banner represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Idle,
    Error(Severity),
}

/// Text and background color shown on the status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    pub color: String,
}

impl Banner {
    pub fn idle(config: &AppConfig) -> Self {
        Self {
            kind: BannerKind::Idle,
            text: config.idle_message.clone(),
            color: config.idle_color.clone(),
        }
    }

    pub fn error(context: &ErrorContext) -> Self {
        Self {
            kind: BannerKind::Error(context.severity),
            text: format!("Device Error: {}", context.message),
            color: context.severity.color().to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, BannerKind::Error(_))
    }
}

/// Status indicator trait
pub trait StatusIndicator: Send + Sync {
    fn show(&self, banner: &Banner);

    /// Banner currently on display
    fn current(&self) -> Banner;
}

/// In-memory banner state
pub struct StatusBoard {
    banner: Mutex<Banner>,
}

impl StatusBoard {
    pub fn new(initial: Banner) -> Self {
        Self {
            banner: Mutex::new(initial),
        }
    }
}

impl StatusIndicator for StatusBoard {
    fn show(&self, banner: &Banner) {
        let mut current = self.banner.lock().unwrap_or_else(PoisonError::into_inner);
        *current = banner.clone();
    }

    fn current(&self) -> Banner {
        self.banner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Prints each banner change to stdout
pub struct ConsoleIndicator {
    board: StatusBoard,
}

impl ConsoleIndicator {
    pub fn new(initial: Banner) -> Self {
        Self {
            board: StatusBoard::new(initial),
        }
    }
}

impl StatusIndicator for ConsoleIndicator {
    fn show(&self, banner: &Banner) {
        println!("[{}] {}", banner.color, banner.text);
        self.board.show(banner);
    }

    fn current(&self) -> Banner {
        self.board.current()
    }
}

/// Pops a desktop notification for every error banner. The notification
/// expires together with the banner, so reverting needs no extra call.
pub struct DesktopIndicator {
    board: StatusBoard,
    timeout: Duration,
}

impl DesktopIndicator {
    pub fn new(initial: Banner, timeout: Duration) -> Self {
        Self {
            board: StatusBoard::new(initial),
            timeout,
        }
    }

    fn display_notification(&self, banner: &Banner) -> Result<(), notify_rust::error::Error> {
        let summary = match banner.kind {
            BannerKind::Error(severity) => format!("Guestbook ({})", severity),
            BannerKind::Idle => "Guestbook".to_string(),
        };

        let mut notification = Notification::new();
        notification.summary(&summary);
        notification.body(&banner.text);
        notification.timeout(Timeout::Milliseconds(timeout_millis(self.timeout)));
        notification.show()?;
        Ok(())
    }
}

impl StatusIndicator for DesktopIndicator {
    fn show(&self, banner: &Banner) {
        if banner.is_error() {
            if let Err(e) = self.display_notification(banner) {
                tracing::warn!("Failed to display desktop notification: {}", e);
            }
        }
        self.board.show(banner);
    }

    fn current(&self) -> Banner {
        self.board.current()
    }
}

/// Build the configured indicator, starting on the idle banner
pub fn build_indicator(config: &AppConfig) -> Box<dyn StatusIndicator> {
    let idle = Banner::idle(config);
    match config.indicator {
        IndicatorKind::Console => Box::new(ConsoleIndicator::new(idle)),
        IndicatorKind::Desktop => Box::new(DesktopIndicator::new(idle, config.banner_revert())),
    }
}

/// Notification timeout in milliseconds, saturating at `u32::MAX`
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}
