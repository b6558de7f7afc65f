//! Configuration schema for guestbook-notifier
//!
//! This module defines the data structures for the notifier configuration,
//! including rate-limit settings, banner timing, cues and the log sink.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cues::{DEFAULT_PROMINENT_SOUND, DEFAULT_QUIET_SOUND};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Notified occurrences of one source/severity before it goes silent
    #[serde(default = "default_max_before_silent")]
    pub max_before_silent: u32,

    /// Minimum gap between two notifications of the same source/severity
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// How long an error banner stays up before reverting to idle
    #[serde(default = "default_banner_revert_ms")]
    pub banner_revert_ms: u64,

    /// Gap between the two cues played for critical errors
    #[serde(default = "default_critical_cue_gap_ms")]
    pub critical_cue_gap_ms: u64,

    /// Banner text shown while no error is displayed
    #[serde(default = "default_idle_message")]
    pub idle_message: String,

    /// Banner color shown while no error is displayed
    #[serde(default = "default_idle_color")]
    pub idle_color: String,

    /// Where banner updates are rendered
    #[serde(default)]
    pub indicator: IndicatorKind,

    #[serde(default)]
    pub cues: CueConfig,

    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_max_before_silent() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_banner_revert_ms() -> u64 {
    5_000
}

fn default_critical_cue_gap_ms() -> u64 {
    500
}

fn default_idle_message() -> String {
    "Swipe your card or scan your barcode to record an entry...".to_string()
}

fn default_idle_color() -> String {
    "#00447C".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            debug: false,
            max_before_silent: default_max_before_silent(),
            cooldown_ms: default_cooldown_ms(),
            banner_revert_ms: default_banner_revert_ms(),
            critical_cue_gap_ms: default_critical_cue_gap_ms(),
            idle_message: default_idle_message(),
            idle_color: default_idle_color(),
            indicator: IndicatorKind::default(),
            cues: CueConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn banner_revert(&self) -> Duration {
        Duration::from_millis(self.banner_revert_ms)
    }

    pub fn critical_cue_gap(&self) -> Duration {
        Duration::from_millis(self.critical_cue_gap_ms)
    }
}

/// Status indicator backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Print banner changes to stdout
    #[default]
    Console,
    /// Desktop notification for each error banner
    Desktop,
}

/// Cue player backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Play sounds with the platform audio player
    #[default]
    System,
    /// Never make a sound
    None,
}

/// Feedback cue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CueConfig {
    pub player: PlayerKind,

    /// Sound for medium device errors (system sound name or file path)
    pub quiet_sound: String,

    /// Sound for high and critical errors (system sound name or file path)
    pub prominent_sound: String,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            player: PlayerKind::System,
            quiet_sound: DEFAULT_QUIET_SOUND.to_string(),
            prominent_sound: DEFAULT_PROMINENT_SOUND.to_string(),
        }
    }
}

/// Log sink backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// POST JSON records to `url`
    Http,
    /// Append lines to a daily file in `dir`
    File,
    /// Keep records local only
    #[default]
    None,
}

/// Configuration for the external logging sink
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Endpoint for the http sink
    pub url: Option<String>,

    /// Log directory for the file sink
    pub dir: Option<PathBuf>,

    pub timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::None,
            url: None,
            dir: None,
            timeout_ms: 3_000,
        }
    }
}
