//! Error context definitions
//!
//! This module defines the value types that describe a single reported
//! error: where it came from, how urgent it is and when it happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NotifierError;

/// Subsystem an error originated from
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// Barcode scanner
    Barcode,
    /// Magnetic-stripe card reader
    #[serde(alias = "magtek")]
    Magstripe,
    /// On-screen keypad / manual entry
    Keypad,
    /// Server communication
    Network,
    /// Anything else (restart, logging, generic)
    System,
    /// Device configuration
    Config,
}

impl ErrorSource {
    pub const ALL: [ErrorSource; 6] = [
        ErrorSource::Barcode,
        ErrorSource::Magstripe,
        ErrorSource::Keypad,
        ErrorSource::Network,
        ErrorSource::System,
        ErrorSource::Config,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Barcode => "barcode",
            ErrorSource::Magstripe => "magstripe",
            ErrorSource::Keypad => "keypad",
            ErrorSource::Network => "network",
            ErrorSource::System => "system",
            ErrorSource::Config => "config",
        }
    }

    /// Hardware input devices get an audible cue even for medium errors
    pub fn is_device(&self) -> bool {
        matches!(self, ErrorSource::Barcode | ErrorSource::Magstripe)
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorSource {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barcode" => Ok(ErrorSource::Barcode),
            "magstripe" | "magtek" => Ok(ErrorSource::Magstripe),
            "keypad" => Ok(ErrorSource::Keypad),
            "network" => Ok(ErrorSource::Network),
            "system" => Ok(ErrorSource::System),
            "config" => Ok(ErrorSource::Config),
            other => Err(NotifierError::InvalidInput(format!(
                "Unknown error source: {}",
                other
            ))),
        }
    }
}

/// Urgency of an error, ordered from least to most urgent
#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Banner color shown while an error of this severity is displayed
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#FFA500",
            Severity::Medium => "#FF8C00",
            Severity::High => "#FF4500",
            Severity::Critical => "#DC143C",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(NotifierError::InvalidInput(format!(
                "Unknown severity: {}",
                other
            ))),
        }
    }
}

/// A single error occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub source: ErrorSource,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// `false` for errors pushed by devices, `true` for errors reported
    /// explicitly by application code
    pub user_actionable: bool,
}

impl ErrorContext {
    pub fn new(
        source: ErrorSource,
        severity: Severity,
        message: impl Into<String>,
        user_actionable: bool,
    ) -> Self {
        Self {
            source,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            user_actionable,
        }
    }

    pub fn key(&self) -> SuppressionKey {
        SuppressionKey::new(self.source, self.severity)
    }

    /// Single-line local log form: `[timestamp] [SEVERITY] [source] message`
    pub fn log_line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            self.timestamp.to_rfc3339(),
            self.severity.as_str().to_uppercase(),
            self.source,
            self.message
        )
    }
}

/// Composite `source|severity` key used for repeated-error bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuppressionKey {
    pub source: ErrorSource,
    pub severity: Severity,
}

impl SuppressionKey {
    pub fn new(source: ErrorSource, severity: Severity) -> Self {
        Self { source, severity }
    }
}

impl fmt::Display for SuppressionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.source, self.severity)
    }
}
