//! Error types for guestbook-notifier
//!
//! This module defines structured error types using the `thiserror` crate.
//! Reported kiosk errors are plain `ErrorContext` values and never show up
//! here; these types cover the notifier's own fallible plumbing.

use std::io;
use thiserror::Error;

/// Main error type for the notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Error occurred during JSON parsing or validation
    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// Error occurred while reading input or writing files
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration could not be read, parsed or written
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unknown error source or severity name
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error bubbled up from a log sink
    #[error("Log sink error: {0}")]
    SinkError(#[from] SinkError),
}

/// Errors raised while forwarding a record to the logging sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Sink responded with status {0}: {1}")]
    Rejected(u16, String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to write log file: {0}")]
    WriteError(#[from] io::Error),

    #[error("Invalid sink configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while playing a feedback cue
#[derive(Error, Debug)]
pub enum CueError {
    /// Sound name or path could not be resolved to a file
    #[error("Invalid sound parameter: {0}")]
    InvalidSound(String),

    /// Player process or its reaper thread could not be started
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Result type alias for the notifier
pub type Result<T> = std::result::Result<T, NotifierError>;
