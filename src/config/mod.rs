//! Configuration management module
//!
//! This module handles loading and saving the notifier configuration:
//! rate-limit thresholds, banner timing, cue sounds and the log sink.

pub mod loader;
pub mod schema;

pub use loader::{default_config, get_config_path, load_config_from_path, save_config_to_path};
pub use schema::{AppConfig, CueConfig, IndicatorKind, PlayerKind, SinkConfig, SinkKind};
