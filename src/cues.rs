//! Audible feedback cues
//!
//! A cue is picked from the error severity (and, for medium errors, the
//! source). Playback goes through the `CuePlayer` trait so the notifier does
//! not care whether sounds come from the system player or nowhere at all.

use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use std::thread;

use crate::config::{CueConfig, PlayerKind};
use crate::context::{ErrorContext, Severity};
use crate::error::CueError;

/// Kinds of feedback cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Short, quiet beep for medium device errors
    Quiet,
    /// Error sound for high and critical errors
    Prominent,
}

/// Cues to play for one notified error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuePlan {
    Silent,
    Once(Cue),
    /// Play the cue, wait the configured gap, play it again
    Twice(Cue),
}

impl CuePlan {
    pub fn for_context(context: &ErrorContext) -> Self {
        match context.severity {
            Severity::Low => CuePlan::Silent,
            Severity::Medium if context.source.is_device() => CuePlan::Once(Cue::Quiet),
            Severity::Medium => CuePlan::Silent,
            Severity::High => CuePlan::Once(Cue::Prominent),
            Severity::Critical => CuePlan::Twice(Cue::Prominent),
        }
    }
}

/// Cue player trait
#[async_trait]
pub trait CuePlayer: Send + Sync {
    /// Play a cue. Should return as soon as playback is dispatched.
    async fn play(&self, cue: Cue) -> Result<(), CueError>;
}

/// Plays sounds through the platform audio player on a background thread
pub struct SystemCuePlayer {
    command: String,
    quiet_sound: String,
    prominent_sound: String,
}

impl SystemCuePlayer {
    pub fn new(config: &CueConfig) -> Self {
        Self::with_command(platform::PLAYER_COMMAND, config)
    }

    /// Player that runs `command <sound file>` instead of the platform player
    pub fn with_command(command: impl Into<String>, config: &CueConfig) -> Self {
        Self {
            command: command.into(),
            quiet_sound: config.quiet_sound.clone(),
            prominent_sound: config.prominent_sound.clone(),
        }
    }

    fn sound_for(&self, cue: Cue) -> &str {
        match cue {
            Cue::Quiet => &self.quiet_sound,
            Cue::Prominent => &self.prominent_sound,
        }
    }

    /// Resolve sound parameter to actual file path
    ///
    /// Anything with a path separator or `~` is a file; bare names are
    /// looked up in the platform sound directory.
    fn resolve_sound_path(sound: &str) -> Result<String, CueError> {
        if sound.contains('/') || sound.contains('\\') || sound.contains('~') {
            let expanded_path = shellexpand::full(sound)
                .map_err(|e| CueError::InvalidSound(e.to_string()))?
                .to_string();

            if !Path::new(&expanded_path).exists() {
                return Err(CueError::InvalidSound(format!(
                    "Sound file not found: {}",
                    expanded_path
                )));
            }

            Ok(expanded_path)
        } else {
            let system_sound_path = system_sound_path(sound);

            if !Path::new(&system_sound_path).exists() {
                return Err(CueError::InvalidSound(format!(
                    "System sound not found: {} (looked for {})",
                    sound, system_sound_path
                )));
            }

            Ok(system_sound_path)
        }
    }
}

#[cfg(target_os = "macos")]
mod platform {
    pub const PLAYER_COMMAND: &str = "/usr/bin/afplay";
    pub const SOUND_DIR: &str = "/System/Library/Sounds";
    pub const SOUND_EXT: &str = "aiff";
    pub const QUIET_SOUND: &str = "Tink";
    pub const PROMINENT_SOUND: &str = "Basso";
}

// freedesktop sound theme, played through PulseAudio / PipeWire
#[cfg(not(target_os = "macos"))]
mod platform {
    pub const PLAYER_COMMAND: &str = "paplay";
    pub const SOUND_DIR: &str = "/usr/share/sounds/freedesktop/stereo";
    pub const SOUND_EXT: &str = "oga";
    pub const QUIET_SOUND: &str = "message";
    pub const PROMINENT_SOUND: &str = "dialog-error";
}

pub use platform::{PROMINENT_SOUND as DEFAULT_PROMINENT_SOUND, QUIET_SOUND as DEFAULT_QUIET_SOUND};

/// Path a bare sound name maps to on this platform
pub fn system_sound_path(name: &str) -> String {
    format!("{}/{}.{}", platform::SOUND_DIR, name, platform::SOUND_EXT)
}

#[async_trait]
impl CuePlayer for SystemCuePlayer {
    async fn play(&self, cue: Cue) -> Result<(), CueError> {
        let sound_path = Self::resolve_sound_path(self.sound_for(cue))?;

        let mut child = Command::new(&self.command)
            .arg(&sound_path)
            .spawn()
            .map_err(|e| {
                CueError::PlaybackFailed(format!("Failed to start {}: {}", self.command, e))
            })?;

        // Reap the player off the async runtime
        thread::Builder::new()
            .name("cue-player".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::warn!("Sound player exited with non-zero status: {}", status);
                }
                Err(e) => {
                    tracing::warn!("Failed to wait for sound player: {}", e);
                }
                _ => {}
            })
            .map_err(|e| CueError::PlaybackFailed(format!("Failed to spawn player thread: {}", e)))?;

        Ok(())
    }
}

/// Player that never makes a sound
pub struct SilentCuePlayer;

#[async_trait]
impl CuePlayer for SilentCuePlayer {
    async fn play(&self, cue: Cue) -> Result<(), CueError> {
        crate::debug_context!("SilentCuePlayer", "Skipping {:?} cue", cue);
        Ok(())
    }
}

/// Build the configured cue player
pub fn build_player(config: &CueConfig) -> Box<dyn CuePlayer> {
    match config.player {
        PlayerKind::System => Box::new(SystemCuePlayer::new(config)),
        PlayerKind::None => Box::new(SilentCuePlayer),
    }
}
