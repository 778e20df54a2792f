//! Session settings loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// How a level is budgeted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LevelMode {
    /// Play until the board is cleared or the tray fills.
    #[default]
    Unlimited,
    /// A fixed number of tray adds.
    Moves,
    /// A countdown.
    Timer,
}

/// Settings for one session. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameSettings {
    /// Board width in cells.
    #[serde(default = "default_board_width")]
    board_width: u8,

    /// Board height in cells.
    #[serde(default = "default_board_height")]
    board_height: u8,

    /// Number of tray slots.
    #[serde(default = "default_tray_capacity")]
    tray_capacity: usize,

    /// Items of one key that form a match.
    #[serde(default = "default_match_size")]
    match_size: usize,

    /// Level mode used when none is given at start.
    #[serde(default)]
    level_mode: LevelMode,

    /// Move budget for [`LevelMode::Moves`].
    #[serde(default = "default_level_moves")]
    level_moves: u32,

    /// Countdown for [`LevelMode::Timer`], in seconds.
    #[serde(default = "default_level_time_secs")]
    level_time_secs: u64,

    /// Pause after each move before outcomes are evaluated, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    settle_delay_ms: u64,

    /// Pause between autoplay moves, in milliseconds.
    #[serde(default = "default_autoplay_delay_ms")]
    autoplay_delay_ms: u64,
}

fn default_board_width() -> u8 {
    5
}

fn default_board_height() -> u8 {
    5
}

fn default_tray_capacity() -> usize {
    5
}

fn default_match_size() -> usize {
    3
}

fn default_level_moves() -> u32 {
    16
}

fn default_level_time_secs() -> u64 {
    60
}

fn default_settle_delay_ms() -> u64 {
    400
}

fn default_autoplay_delay_ms() -> u64 {
    500
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_width: default_board_width(),
            board_height: default_board_height(),
            tray_capacity: default_tray_capacity(),
            match_size: default_match_size(),
            level_mode: LevelMode::default(),
            level_moves: default_level_moves(),
            level_time_secs: default_level_time_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            autoplay_delay_ms: default_autoplay_delay_ms(),
        }
    }
}

impl GameSettings {
    /// Loads settings from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading settings from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read settings file: {}", e)))?;
        let settings = Self::from_toml_str(&content)?;
        info!(
            board = %format!("{}x{}", settings.board_width, settings.board_height),
            tray = settings.tray_capacity,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Parses and validates settings from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings no session can be played with.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_width == 0 || self.board_height == 0 {
            return Err(ConfigError::new(format!(
                "Board must have at least one cell, got {}x{}",
                self.board_width, self.board_height
            )));
        }
        if self.match_size < 2 {
            return Err(ConfigError::new(format!(
                "Match size must be at least 2, got {}",
                self.match_size
            )));
        }
        if self.tray_capacity < self.match_size {
            return Err(ConfigError::new(format!(
                "Tray capacity {} cannot hold a match of {}",
                self.tray_capacity, self.match_size
            )));
        }
        Ok(())
    }

    /// Returns a copy with both delays set to zero.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.autoplay_delay_ms = 0;
        self
    }

    /// Returns a copy with a different board size.
    pub fn with_board(mut self, width: u8, height: u8) -> Self {
        self.board_width = width;
        self.board_height = height;
        self
    }

    /// Returns a copy with a different tray capacity.
    pub fn with_tray_capacity(mut self, capacity: usize) -> Self {
        self.tray_capacity = capacity;
        self
    }

    /// Returns a copy with a different level mode.
    pub fn with_level_mode(mut self, mode: LevelMode) -> Self {
        self.level_mode = mode;
        self
    }

    /// Returns a copy with a different move budget.
    pub fn with_level_moves(mut self, moves: u32) -> Self {
        self.level_moves = moves;
        self
    }

    /// Returns a copy with a different countdown, in seconds.
    pub fn with_level_time_secs(mut self, secs: u64) -> Self {
        self.level_time_secs = secs;
        self
    }

    /// Countdown for timer levels.
    pub fn level_time(&self) -> Duration {
        Duration::from_secs(self.level_time_secs)
    }

    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Autoplay delay as a duration.
    pub fn autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.autoplay_delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = GameSettings::from_toml_str("").unwrap();
        assert_eq!(settings, GameSettings::default());
        assert_eq!(*settings.tray_capacity(), 5);
        assert_eq!(settings.settle_delay(), Duration::from_millis(400));
    }

    #[test]
    fn test_partial_toml_overrides() {
        let settings = GameSettings::from_toml_str(
            "tray_capacity = 7\nlevel_mode = \"moves\"\nlevel_moves = 9\n",
        )
        .unwrap();
        assert_eq!(*settings.tray_capacity(), 7);
        assert_eq!(*settings.level_mode(), LevelMode::Moves);
        assert_eq!(*settings.level_moves(), 9);
        assert_eq!(*settings.board_width(), 5);
    }

    #[test]
    fn test_rejects_tray_smaller_than_match() {
        let err = GameSettings::from_toml_str("tray_capacity = 2").unwrap_err();
        assert!(err.message.contains("cannot hold"));
        assert!(err.file.ends_with("settings.rs"));
    }

    #[test]
    fn test_rejects_empty_board() {
        assert!(GameSettings::from_toml_str("board_width = 0").is_err());
        assert!(GameSettings::from_toml_str("match_size = 1").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "board_height = 4").unwrap();
        let settings = GameSettings::from_file(file.path()).unwrap();
        assert_eq!(*settings.board_height(), 4);

        assert!(GameSettings::from_file("/nonexistent/triples.toml").is_err());
    }

    #[test]
    fn test_level_mode_parses_from_cli_text() {
        assert_eq!("timer".parse::<LevelMode>().unwrap(), LevelMode::Timer);
        assert_eq!(LevelMode::Moves.to_string(), "moves");
    }
}
