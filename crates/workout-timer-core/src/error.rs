//! Core error types for workout-timer-core.
//!
//! Validation failures are user-facing and carry a message meant to be shown
//! verbatim. State errors are caller contract violations. Playback errors never
//! leave the sound player; they are logged and replaced by a fallback alert.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::SessionState;

/// Core error type for workout-timer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session runner contract violations
    #[error(transparent)]
    State(#[from] StateError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session history errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bad or missing configuration input.
///
/// The `Display` text is the message surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Value must not be empty")]
    Empty,

    #[error("Use mm:ss or plain seconds for durations")]
    SuffixOnColonForm,

    #[error("Use digits in mm:ss format")]
    NonDigitGroup,

    #[error("Duration must be numeric")]
    NotNumeric,

    #[error("Duration is too large")]
    Overflow,

    /// Invalid value
    #[error("{protocol}: {field} {message}")]
    InvalidValue {
        protocol: &'static str,
        field: &'static str,
        message: &'static str,
    },

    /// A count field (rounds, cycles) that is not a positive integer.
    #[error("{field} must be a whole number")]
    NotACount { field: String },

    #[error("Custom: provide at least one interval")]
    NoIntervals,

    #[error("Line {line}: expected 'work rest'")]
    MalformedLine { line: usize },

    /// Wraps an error raised while parsing one line of an interval list.
    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Session runner misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Nothing to run")]
    NothingToRun,

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },
}

/// Sound playback failures.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No sound configured for '{0}'")]
    NoSound(String),

    #[error("Sound file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("No audio player available")]
    NoPlayer,

    #[error("Failed to open sound file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode sound file {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Audio output unavailable: {0}")]
    Device(String),

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to resolve the data directory
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Session history errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to read history at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write history at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
