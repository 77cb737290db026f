//! Error types for settings and duration parsing

use thiserror::Error;

/// Errors during settings persistence
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save settings")]
    Save(#[source] confy::ConfyError),
}

/// Errors when reading a countdown duration typed by the user
#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration '{input}' (expected e.g. 90, 90s, 2m, 1.5h)")]
    Invalid { input: String },

    #[error("duration '{input}' must be at least one second")]
    Zero { input: String },
}
