//! Unified error types for sitetrack with fail-open handling.
//!
//! Tracking must never break the page that hosts it. Infrastructure errors
//! are logged and replaced with safe defaults wherever a caller has no
//! sensible way to recover.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sitetrack operations.
#[derive(Error, Debug)]
pub enum TrackError {
    /// I/O errors while reading config files or event streams.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A reporter failed to deliver an event.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A CSS selector could not be parsed.
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for sitetrack operations.
pub type Result<T> = std::result::Result<T, TrackError>;

impl TrackError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a selector error.
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<io::Error> for TrackError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Fail-open error handling: log the error and carry on with a default.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }
}

/// Exit codes for the sitetrack CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed (bad input, unreadable file).
    pub const ERROR: i32 = 1;

    /// No analytics backend was detected.
    pub const NO_BACKEND: i32 = 2;
}
