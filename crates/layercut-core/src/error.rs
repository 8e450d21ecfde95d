//! Error handling for layercut
//!
//! Provides the shared error type used by the settings layer and the binary.
//! The compiler crate defines its own, more specific error enums and converts
//! into this type at the boundary.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for layercut
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is missing or invalid
    #[error("Invalid setting '{setting}': {reason}")]
    Config {
        /// The setting name.
        setting: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A file or value could not be parsed
    #[error("Parse error in {source_name}: {reason}")]
    Parse {
        /// What was being parsed (file name or value name).
        source_name: String,
        /// The reason parsing failed.
        reason: String,
    },

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error for the named setting
    pub fn config(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Config {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
