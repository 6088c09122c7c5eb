//! Error handling module for SignClip bootstrap and configuration

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised while loading configuration and wiring the application
#[derive(Error, Debug)]
pub enum SignClipError {
    /// Configuration file could not be parsed
    #[error("Invalid configuration in {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration could not be rendered as TOML
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A configuration value is out of range or unknown
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Error raised by the core
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SignClipError {
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for SignClip bootstrap operations
pub type SignClipResult<T> = std::result::Result<T, SignClipError>;
