// src/error.rs

//! Unified error handling for the link audit engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::ResolutionFailure;

/// Result type alias for link audit operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required input file or artifact is absent
    #[error("Required input missing: {}", path.display())]
    InputMissing { path: PathBuf },

    /// A tabular export row could not be parsed
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    /// An oracle report row could not be repaired
    #[error("Normalization failed at row {line}: {message}")]
    Normalization { line: u64, message: String },

    /// A redirect chain did not reach its canonical form
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    /// A remote listing or oracle call failed
    #[error("Remote call failed for {context}: {message}")]
    RemoteCall { context: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Delimited text reading/writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Protocol XML could not be parsed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a missing-input error for a path.
    pub fn input_missing(path: impl Into<PathBuf>) -> Self {
        Self::InputMissing { path: path.into() }
    }

    /// Create a malformed-record error.
    pub fn malformed(line: u64, message: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            line,
            message: message.to_string(),
        }
    }

    /// Create a normalization error.
    pub fn normalization(line: u64, message: impl fmt::Display) -> Self {
        Self::Normalization {
            line,
            message: message.to_string(),
        }
    }

    /// Create a remote call error with context.
    pub fn remote(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RemoteCall {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error must abort the whole run.
    ///
    /// Everything else is recorded against a single row, page or seed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InputMissing { .. } | Self::Config(_) | Self::Validation(_)
        )
    }
}
