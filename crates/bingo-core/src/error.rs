use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Ball and card errors
    #[error("Invalid ball number: {0} (expected 1-75)")]
    InvalidBallNumber(u8),

    #[error("Invalid card layout: {0}")]
    InvalidCard(String),

    #[error("Unknown winning pattern: {0}")]
    UnknownPattern(String),

    // Protocol errors
    #[error("Cannot decode device line {line:?}: {reason}")]
    ProtocolDecode { line: String, reason: String },

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to persist settings to {path}: {reason}")]
    ConfigPersist { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a protocol decode error for a rejected device line.
    pub fn protocol_decode(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProtocolDecode {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
