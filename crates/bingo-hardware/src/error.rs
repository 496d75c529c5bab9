//! Error types for serial hardware operations.
//!
//! Every variant here is recoverable. The bridge answers any of them by
//! falling back to the in-process simulator.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to the ball machine.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// A port could not be opened.
    #[error("Port unavailable: {port}: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// An open link stopped working.
    #[error("Link failure on {port}: {reason}")]
    LinkFailure { port: String, reason: String },

    /// The link is closed or was never opened.
    #[error("Not connected")]
    NotConnected,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new port unavailable error.
    pub fn port_unavailable(port: impl Into<String>, reason: impl ToString) -> Self {
        Self::PortUnavailable {
            port: port.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new link failure error.
    pub fn link_failure(port: impl Into<String>, reason: impl ToString) -> Self {
        Self::LinkFailure {
            port: port.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means an established link is gone.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, Self::LinkFailure { .. } | Self::Io(_))
    }
}
