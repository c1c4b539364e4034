//! Error types for the obsws-rpc crate.

use crate::transport::TransportError;

/// Unified error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No active connection, or the transport failed to connect or send
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with `status: error`
    #[error("Server error: {0}")]
    Protocol(String),

    #[error("Request timeout")]
    Timeout,

    /// The session was torn down while the request was outstanding
    #[error("Request cancelled")]
    Cancelled,

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether the failure ended the session rather than a single request.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Transport(TransportError::NotConnected | TransportError::ConnectionClosed)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
