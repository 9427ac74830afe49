//! Error types for gym-remote

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for gym-remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// gym-remote error types
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The bridge has torn down the session (explicit close or limit breach)
    #[error("Connection closed by remote environment")]
    ConnectionClosed,

    /// Malformed or unexpected message on the wire
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Bridge process never exposed a reachable endpoint
    #[error("Startup error: {0}")]
    StartupError(String),

    /// Failure raised by the wrapped environment
    #[error("Environment error: {0}")]
    EnvironmentError(String),

    /// Action not in action space
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// No environment registered under the requested id
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Rejected limit or spawn configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IPC communication error
    #[error("IPC error: {0}")]
    IpcError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RemoteError {
    /// Map a transport I/O failure, treating a vanished peer as a closed session
    pub fn from_io(context: &str, err: std::io::Error) -> Self {
        use std::io::ErrorKind as IoKind;

        match err.kind() {
            IoKind::UnexpectedEof
            | IoKind::BrokenPipe
            | IoKind::ConnectionReset
            | IoKind::ConnectionAborted => RemoteError::ConnectionClosed,
            _ => RemoteError::IpcError(format!("{}: {}", context, err)),
        }
    }

    /// Classify an error for transmission back to the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::InvalidAction(_) => ErrorKind::InvalidAction,
            RemoteError::ProtocolError(_) => ErrorKind::Protocol,
            _ => ErrorKind::Environment,
        }
    }

    /// Message without the variant prefix, for error responses
    pub fn detail(&self) -> String {
        match self {
            RemoteError::ProtocolError(msg)
            | RemoteError::StartupError(msg)
            | RemoteError::EnvironmentError(msg)
            | RemoteError::InvalidAction(msg)
            | RemoteError::UnknownEnvironment(msg)
            | RemoteError::InvalidConfig(msg)
            | RemoteError::IpcError(msg)
            | RemoteError::SerializationError(msg) => msg.clone(),
            RemoteError::ConnectionClosed => self.to_string(),
        }
    }

    /// Rebuild an error received from the bridge
    pub fn from_remote(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::InvalidAction => RemoteError::InvalidAction(message),
            ErrorKind::Protocol => RemoteError::ProtocolError(message),
            ErrorKind::Environment => RemoteError::EnvironmentError(message),
        }
    }

    /// Whether this error means the session is gone for good
    pub fn is_closed(&self) -> bool {
        matches!(self, RemoteError::ConnectionClosed)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::SerializationError(err.to_string())
    }
}

/// Error category carried in bridge error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    Environment,
    InvalidAction,
    Protocol,
}
