//! Wire protocol between the client proxy and the bridge
//!
//! Messages are serialized as JSON with internally-tagged enums.
//! Format: {"Type": "MessageType", ...fields}

use gym_remote_core::{Action, ErrorKind, Observation, RemoteError, Result, Space, StepResult};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Messages sent from the client proxy to the bridge
///
/// Note: `rename_all` on enums only affects variant names, not field names inside variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum Request {
    /// Advance the environment by one action
    Step {
        #[serde(rename = "Action")]
        action: Action,
    },

    /// Start a new episode
    Reset,

    /// Ask for the environment's spaces
    Describe,

    /// End the session
    Close,
}

/// Messages sent from the bridge back to the client proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum Response {
    /// Step result
    StepResult {
        #[serde(rename = "Result")]
        result: StepResult,
    },

    /// Reset complete
    ResetComplete {
        #[serde(rename = "Observation")]
        observation: Observation,
    },

    /// Environment spaces
    Spaces {
        #[serde(rename = "ActionSpace")]
        action_space: Space,
        #[serde(rename = "ObservationSpace")]
        observation_space: Space,
    },

    /// Close acknowledged; the bridge is shutting down
    Closed,

    /// Error response
    Error {
        #[serde(rename = "Kind")]
        kind: ErrorKind,
        #[serde(rename = "Message")]
        message: String,
    },
}

impl Response {
    /// Build an error response from a failure inside the bridge
    pub fn error(err: &RemoteError) -> Self {
        Response::Error {
            kind: err.kind(),
            message: err.detail(),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Response::StepResult { .. } => "StepResult",
            Response::ResetComplete { .. } => "ResetComplete",
            Response::Spaces { .. } => "Spaces",
            Response::Closed => "Closed",
            Response::Error { .. } => "Error",
        }
    }
}

/// Serialize a message to JSON bytes
pub fn serialize<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(Into::into)
}

/// Deserialize a message from JSON bytes
///
/// Anything that does not decode is a protocol violation by the peer.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| RemoteError::ProtocolError(e.to_string()))
}
