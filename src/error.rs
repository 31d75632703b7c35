//! Error types for Agentflow.
//!
//! All errors in Agentflow are represented by the `AgentflowError` enum.
//! Graph store errors are synchronous and leave the graph untouched,
//! status channel errors are reported to listeners, and suggestion
//! provider errors never escape the adapter.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Agentflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum AgentflowError {
    /// A referenced node, edge or workflow id does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Self-loop or duplicate directed edge.
    #[error("{0}")]
    InvalidEdge(String),

    /// Illegal workflow status transition.
    #[error("{0}")]
    InvalidState(String),

    /// Execution status channel failure.
    #[error("{0}")]
    Connection(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// Suggestion provider failure. Absorbed by the adapter.
    #[error("{0}")]
    Suggestion(String),

    /// A suggestion request is already in flight for this form.
    #[error("a suggestion request is already in flight")]
    Busy,

    /// The initiating view went away before the result arrived.
    #[error("request cancelled")]
    Cancelled,

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl AgentflowError {
    pub fn node_not_found(id: &str) -> Self {
        AgentflowError::NotFound(format!("node {} not found", id))
    }

    pub fn edge_not_found(id: &str) -> Self {
        AgentflowError::NotFound(format!("edge {} not found", id))
    }
}

impl From<AgentflowError> for String {
    fn from(val: AgentflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for AgentflowError {
    fn from(error: std::io::Error) -> Self {
        AgentflowError::IoError(error.to_string())
    }
}

impl From<AgentflowError> for std::io::Error {
    fn from(val: AgentflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for AgentflowError {
    fn from(error: serde_json::Error) -> Self {
        AgentflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for AgentflowError {
    fn from(error: toml::de::Error) -> Self {
        AgentflowError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for AgentflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        AgentflowError::Convert(error.to_string())
    }
}

impl From<reqwest::Error> for AgentflowError {
    fn from(error: reqwest::Error) -> Self {
        AgentflowError::Connection(format!("http error: {}", error))
    }
}

impl From<sqlx::Error> for AgentflowError {
    fn from(error: sqlx::Error) -> Self {
        AgentflowError::Store(error.to_string())
    }
}
