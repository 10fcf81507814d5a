//! Error types for the simulation harness.

use biblio_agent::AgentError;
use thiserror::Error;

/// Errors raised while loading or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An agent could not be started.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
