//! Error types for biblio-agent.

use biblio_ledger::LedgerError;
use biblio_platform::PlatformError;
use biblio_proto::ProtoError;
use thiserror::Error;

/// Errors that can occur while running an agent.
///
/// Refusals, stale offers and timeouts are not errors: they are reported
/// as a [`SessionOutcome`](crate::session::SessionOutcome).
#[derive(Debug, Error)]
pub enum AgentError {
    /// The platform could not register, discover or deliver.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A message or agent definition could not be read.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Stock changed under a handler that had already checked it.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The agent task panicked or was aborted.
    #[error("agent task failed: {0}")]
    Join(String),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
