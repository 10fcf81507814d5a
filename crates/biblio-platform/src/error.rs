//! Error types for biblio-platform.

use biblio_proto::AgentId;
use thiserror::Error;

/// Errors raised by the platform boundary.
///
/// These are the only errors that end an agent session abnormally; every
/// negotiation failure travels over the protocol instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// A message was addressed to an agent with no mailbox.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(AgentId),

    /// A message had no receivers.
    #[error("message from {0} has no receivers")]
    NoReceivers(AgentId),

    /// An agent with this id is already attached.
    #[error("agent '{0}' is already attached")]
    AlreadyAttached(AgentId),

    /// The directory could not serve the request.
    #[error("directory error: {0}")]
    Directory(String),
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
