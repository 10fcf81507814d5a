//! Error types for biblio-ledger.

use biblio_proto::RefuseReason;
use thiserror::Error;

/// Errors returned by catalog checks and mutations.
///
/// None of these are fatal to the owning agent: they are turned into
/// `REFUSE` or `FAILURE` replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The title is not in the catalog.
    #[error("title not found: {title}")]
    NotFound {
        /// Requested title.
        title: String,
    },

    /// Not enough copies on hand.
    #[error("insufficient stock for {title}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Requested title.
        title: String,
        /// Copies requested.
        requested: u32,
        /// Copies on hand.
        available: u32,
    },

    /// A request for zero copies.
    #[error("invalid copy count for {title}")]
    InvalidCount {
        /// Requested title.
        title: String,
    },
}

impl LedgerError {
    /// Reason to put in a refusal sent back to the requester.
    pub fn refuse_reason(&self) -> RefuseReason {
        match self {
            Self::NotFound { .. } | Self::InvalidCount { .. } => RefuseReason::NotFound,
            Self::InsufficientStock { available, .. } => RefuseReason::InsufficientCopies {
                available: *available,
            },
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_reasons() {
        let missing = LedgerError::NotFound { title: "Hamlet".into() };
        assert_eq!(missing.refuse_reason().encode(), "book-not-found");

        let short = LedgerError::InsufficientStock {
            title: "Dune".into(),
            requested: 1,
            available: 0,
        };
        assert_eq!(short.refuse_reason().encode(), "insufficient-copies:0");
        assert_eq!(
            short.to_string(),
            "insufficient stock for Dune: requested 1, available 0"
        );
    }
}
