//! Identity types shared by every agent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Name of an agent on the platform.
///
/// Agent names are chosen at spawn time (`"seller-1"`, `"clerk"`) and are
/// unique for the lifetime of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent id, rejecting empty or whitespace-only names.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtoError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProtoError::Validation("agent name cannot be empty".to_string()));
        }
        Ok(Self(name))
    }

    /// Get the agent name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability tag an agent advertises in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    /// Tag advertised by book sellers.
    pub const BOOK_SELLING: &'static str = "book-selling";
    /// Tag advertised by library clerks.
    pub const LIBRARY_SERVICE: &'static str = "library-service";

    /// Create a capability tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The capability sellers register under.
    #[must_use]
    pub fn book_selling() -> Self {
        Self::new(Self::BOOK_SELLING)
    }

    /// The capability library clerks register under.
    #[must_use]
    pub fn library_service() -> Self {
        Self::new(Self::LIBRARY_SERVICE)
    }

    /// Get the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
