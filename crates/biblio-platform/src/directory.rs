//! Capability directory: agents advertise what they offer and initiators
//! look responders up by capability instead of by name.

use biblio_proto::{AgentId, Capability};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{PlatformError, Result};

/// Registry client used by agents.
pub trait Directory: Send + Sync {
    /// Advertises `agent` under `capability`. Registering the same pair again
    /// only refreshes the display name.
    fn register(&self, agent: &AgentId, capability: &Capability, display_name: &str) -> Result<()>;

    /// Removes every advertisement of `agent` and returns how many were removed.
    fn deregister(&self, agent: &AgentId) -> Result<usize>;

    /// Agents advertising `capability`, in registration order.
    fn discover(&self, capability: &Capability) -> Result<Vec<AgentId>>;
}

/// One advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Advertised agent.
    pub agent: AgentId,
    /// Advertised capability.
    pub capability: Capability,
    /// Human-readable name.
    pub display_name: String,
    /// When the advertisement was first made.
    pub registered_at: DateTime<Utc>,
}

/// Directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: RwLock<Vec<Registration>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all advertisements.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        self.entries.read().clone()
    }

    /// Number of advertisements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Directory for InMemoryDirectory {
    fn register(&self, agent: &AgentId, capability: &Capability, display_name: &str) -> Result<()> {
        if display_name.trim().is_empty() {
            return Err(PlatformError::Directory(format!(
                "display name for '{agent}' cannot be blank"
            )));
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries
            .iter_mut()
            .find(|r| &r.agent == agent && &r.capability == capability)
        {
            existing.display_name = display_name.to_string();
            debug!(agent = %agent, capability = %capability, "Refreshed registration");
            return Ok(());
        }

        entries.push(Registration {
            agent: agent.clone(),
            capability: capability.clone(),
            display_name: display_name.to_string(),
            registered_at: Utc::now(),
        });
        info!(agent = %agent, capability = %capability, name = %display_name, "Registered agent");
        Ok(())
    }

    fn deregister(&self, agent: &AgentId) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|r| &r.agent != agent);
        let removed = before - entries.len();
        if removed > 0 {
            info!(agent = %agent, removed, "Deregistered agent");
        }
        Ok(removed)
    }

    fn discover(&self, capability: &Capability) -> Result<Vec<AgentId>> {
        let found: Vec<AgentId> = self
            .entries
            .read()
            .iter()
            .filter(|r| &r.capability == capability)
            .map(|r| r.agent.clone())
            .collect();
        debug!(capability = %capability, count = found.len(), "Discovery");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[test]
    fn discover_in_registration_order() {
        let dir = InMemoryDirectory::new();
        let selling = Capability::book_selling();
        dir.register(&agent("seller-2"), &selling, "Seller 2").unwrap();
        dir.register(&agent("seller-1"), &selling, "Seller 1").unwrap();
        dir.register(&agent("clerk"), &Capability::library_service(), "Clerk").unwrap();

        assert_eq!(
            dir.discover(&selling).unwrap(),
            vec![agent("seller-2"), agent("seller-1")]
        );
    }

    #[test]
    fn register_is_idempotent() {
        let dir = InMemoryDirectory::new();
        let selling = Capability::book_selling();
        dir.register(&agent("seller-1"), &selling, "Seller").unwrap();
        dir.register(&agent("seller-1"), &selling, "Seller One").unwrap();

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.registrations()[0].display_name, "Seller One");
    }

    #[test]
    fn discover_twice_is_stable() {
        let dir = InMemoryDirectory::new();
        let selling = Capability::book_selling();
        for name in ["a", "b", "c"] {
            dir.register(&agent(name), &selling, name).unwrap();
        }
        assert_eq!(dir.discover(&selling).unwrap(), dir.discover(&selling).unwrap());
    }

    #[test]
    fn deregister_removes_all_capabilities() {
        let dir = InMemoryDirectory::new();
        let a = agent("both");
        dir.register(&a, &Capability::book_selling(), "Both").unwrap();
        dir.register(&a, &Capability::library_service(), "Both").unwrap();

        assert_eq!(dir.deregister(&a).unwrap(), 2);
        assert!(dir.is_empty());
        assert_eq!(dir.deregister(&a).unwrap(), 0);
        assert!(dir.discover(&Capability::book_selling()).unwrap().is_empty());
    }

    #[test]
    fn blank_display_name_is_rejected() {
        let dir = InMemoryDirectory::new();
        let err = dir
            .register(&agent("x"), &Capability::book_selling(), "  ")
            .unwrap_err();
        assert!(matches!(err, PlatformError::Directory(_)));
    }
}
