//! Message routing between attached agents.

use std::collections::HashMap;
use std::sync::Arc;

use biblio_proto::{AgentId, Message};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{PlatformError, Result};
use crate::mailbox::Mailbox;

/// Outbound side of the platform.
pub trait Transport: Send + Sync {
    /// Delivers `message` to every receiver.
    ///
    /// Known receivers get the message even when another receiver is
    /// unknown; the first unknown receiver is reported as an error.
    fn send(&self, message: Message) -> Result<()>;
}

/// Routes messages to the mailboxes of attached agents.
#[derive(Debug, Default)]
pub struct PostOffice {
    mailboxes: RwLock<HashMap<AgentId, Arc<Mailbox>>>,
}

impl PostOffice {
    /// Creates a post office with no mailboxes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a mailbox for `agent`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::AlreadyAttached`] if the agent already has one.
    pub fn open(&self, agent: &AgentId) -> Result<Arc<Mailbox>> {
        let mut mailboxes = self.mailboxes.write();
        if mailboxes.contains_key(agent) {
            return Err(PlatformError::AlreadyAttached(agent.clone()));
        }
        let mailbox = Arc::new(Mailbox::new());
        mailboxes.insert(agent.clone(), Arc::clone(&mailbox));
        debug!(agent = %agent, "Opened mailbox");
        Ok(mailbox)
    }

    /// Closes the mailbox of `agent`. Undelivered messages are dropped.
    pub fn close(&self, agent: &AgentId) {
        if let Some(mailbox) = self.mailboxes.write().remove(agent) {
            if !mailbox.is_empty() {
                debug!(agent = %agent, dropped = mailbox.len(), "Closed mailbox with pending messages");
            }
        }
    }

    /// Returns true if `agent` has an open mailbox.
    #[must_use]
    pub fn is_open(&self, agent: &AgentId) -> bool {
        self.mailboxes.read().contains_key(agent)
    }

    /// Number of open mailboxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailboxes.read().len()
    }

    /// Returns true if no mailbox is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mailboxes.read().is_empty()
    }
}

impl Transport for PostOffice {
    fn send(&self, message: Message) -> Result<()> {
        if message.receivers.is_empty() {
            return Err(PlatformError::NoReceivers(message.sender));
        }

        let mailboxes = self.mailboxes.read();
        let mut first_unknown = None;
        for receiver in &message.receivers {
            match mailboxes.get(receiver) {
                Some(mailbox) => {
                    trace!(from = %message.sender, to = %receiver, performative = %message.performative, "Delivering");
                    mailbox.deliver(message.clone());
                }
                None => {
                    warn!(from = %message.sender, to = %receiver, "No mailbox for receiver");
                    first_unknown.get_or_insert_with(|| receiver.clone());
                }
            }
        }

        match first_unknown {
            Some(receiver) => Err(PlatformError::UnknownRecipient(receiver)),
            None => Ok(()),
        }
    }
}
