//! The in-process platform agents run on, and the per-agent handle to it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use biblio_proto::{AgentId, Capability, Message, Performative, Template};
use tracing::{debug, warn};

use crate::directory::{Directory, InMemoryDirectory};
use crate::error::Result;
use crate::mailbox::Mailbox;
use crate::post_office::{PostOffice, Transport};
use crate::sink::{NotificationCategory, NotificationSink, TracingSink};

/// Shared services: directory, message routing and notifications.
///
/// Cloning is cheap; every clone talks to the same services.
#[derive(Clone)]
pub struct Platform {
    directory: Arc<dyn Directory>,
    post_office: Arc<PostOffice>,
    sink: Arc<dyn NotificationSink>,
}

impl Platform {
    /// Creates a platform with an in-memory directory and the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_directory(Arc::new(InMemoryDirectory::new()), sink)
    }

    /// Creates a platform around an existing directory.
    #[must_use]
    pub fn with_directory(directory: Arc<dyn Directory>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            directory,
            post_office: Arc::new(PostOffice::new()),
            sink,
        }
    }

    /// Directory shared by all agents.
    #[must_use]
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Message router shared by all agents.
    #[must_use]
    pub fn post_office(&self) -> &Arc<PostOffice> {
        &self.post_office
    }

    /// Attaches an agent and returns its context.
    ///
    /// # Errors
    ///
    /// Returns an error if an agent with the same id is already attached.
    pub fn attach(&self, id: AgentId) -> Result<AgentContext> {
        let mailbox = self.post_office.open(&id)?;
        Ok(AgentContext {
            id,
            platform: self.clone(),
            mailbox,
        })
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("mailboxes", &self.post_office.len())
            .finish_non_exhaustive()
    }
}

/// An attached agent's view of the platform.
///
/// Each agent task owns exactly one context; its mailbox is read only
/// through it.
#[derive(Debug)]
pub struct AgentContext {
    id: AgentId,
    platform: Platform,
    mailbox: Arc<Mailbox>,
}

impl AgentContext {
    /// This agent's id.
    #[must_use]
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Starts a message from this agent.
    #[must_use]
    pub fn message(&self, performative: Performative) -> Message {
        Message::new(performative, self.id.clone())
    }

    /// Starts a reply from this agent to `original`.
    #[must_use]
    pub fn reply(&self, original: &Message, performative: Performative) -> Message {
        original.reply(self.id.clone(), performative)
    }

    /// Advertises this agent under `capability`.
    pub fn register(&self, capability: &Capability, display_name: &str) -> Result<()> {
        self.platform
            .directory
            .register(&self.id, capability, display_name)
    }

    /// Removes this agent's advertisements.
    pub fn deregister(&self) -> Result<usize> {
        self.platform.directory.deregister(&self.id)
    }

    /// Agents advertising `capability`, excluding this one.
    pub fn discover(&self, capability: &Capability) -> Result<Vec<AgentId>> {
        let mut agents = self.platform.directory.discover(capability)?;
        agents.retain(|a| a != &self.id);
        Ok(agents)
    }

    /// Sends a message.
    pub fn send(&self, message: Message) -> Result<()> {
        debug!(agent = %self.id, message = %message, "Sending");
        self.platform.post_office.send(message)
    }

    /// Takes the oldest queued message matching `template`, without waiting.
    pub fn receive(&self, template: &Template) -> Option<Message> {
        self.mailbox.receive(template)
    }

    /// Waits up to `timeout` for a message matching `template`.
    pub async fn receive_within(&self, template: &Template, timeout: Duration) -> Option<Message> {
        self.mailbox.receive_within(template, timeout).await
    }

    /// Number of messages waiting in this agent's mailbox.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.mailbox.len()
    }

    /// Reports an event to the platform's sink.
    pub fn notify(&self, category: NotificationCategory, text: impl AsRef<str>) {
        self.platform.sink.notify(&self.id, category, text.as_ref());
    }

    /// Sleeps for `duration`; zero returns immediately.
    pub async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// Deregisters and closes the mailbox.
    pub fn detach(self) {
        if let Err(e) = self.platform.directory.deregister(&self.id) {
            warn!(agent = %self.id, error = %e, "Deregistration failed on detach");
        }
        self.platform.post_office.close(&self.id);
        debug!(agent = %self.id, "Detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::sink::EventLog;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn agents_exchange_messages() {
        let platform = Platform::default();
        let seller = platform.attach(agent("seller")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();

        buyer
            .send(
                buyer
                    .message(Performative::CallForProposal)
                    .to(seller.id().clone())
                    .with_content("1984")
                    .reply_with("cfp-1"),
            )
            .unwrap();

        let cfp = seller
            .receive_within(&Template::performative(Performative::CallForProposal), Duration::from_secs(1))
            .await
            .unwrap();
        seller.send(seller.reply(&cfp, Performative::Refuse).with_content("book-not-found")).unwrap();

        let reply = buyer.receive(&Template::in_reply_to("cfp-1")).unwrap();
        assert_eq!(reply.performative, Performative::Refuse);
    }

    #[test]
    fn discover_excludes_self() {
        let platform = Platform::default();
        let a = platform.attach(agent("a")).unwrap();
        let b = platform.attach(agent("b")).unwrap();
        let cap = Capability::book_selling();
        a.register(&cap, "A").unwrap();
        b.register(&cap, "B").unwrap();

        assert_eq!(a.discover(&cap).unwrap(), vec![agent("b")]);
    }

    #[test]
    fn detach_deregisters_and_closes() {
        let platform = Platform::default();
        let a = platform.attach(agent("a")).unwrap();
        let observer = platform.attach(agent("observer")).unwrap();
        a.register(&Capability::library_service(), "A").unwrap();
        a.detach();

        assert!(observer.discover(&Capability::library_service()).unwrap().is_empty());
        let msg = observer.message(Performative::Inform).to(agent("a"));
        assert_eq!(observer.send(msg).unwrap_err(), PlatformError::UnknownRecipient(agent("a")));
        assert!(platform.attach(agent("a")).is_ok());
    }

    #[test]
    fn notifications_reach_the_sink() {
        let log = Arc::new(EventLog::new());
        let platform = Platform::new(log.clone());
        let a = platform.attach(agent("a")).unwrap();
        a.notify(NotificationCategory::New, "hello");

        let entries = log.for_agent(&agent("a"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, NotificationCategory::New);
    }
}
