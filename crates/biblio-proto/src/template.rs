//! Message templates used to pick relevant messages out of a mailbox.
//!
//! A [`Template`] is a small predicate language over the envelope:
//!
//! ```rust
//! use biblio_proto::{AgentId, Message, Performative, Template};
//!
//! let wanted = Template::conversation("book-loan").and(Template::any_of([
//!     Performative::Propose,
//!     Performative::Refuse,
//! ]));
//!
//! let clerk = AgentId::new("clerk").unwrap();
//! let reply = Message::new(Performative::Refuse, clerk).in_conversation("book-loan");
//! assert!(wanted.matches(&reply));
//! ```

use serde::{Deserialize, Serialize};

use crate::message::{Message, Performative};
use crate::types::AgentId;

/// Predicate over a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Matches every message.
    Any,
    /// Performative equals.
    Performative(Performative),
    /// Conversation id equals.
    ConversationId(String),
    /// Text content equals.
    Content(String),
    /// Reply-correlation token equals.
    InReplyTo(String),
    /// Sender equals.
    Sender(AgentId),
    /// Both sub-templates match.
    And(Box<Template>, Box<Template>),
    /// Either sub-template matches.
    Or(Box<Template>, Box<Template>),
    /// The sub-template does not match.
    Not(Box<Template>),
}

impl Template {
    /// Match on performative.
    #[must_use]
    pub const fn performative(performative: Performative) -> Self {
        Self::Performative(performative)
    }

    /// Match on conversation id.
    #[must_use]
    pub fn conversation(id: impl Into<String>) -> Self {
        Self::ConversationId(id.into())
    }

    /// Match on exact text content.
    #[must_use]
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    /// Match replies to the given token.
    #[must_use]
    pub fn in_reply_to(token: impl Into<String>) -> Self {
        Self::InReplyTo(token.into())
    }

    /// Match on sender.
    #[must_use]
    pub const fn sender(sender: AgentId) -> Self {
        Self::Sender(sender)
    }

    /// Match any of the given performatives. An empty set matches nothing.
    #[must_use]
    pub fn any_of(performatives: impl IntoIterator<Item = Performative>) -> Self {
        performatives
            .into_iter()
            .map(Self::Performative)
            .reduce(Self::or)
            .unwrap_or_else(|| Self::Any.not())
    }

    /// Conjunction.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate the template against a message.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Self::Any => true,
            Self::Performative(p) => message.performative == *p,
            Self::ConversationId(id) => message.conversation_id.as_deref() == Some(id.as_str()),
            Self::Content(text) => message.content.as_text() == Some(text.as_str()),
            Self::InReplyTo(token) => message.in_reply_to.as_deref() == Some(token.as_str()),
            Self::Sender(sender) => &message.sender == sender,
            Self::And(a, b) => a.matches(message) && b.matches(message),
            Self::Or(a, b) => a.matches(message) || b.matches(message),
            Self::Not(inner) => !inner.matches(message),
        }
    }
}
