//! Observer notifications.
//!
//! Agents report lifecycle events and transactions to a
//! [`NotificationSink`]. Sinks are fire-and-forget: they never block the
//! caller and never fail.

use std::fmt;
use std::sync::Arc;

use biblio_proto::AgentId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

/// Kind of event being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    /// An agent started.
    New,
    /// Progress information.
    Info,
    /// An agent finished.
    End,
    /// Stock changed hands.
    Transaction,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "NEW",
            Self::Info => "INFO",
            Self::End => "END",
            Self::Transaction => "TRANSACTION",
        };
        f.write_str(name)
    }
}

/// Consumer of agent notifications.
pub trait NotificationSink: Send + Sync {
    /// Records one notification.
    fn notify(&self, agent: &AgentId, category: NotificationCategory, text: &str);
}

/// Emits each notification as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, agent: &AgentId, category: NotificationCategory, text: &str) {
        info!(target: "biblio::notify", agent = %agent, category = %category, "{text}");
    }
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Reporting agent.
    pub agent: AgentId,
    /// Event kind.
    pub category: NotificationCategory,
    /// Free-form text.
    pub text: String,
    /// When it was recorded.
    pub at: DateTime<Utc>,
}

/// Keeps every notification in memory, in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<Notification>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notification.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Notifications of one category.
    #[must_use]
    pub fn by_category(&self, category: NotificationCategory) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.category == category)
            .cloned()
            .collect()
    }

    /// Transaction notifications.
    #[must_use]
    pub fn transactions(&self) -> Vec<Notification> {
        self.by_category(NotificationCategory::Transaction)
    }

    /// Notifications reported by `agent`.
    #[must_use]
    pub fn for_agent(&self, agent: &AgentId) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| &n.agent == agent)
            .cloned()
            .collect()
    }

    /// Number of notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl NotificationSink for EventLog {
    fn notify(&self, agent: &AgentId, category: NotificationCategory, text: &str) {
        self.entries.lock().push(Notification {
            agent: agent.clone(),
            category,
            text: text.to_string(),
            at: Utc::now(),
        });
    }
}

/// Forwards every notification to several sinks.
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl CompositeSink {
    /// Creates a sink with no targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl NotificationSink for CompositeSink {
    fn notify(&self, agent: &AgentId, category: NotificationCategory, text: &str) {
        for sink in &self.sinks {
            sink.notify(agent, category, text);
        }
    }
}
