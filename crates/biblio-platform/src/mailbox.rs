//! Per-agent message queue with template-based selective receive.

use std::collections::VecDeque;
use std::time::Duration;

use biblio_proto::{Message, Template};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

/// FIFO queue of delivered messages.
///
/// Messages are appended in delivery order, so two messages from the same
/// sender are always seen in the order they were sent. Receiving removes the
/// oldest message matching a template and leaves the rest in place.
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
    arrived: Notify,
}

impl Mailbox {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and wakes the owner if it is waiting.
    pub fn deliver(&self, message: Message) {
        self.queue.lock().push_back(message);
        self.arrived.notify_one();
    }

    /// Removes and returns the oldest message matching `template`, without waiting.
    pub fn receive(&self, template: &Template) -> Option<Message> {
        let mut queue = self.queue.lock();
        let index = queue.iter().position(|m| template.matches(m))?;
        queue.remove(index)
    }

    /// Waits up to `timeout` for a message matching `template`.
    ///
    /// The task is parked between deliveries and re-checks the queue on each
    /// wake-up. Returns `None` once the deadline passes.
    pub async fn receive_within(&self, template: &Template, timeout: Duration) -> Option<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(message) = self.receive(template) {
                return Some(message);
            }
            if timeout_at(deadline, self.arrived.notified()).await.is_err() {
                return self.receive(template);
            }
        }
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use biblio_proto::{AgentId, Performative};

    fn msg(performative: Performative, content: &str) -> Message {
        Message::new(performative, AgentId::new("peer").unwrap()).with_content(content)
    }

    #[test]
    fn receive_takes_oldest_match_once() {
        let mailbox = Mailbox::new();
        mailbox.deliver(msg(Performative::Inform, "first"));
        mailbox.deliver(msg(Performative::Propose, "offer"));
        mailbox.deliver(msg(Performative::Inform, "second"));

        let inform = Template::performative(Performative::Inform);
        assert_eq!(mailbox.receive(&inform).unwrap().text().unwrap(), "first");
        assert_eq!(mailbox.receive(&inform).unwrap().text().unwrap(), "second");
        assert!(mailbox.receive(&inform).is_none());
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn non_matching_messages_stay_queued() {
        let mailbox = Mailbox::new();
        mailbox.deliver(msg(Performative::Refuse, "book-not-found"));
        assert!(mailbox.receive(&Template::performative(Performative::Propose)).is_none());
        assert_eq!(mailbox.len(), 1);
    }

    #[tokio::test]
    async fn receive_within_times_out() {
        let mailbox = Mailbox::new();
        let started = Instant::now();
        let got = mailbox
            .receive_within(&Template::Any, Duration::from_millis(30))
            .await;
        assert!(got.is_none());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn receive_within_wakes_on_delivery() {
        let mailbox = Arc::new(Mailbox::new());
        let sender = Arc::clone(&mailbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sender.deliver(msg(Performative::Inform, "noise"));
            tokio::time::sleep(Duration::from_millis(10)).await;
            sender.deliver(msg(Performative::Propose, "offer"));
        });

        let got = mailbox
            .receive_within(
                &Template::performative(Performative::Propose),
                Duration::from_secs(2),
            )
            .await
            .unwrap();
        assert_eq!(got.text().unwrap(), "offer");
        assert_eq!(mailbox.len(), 1);
    }
}
