//! Simple borrower: asks the library whether one title is on the shelf.

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{Capability, Performative, Template, conversation, new_token, reason};
use tracing::debug;

use crate::error::Result;
use crate::session::{Session, SessionOutcome, SessionPhase, conclude};
use crate::timings::AgentTimings;

/// A reader who only wants to know if a title is available.
#[derive(Debug, Clone)]
pub struct SimpleBorrower {
    title: String,
}

impl SimpleBorrower {
    /// Creates a borrower asking about `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// Runs the inquiry, then reports and detaches.
    pub async fn run(self, ctx: AgentContext, timings: AgentTimings) -> Result<SessionOutcome> {
        ctx.notify(
            NotificationCategory::New,
            format!("asking about \"{}\"", self.title),
        );
        let result = self.inquire(&ctx, &timings).await;
        conclude(ctx, result)
    }

    async fn inquire(&self, ctx: &AgentContext, timings: &AgentTimings) -> Result<SessionOutcome> {
        let mut session = Session::new(ctx.id().clone());

        session.advance(SessionPhase::AwaitingDiscovery);
        let Some(clerk) = ctx.discover(&Capability::library_service())?.into_iter().next() else {
            ctx.notify(NotificationCategory::Info, "no library clerk found");
            return Ok(SessionOutcome::NoResponders);
        };

        let token = new_token("search");
        ctx.send(
            ctx.message(Performative::Request)
                .to(clerk.clone())
                .with_content(self.title.as_str())
                .in_conversation(conversation::BOOK_SEARCH)
                .reply_with(token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingSearchAck);
        let ack = Template::conversation(conversation::BOOK_SEARCH)
            .and(Template::in_reply_to(token.as_str()))
            .and(Template::performative(Performative::Inform));
        if ctx.receive_within(&ack, timings.reply_timeout()).await.is_none() {
            ctx.notify(NotificationCategory::Info, "clerk did not acknowledge");
            return Ok(session.timed_out());
        }
        debug!(agent = %ctx.id(), title = %self.title, "Search acknowledged");

        session.advance(SessionPhase::AwaitingOffers);
        let answer = Template::conversation(conversation::SEARCH_RESULT)
            .and(Template::in_reply_to(token))
            .and(Template::any_of([Performative::Inform, Performative::Failure]));
        let Some(reply) = ctx.receive_within(&answer, timings.reply_timeout()).await else {
            ctx.notify(NotificationCategory::Info, "no answer from the clerk");
            return Ok(session.timed_out());
        };

        session.advance(SessionPhase::Done);
        let outcome = if reply.performative == Performative::Inform {
            SessionOutcome::Available {
                title: self.title.clone(),
            }
        } else {
            SessionOutcome::Unavailable {
                title: self.title.clone(),
            }
        };
        ctx.notify(NotificationCategory::Info, outcome.to_string());
        ctx.send(
            ctx.reply(&reply, Performative::Inform)
                .with_content(reason::THANKS),
        )?;
        Ok(outcome)
    }
}
