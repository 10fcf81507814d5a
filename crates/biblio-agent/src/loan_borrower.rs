//! Single-loan borrower: negotiates a loan of one title, possibly several copies.

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{
    AgentId, Capability, ItemRequest, LoanConfirmation, LoanOffer, Message, Performative,
    ProtoError, RefuseReason, Template, conversation, new_token, reason,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::{Session, SessionOutcome, SessionPhase, conclude};
use crate::timings::AgentTimings;

/// A reader who wants to take copies of one title home.
#[derive(Debug, Clone)]
pub struct SingleLoanBorrower {
    request: ItemRequest,
}

impl SingleLoanBorrower {
    /// Creates a borrower for `copies` of `title`.
    #[must_use]
    pub fn new(title: impl Into<String>, copies: u32) -> Self {
        Self {
            request: ItemRequest::new(title, copies),
        }
    }

    /// What is being asked for.
    #[must_use]
    pub const fn request(&self) -> &ItemRequest {
        &self.request
    }

    /// Runs the loan negotiation, then reports and detaches.
    pub async fn run(self, ctx: AgentContext, timings: AgentTimings) -> Result<SessionOutcome> {
        ctx.notify(
            NotificationCategory::New,
            format!(
                "wants {} x \"{}\"",
                self.request.copies, self.request.title
            ),
        );
        let result = self.borrow(&ctx, &timings).await;
        conclude(ctx, result)
    }

    async fn borrow(&self, ctx: &AgentContext, timings: &AgentTimings) -> Result<SessionOutcome> {
        let mut session = Session::new(ctx.id().clone());
        let title = &self.request.title;

        session.advance(SessionPhase::AwaitingDiscovery);
        let Some(clerk) = ctx.discover(&Capability::library_service())?.into_iter().next() else {
            ctx.notify(NotificationCategory::Info, "no library clerk found");
            return Ok(SessionOutcome::NoResponders);
        };

        let token = new_token("loan");
        ctx.send(
            ctx.message(Performative::CallForProposal)
                .to(clerk.clone())
                .with_content(self.request.encode())
                .in_conversation(conversation::BOOK_LOAN)
                .reply_with(token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingSearchAck);
        let ack = Template::conversation(conversation::LOAN_SEARCH)
            .and(Template::in_reply_to(token.as_str()))
            .and(Template::performative(Performative::Inform));
        if ctx.receive_within(&ack, timings.reply_timeout()).await.is_none() {
            ctx.notify(NotificationCategory::Info, "clerk did not acknowledge");
            return Ok(session.timed_out());
        }

        session.advance(SessionPhase::AwaitingOffers);
        let answer = Template::conversation(conversation::BOOK_LOAN)
            .and(Template::in_reply_to(token))
            .and(Template::any_of([Performative::Propose, Performative::Refuse]));
        let Some(reply) = Self::next_well_formed(ctx, &answer, timings).await else {
            ctx.notify(NotificationCategory::Info, "no answer from the clerk");
            return Ok(session.timed_out());
        };

        let offer = match reply {
            Answer::Refused(reason_code) => {
                let text = match reason_code {
                    RefuseReason::NotFound => format!("\"{title}\" is not in the library"),
                    RefuseReason::InsufficientCopies { available } => {
                        format!("only {available} copies of \"{title}\" left")
                    }
                };
                ctx.notify(NotificationCategory::Info, text);
                session.advance(SessionPhase::Done);
                Self::courtesy(ctx, &clerk, reason::THANKS_ANYWAY)?;
                return Ok(SessionOutcome::Refused {
                    title: title.clone(),
                    reason: reason_code,
                });
            }
            Answer::Offered(offer) => offer,
        };
        debug!(agent = %ctx.id(), title = %title, max_loan_days = offer.max_loan_days, "Loan offered");

        let accept_token = new_token("accept");
        ctx.send(
            ctx.message(Performative::AcceptProposal)
                .to(clerk.clone())
                .with_content(self.request.encode())
                .in_conversation(conversation::BOOK_LOAN)
                .reply_with(accept_token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingConfirmation);
        let confirmation = Template::in_reply_to(accept_token)
            .and(Template::any_of([Performative::Inform, Performative::Failure]));
        let Some(reply) = ctx
            .receive_within(&confirmation, timings.reply_timeout())
            .await
        else {
            ctx.notify(NotificationCategory::Info, "loan never confirmed");
            return Ok(session.timed_out());
        };

        session.advance(SessionPhase::Done);
        if reply.performative == Performative::Failure {
            ctx.notify(
                NotificationCategory::Info,
                format!("\"{title}\" went to someone else"),
            );
            Self::courtesy(ctx, &clerk, reason::THANKS_ANYWAY)?;
            return Ok(SessionOutcome::LoanFailed {
                title: title.clone(),
            });
        }

        let loan_days = match reply.text().and_then(LoanConfirmation::parse) {
            Ok(confirmation) => confirmation.loan_days,
            Err(e) => {
                warn!(agent = %ctx.id(), error = %e, "Confirmation without terms, using offer");
                offer.max_loan_days
            }
        };
        ctx.notify(
            NotificationCategory::Transaction,
            format!(
                "borrowed {} x \"{title}\" for {loan_days} days",
                self.request.copies
            ),
        );
        Self::courtesy(ctx, &clerk, reason::THANKS)?;
        Ok(SessionOutcome::Borrowed {
            title: title.clone(),
            loan_days,
        })
    }

    /// Waits for a proposal or refusal, skipping unreadable ones.
    async fn next_well_formed(
        ctx: &AgentContext,
        template: &Template,
        timings: &AgentTimings,
    ) -> Option<Answer> {
        let deadline = Instant::now() + timings.reply_timeout();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let reply = ctx.receive_within(template, remaining).await?;
            match Answer::read(&reply) {
                Ok(answer) => return Some(answer),
                Err(e) => warn!(agent = %ctx.id(), error = %e, "Dropped malformed reply"),
            }
        }
    }

    fn courtesy(ctx: &AgentContext, clerk: &AgentId, text: &str) -> Result<()> {
        ctx.send(
            ctx.message(Performative::Inform)
                .to(clerk.clone())
                .with_content(text)
                .in_conversation(conversation::BOOK_LOAN),
        )?;
        Ok(())
    }
}

/// The clerk's answer to a loan request.
enum Answer {
    Offered(LoanOffer),
    Refused(RefuseReason),
}

impl Answer {
    fn read(message: &Message) -> std::result::Result<Self, ProtoError> {
        let text = message.text()?;
        if message.performative == Performative::Propose {
            LoanOffer::parse(text).map(Self::Offered)
        } else {
            RefuseReason::parse(text).map(Self::Refused)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clerk::LibraryClerk;
    use crate::responder::start;
    use biblio_platform::{EventLog, Platform};
    use biblio_proto::BookRecord;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn borrows_then_second_reader_is_refused() {
        let log = Arc::new(EventLog::new());
        let platform = Platform::new(log.clone());
        let cancel = CancellationToken::new();
        let clerk = LibraryClerk::new(
            "Clerk",
            [BookRecord::for_loan("1984", "George Orwell", 3, 21)],
            AgentTimings::instant(),
        );
        let task = start(clerk, platform.attach(agent("clerk")).unwrap(), cancel.clone()).unwrap();

        let first = SingleLoanBorrower::new("1984", 2)
            .run(platform.attach(agent("user2")).unwrap(), AgentTimings::instant())
            .await
            .unwrap();
        assert_eq!(first, SessionOutcome::Borrowed { title: "1984".into(), loan_days: 21 });

        let second = SingleLoanBorrower::new("1984", 2)
            .run(platform.attach(agent("user6")).unwrap(), AgentTimings::instant())
            .await
            .unwrap();
        assert_eq!(
            second,
            SessionOutcome::Refused {
                title: "1984".into(),
                reason: RefuseReason::InsufficientCopies { available: 1 },
            }
        );

        cancel.cancel();
        let clerk = task.await.unwrap().unwrap();
        assert_eq!(clerk.catalog().lookup("1984").map(|b| b.quantity), Some(1));
        assert_eq!(log.transactions().len(), 2);
    }

    #[tokio::test]
    async fn silent_clerk_times_out_waiting_for_ack() {
        let platform = Platform::default();
        let silent = platform.attach(agent("clerk")).unwrap();
        silent.register(&Capability::library_service(), "Silent").unwrap();

        let timings = AgentTimings {
            reply_timeout_ms: 50,
            ..AgentTimings::instant()
        };
        let outcome = SingleLoanBorrower::new("Dune", 1)
            .run(platform.attach(agent("user")).unwrap(), timings)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Timeout { phase: SessionPhase::AwaitingSearchAck }
        );
    }
}
