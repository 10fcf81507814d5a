//! List borrower: submits a wanted list and borrows the found titles when
//! enough of the list is on the shelf.

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{
    AgentId, Capability, Performative, Template, WantedList, conversation, new_token, reason,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::selection::should_borrow;
use crate::session::{Session, SessionOutcome, SessionPhase, conclude};
use crate::timings::AgentTimings;

/// A reader with a reading list and a utility threshold.
#[derive(Debug, Clone)]
pub struct ListBorrower {
    wanted: WantedList,
}

impl ListBorrower {
    /// Creates a borrower for `wanted`.
    #[must_use]
    pub const fn new(wanted: WantedList) -> Self {
        Self { wanted }
    }

    /// The wanted list.
    #[must_use]
    pub const fn wanted(&self) -> &WantedList {
        &self.wanted
    }

    /// Runs the search and, if worthwhile, the bulk loan; then reports and detaches.
    pub async fn run(self, ctx: AgentContext, timings: AgentTimings) -> Result<SessionOutcome> {
        ctx.notify(
            NotificationCategory::New,
            format!(
                "looking for {} (threshold {:.2})",
                self.wanted,
                self.wanted.threshold().value()
            ),
        );
        let result = self.borrow(&ctx, &timings).await;
        conclude(ctx, result)
    }

    async fn borrow(&self, ctx: &AgentContext, timings: &AgentTimings) -> Result<SessionOutcome> {
        let mut session = Session::new(ctx.id().clone());

        session.advance(SessionPhase::AwaitingDiscovery);
        let Some(clerk) = ctx.discover(&Capability::library_service())?.into_iter().next() else {
            ctx.notify(NotificationCategory::Info, "no library clerk found");
            return Ok(SessionOutcome::NoResponders);
        };

        let token = new_token("list");
        ctx.send(
            ctx.message(Performative::Confirm)
                .to(clerk.clone())
                .with_content(self.wanted.clone())
                .in_conversation(conversation::LIST_SEARCH)
                .reply_with(token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingSearchAck);
        let from_search = Template::conversation(conversation::LIST_SEARCH)
            .and(Template::in_reply_to(token))
            .and(Template::performative(Performative::Inform));
        let ack = from_search
            .clone()
            .and(Template::content(reason::SEARCH_IN_PROGRESS));
        if ctx.receive_within(&ack, timings.reply_timeout()).await.is_none() {
            ctx.notify(NotificationCategory::Info, "clerk did not acknowledge");
            return Ok(session.timed_out());
        }

        session.advance(SessionPhase::AwaitingOffers);
        let answer = from_search.and(Template::content(reason::SEARCH_IN_PROGRESS).not());
        let Some(reply) = ctx.receive_within(&answer, timings.reply_timeout()).await else {
            ctx.notify(NotificationCategory::Info, "no search result from the clerk");
            return Ok(session.timed_out());
        };
        let result = reply.content.search_result()?;
        let utility = result.utility();
        info!(
            agent = %ctx.id(),
            found = result.found_count(),
            requested = result.requested_count(),
            utility,
            "Search result"
        );
        ctx.notify(
            NotificationCategory::Info,
            format!(
                "found {}/{} titles (utility {utility:.2})",
                result.found_count(),
                result.requested_count()
            ),
        );

        Self::courtesy(ctx, &clerk, conversation::LIST_SEARCH, reason::THINKING)?;
        ctx.pause(timings.think_time()).await;

        if !should_borrow(result, &self.wanted) {
            session.advance(SessionPhase::Done);
            ctx.notify(
                NotificationCategory::Info,
                format!(
                    "not worth it: {utility:.2} below {:.2}",
                    self.wanted.threshold().value()
                ),
            );
            Self::courtesy(ctx, &clerk, conversation::LIST_SEARCH, reason::NO_THANKS)?;
            return Ok(SessionOutcome::Declined { utility });
        }

        let titles = result.found_titles();
        debug!(agent = %ctx.id(), titles = ?titles, "Borrowing found titles");
        let loan_token = new_token("bulk");
        ctx.send(
            ctx.message(Performative::Agree)
                .to(clerk.clone())
                .with_content(reason::encode_title_list(&titles))
                .in_conversation(conversation::LIST_LOAN)
                .reply_with(loan_token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingConfirmation);
        let report_template = Template::conversation(conversation::LIST_LOAN)
            .and(Template::in_reply_to(loan_token))
            .and(Template::performative(Performative::Inform));
        let Some(reply) = ctx
            .receive_within(&report_template, timings.reply_timeout())
            .await
        else {
            ctx.notify(NotificationCategory::Info, "bulk loan never confirmed");
            return Ok(session.timed_out());
        };
        let report = reply.content.loan_report()?.clone();

        session.advance(SessionPhase::Done);
        if report.outcomes().is_empty() {
            ctx.notify(NotificationCategory::Info, "nothing on the list to borrow");
        } else if report.all_borrowed() {
            ctx.notify(
                NotificationCategory::Transaction,
                format!(
                    "borrowed {} titles, due in {} days",
                    report.outcomes().len(),
                    report.min_loan_days().unwrap_or_default()
                ),
            );
        } else {
            warn!(agent = %ctx.id(), report = %report, "Some titles went to other readers");
            ctx.notify(NotificationCategory::Info, format!("partial loan: {report}"));
        }
        Self::courtesy(ctx, &clerk, conversation::LIST_LOAN, reason::THANKS)?;
        Ok(SessionOutcome::BorrowedList { report })
    }

    fn courtesy(ctx: &AgentContext, clerk: &AgentId, conversation_id: &str, text: &str) -> Result<()> {
        ctx.send(
            ctx.message(Performative::Inform)
                .to(clerk.clone())
                .with_content(text)
                .in_conversation(conversation_id),
        )?;
        Ok(())
    }
}
