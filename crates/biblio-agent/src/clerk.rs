//! Library clerk: availability questions, single-title loans, wanted-list
//! searches and bulk loans against one library catalog.

use biblio_ledger::Catalog;
use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{
    BookRecord, Capability, ItemRequest, LoanConfirmation, LoanOffer, LoanReport, LoanStatus,
    Message, Performative, TitleOutcome, conversation, reason,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::responder::Responder;
use crate::timings::AgentTimings;

/// Counters reported when the clerk closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClerkStats {
    /// Requests answered: availability questions, loan requests, searches and bulk loans.
    pub requests_handled: u64,
    /// Copies lent.
    pub loans_granted: u64,
}

/// The library's front desk.
#[derive(Debug, Clone)]
pub struct LibraryClerk {
    name: String,
    catalog: Catalog,
    timings: AgentTimings,
    stats: ClerkStats,
}

impl LibraryClerk {
    /// Creates a clerk for the given collection.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        books: impl IntoIterator<Item = BookRecord>,
        timings: AgentTimings,
    ) -> Self {
        Self {
            name: name.into(),
            catalog: books.into_iter().collect(),
            timings,
            stats: ClerkStats::default(),
        }
    }

    /// Current collection.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> ClerkStats {
        self.stats
    }

    fn acknowledge(ctx: &AgentContext, message: &Message, conversation_id: &str) -> Result<()> {
        ctx.send(
            ctx.reply(message, Performative::Inform)
                .in_conversation(conversation_id)
                .with_content(reason::SEARCH_IN_PROGRESS),
        )?;
        Ok(())
    }

    /// `Request(title)`: is the title on the shelf?
    async fn on_request(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let title = message.text()?.to_string();
        self.stats.requests_handled += 1;
        Self::acknowledge(ctx, message, conversation::BOOK_SEARCH)?;
        ctx.pause(self.timings.search_delay()).await;

        let available = self.catalog.is_available(&title);
        debug!(agent = %ctx.id(), title = %title, available, "Availability checked");
        let reply = if available {
            ctx.reply(message, Performative::Inform)
                .with_content(reason::AVAILABLE)
        } else {
            ctx.reply(message, Performative::Failure)
                .with_content(reason::UNAVAILABLE)
        };
        ctx.send(reply.in_conversation(conversation::SEARCH_RESULT))?;
        Ok(())
    }

    /// `CallForProposal("title[:count]")`: offer loan terms or refuse.
    async fn on_call_for_proposal(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let request = ItemRequest::parse(message.text()?)?;
        self.stats.requests_handled += 1;
        Self::acknowledge(ctx, message, conversation::LOAN_SEARCH)?;
        ctx.pause(self.timings.search_delay()).await;

        let reply = match self.catalog.check(&request.title, request.copies) {
            Ok(record) => {
                let max_loan_days = record.max_loan_days().unwrap_or_default();
                ctx.reply(message, Performative::Propose)
                    .with_content(LoanOffer { max_loan_days }.encode())
            }
            Err(e) => {
                debug!(agent = %ctx.id(), title = %request.title, reason = %e, "Refusing loan");
                ctx.reply(message, Performative::Refuse)
                    .with_content(e.refuse_reason().encode())
            }
        };
        ctx.send(reply)?;
        Ok(())
    }

    /// `AcceptProposal("title:count")`: re-check and lend.
    ///
    /// Stock only moves once the confirmation has been delivered, so a reader
    /// who has already left takes nothing.
    fn on_accept(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let request = ItemRequest::parse(message.text()?)?;
        let borrower = &message.sender;

        let loan_days = match self.catalog.check(&request.title, request.copies) {
            Ok(record) => record.max_loan_days().unwrap_or_default(),
            Err(e) => {
                info!(agent = %ctx.id(), title = %request.title, borrower = %borrower, reason = %e, "Loan no longer possible");
                ctx.send(
                    ctx.reply(message, Performative::Failure)
                        .with_content(reason::NO_LONGER_AVAILABLE),
                )?;
                return Ok(());
            }
        };

        ctx.send(
            ctx.reply(message, Performative::Inform)
                .with_content(LoanConfirmation { loan_days }.encode()),
        )?;
        let remaining = self.catalog.decrement(&request.title, request.copies)?;
        self.stats.loans_granted += u64::from(request.copies);
        info!(agent = %ctx.id(), title = %request.title, copies = request.copies, remaining, borrower = %borrower, "Loan granted");
        ctx.notify(
            NotificationCategory::Info,
            format!("{} x \"{}\" lent to {borrower}", request.copies, request.title),
        );
        ctx.notify(
            NotificationCategory::Transaction,
            format!(
                "loan of {} x \"{}\" to {borrower} for {loan_days} days",
                request.copies, request.title
            ),
        );
        Ok(())
    }

    /// `Confirm(WantedList)`: search the whole list.
    async fn on_wanted_list(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let wanted = message.content.wanted_list()?;
        self.stats.requests_handled += 1;
        Self::acknowledge(ctx, message, conversation::LIST_SEARCH)?;
        ctx.pause(self.timings.list_search_delay(wanted.len())).await;

        let result = self.catalog.search(wanted);
        info!(
            agent = %ctx.id(),
            borrower = %message.sender,
            found = result.found_count(),
            requested = result.requested_count(),
            "List searched"
        );
        ctx.send(
            ctx.reply(message, Performative::Inform)
                .with_content(result),
        )?;
        Ok(())
    }

    /// `Agree("t1;t2;")`: lend one copy of each title, independently.
    ///
    /// The loans are worked out on a copy of the catalog, which replaces the
    /// real one only after the report has been delivered.
    fn on_bulk_loan(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let titles = reason::parse_title_list(message.text()?);
        let borrower = &message.sender;
        self.stats.requests_handled += 1;

        let mut planned = self.catalog.clone();
        let outcomes: Vec<TitleOutcome> = titles
            .into_iter()
            .map(|title| {
                let loan_days = planned
                    .lookup(&title)
                    .and_then(BookRecord::max_loan_days)
                    .unwrap_or_default();
                let status = match planned.decrement(&title, 1) {
                    Ok(_) => LoanStatus::Borrowed { loan_days },
                    Err(e) => {
                        debug!(agent = %ctx.id(), title = %title, reason = %e, "Bulk loan item unavailable");
                        LoanStatus::Unavailable
                    }
                };
                TitleOutcome { title, status }
            })
            .collect();

        let report = LoanReport::from_outcomes(outcomes);
        ctx.send(
            ctx.reply(message, Performative::Inform)
                .with_content(report.clone()),
        )?;
        self.catalog = planned;

        for outcome in report.outcomes() {
            if let LoanStatus::Borrowed { loan_days } = outcome.status {
                self.stats.loans_granted += 1;
                ctx.notify(
                    NotificationCategory::Transaction,
                    format!("loan of \"{}\" to {borrower} for {loan_days} days", outcome.title),
                );
            }
        }
        info!(agent = %ctx.id(), borrower = %borrower, report = %report, "Bulk loan");
        ctx.notify(
            NotificationCategory::Info,
            format!("bulk loan for {borrower}: {report}"),
        );
        Ok(())
    }
}

impl Responder for LibraryClerk {
    fn capability(&self) -> Capability {
        Capability::library_service()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    async fn handle(&mut self, ctx: &AgentContext, message: Message) -> Result<()> {
        match message.performative {
            Performative::Request => self.on_request(ctx, &message).await,
            Performative::CallForProposal => self.on_call_for_proposal(ctx, &message).await,
            Performative::AcceptProposal => self.on_accept(ctx, &message),
            Performative::Confirm => self.on_wanted_list(ctx, &message).await,
            Performative::Agree => self.on_bulk_loan(ctx, &message),
            Performative::Inform => {
                debug!(
                    agent = %ctx.id(),
                    from = %message.sender,
                    text = message.content.as_text().unwrap_or_default(),
                    "Courtesy message"
                );
                Ok(())
            }
            other => {
                debug!(agent = %ctx.id(), performative = %other, "Ignoring");
                Ok(())
            }
        }
    }

    fn on_shutdown(&mut self, ctx: &AgentContext) {
        info!(
            agent = %ctx.id(),
            requests = self.stats.requests_handled,
            loans = self.stats.loans_granted,
            "Clerk closing"
        );
        ctx.notify(
            NotificationCategory::Info,
            format!(
                "{} requests handled, {} copies lent",
                self.stats.requests_handled, self.stats.loans_granted
            ),
        );
    }
}
