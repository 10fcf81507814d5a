//! Buyer: asks every seller for a title, buys the cheapest offer.

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{
    Capability, ItemRequest, Performative, RefuseReason, SaleConfirmation, Template,
    conversation, new_token, reason,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::selection::{Offer, OfferCollection};
use crate::session::{Session, SessionOutcome, SessionPhase, conclude};
use crate::timings::AgentTimings;

/// A one-shot buyer for a single title.
#[derive(Debug, Clone)]
pub struct Buyer {
    title: String,
}

impl Buyer {
    /// Creates a buyer looking for `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// Title wanted.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Runs the purchase, then reports and detaches.
    pub async fn run(self, ctx: AgentContext, timings: AgentTimings) -> Result<SessionOutcome> {
        ctx.notify(
            NotificationCategory::New,
            format!("looking to buy \"{}\"", self.title),
        );
        let result = self.negotiate(&ctx, &timings).await;
        conclude(ctx, result)
    }

    async fn negotiate(&self, ctx: &AgentContext, timings: &AgentTimings) -> Result<SessionOutcome> {
        let mut session = Session::new(ctx.id().clone());

        session.advance(SessionPhase::AwaitingDiscovery);
        let sellers = ctx.discover(&Capability::book_selling())?;
        if sellers.is_empty() {
            ctx.notify(NotificationCategory::Info, "no sellers found");
            session.advance(SessionPhase::Done);
            return Ok(SessionOutcome::NoResponders);
        }
        ctx.notify(
            NotificationCategory::Info,
            format!("asking {} sellers for \"{}\"", sellers.len(), self.title),
        );

        let token = new_token("cfp");
        ctx.send(
            ctx.message(Performative::CallForProposal)
                .to_all(sellers.iter().cloned())
                .with_content(ItemRequest::new(self.title.as_str(), 1).encode())
                .in_conversation(conversation::BOOK_TRADE)
                .reply_with(token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingOffers);
        let replies = Template::conversation(conversation::BOOK_TRADE)
            .and(Template::in_reply_to(token))
            .and(Template::any_of([Performative::Propose, Performative::Refuse]));
        let mut collection = OfferCollection::new(sellers);
        let deadline = Instant::now() + timings.offer_window();

        while !collection.is_complete() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(reply) = ctx.receive_within(&replies, remaining).await else {
                debug!(agent = %ctx.id(), "Offer window closed");
                break;
            };
            match reply.performative {
                Performative::Propose => match reply.content.book() {
                    Ok(book) => match book.price() {
                        Some(price) => {
                            debug!(agent = %ctx.id(), seller = %reply.sender, price = %price, "Offer");
                            collection.record_offer(Offer {
                                seller: reply.sender.clone(),
                                book: book.clone(),
                                price,
                            });
                        }
                        None => warn!(agent = %ctx.id(), seller = %reply.sender, "Offer without a price"),
                    },
                    Err(e) => warn!(agent = %ctx.id(), seller = %reply.sender, error = %e, "Dropped malformed offer"),
                },
                _ => {
                    let reason = reply
                        .text()
                        .and_then(RefuseReason::parse)
                        .unwrap_or(RefuseReason::NotFound);
                    debug!(agent = %ctx.id(), seller = %reply.sender, reason = %reason, "Refusal");
                    collection.record_refusal(&reply.sender, reason);
                }
            }
        }

        let refusals = collection.refusals().len();
        let Some((winner, losers)) = collection.into_selection() else {
            ctx.notify(
                NotificationCategory::Info,
                format!("nobody offered \"{}\"", self.title),
            );
            session.advance(SessionPhase::Done);
            return Ok(SessionOutcome::NoOffers { refusals });
        };

        for loser in losers {
            ctx.send(
                ctx.message(Performative::RejectProposal)
                    .to(loser.seller)
                    .with_content(loser.book)
                    .in_conversation(conversation::BOOK_TRADE),
            )?;
        }

        info!(agent = %ctx.id(), seller = %winner.seller, price = %winner.price, "Accepting cheapest offer");
        ctx.notify(
            NotificationCategory::Info,
            format!("accepting {} from {}", winner.price, winner.seller),
        );
        let accept_token = new_token("accept");
        ctx.send(
            ctx.message(Performative::AcceptProposal)
                .to(winner.seller.clone())
                .with_content(winner.book.clone())
                .in_conversation(conversation::BOOK_TRADE)
                .reply_with(accept_token.as_str()),
        )?;

        session.advance(SessionPhase::AwaitingConfirmation);
        let confirmation = Template::in_reply_to(accept_token)
            .and(Template::any_of([Performative::Inform, Performative::Failure]));
        let Some(reply) = ctx
            .receive_within(&confirmation, timings.reply_timeout())
            .await
        else {
            ctx.notify(
                NotificationCategory::Info,
                format!("{} never confirmed", winner.seller),
            );
            return Ok(session.timed_out());
        };

        session.advance(SessionPhase::Done);
        if reply.performative == Performative::Inform {
            let price = match reply.text().and_then(SaleConfirmation::parse) {
                Ok(confirmation) => confirmation.price,
                Err(e) => {
                    warn!(agent = %ctx.id(), error = %e, "Confirmation without terms, using offer");
                    winner.price
                }
            };
            debug!(agent = %ctx.id(), seller = %winner.seller, price = %price, "Confirmed");
            ctx.notify(
                NotificationCategory::Transaction,
                format!("bought \"{}\" for {price}", self.title),
            );
            Ok(SessionOutcome::Purchased {
                title: self.title.clone(),
                seller: winner.seller,
                price,
            })
        } else {
            ctx.notify(
                NotificationCategory::Info,
                format!("{} replied {}", winner.seller, reply.content.as_text().unwrap_or(reason::NO_LONGER_AVAILABLE)),
            );
            Ok(SessionOutcome::PurchaseFailed {
                title: self.title.clone(),
                seller: winner.seller,
            })
        }
    }
}
