//! Seller: answers calls for proposals from buyers and sells from a priced stock.

use biblio_ledger::Catalog;
use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{
    BookRecord, Capability, ItemRequest, Message, Performative, Price, SaleConfirmation, reason,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::responder::Responder;

/// A bookshop with a priced catalog.
#[derive(Debug, Clone)]
pub struct Seller {
    name: String,
    catalog: Catalog,
    sales: u32,
}

impl Seller {
    /// Creates a seller with the given stock.
    #[must_use]
    pub fn new(name: impl Into<String>, books: impl IntoIterator<Item = BookRecord>) -> Self {
        Self {
            name: name.into(),
            catalog: books.into_iter().collect(),
            sales: 0,
        }
    }

    /// Current stock.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Copies sold so far.
    #[must_use]
    pub const fn sales(&self) -> u32 {
        self.sales
    }

    /// `CallForProposal("title[:count]")`: quote the asking price or refuse.
    fn on_call_for_proposal(&self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let request = ItemRequest::parse(message.text()?)?;
        let reply = match self.catalog.check(&request.title, request.copies) {
            Ok(record) => {
                debug!(agent = %ctx.id(), title = %request.title, copies = request.copies, price = ?record.price(), "Proposing");
                let mut offer = record.clone();
                offer.quantity = request.copies;
                ctx.reply(message, Performative::Propose)
                    .with_content(offer)
            }
            Err(e) => {
                debug!(agent = %ctx.id(), title = %request.title, reason = %e, "Refusing");
                ctx.reply(message, Performative::Refuse)
                    .with_content(e.refuse_reason().encode())
            }
        };
        ctx.send(reply)?;
        Ok(())
    }

    /// `AcceptProposal(offer)`: re-check, confirm with the price, then sell.
    ///
    /// Stock only moves once the confirmation has been delivered.
    fn on_accept(&mut self, ctx: &AgentContext, message: &Message) -> Result<()> {
        let book = message.content.book()?;
        let buyer = &message.sender;
        let copies = book.quantity.max(1);

        // Stock may have moved since the proposal went out.
        let unit_price = match self.catalog.check(&book.title, copies) {
            Ok(record) => record.price().or_else(|| book.price()).unwrap_or(Price::from_cents(0)),
            Err(e) => {
                info!(agent = %ctx.id(), title = %book.title, buyer = %buyer, reason = %e, "Sale no longer possible");
                ctx.send(
                    ctx.reply(message, Performative::Failure)
                        .with_content(reason::NO_LONGER_AVAILABLE),
                )?;
                ctx.notify(
                    NotificationCategory::Info,
                    format!("\"{}\" no longer available for {buyer}", book.title),
                );
                return Ok(());
            }
        };
        let price = Price::from_cents(unit_price.cents() * u64::from(copies));

        ctx.send(
            ctx.reply(message, Performative::Inform)
                .with_content(SaleConfirmation { price }.encode()),
        )?;
        let remaining = self.catalog.decrement(&book.title, copies)?;
        self.sales += copies;
        info!(agent = %ctx.id(), title = %book.title, copies, remaining, buyer = %buyer, price = %price, "Sold");
        ctx.notify(
            NotificationCategory::Info,
            format!("\"{}\" sold to {buyer}", book.title),
        );
        ctx.notify(
            NotificationCategory::Transaction,
            format!("sale of \"{}\" to {buyer} for {price}", book.title),
        );
        Ok(())
    }

    fn on_reject(&self, ctx: &AgentContext, message: &Message) {
        let title = message
            .content
            .book()
            .map_or("an offer", |b| b.title.as_str());
        ctx.notify(
            NotificationCategory::Info,
            format!("{} turned down {title}", message.sender),
        );
    }
}

impl Responder for Seller {
    fn capability(&self) -> Capability {
        Capability::book_selling()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    async fn handle(&mut self, ctx: &AgentContext, message: Message) -> Result<()> {
        match message.performative {
            Performative::CallForProposal => self.on_call_for_proposal(ctx, &message),
            Performative::AcceptProposal => self.on_accept(ctx, &message),
            Performative::RejectProposal => {
                self.on_reject(ctx, &message);
                Ok(())
            }
            other => {
                debug!(agent = %ctx.id(), performative = %other, "Ignoring");
                Ok(())
            }
        }
    }

    fn on_shutdown(&mut self, ctx: &AgentContext) {
        info!(agent = %ctx.id(), sales = self.sales, titles = self.catalog.len(), "Seller closing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::start;
    use biblio_platform::{EventLog, Platform};
    use biblio_proto::{AgentId, Template, conversation};
    use std::sync::Arc;
    use std::time::Duration;
    use test_case::test_case;
    use tokio_util::sync::CancellationToken;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    fn seller() -> Seller {
        Seller::new(
            "Shop",
            [
                BookRecord::for_sale("1984", "George Orwell", Price::from_cents(1599)),
                BookRecord::for_sale("Dune", "Frank Herbert", Price::from_cents(1875)),
            ],
        )
    }

    fn cfp(ctx: &AgentContext, to: &AgentId, title: &str) -> Message {
        ctx.message(Performative::CallForProposal)
            .to(to.clone())
            .with_content(title)
            .in_conversation(conversation::BOOK_TRADE)
            .reply_with("cfp-1")
    }

    fn accept(ctx: &AgentContext, to: &AgentId, book: BookRecord) -> Message {
        ctx.message(Performative::AcceptProposal)
            .to(to.clone())
            .with_content(book)
            .in_conversation(conversation::BOOK_TRADE)
            .reply_with("accept-1")
    }

    async fn next(ctx: &AgentContext) -> Message {
        ctx.receive_within(&Template::Any, Duration::from_secs(1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn proposes_stocked_title_and_refuses_others() {
        let platform = Platform::default();
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        let mut seller = seller();

        seller.handle(&shop, cfp(&buyer, shop.id(), "1984")).await.unwrap();
        let reply = next(&buyer).await;
        assert_eq!(reply.performative, Performative::Propose);
        assert_eq!(reply.in_reply_to.as_deref(), Some("cfp-1"));
        assert_eq!(reply.content.book().unwrap().price(), Some(Price::from_cents(1599)));

        seller.handle(&shop, cfp(&buyer, shop.id(), "Hamlet")).await.unwrap();
        let reply = next(&buyer).await;
        assert_eq!(reply.performative, Performative::Refuse);
        assert_eq!(reply.text().unwrap(), "book-not-found");
    }

    #[test_case("1984:1", Performative::Propose, None ; "explicit single copy")]
    #[test_case("1984", Performative::Propose, None ; "bare title")]
    #[test_case("1984:2", Performative::Refuse, Some("insufficient-copies:1") ; "more than stocked")]
    #[test_case("Hamlet:1", Performative::Refuse, Some("book-not-found") ; "unknown with count")]
    #[tokio::test]
    async fn call_for_proposal_reads_the_requested_count(
        content: &str,
        performative: Performative,
        refusal: Option<&str>,
    ) {
        let platform = Platform::default();
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();

        seller().handle(&shop, cfp(&buyer, shop.id(), content)).await.unwrap();
        let reply = next(&buyer).await;
        assert_eq!(reply.performative, performative);
        match refusal {
            Some(text) => assert_eq!(reply.text().unwrap(), text),
            None => {
                let offer = reply.content.book().unwrap();
                assert_eq!(offer.title, "1984");
                assert_eq!(offer.quantity, 1);
            }
        }
    }

    #[tokio::test]
    async fn malformed_count_is_an_error() {
        let platform = Platform::default();
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        assert!(seller().handle(&shop, cfp(&buyer, shop.id(), "1984:x")).await.is_err());
        assert_eq!(buyer.pending(), 0);
    }

    #[tokio::test]
    async fn accept_sells_once_then_fails() {
        let log = Arc::new(EventLog::new());
        let platform = Platform::new(log.clone());
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        let mut seller = seller();
        let book = seller.catalog().lookup("Dune").cloned().unwrap();

        for _ in 0..2 {
            seller.handle(&shop, accept(&buyer, shop.id(), book.clone())).await.unwrap();
        }

        let first = next(&buyer).await;
        assert_eq!(first.performative, Performative::Inform);
        assert_eq!(first.text().unwrap(), "sale-confirmed:1875");
        assert_eq!(
            SaleConfirmation::parse(first.text().unwrap()).unwrap().price,
            Price::from_cents(1875)
        );
        let second = next(&buyer).await;
        assert_eq!(second.performative, Performative::Failure);
        assert_eq!(second.text().unwrap(), reason::NO_LONGER_AVAILABLE);

        assert_eq!(seller.sales(), 1);
        assert_eq!(seller.catalog().lookup("Dune").map(|b| b.quantity), Some(0));
        assert_eq!(log.transactions().len(), 1);

        seller.handle(&shop, cfp(&buyer, shop.id(), "Dune")).await.unwrap();
        assert_eq!(next(&buyer).await.text().unwrap(), "insufficient-copies:0");
    }

    #[tokio::test]
    async fn accept_from_departed_buyer_keeps_stock() {
        let log = Arc::new(EventLog::new());
        let platform = Platform::new(log.clone());
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        let mut seller = seller();
        let book = seller.catalog().lookup("Dune").cloned().unwrap();

        let late = accept(&buyer, shop.id(), book);
        buyer.detach();
        assert!(seller.handle(&shop, late).await.is_err());

        assert_eq!(seller.sales(), 0);
        assert_eq!(seller.catalog().lookup("Dune").map(|b| b.quantity), Some(1));
        assert!(log.transactions().is_empty());
    }

    #[tokio::test]
    async fn malformed_accept_is_an_error() {
        let platform = Platform::default();
        let shop = platform.attach(agent("shop")).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        let accept = buyer
            .message(Performative::AcceptProposal)
            .to(shop.id().clone())
            .with_content("Dune");
        assert!(seller().handle(&shop, accept).await.is_err());
    }

    #[tokio::test]
    async fn messages_outside_the_trade_are_answered_or_drained() {
        let platform = Platform::default();
        let cancel = CancellationToken::new();
        let task = start(seller(), platform.attach(agent("shop")).unwrap(), cancel.clone()).unwrap();
        let buyer = platform.attach(agent("buyer")).unwrap();
        let shop = agent("shop");

        buyer
            .send(
                buyer
                    .message(Performative::Inform)
                    .to(shop.clone())
                    .with_content("hello"),
            )
            .unwrap();
        buyer
            .send(
                buyer
                    .message(Performative::CallForProposal)
                    .to(shop.clone())
                    .with_content("Dune")
                    .reply_with("no-conversation"),
            )
            .unwrap();

        // the stray Inform was queued first and consumed without a reply
        let reply = next(&buyer).await;
        assert_eq!(reply.performative, Performative::Propose);
        assert_eq!(reply.in_reply_to.as_deref(), Some("no-conversation"));

        cancel.cancel();
        let seller = task.await.unwrap().unwrap();
        assert_eq!(seller.sales(), 0);
        assert_eq!(buyer.pending(), 0);
    }
}
