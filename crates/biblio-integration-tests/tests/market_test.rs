//! Integration tests for the book market.
//!
//! Covers the full buyer flow against live sellers:
//! 1. Discovery of every seller
//! 2. Call for proposals fan-out and offer collection
//! 3. Cheapest selection with rejection of the other offers
//! 4. Purchase confirmation and stock changes
//! 5. Races for the last copy

use std::sync::Arc;

use biblio_agent::{
    AgentReport, AgentRole, AgentTimings, Buyer, Runtime, Seller, SessionOutcome, start,
};
use biblio_platform::{EventLog, NotificationCategory, Platform};
use biblio_proto::{AgentId, BookRecord, Capability, Price};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helper Functions
// ============================================================================

fn agent(name: &str) -> AgentId {
    AgentId::new(name).unwrap()
}

fn book(title: &str, cents: u64) -> BookRecord {
    BookRecord::for_sale(title, "Author", Price::from_cents(cents))
}

fn seller_role(books: &[(&str, u64)]) -> AgentRole {
    AgentRole::Seller {
        books: books.iter().map(|(t, c)| book(t, *c)).collect(),
    }
}

fn sellers(reports: Vec<(AgentId, biblio_agent::error::Result<AgentReport>)>) -> Vec<(AgentId, Seller)> {
    reports
        .into_iter()
        .filter_map(|(id, report)| match report.unwrap() {
            AgentReport::Seller(seller) => Some((id, seller)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Cheapest Offer Selection
// ============================================================================

#[tokio::test]
async fn buyer_accepts_the_cheaper_of_two_offers() {
    let log = Arc::new(EventLog::new());
    let mut runtime = Runtime::new(Platform::new(log.clone()), AgentTimings::instant());
    runtime.spawn("seller-a", seller_role(&[("1984", 1599)])).unwrap();
    runtime.spawn("seller-b", seller_role(&[("1984", 1250)])).unwrap();
    runtime
        .spawn("buyer", AgentRole::Buyer { title: "1984".into() })
        .unwrap();

    let results = runtime.join_initiators().await;
    assert_eq!(
        results[0].1.as_ref().unwrap(),
        &SessionOutcome::Purchased {
            title: "1984".into(),
            seller: agent("seller-b"),
            price: Price::from_cents(1250),
        }
    );

    let sellers = sellers(runtime.shutdown().await);
    let a = &sellers.iter().find(|(id, _)| id.as_str() == "seller-a").unwrap().1;
    let b = &sellers.iter().find(|(id, _)| id.as_str() == "seller-b").unwrap().1;
    assert_eq!(a.sales(), 0);
    assert_eq!(a.catalog().lookup("1984").map(|r| r.quantity), Some(1));
    assert_eq!(b.sales(), 1);
    assert_eq!(b.catalog().lookup("1984").map(|r| r.quantity), Some(0));

    // the rejected seller heard about it
    let rejected = log
        .for_agent(&agent("seller-a"))
        .into_iter()
        .filter(|n| n.category == NotificationCategory::Info)
        .count();
    assert_eq!(rejected, 1);
}

#[tokio::test]
async fn sellers_without_the_title_are_skipped() {
    let mut runtime = Runtime::new(Platform::default(), AgentTimings::instant());
    runtime.spawn("seller-a", seller_role(&[("Dune", 1875)])).unwrap();
    runtime.spawn("seller-b", seller_role(&[("Fondation", 1690)])).unwrap();
    runtime.spawn("seller-c", seller_role(&[("Fondation", 1720)])).unwrap();
    runtime
        .spawn("buyer", AgentRole::Buyer { title: "Fondation".into() })
        .unwrap();

    let results = runtime.join_initiators().await;
    let SessionOutcome::Purchased { seller, price, .. } = results[0].1.as_ref().unwrap() else {
        panic!("expected a purchase");
    };
    assert_eq!(seller, &agent("seller-b"));
    assert_eq!(*price, Price::from_cents(1690));
    runtime.shutdown().await;
}

#[tokio::test]
async fn nobody_stocks_the_title() {
    let log = Arc::new(EventLog::new());
    let mut runtime = Runtime::new(Platform::new(log.clone()), AgentTimings::instant());
    runtime.spawn("seller-a", seller_role(&[("Dune", 1875)])).unwrap();
    runtime.spawn("seller-b", seller_role(&[("1984", 1599)])).unwrap();
    runtime
        .spawn(
            "buyer",
            AgentRole::Buyer {
                title: "Le Seigneur des Anneaux".into(),
            },
        )
        .unwrap();

    let results = runtime.join_initiators().await;
    assert_eq!(
        results[0].1.as_ref().unwrap(),
        &SessionOutcome::NoOffers { refusals: 2 }
    );
    runtime.shutdown().await;
    assert!(log.transactions().is_empty());
}

// ============================================================================
// No Sellers
// ============================================================================

#[tokio::test]
async fn buyer_without_sellers_ends_immediately() {
    let log = Arc::new(EventLog::new());
    let platform = Platform::new(log.clone());
    let bystander = platform.attach(agent("bystander")).unwrap();

    let outcome = Buyer::new("1984")
        .run(platform.attach(agent("buyer")).unwrap(), AgentTimings::default())
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::NoResponders);
    assert_eq!(bystander.pending(), 0);
    let categories: Vec<_> = log
        .for_agent(&agent("buyer"))
        .iter()
        .map(|n| n.category)
        .collect();
    assert_eq!(
        categories,
        vec![
            NotificationCategory::New,
            NotificationCategory::Info,
            NotificationCategory::End,
        ]
    );
}

// ============================================================================
// Last Copy Races
// ============================================================================

#[tokio::test]
async fn two_buyers_one_copy_exactly_one_purchase() {
    let log = Arc::new(EventLog::new());
    let platform = Platform::new(log.clone());
    let cancel = CancellationToken::new();
    let seller = start(
        Seller::new("Shop", [book("Dune", 1875)]),
        platform.attach(agent("shop")).unwrap(),
        cancel.clone(),
    )
    .unwrap();

    let first = tokio::spawn(
        Buyer::new("Dune").run(platform.attach(agent("buyer-1")).unwrap(), AgentTimings::instant()),
    );
    let second = tokio::spawn(
        Buyer::new("Dune").run(platform.attach(agent("buyer-2")).unwrap(), AgentTimings::instant()),
    );
    let outcomes = [first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];

    let purchases = outcomes
        .iter()
        .filter(|o| matches!(o, SessionOutcome::Purchased { .. }))
        .count();
    assert_eq!(purchases, 1);
    assert!(outcomes.iter().all(|o| matches!(
        o,
        SessionOutcome::Purchased { .. }
            | SessionOutcome::PurchaseFailed { .. }
            | SessionOutcome::NoOffers { .. }
    )));

    cancel.cancel();
    let seller = seller.await.unwrap().unwrap();
    assert_eq!(seller.sales(), 1);
    assert_eq!(seller.catalog().lookup("Dune").map(|r| r.quantity), Some(0));
    // one from the buyer, one from the seller
    assert_eq!(log.transactions().len(), 2);
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn repeated_registration_is_idempotent() {
    let platform = Platform::default();
    let shop = platform.attach(agent("shop")).unwrap();
    shop.register(&Capability::book_selling(), "Shop").unwrap();
    shop.register(&Capability::book_selling(), "Shop, renamed").unwrap();

    let buyer = platform.attach(agent("buyer")).unwrap();
    assert_eq!(
        buyer.discover(&Capability::book_selling()).unwrap(),
        vec![agent("shop")]
    );
    assert_eq!(platform.directory().discover(&Capability::book_selling()).unwrap().len(), 1);

    shop.detach();
    assert!(buyer.discover(&Capability::book_selling()).unwrap().is_empty());
}
