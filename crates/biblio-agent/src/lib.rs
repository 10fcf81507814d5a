//! # biblio-agent
//!
//! The negotiating agents of the book market and the library.
//!
//! Responders ([`Seller`], [`LibraryClerk`]) register a capability and
//! answer requests until cancelled. Initiators ([`Buyer`],
//! [`SimpleBorrower`], [`SingleLoanBorrower`], [`ListBorrower`]) discover a
//! responder, run one session and detach. [`Runtime`] starts any of them
//! from an [`AgentRole`].
//!
//! ```rust,no_run
//! use biblio_agent::{AgentRole, AgentTimings, Runtime};
//! use biblio_platform::Platform;
//! use biblio_proto::{BookRecord, Price};
//!
//! # async fn demo() -> biblio_agent::error::Result<()> {
//! let mut runtime = Runtime::new(Platform::default(), AgentTimings::instant());
//! runtime.spawn("seller-1", AgentRole::Seller {
//!     books: vec![BookRecord::for_sale("Dune", "Frank Herbert", Price::from_cents(1875))],
//! })?;
//! runtime.spawn("buyer-1", AgentRole::Buyer { title: "Dune".into() })?;
//! for (agent, outcome) in runtime.join_initiators().await {
//!     println!("{agent}: {}", outcome?);
//! }
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buyer;
pub mod clerk;
pub mod error;
pub mod list_borrower;
pub mod loan_borrower;
pub mod responder;
pub mod runtime;
pub mod selection;
pub mod seller;
pub mod session;
pub mod simple_borrower;
pub mod timings;

pub use buyer::Buyer;
pub use clerk::{ClerkStats, LibraryClerk};
pub use error::AgentError;
pub use list_borrower::ListBorrower;
pub use loan_borrower::SingleLoanBorrower;
pub use responder::{Responder, serve, start};
pub use runtime::{AgentHandle, AgentReport, AgentRole, Runtime, spawn};
pub use selection::{Offer, OfferCollection, select_cheapest, should_borrow};
pub use seller::Seller;
pub use session::{Session, SessionOutcome, SessionPhase, conclude};
pub use simple_borrower::SimpleBorrower;
pub use timings::AgentTimings;
