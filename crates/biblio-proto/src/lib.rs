//! # biblio-proto
//!
//! Message contract shared by every biblio agent: the envelope, the
//! template matcher used to read mailboxes, and the payload records traded
//! between sellers, clerks, buyers and borrowers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod book;
pub mod conversation;
pub mod error;
pub mod message;
pub mod reason;
pub mod template;
pub mod types;
pub mod wanted;

pub use book::{BookRecord, Price, Terms};
pub use error::ProtoError;
pub use message::{Content, Message, Performative, new_token};
pub use reason::{ItemRequest, LoanConfirmation, LoanOffer, RefuseReason, SaleConfirmation};
pub use template::Template;
pub use types::{AgentId, Capability};
pub use wanted::{
    FoundBook, LoanReport, LoanStatus, SearchResult, TitleOutcome, UtilityThreshold, WantedList,
    utility,
};
