//! # biblio-ledger
//!
//! Book inventory owned by a single seller or library clerk, with the
//! availability checks and decrements used during negotiation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;

pub use catalog::Catalog;
pub use error::LedgerError;
