//! Short tagged strings carried as text content.
//!
//! Most protocol steps exchange small `tag` or `tag:value` strings rather
//! than structured records. Each shape has an encoder and a parser here so
//! both sides of a conversation agree on the format.

use std::fmt;

use crate::book::Price;
use crate::error::ProtoError;

/// Acknowledgement sent before a clerk starts searching.
pub const SEARCH_IN_PROGRESS: &str = "search-in-progress";
/// Simple availability answer.
pub const AVAILABLE: &str = "available";
/// Simple unavailability answer.
pub const UNAVAILABLE: &str = "unavailable";
/// Stock changed between the offer and the acceptance.
pub const NO_LONGER_AVAILABLE: &str = "no-longer-available";
/// Borrower courtesy after a successful exchange.
pub const THANKS: &str = "thanks";
/// Borrower courtesy after an unsuccessful exchange.
pub const THANKS_ANYWAY: &str = "thanks-anyway";
/// List borrower is weighing a search result.
pub const THINKING: &str = "thinking";
/// List borrower declines to borrow.
pub const NO_THANKS: &str = "no-thanks";

const NOT_FOUND_TAG: &str = "book-not-found";
const INSUFFICIENT_TAG: &str = "insufficient-copies";
const LOAN_OFFER_TAG: &str = "available";
const LOAN_CONFIRMED_TAG: &str = "loan-confirmed";
const SALE_CONFIRMED_TAG: &str = "sale-confirmed";

fn parse_tagged_count(text: &str, tag: &'static str, expected: &'static str) -> Result<u32, ProtoError> {
    text.strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .ok_or_else(|| ProtoError::malformed(expected, text))
}

/// Why a responder declined a call for proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefuseReason {
    /// The title is not in the catalog.
    NotFound,
    /// The title exists but not enough copies are on hand.
    InsufficientCopies {
        /// Copies currently on hand.
        available: u32,
    },
}

impl RefuseReason {
    /// Encode as `book-not-found` or `insufficient-copies:<n>`.
    #[must_use]
    pub fn encode(self) -> String {
        match self {
            Self::NotFound => NOT_FOUND_TAG.to_string(),
            Self::InsufficientCopies { available } => format!("{INSUFFICIENT_TAG}:{available}"),
        }
    }

    /// Parse a refusal reason.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if the text is neither shape.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        if text == NOT_FOUND_TAG {
            return Ok(Self::NotFound);
        }
        parse_tagged_count(text, INSUFFICIENT_TAG, "refuse reason")
            .map(|available| Self::InsufficientCopies { available })
    }
}

impl fmt::Display for RefuseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not in the catalog"),
            Self::InsufficientCopies { available } => write!(f, "only {available} copies available"),
        }
    }
}

/// A request for a number of copies of one title: `"<title>"` or `"<title>:<count>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRequest {
    /// Requested title.
    pub title: String,
    /// Requested copies, at least one.
    pub copies: u32,
}

impl ItemRequest {
    /// Create a request.
    #[must_use]
    pub fn new(title: impl Into<String>, copies: u32) -> Self {
        Self {
            title: title.into(),
            copies,
        }
    }

    /// Encode as `<title>:<count>`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}:{}", self.title, self.copies)
    }

    /// Parse a request. A bare title means one copy.
    ///
    /// The count is taken after the last `:`, so titles containing a colon
    /// must carry an explicit count.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for a blank title, a non-numeric
    /// count, or a count of zero.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        let (title, copies) = match text.rsplit_once(':') {
            Some((title, count)) => {
                let copies = count
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ProtoError::malformed("title:count", text))?;
                (title, copies)
            }
            None => (text, 1),
        };
        if title.trim().is_empty() || copies == 0 {
            return Err(ProtoError::malformed("title:count", text));
        }
        Ok(Self::new(title, copies))
    }
}

/// Clerk's loan offer: `available:<max_loan_days>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanOffer {
    /// Longest loan granted for the title.
    pub max_loan_days: u32,
}

impl LoanOffer {
    /// Encode the offer.
    #[must_use]
    pub fn encode(self) -> String {
        format!("{LOAN_OFFER_TAG}:{}", self.max_loan_days)
    }

    /// Parse the offer.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if the text is not `available:<days>`.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        parse_tagged_count(text, LOAN_OFFER_TAG, "available:days")
            .map(|max_loan_days| Self { max_loan_days })
    }
}

/// Clerk's loan confirmation: `loan-confirmed:<loan_days>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanConfirmation {
    /// Loan duration granted.
    pub loan_days: u32,
}

impl LoanConfirmation {
    /// Encode the confirmation.
    #[must_use]
    pub fn encode(self) -> String {
        format!("{LOAN_CONFIRMED_TAG}:{}", self.loan_days)
    }

    /// Parse the confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if the text is not `loan-confirmed:<days>`.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        parse_tagged_count(text, LOAN_CONFIRMED_TAG, "loan-confirmed:days")
            .map(|loan_days| Self { loan_days })
    }
}

/// Seller's sale confirmation: `sale-confirmed:<price in cents>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleConfirmation {
    /// Price charged.
    pub price: Price,
}

impl SaleConfirmation {
    /// Encode the confirmation.
    #[must_use]
    pub fn encode(self) -> String {
        format!("{SALE_CONFIRMED_TAG}:{}", self.price.cents())
    }

    /// Parse the confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] if the text is not `sale-confirmed:<cents>`.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        text.strip_prefix(SALE_CONFIRMED_TAG)
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|cents| cents.trim().parse::<u64>().ok())
            .map(|cents| Self {
                price: Price::from_cents(cents),
            })
            .ok_or_else(|| ProtoError::malformed("sale-confirmed:cents", text))
    }
}

/// Encode titles for a bulk loan: each title followed by `;`.
#[must_use]
pub fn encode_title_list<S: AsRef<str>>(titles: &[S]) -> String {
    titles.iter().fold(String::new(), |mut acc, title| {
        acc.push_str(title.as_ref());
        acc.push(';');
        acc
    })
}

/// Parse a bulk loan title list, skipping empty segments.
///
/// An empty list is a bulk loan of nothing, not an error.
#[must_use]
pub fn parse_title_list(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}
