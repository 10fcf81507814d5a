//! Book records exchanged between sellers, clerks and their clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A price in cents.
///
/// Prices are integral so the cheapest-offer comparison is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Create a price from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// The price in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Commercial terms attached to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Terms {
    /// The book is sold at a fixed price.
    Sale {
        /// Asking price.
        price: Price,
    },
    /// The book is lent for at most `max_loan_days`.
    Loan {
        /// Longest loan the library grants for this title.
        max_loan_days: u32,
    },
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Title, unique within a catalog.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Copies on hand.
    pub quantity: u32,
    /// Sale or loan terms.
    pub terms: Terms,
}

impl BookRecord {
    /// A single copy offered for sale.
    #[must_use]
    pub fn for_sale(title: impl Into<String>, author: impl Into<String>, price: Price) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            quantity: 1,
            terms: Terms::Sale { price },
        }
    }

    /// Library copies available for loan.
    #[must_use]
    pub fn for_loan(
        title: impl Into<String>,
        author: impl Into<String>,
        quantity: u32,
        max_loan_days: u32,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            quantity,
            terms: Terms::Loan { max_loan_days },
        }
    }

    /// Override the number of copies on hand.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Returns true if at least `count` copies are on hand.
    #[must_use]
    pub const fn has_copies(&self, count: u32) -> bool {
        self.quantity >= count
    }

    /// Sale price, if this is a sale record.
    #[must_use]
    pub const fn price(&self) -> Option<Price> {
        match self.terms {
            Terms::Sale { price } => Some(price),
            Terms::Loan { .. } => None,
        }
    }

    /// Maximum loan duration, if this is a loan record.
    #[must_use]
    pub const fn max_loan_days(&self) -> Option<u32> {
        match self.terms {
            Terms::Loan { max_loan_days } => Some(max_loan_days),
            Terms::Sale { .. } => None,
        }
    }
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.terms {
            Terms::Sale { price } => write!(f, "\"{}\" by {} at {price}", self.title, self.author),
            Terms::Loan { max_loan_days } => write!(
                f,
                "\"{}\" by {} ({} copies, {max_loan_days} days max)",
                self.title, self.author, self.quantity
            ),
        }
    }
}
