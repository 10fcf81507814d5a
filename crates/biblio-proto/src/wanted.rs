//! Wanted lists, search results and bulk loan reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::book::BookRecord;
use crate::error::ProtoError;

/// Minimum found/requested ratio a list borrower needs before borrowing.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct UtilityThreshold(f64);

impl UtilityThreshold {
    /// Create a threshold in `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is outside the unit interval or not a number.
    pub fn new(value: f64) -> Result<Self, ProtoError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ProtoError::Validation(format!(
                "utility threshold must be within 0.0..=1.0, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// The raw ratio.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns true if `utility` reaches the threshold (inclusive).
    #[must_use]
    pub fn is_met(self, utility: f64) -> bool {
        utility >= self.0
    }
}

impl Default for UtilityThreshold {
    fn default() -> Self {
        Self(0.6)
    }
}

impl TryFrom<f64> for UtilityThreshold {
    type Error = ProtoError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UtilityThreshold> for f64 {
    fn from(threshold: UtilityThreshold) -> Self {
        threshold.0
    }
}

/// Ratio of found titles to requested titles. An empty request has no utility.
#[must_use]
pub fn utility(found: usize, requested: usize) -> f64 {
    if requested == 0 {
        return 0.0;
    }
    found as f64 / requested as f64
}

/// Titles a borrower wants in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantedList {
    titles: Vec<String>,
    threshold: UtilityThreshold,
}

impl WantedList {
    /// Create a wanted list.
    ///
    /// # Errors
    ///
    /// Returns an error if `titles` is empty or contains a blank title.
    pub fn new<I, S>(titles: I, threshold: UtilityThreshold) -> Result<Self, ProtoError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: Vec<String> = titles.into_iter().map(Into::into).collect();
        if titles.is_empty() {
            return Err(ProtoError::Validation("wanted list cannot be empty".to_string()));
        }
        if titles.iter().any(|t| t.trim().is_empty()) {
            return Err(ProtoError::Validation(
                "wanted list cannot contain blank titles".to_string(),
            ));
        }
        Ok(Self { titles, threshold })
    }

    /// Wanted titles, in the order they were listed.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Number of wanted titles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Returns true if the list has no titles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// The borrower's utility threshold.
    #[must_use]
    pub const fn threshold(&self) -> UtilityThreshold {
        self.threshold
    }
}

impl fmt::Display for WantedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.titles.join(", "))
    }
}

/// A title found by the clerk, with the catalog entry as it was at search time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundBook {
    /// Requested title.
    pub title: String,
    /// Snapshot of the catalog record.
    pub record: BookRecord,
}

/// Partition of a wanted list into found and missing titles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    found: Vec<FoundBook>,
    not_found: Vec<String>,
}

impl SearchResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a title that is available.
    pub fn record_found(&mut self, title: impl Into<String>, record: BookRecord) {
        self.found.push(FoundBook {
            title: title.into(),
            record,
        });
    }

    /// Record a title that is missing or out of stock.
    pub fn record_missing(&mut self, title: impl Into<String>) {
        self.not_found.push(title.into());
    }

    /// Found titles with their records.
    #[must_use]
    pub fn found(&self) -> &[FoundBook] {
        &self.found
    }

    /// Titles that could not be found.
    #[must_use]
    pub fn not_found(&self) -> &[String] {
        &self.not_found
    }

    /// Found titles only.
    #[must_use]
    pub fn found_titles(&self) -> Vec<&str> {
        self.found.iter().map(|f| f.title.as_str()).collect()
    }

    /// Number of found titles.
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    /// Number of titles searched for.
    #[must_use]
    pub fn requested_count(&self) -> usize {
        self.found.len() + self.not_found.len()
    }

    /// Returns true if every requested title was found.
    #[must_use]
    pub fn all_found(&self) -> bool {
        self.not_found.is_empty()
    }

    /// Found/requested ratio.
    #[must_use]
    pub fn utility(&self) -> f64 {
        utility(self.found_count(), self.requested_count())
    }
}

/// Outcome of one title in a bulk loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoanStatus {
    /// One copy was lent.
    Borrowed {
        /// Loan duration granted.
        loan_days: u32,
    },
    /// No copy could be lent.
    Unavailable,
}

/// Per-title line of a [`LoanReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleOutcome {
    /// Title requested.
    pub title: String,
    /// What happened to it.
    pub status: LoanStatus,
}

/// Clerk's answer to a bulk loan request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReport {
    outcomes: Vec<TitleOutcome>,
    min_loan_days: Option<u32>,
}

impl LoanReport {
    /// Build a report. The minimum loan duration is only set when every title
    /// was borrowed.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<TitleOutcome>) -> Self {
        let mut min_loan_days: Option<u32> = None;
        let mut all_borrowed = !outcomes.is_empty();
        for outcome in &outcomes {
            match outcome.status {
                LoanStatus::Borrowed { loan_days } => {
                    min_loan_days = Some(min_loan_days.map_or(loan_days, |m| m.min(loan_days)));
                }
                LoanStatus::Unavailable => all_borrowed = false,
            }
        }
        Self {
            outcomes,
            min_loan_days: if all_borrowed { min_loan_days } else { None },
        }
    }

    /// Per-title outcomes, in request order.
    #[must_use]
    pub fn outcomes(&self) -> &[TitleOutcome] {
        &self.outcomes
    }

    /// Shortest loan across all titles, when every title was borrowed.
    #[must_use]
    pub const fn min_loan_days(&self) -> Option<u32> {
        self.min_loan_days
    }

    /// Titles that were lent.
    #[must_use]
    pub fn borrowed_titles(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LoanStatus::Borrowed { .. }))
            .map(|o| o.title.as_str())
            .collect()
    }

    /// Returns true if every requested title was lent.
    #[must_use]
    pub fn all_borrowed(&self) -> bool {
        self.min_loan_days.is_some()
    }
}

impl fmt::Display for LoanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .outcomes
            .iter()
            .map(|o| match o.status {
                LoanStatus::Borrowed { loan_days } => format!("{} ({loan_days} days)", o.title),
                LoanStatus::Unavailable => format!("{} (unavailable)", o.title),
            })
            .collect();
        f.write_str(&lines.join("; "))
    }
}
