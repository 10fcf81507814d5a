//! Initiator session state: phases, outcomes and the closing sequence.

use std::fmt;

use biblio_platform::{AgentContext, NotificationCategory};
use biblio_proto::{AgentId, LoanReport, Price, RefuseReason};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};

/// Where an initiator is in its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Not started.
    Start,
    /// Looking responders up in the directory.
    AwaitingDiscovery,
    /// Waiting for a clerk to acknowledge a search.
    AwaitingSearchAck,
    /// Waiting for offers or an answer.
    AwaitingOffers,
    /// Committed, waiting for the final acknowledgement.
    AwaitingConfirmation,
    /// Finished.
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::AwaitingDiscovery => "awaiting discovery",
            Self::AwaitingSearchAck => "awaiting search acknowledgement",
            Self::AwaitingOffers => "awaiting offers",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// How an initiator session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The buyer bought the book.
    Purchased {
        /// Title bought.
        title: String,
        /// Winning seller.
        seller: AgentId,
        /// Price paid.
        price: Price,
    },
    /// The winning seller sold out between offer and acceptance.
    PurchaseFailed {
        /// Title wanted.
        title: String,
        /// Seller that failed.
        seller: AgentId,
    },
    /// Discovery found nobody to ask.
    NoResponders,
    /// Every seller refused or stayed silent.
    NoOffers {
        /// Number of refusals received.
        refusals: usize,
    },
    /// A wait elapsed.
    Timeout {
        /// Phase that timed out.
        phase: SessionPhase,
    },
    /// The clerk has the title.
    Available {
        /// Title asked about.
        title: String,
    },
    /// The clerk does not have the title.
    Unavailable {
        /// Title asked about.
        title: String,
    },
    /// The clerk refused a loan request.
    Refused {
        /// Title requested.
        title: String,
        /// Why.
        reason: RefuseReason,
    },
    /// The loan went through.
    Borrowed {
        /// Title borrowed.
        title: String,
        /// Loan duration.
        loan_days: u32,
    },
    /// The offered copies were gone at acceptance time.
    LoanFailed {
        /// Title requested.
        title: String,
    },
    /// A bulk loan was carried out.
    BorrowedList {
        /// Per-title outcome.
        report: LoanReport,
    },
    /// The list borrower did not find enough titles to bother.
    Declined {
        /// Found/requested ratio.
        utility: f64,
    },
}

impl SessionOutcome {
    /// Returns true if the initiator got what it came for.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Purchased { .. }
                | Self::Available { .. }
                | Self::Borrowed { .. }
                | Self::BorrowedList { .. }
        )
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchased { title, seller, price } => {
                write!(f, "bought \"{title}\" from {seller} for {price}")
            }
            Self::PurchaseFailed { title, seller } => {
                write!(f, "{seller} could no longer sell \"{title}\"")
            }
            Self::NoResponders => f.write_str("nobody to ask"),
            Self::NoOffers { refusals } => write!(f, "no offers ({refusals} refusals)"),
            Self::Timeout { phase } => write!(f, "timed out while {phase}"),
            Self::Available { title } => write!(f, "\"{title}\" is available"),
            Self::Unavailable { title } => write!(f, "\"{title}\" is unavailable"),
            Self::Refused { title, reason } => write!(f, "loan of \"{title}\" refused: {reason}"),
            Self::Borrowed { title, loan_days } => {
                write!(f, "borrowed \"{title}\" for {loan_days} days")
            }
            Self::LoanFailed { title } => write!(f, "loan of \"{title}\" failed at confirmation"),
            Self::BorrowedList { report } => write!(f, "borrowed: {report}"),
            Self::Declined { utility } => write!(f, "declined with utility {utility:.2}"),
        }
    }
}

/// Tracks an initiator's phase and logs transitions.
#[derive(Debug)]
pub struct Session {
    agent: AgentId,
    phase: SessionPhase,
}

impl Session {
    /// Starts tracking a session for `agent`.
    #[must_use]
    pub const fn new(agent: AgentId) -> Self {
        Self {
            agent,
            phase: SessionPhase::Start,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Moves to `next`.
    pub fn advance(&mut self, next: SessionPhase) {
        debug!(agent = %self.agent, from = %self.phase, to = %next, "Session phase");
        self.phase = next;
    }

    /// Outcome for a wait that elapsed in the current phase.
    #[must_use]
    pub const fn timed_out(&self) -> SessionOutcome {
        SessionOutcome::Timeout { phase: self.phase }
    }
}

/// Reports how a session ended, then takes the agent off the platform.
///
/// Every initiator ends here: an END notification is always emitted, a
/// failure notification precedes it for platform errors, and the context is
/// detached either way.
pub fn conclude(ctx: AgentContext, result: Result<SessionOutcome>) -> Result<SessionOutcome> {
    match &result {
        Ok(outcome) if outcome.is_success() => {
            info!(agent = %ctx.id(), outcome = %outcome, "Session succeeded");
        }
        Ok(outcome) => {
            info!(agent = %ctx.id(), outcome = %outcome, "Session ended without success");
        }
        Err(e) => {
            warn!(agent = %ctx.id(), error = %e, "Session aborted");
            ctx.notify(NotificationCategory::Info, format!("session aborted: {e}"));
        }
    }
    let summary = match &result {
        Ok(outcome) => outcome.to_string(),
        Err(AgentError::Platform(e)) => format!("platform failure: {e}"),
        Err(e) => e.to_string(),
    };
    ctx.notify(NotificationCategory::End, summary);
    ctx.detach();
    result
}
