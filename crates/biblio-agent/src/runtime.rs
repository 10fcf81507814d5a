//! Spawning agents by role and collecting their results.

use std::fmt;

use biblio_platform::Platform;
use biblio_proto::{AgentId, BookRecord, UtilityThreshold, WantedList};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::buyer::Buyer;
use crate::clerk::LibraryClerk;
use crate::error::{AgentError, Result};
use crate::list_borrower::ListBorrower;
use crate::loan_borrower::SingleLoanBorrower;
use crate::responder::start;
use crate::seller::Seller;
use crate::session::SessionOutcome;
use crate::simple_borrower::SimpleBorrower;
use crate::timings::AgentTimings;

fn one_copy() -> u32 {
    1
}

/// What an agent does, with the data it starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AgentRole {
    /// Sells single copies at fixed prices.
    Seller {
        /// Starting stock.
        books: Vec<BookRecord>,
    },
    /// Runs the library desk.
    Clerk {
        /// Library collection.
        books: Vec<BookRecord>,
    },
    /// Buys one title from the cheapest seller.
    Buyer {
        /// Title wanted.
        title: String,
    },
    /// Asks whether one title is available.
    SimpleBorrower {
        /// Title asked about.
        title: String,
    },
    /// Borrows copies of one title.
    SingleLoanBorrower {
        /// Title wanted.
        title: String,
        /// Copies wanted.
        #[serde(default = "one_copy")]
        copies: u32,
    },
    /// Borrows from a wanted list when enough of it is available.
    ListBorrower {
        /// Titles wanted.
        titles: Vec<String>,
        /// Minimum found/requested ratio.
        #[serde(default)]
        threshold: UtilityThreshold,
    },
}

impl AgentRole {
    /// Returns true for sellers and clerks.
    #[must_use]
    pub const fn is_responder(&self) -> bool {
        matches!(self, Self::Seller { .. } | Self::Clerk { .. })
    }

    /// Short role name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Seller { .. } => "seller",
            Self::Clerk { .. } => "clerk",
            Self::Buyer { .. } => "buyer",
            Self::SimpleBorrower { .. } => "simple_borrower",
            Self::SingleLoanBorrower { .. } => "single_loan_borrower",
            Self::ListBorrower { .. } => "list_borrower",
        }
    }
}

/// What an agent task hands back when it finishes.
#[derive(Debug)]
pub enum AgentReport {
    /// A seller after shutdown.
    Seller(Seller),
    /// A clerk after shutdown.
    Clerk(LibraryClerk),
    /// An initiator's session result.
    Session(SessionOutcome),
}

impl fmt::Display for AgentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seller(seller) => write!(f, "{} copies sold", seller.sales()),
            Self::Clerk(clerk) => {
                let stats = clerk.stats();
                write!(
                    f,
                    "{} requests handled, {} copies lent",
                    stats.requests_handled, stats.loans_granted
                )
            }
            Self::Session(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// A running agent.
#[derive(Debug)]
pub struct AgentHandle {
    id: AgentId,
    role: &'static str,
    task: JoinHandle<Result<AgentReport>>,
}

impl AgentHandle {
    /// The agent's id.
    #[must_use]
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// The agent's role name.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        self.role
    }

    /// Waits for the agent to finish.
    ///
    /// # Errors
    ///
    /// Returns the agent's own error, or [`AgentError::Join`] if the task
    /// panicked.
    pub async fn join(self) -> Result<AgentReport> {
        self.task
            .await
            .map_err(|e| AgentError::Join(format!("{}: {e}", self.id)))?
    }
}

/// Attaches `name` to the platform and starts it in `role`.
///
/// Responders are registered before this returns and stop when `cancel`
/// fires; initiators run their session and stop on their own.
///
/// # Errors
///
/// Returns an error if the name is blank or taken, the wanted list is
/// invalid, or registration fails.
pub fn spawn(
    platform: &Platform,
    name: &str,
    role: AgentRole,
    timings: AgentTimings,
    cancel: &CancellationToken,
) -> Result<AgentHandle> {
    let id = AgentId::new(name)?;
    let role_name = role.name();
    let ctx = platform.attach(id.clone())?;
    info!(agent = %id, role = role_name, "Spawning agent");

    let task: JoinHandle<Result<AgentReport>> = match role {
        AgentRole::Seller { books } => {
            let seller = start(Seller::new(name, books), ctx, cancel.clone())?;
            tokio::spawn(async move { seller_report(seller.await) })
        }
        AgentRole::Clerk { books } => {
            let clerk = start(LibraryClerk::new(name, books, timings), ctx, cancel.clone())?;
            tokio::spawn(async move { clerk_report(clerk.await) })
        }
        AgentRole::Buyer { title } => tokio::spawn(async move {
            Buyer::new(title).run(ctx, timings).await.map(AgentReport::Session)
        }),
        AgentRole::SimpleBorrower { title } => tokio::spawn(async move {
            SimpleBorrower::new(title)
                .run(ctx, timings)
                .await
                .map(AgentReport::Session)
        }),
        AgentRole::SingleLoanBorrower { title, copies } => tokio::spawn(async move {
            SingleLoanBorrower::new(title, copies)
                .run(ctx, timings)
                .await
                .map(AgentReport::Session)
        }),
        AgentRole::ListBorrower { titles, threshold } => {
            let wanted = match WantedList::new(titles, threshold) {
                Ok(wanted) => wanted,
                Err(e) => {
                    ctx.detach();
                    return Err(e.into());
                }
            };
            tokio::spawn(async move {
                ListBorrower::new(wanted)
                    .run(ctx, timings)
                    .await
                    .map(AgentReport::Session)
            })
        }
    };

    Ok(AgentHandle {
        id,
        role: role_name,
        task,
    })
}

fn seller_report(joined: std::result::Result<Result<Seller>, JoinError>) -> Result<AgentReport> {
    joined
        .map_err(|e| AgentError::Join(e.to_string()))?
        .map(AgentReport::Seller)
}

fn clerk_report(joined: std::result::Result<Result<LibraryClerk>, JoinError>) -> Result<AgentReport> {
    joined
        .map_err(|e| AgentError::Join(e.to_string()))?
        .map(AgentReport::Clerk)
}

/// A set of agents sharing one platform and one shutdown signal.
#[derive(Debug)]
pub struct Runtime {
    platform: Platform,
    timings: AgentTimings,
    cancel: CancellationToken,
    responders: Vec<AgentHandle>,
    initiators: Vec<AgentHandle>,
}

impl Runtime {
    /// Creates an empty runtime on `platform`.
    #[must_use]
    pub fn new(platform: Platform, timings: AgentTimings) -> Self {
        Self {
            platform,
            timings,
            cancel: CancellationToken::new(),
            responders: Vec::new(),
            initiators: Vec::new(),
        }
    }

    /// The shared platform.
    #[must_use]
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Timings every agent uses.
    #[must_use]
    pub const fn timings(&self) -> AgentTimings {
        self.timings
    }

    /// Starts an agent.
    ///
    /// # Errors
    ///
    /// See [`spawn`].
    pub fn spawn(&mut self, name: &str, role: AgentRole) -> Result<AgentId> {
        let is_responder = role.is_responder();
        let handle = spawn(&self.platform, name, role, self.timings, &self.cancel)?;
        let id = handle.id().clone();
        if is_responder {
            self.responders.push(handle);
        } else {
            self.initiators.push(handle);
        }
        Ok(id)
    }

    /// Number of responders still running.
    #[must_use]
    pub fn responder_count(&self) -> usize {
        self.responders.len()
    }

    /// Waits for every initiator started so far, in start order.
    pub async fn join_initiators(&mut self) -> Vec<(AgentId, Result<SessionOutcome>)> {
        let mut results = Vec::with_capacity(self.initiators.len());
        for handle in self.initiators.drain(..) {
            let id = handle.id().clone();
            let outcome = match handle.join().await {
                Ok(AgentReport::Session(outcome)) => Ok(outcome),
                Ok(other) => Err(AgentError::Join(format!("unexpected report: {other}"))),
                Err(e) => Err(e),
            };
            results.push((id, outcome));
        }
        results
    }

    /// Stops every responder and returns their final state.
    pub async fn shutdown(self) -> Vec<(AgentId, Result<AgentReport>)> {
        self.cancel.cancel();
        let mut reports = Vec::with_capacity(self.responders.len() + self.initiators.len());
        for handle in self.responders.into_iter().chain(self.initiators) {
            let id = handle.id().clone();
            let report = handle.join().await;
            if let Err(e) = &report {
                warn!(agent = %id, error = %e, "Agent ended with an error");
            }
            reports.push((id, report));
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_proto::Price;

    #[test]
    fn role_json_shape() {
        let role: AgentRole = serde_json::from_str(
            r#"{"role": "list_borrower", "titles": ["Dune", "Fondation"]}"#,
        )
        .unwrap();
        assert_eq!(
            role,
            AgentRole::ListBorrower {
                titles: vec!["Dune".into(), "Fondation".into()],
                threshold: UtilityThreshold::default(),
            }
        );

        let loan: AgentRole =
            serde_json::from_str(r#"{"role": "single_loan_borrower", "title": "1984"}"#).unwrap();
        assert_eq!(
            loan,
            AgentRole::SingleLoanBorrower { title: "1984".into(), copies: 1 }
        );
    }

    #[tokio::test]
    async fn runtime_runs_a_market() {
        let mut runtime = Runtime::new(Platform::default(), AgentTimings::instant());
        runtime
            .spawn(
                "seller-1",
                AgentRole::Seller {
                    books: vec![BookRecord::for_sale("Dune", "Frank Herbert", Price::from_cents(1875))],
                },
            )
            .unwrap();
        runtime
            .spawn("buyer-1", AgentRole::Buyer { title: "Dune".into() })
            .unwrap();

        let results = runtime.join_initiators().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].1.as_ref().unwrap().is_success());

        let reports = runtime.shutdown().await;
        let Ok(AgentReport::Seller(seller)) = &reports[0].1 else {
            panic!("expected the seller report");
        };
        assert_eq!(seller.sales(), 1);
    }

    #[tokio::test]
    async fn invalid_list_is_rejected_at_spawn() {
        let platform = Platform::default();
        let cancel = CancellationToken::new();
        let err = spawn(
            &platform,
            "user",
            AgentRole::ListBorrower {
                titles: Vec::new(),
                threshold: UtilityThreshold::default(),
            },
            AgentTimings::instant(),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::Proto(_)));
        assert!(!platform.post_office().is_open(&AgentId::new("user").unwrap()));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let mut runtime = Runtime::new(Platform::default(), AgentTimings::instant());
        runtime.spawn("clerk", AgentRole::Clerk { books: Vec::new() }).unwrap();
        assert!(matches!(
            runtime.spawn("clerk", AgentRole::Clerk { books: Vec::new() }),
            Err(AgentError::Platform(_))
        ));
        runtime.shutdown().await;
    }
}
