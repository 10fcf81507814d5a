//! Waiting windows and simulated delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs shared by every agent in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTimings {
    /// How long an initiator waits for any single reply (in milliseconds).
    pub reply_timeout_ms: u64,
    /// How long a buyer collects offers (in milliseconds).
    pub offer_window_ms: u64,
    /// Simulated clerk lookup time (in milliseconds).
    pub search_delay_ms: u64,
    /// Extra clerk lookup time per title of a wanted list (in milliseconds).
    pub per_title_delay_ms: u64,
    /// How long a list borrower weighs a search result (in milliseconds).
    pub think_time_ms: u64,
    /// Gap between initiator start-ups in a simulation (in milliseconds).
    pub start_stagger_ms: u64,
}

impl Default for AgentTimings {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 10_000,
            offer_window_ms: 5_000,
            search_delay_ms: 500,
            per_title_delay_ms: 250,
            think_time_ms: 1_000,
            start_stagger_ms: 500,
        }
    }
}

impl AgentTimings {
    /// No simulated delays and short windows, for tests.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            reply_timeout_ms: 2_000,
            offer_window_ms: 2_000,
            search_delay_ms: 0,
            per_title_delay_ms: 0,
            think_time_ms: 0,
            start_stagger_ms: 0,
        }
    }

    /// Reply timeout.
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Offer collection window.
    #[must_use]
    pub const fn offer_window(&self) -> Duration {
        Duration::from_millis(self.offer_window_ms)
    }

    /// Clerk delay before answering a single-title request.
    #[must_use]
    pub const fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    /// Clerk delay before answering a wanted list of `titles` entries.
    #[must_use]
    pub fn list_search_delay(&self, titles: usize) -> Duration {
        let per_title = self.per_title_delay_ms.saturating_mul(titles as u64);
        Duration::from_millis(self.search_delay_ms.saturating_add(per_title))
    }

    /// List borrower think time.
    #[must_use]
    pub const fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_time_ms)
    }

    /// Gap between initiator start-ups.
    #[must_use]
    pub const fn start_stagger(&self) -> Duration {
        Duration::from_millis(self.start_stagger_ms)
    }

    /// Checks that the waiting windows are usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.reply_timeout_ms == 0 {
            return Err("reply_timeout_ms must be greater than zero".to_string());
        }
        if self.offer_window_ms == 0 {
            return Err("offer_window_ms must be greater than zero".to_string());
        }
        if self.reply_timeout_ms <= self.search_delay_ms {
            return Err("reply_timeout_ms must exceed search_delay_ms".to_string());
        }
        Ok(())
    }
}
