//! Running a configured cast to completion.

use std::fmt;
use std::sync::Arc;

use biblio_agent::{AgentReport, Runtime};
use biblio_platform::{NotificationSink, Platform};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::error::Result;

/// Final line for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    /// Agent name.
    pub agent: String,
    /// Human-readable result.
    pub summary: String,
    /// Whether the agent got what it came for.
    pub success: bool,
}

impl fmt::Display for AgentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.success { "ok" } else { "--" };
        write!(f, "[{mark}] {}: {}", self.agent, self.summary)
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// One entry per initiator, in start order.
    pub sessions: Vec<AgentSummary>,
    /// One entry per responder, in start order.
    pub responders: Vec<AgentSummary>,
}

impl ScenarioReport {
    /// Number of initiators that succeeded.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.sessions.iter().filter(|s| s.success).count()
    }

    /// Looks up an initiator's entry.
    #[must_use]
    pub fn session(&self, agent: &str) -> Option<&AgentSummary> {
        self.sessions.iter().find(|s| s.agent == agent)
    }
}

/// Starts every responder, then every initiator spaced by the start
/// stagger, waits for the initiators and shuts the responders down.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or an agent cannot be
/// started. Session failures are reported, not returned.
pub async fn run(config: &SimConfig, sink: Arc<dyn NotificationSink>) -> Result<ScenarioReport> {
    config.validate()?;
    let backlog = config.clerk_backlog();
    if config.timings.reply_timeout() < backlog {
        warn!(
            reply_timeout_ms = config.timings.reply_timeout_ms,
            backlog_ms = u64::try_from(backlog.as_millis()).unwrap_or(u64::MAX),
            "Reply timeout is shorter than the clerk backlog, borrowers may give up"
        );
    }
    let mut runtime = Runtime::new(Platform::new(sink), config.timings);

    for spec in config.responders() {
        runtime.spawn(&spec.name, spec.role.clone())?;
    }
    info!(responders = runtime.responder_count(), "Responders registered");

    let stagger = config.timings.start_stagger();
    for (i, spec) in config.initiators().enumerate() {
        if i > 0 && !stagger.is_zero() {
            tokio::time::sleep(stagger).await;
        }
        runtime.spawn(&spec.name, spec.role.clone())?;
    }

    let mut report = ScenarioReport::default();
    for (agent, outcome) in runtime.join_initiators().await {
        let summary = match outcome {
            Ok(outcome) => AgentSummary {
                agent: agent.to_string(),
                summary: outcome.to_string(),
                success: outcome.is_success(),
            },
            Err(e) => {
                warn!(agent = %agent, error = %e, "Session failed");
                AgentSummary {
                    agent: agent.to_string(),
                    summary: format!("error: {e}"),
                    success: false,
                }
            }
        };
        report.sessions.push(summary);
    }

    for (agent, result) in runtime.shutdown().await {
        let (summary, success) = match result {
            Ok(state @ (AgentReport::Seller(_) | AgentReport::Clerk(_))) => (state.to_string(), true),
            Ok(other) => (other.to_string(), false),
            Err(e) => (format!("error: {e}"), false),
        };
        report.responders.push(AgentSummary {
            agent: agent.to_string(),
            summary,
            success,
        });
    }

    info!(
        sessions = report.sessions.len(),
        successes = report.successes(),
        "Scenario finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_agent::AgentTimings;
    use biblio_platform::EventLog;

    fn quick(mut config: SimConfig) -> SimConfig {
        config.timings = AgentTimings::instant();
        config
    }

    #[tokio::test]
    async fn market_scenario_sells_three_titles() {
        let log = Arc::new(EventLog::new());
        let report = run(&quick(SimConfig::market()), log.clone()).await.unwrap();

        assert_eq!(report.sessions.len(), 4);
        assert_eq!(report.successes(), 3);
        assert!(!report.session("buyer-4").unwrap().success);
        assert_eq!(report.responders.len(), 3);
        // each buyer and the winning seller report the sale
        assert_eq!(log.transactions().len(), 6);
    }

    #[tokio::test]
    async fn library_scenario_outcomes() {
        let report = run(&quick(SimConfig::library()), Arc::new(EventLog::new()))
            .await
            .unwrap();

        assert!(report.session("user1").unwrap().success);
        assert!(report.session("user2").unwrap().success);
        assert!(report.session("user3").unwrap().success);
        assert!(!report.session("user4").unwrap().success);
        assert!(!report.session("user5").unwrap().success);
        assert!(report.responders[0].summary.contains("copies lent"));
    }

    #[tokio::test(start_paused = true)]
    async fn library_scenario_completes_with_default_timings() {
        let log = Arc::new(EventLog::new());
        let config = SimConfig::library();
        assert_eq!(config.timings, AgentTimings::default());
        let report = run(&config, log.clone()).await.unwrap();

        let successes: Vec<_> = report.sessions.iter().map(|s| s.success).collect();
        assert_eq!(successes, vec![true, true, true, false, false]);
        assert!(report.sessions.iter().all(|s| !s.summary.contains("timed out")));
        assert!(report.responders[0].summary.contains("6 requests handled"));
        // 2 x "1984" to user2, "Dune", "Fondation" and "Les Misérables" to user3
        assert!(report.responders[0].summary.contains("5 copies lent"));
    }

    #[tokio::test(start_paused = true)]
    async fn market_scenario_completes_with_default_timings() {
        let log = Arc::new(EventLog::new());
        let report = run(&SimConfig::market(), log.clone()).await.unwrap();

        assert_eq!(report.successes(), 3);
        assert!(!report.session("buyer-4").unwrap().success);
        assert_eq!(log.transactions().len(), 6);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_start() {
        let config = SimConfig {
            timings: AgentTimings::instant(),
            agents: Vec::new(),
        };
        assert!(run(&config, Arc::new(EventLog::new())).await.is_err());
    }
}
