//! Integration tests for the simulation harness.
//!
//! Runs whole casts the way the binary does: config on disk, notifications
//! collected in an event log, results summarised per agent.

use std::sync::Arc;

use biblio_agent::{AgentRole, AgentTimings};
use biblio_platform::{EventLog, NotificationCategory};
use biblio_sim::{AgentSpec, SimConfig};

// ============================================================================
// Helper Functions
// ============================================================================

fn instant(mut config: SimConfig) -> SimConfig {
    config.timings = AgentTimings::instant();
    config
}

// ============================================================================
// Config Files
// ============================================================================

#[tokio::test]
async fn config_written_to_disk_runs_the_full_cast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biblio.json");
    instant(SimConfig::default()).save(&path).unwrap();

    let config = SimConfig::from_file(&path).unwrap();
    let log = Arc::new(EventLog::new());
    let report = biblio_sim::run(&config, log.clone()).await.unwrap();

    assert_eq!(report.sessions.len(), 9);
    assert_eq!(report.responders.len(), 4);
    // three buyers and three library users get what they came for
    assert_eq!(report.successes(), 6);
    assert!(!report.session("buyer-4").unwrap().success);
    assert!(!report.session("user4").unwrap().success);
    assert!(!report.session("user5").unwrap().success);

    let json = serde_json::to_value(log.entries()).unwrap();
    let categories: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["category"].as_str())
        .collect();
    assert!(categories.contains(&"TRANSACTION"));
    assert_eq!(
        log.by_category(NotificationCategory::New).len(),
        log.by_category(NotificationCategory::End).len()
    );
}

#[tokio::test]
async fn hand_written_cast() {
    let json = r#"{
        "timings": {"reply_timeout_ms": 2000, "offer_window_ms": 2000, "search_delay_ms": 0,
                    "per_title_delay_ms": 0, "think_time_ms": 0, "start_stagger_ms": 0},
        "agents": [
            {"name": "clerk", "role": "clerk", "books": [
                {"title": "Dune", "author": "Frank Herbert", "quantity": 1,
                 "terms": {"kind": "loan", "max_loan_days": 21}}
            ]},
            {"name": "reader", "role": "single_loan_borrower", "title": "Dune"}
        ]
    }"#;
    let config = SimConfig::from_json(json).unwrap();
    assert_eq!(
        config.agents[1],
        AgentSpec::new(
            "reader",
            AgentRole::SingleLoanBorrower { title: "Dune".into(), copies: 1 }
        )
    );

    let report = biblio_sim::run(&config, Arc::new(EventLog::new())).await.unwrap();
    let reader = report.session("reader").unwrap();
    assert!(reader.success, "{reader}");
    assert!(reader.summary.contains("21"));
}

#[tokio::test]
async fn initiators_without_responders_report_no_responders() {
    let config = SimConfig {
        timings: AgentTimings::instant(),
        agents: vec![AgentSpec::new("buyer", AgentRole::Buyer { title: "Dune".into() })],
    };
    let log = Arc::new(EventLog::new());
    let report = biblio_sim::run(&config, log.clone()).await.unwrap();

    assert_eq!(report.successes(), 0);
    assert!(report.responders.is_empty());
    assert!(log.transactions().is_empty());
}
