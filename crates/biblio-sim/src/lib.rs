//! # biblio-sim
//!
//! Configuration and scenario runner behind the `biblio-sim` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod scenario;

pub use config::{AgentSpec, SimConfig};
pub use error::SimError;
pub use scenario::{AgentSummary, ScenarioReport, run};
