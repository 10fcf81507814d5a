//! biblio-sim - book market and library simulation
//!
//! Starts sellers, a library clerk and their clients on an in-process
//! platform and prints how each negotiation ended.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use biblio_platform::{CompositeSink, EventLog, TracingSink};
use biblio_sim::{ScenarioReport, SimConfig};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "biblio-sim")]
#[command(about = "Book market and library negotiation simulation")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write every notification to this file as JSON
    #[arg(long, global = true)]
    events: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bookseller market
    Market,

    /// Run the library
    Library,

    /// Run a cast from a config file
    Run {
        /// Path to config file
        #[arg(short, long, env = "BIBLIO_CONFIG")]
        config: PathBuf,
    },

    /// Generate a sample config file with the default cast
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "biblio.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env()
        .add_directive("biblio_sim=info".parse()?)
        .add_directive("biblio_agent=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    let config = match cli.command {
        Commands::Market => SimConfig::market(),
        Commands::Library => SimConfig::library(),
        Commands::Run { config } => {
            info!(config = %config.display(), "loading config");
            SimConfig::from_file(&config)?
        }
        Commands::InitConfig { output } => {
            return init_config(&output);
        }
    };

    simulate(&config, cli.events).await
}

async fn simulate(config: &SimConfig, events: Option<PathBuf>) -> anyhow::Result<()> {
    let log = Arc::new(EventLog::new());
    let sink = CompositeSink::new()
        .with(Arc::new(TracingSink))
        .with(log.clone());

    let report = biblio_sim::run(config, Arc::new(sink)).await?;
    print_report(&report);

    if let Some(path) = events {
        std::fs::write(&path, serde_json::to_string_pretty(&log.entries())?)?;
        println!();
        println!("{} notifications written to {}", log.len(), path.display());
    }
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    println!();
    println!("Sessions ({}/{} succeeded):", report.successes(), report.sessions.len());
    for session in &report.sessions {
        println!("  {session}");
    }
    if !report.responders.is_empty() {
        println!();
        println!("Responders:");
        for responder in &report.responders {
            println!("  {responder}");
        }
    }
}

fn init_config(output: &Path) -> anyhow::Result<()> {
    SimConfig::default().save(output)?;

    println!("Config written to {}", output.display());
    println!();
    println!("Edit the cast, then run:");
    println!("  biblio-sim run --config {}", output.display());

    Ok(())
}
