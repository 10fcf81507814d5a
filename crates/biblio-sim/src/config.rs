//! Simulation configuration.
//!
//! A simulation is a list of named agents, each with a role, plus the
//! timings they share. The default configuration reproduces the classic
//! cast: three booksellers and four buyers in the market, one clerk and
//! five readers in the library.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use biblio_agent::{AgentRole, AgentTimings};
use biblio_proto::{BookRecord, Price, UtilityThreshold};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// One agent in the cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent name.
    pub name: String,
    /// What the agent does.
    #[serde(flatten)]
    pub role: AgentRole,
}

impl AgentSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Timings shared by every agent.
    #[serde(default)]
    pub timings: AgentTimings,
    /// The cast, started responders first and then initiators in order.
    pub agents: Vec<AgentSpec>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut agents = Self::market().agents;
        agents.extend(Self::library().agents);
        Self {
            timings: AgentTimings::default(),
            agents,
        }
    }
}

impl SimConfig {
    /// Three sellers with the same stock and four buyers.
    #[must_use]
    pub fn market() -> Self {
        let mut agents: Vec<AgentSpec> = (1..=3)
            .map(|n| {
                AgentSpec::new(
                    format!("seller-{n}"),
                    AgentRole::Seller {
                        books: shop_stock(),
                    },
                )
            })
            .collect();
        agents.extend(
            ["Harry Potter", "1984", "Dune", "Le Seigneur des Anneaux"]
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    AgentSpec::new(
                        format!("buyer-{}", i + 1),
                        AgentRole::Buyer {
                            title: (*title).to_string(),
                        },
                    )
                }),
        );
        Self {
            timings: AgentTimings::default(),
            agents,
        }
    }

    /// One clerk and five readers exercising every borrowing style.
    #[must_use]
    pub fn library() -> Self {
        let agents = vec![
            AgentSpec::new(
                "clerk",
                AgentRole::Clerk {
                    books: library_collection(),
                },
            ),
            AgentSpec::new(
                "user1",
                AgentRole::SimpleBorrower {
                    title: "Le Petit Prince".to_string(),
                },
            ),
            AgentSpec::new(
                "user2",
                AgentRole::SingleLoanBorrower {
                    title: "1984".to_string(),
                    copies: 2,
                },
            ),
            AgentSpec::new(
                "user3",
                AgentRole::ListBorrower {
                    titles: owned(&["Dune", "Fondation", "Les Misérables"]),
                    threshold: threshold(0.5),
                },
            ),
            AgentSpec::new(
                "user4",
                AgentRole::ListBorrower {
                    titles: owned(&[
                        "Crime et Châtiment",
                        "Le Seigneur des Anneaux",
                        "Harry Potter",
                        "Don Quichotte",
                        "Hamlet",
                    ]),
                    threshold: threshold(0.7),
                },
            ),
            AgentSpec::new(
                "user5",
                AgentRole::SimpleBorrower {
                    title: "Les Frères Karamazov".to_string(),
                },
            ),
        ];
        Self {
            timings: AgentTimings::default(),
            agents,
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SimError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is invalid.
    pub fn validate(&self) -> Result<()> {
        self.timings.validate().map_err(SimError::Config)?;

        if self.agents.is_empty() {
            return Err(SimError::Config("at least one agent is required".to_string()));
        }

        let mut names = HashSet::new();
        for spec in &self.agents {
            if spec.name.trim().is_empty() {
                return Err(SimError::Config("agent name cannot be empty".to_string()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(SimError::Config(format!("duplicate agent name: {}", spec.name)));
            }
            validate_role(&spec.name, &spec.role)?;
        }
        Ok(())
    }

    /// Responders in the cast.
    pub fn responders(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter().filter(|spec| spec.role.is_responder())
    }

    /// Initiators in the cast.
    pub fn initiators(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter().filter(|spec| !spec.role.is_responder())
    }

    /// Simulated search time a clerk needs if every borrower in the cast
    /// asks at once.
    ///
    /// A reply timeout shorter than this can leave the last borrower in the
    /// queue waiting in vain.
    #[must_use]
    pub fn clerk_backlog(&self) -> Duration {
        self.initiators()
            .map(|spec| match &spec.role {
                AgentRole::SimpleBorrower { .. } | AgentRole::SingleLoanBorrower { .. } => {
                    self.timings.search_delay()
                }
                AgentRole::ListBorrower { titles, .. } => self.timings.list_search_delay(titles.len()),
                _ => Duration::ZERO,
            })
            .sum()
    }
}

fn validate_role(name: &str, role: &AgentRole) -> Result<()> {
    let invalid = |what: &str| Err(SimError::Config(format!("{name}: {what}")));
    match role {
        AgentRole::Seller { books } => {
            if books.iter().any(|b| b.price().is_none()) {
                return invalid("seller stock must carry sale prices");
            }
        }
        AgentRole::Clerk { books } => {
            if books.iter().any(|b| b.max_loan_days().is_none()) {
                return invalid("library books must carry loan terms");
            }
        }
        AgentRole::Buyer { title } | AgentRole::SimpleBorrower { title } => {
            if title.trim().is_empty() {
                return invalid("title cannot be empty");
            }
        }
        AgentRole::SingleLoanBorrower { title, copies } => {
            if title.trim().is_empty() {
                return invalid("title cannot be empty");
            }
            if *copies == 0 {
                return invalid("copies must be at least 1");
            }
        }
        AgentRole::ListBorrower { titles, .. } => {
            if titles.is_empty() || titles.iter().any(|t| t.trim().is_empty()) {
                return invalid("wanted list needs at least one non-empty title");
            }
        }
    }
    Ok(())
}

fn shop_stock() -> Vec<BookRecord> {
    [
        ("1984", "George Orwell", 1599),
        ("Le Petit Prince", "Antoine de Saint-Exupéry", 1250),
        ("Harry Potter", "J.K. Rowling", 2025),
        ("Dune", "Frank Herbert", 1875),
        ("Fondation", "Isaac Asimov", 1690),
        ("Ainsi parlait Zarathoustra", "Friedrich Nietzsche", 1450),
    ]
    .into_iter()
    .map(|(title, author, cents)| BookRecord::for_sale(title, author, Price::from_cents(cents)))
    .collect()
}

fn library_collection() -> Vec<BookRecord> {
    [
        ("1984", "George Orwell", 3, 21),
        ("Le Petit Prince", "Antoine de Saint-Exupéry", 5, 14),
        ("Harry Potter", "J.K. Rowling", 2, 30),
        ("Dune", "Frank Herbert", 1, 21),
        ("Fondation", "Isaac Asimov", 3, 14),
        ("Ainsi parlait Zarathoustra", "Friedrich Nietzsche", 2, 30),
        ("L'Étranger", "Albert Camus", 4, 21),
        ("Les Misérables", "Victor Hugo", 2, 30),
        ("Crime et Châtiment", "Fiodor Dostoïevski", 1, 14),
        ("Le Seigneur des Anneaux", "J.R.R. Tolkien", 3, 30),
    ]
    .into_iter()
    .map(|(title, author, copies, days)| BookRecord::for_loan(title, author, copies, days))
    .collect()
}

fn owned(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|t| (*t).to_string()).collect()
}

fn threshold(value: f64) -> UtilityThreshold {
    UtilityThreshold::new(value).unwrap_or_default()
}
