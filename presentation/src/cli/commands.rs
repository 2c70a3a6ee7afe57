//! CLI command definitions

use agora_domain::{AgenticFlowType, Model};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for the final debate snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every round with every response
    Full,
    /// Outcome and per-round counts
    Summary,
    /// JSON snapshot
    Json,
}

/// One `-p name:position[:flow]` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSpec {
    pub name: String,
    pub position: String,
    pub flow: Option<AgenticFlowType>,
}

impl ParticipantSpec {
    pub fn new(name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
            flow: None,
        }
    }

    /// Participants used when none are given on the command line
    pub fn default_pair() -> Vec<Self> {
        vec![Self::new("Advocate", "pro"), Self::new("Skeptic", "con")]
    }
}

impl FromStr for ParticipantSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let position = parts.next().unwrap_or_default();
        if name.is_empty() || position.is_empty() {
            return Err(format!("expected NAME:POSITION[:FLOW], got '{}'", s));
        }
        let flow = match parts.next() {
            Some(flow) if !flow.is_empty() => {
                Some(flow.parse::<AgenticFlowType>().map_err(|e| e.to_string())?)
            }
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            position: position.to_string(),
            flow,
        })
    }
}

impl fmt::Display for ParticipantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.position)?;
        if let Some(flow) = self.flow {
            write!(f, ":{}", flow)?;
        }
        Ok(())
    }
}

/// CLI arguments for agora
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(author, version, about = "Multi-round AI debates with agentic reasoning flows")]
#[command(long_about = r#"
Agora runs a structured debate between AI participants on a topic.

Each round every active participant answers once, in turn order. A
participant may wrap its model call in an agentic flow (internal monologue,
red team, tree of thoughts, ...). Provider calls go through a
gateway with rate limiting, a circuit breaker, retries and a response cache.

Configuration files are loaded from (in priority order):
1. AGORA_* environment variables
2. --config <path>     Explicit config file
3. ./agora.toml        Project-level config
4. ~/.config/agora/config.toml   Global config

Example:
  agora "Should cities ban cars from downtown?"
  agora -p Ada:pro:internal_monologue -p Lin:con -p Sam:neutral --rounds 2 "Remote work"
  agora --flow ensemble_voting -o summary "Is nuclear power green?"
"#)]
pub struct Cli {
    /// The debate topic
    #[arg(required_unless_present = "show_config")]
    pub topic: Option<String>,

    /// Participant as NAME:POSITION[:FLOW] (can be specified multiple times)
    #[arg(short = 'p', long = "participant", value_name = "NAME:POSITION[:FLOW]")]
    pub participants: Vec<ParticipantSpec>,

    /// Number of rounds
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Require at least one participant per non-neutral position
    #[arg(long)]
    pub balanced: bool,

    /// Time limit per round in seconds
    #[arg(long, value_name = "SECS")]
    pub round_time: Option<u64>,

    /// Agentic flow for participants that do not name one
    #[arg(long, value_name = "TYPE")]
    pub flow: Option<AgenticFlowType>,

    /// Model used by every participant
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<Model>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Participants from the command line, or the default pair
    pub fn participant_specs(&self) -> Vec<ParticipantSpec> {
        if self.participants.is_empty() {
            ParticipantSpec::default_pair()
        } else {
            self.participants.clone()
        }
    }
}
