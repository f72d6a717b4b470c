//! CLI command implementations for Monster Hunt.

pub(crate) mod catalog;
pub(crate) mod play;
pub(crate) mod simulate;

mod output;

use clap::ValueEnum;
use monster_hunt::simulation::SimError;
use monster_hunt::{CharacterId, ConfigError, GameConfig};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Output format for the `play` and `catalog` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `simulate` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SimulateFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<SimError> for CliError {
    fn from(e: SimError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

/// Install the logger. `RUST_LOG` wins over `-v`.
pub(crate) fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Load the rules from `path`, or the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<GameConfig, CliError> {
    match path {
        Some(path) => Ok(GameConfig::from_json_file(path)?),
        None => Ok(GameConfig::default()),
    }
}

/// Seed from the clock when none is given.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

/// Parse a character name, ignoring case.
pub(crate) fn parse_character(name: &str) -> Result<CharacterId, String> {
    CharacterId::ALL
        .into_iter()
        .find(|id| id.to_string().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            let known: Vec<String> = CharacterId::ALL.iter().map(ToString::to_string).collect();
            format!("unknown character '{name}' (expected one of {})", known.join(", "))
        })
}
