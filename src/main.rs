//! Monster Hunt CLI - play and simulate seeded games from the command line.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use monster_hunt::CharacterId;
use std::path::PathBuf;
use std::process::ExitCode;

/// Monster Hunt - a turn-based monster hunting board game engine
#[derive(Parser, Debug)]
#[command(name = "monster-hunt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rules override file (JSON, missing fields take defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Auto-play a single seeded game
    Play {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of players (default: 4)
        #[arg(short, long, default_value = "4")]
        players: usize,

        /// Characters by seat, comma separated (default: rotate by seed)
        #[arg(long, value_delimiter = ',', value_parser = cli::parse_character)]
        characters: Vec<CharacterId>,

        /// Maximum turns (default: 500)
        #[arg(short = 't', long, default_value = "500")]
        max_turns: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress the narrated log
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many seeded games in parallel and aggregate statistics
    Simulate {
        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of players (default: 4)
        #[arg(short, long, default_value = "4")]
        players: usize,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum turns per game (default: 500)
        #[arg(short = 't', long, default_value = "500")]
        max_turns: u32,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::SimulateFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// List the characters, abilities, items and monsters in play
    Catalog {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_logging(args.verbose);

    let result = cli::load_config(args.config.as_deref()).and_then(|config| match args.command {
        Commands::Play {
            seed,
            players,
            characters,
            max_turns,
            format,
            quiet,
        } => cli::play::execute(config, seed, players, characters, max_turns, format, quiet),

        Commands::Simulate {
            games,
            seed,
            players,
            threads,
            max_turns,
            format,
            progress,
        } => cli::simulate::execute(config, games, seed, players, threads, max_turns, format, progress),

        Commands::Catalog { format } => cli::catalog::execute(&config, format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
