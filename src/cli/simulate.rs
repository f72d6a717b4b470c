//! Simulate command implementation.

use super::output::{format_sim_csv, format_sim_text, JsonSimResult, SimStats};
use super::{CliError, SimulateFormat};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use monster_hunt::simulation::{run_game, SimConfig};
use monster_hunt::GameConfig;
use rayon::prelude::*;
use std::time::Instant;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the progress bar template or JSON output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    config: GameConfig,
    games: u64,
    seed: Option<u64>,
    players: usize,
    threads: Option<usize>,
    max_turns: u32,
    format: SimulateFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(super::random_seed);
    let sim = SimConfig {
        players,
        characters: None,
        max_turns,
        record_log: false,
        game: config,
    };

    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
                .map_err(|e| CliError::new(format!("Bad progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread accumulates into its own SimStats, merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || SimStats::new(players),
            |mut local, i| {
                let game_seed = base_seed.wrapping_add(i);
                match run_game(game_seed, &sim) {
                    Ok(result) => local.add_result(&result),
                    Err(e) => {
                        warn!("seed {game_seed} failed: {e}");
                        local.add_error();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local
            },
        )
        .reduce(
            || SimStats::new(players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    match format {
        SimulateFormat::Text => {
            println!();
            print!("{}", format_sim_text(&stats));
            println!();
            #[allow(clippy::cast_precision_loss)]
            let per_sec = if duration.as_secs_f64() > 0.0 {
                stats.games_played as f64 / duration.as_secs_f64()
            } else {
                0.0
            };
            println!("Duration: {:.2}s ({per_sec:.0} games/sec)", duration.as_secs_f64());
        }
        SimulateFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&JsonSimResult::from_stats(&stats))?);
        }
        SimulateFormat::Csv => {
            print!("{}", format_sim_csv(&stats));
        }
    }

    Ok(())
}
