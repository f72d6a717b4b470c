//! Play command implementation.

use super::output::format_result_text;
use super::{CliError, OutputFormat};
use monster_hunt::simulation::{run_game, SimConfig};
use monster_hunt::{CharacterId, GameConfig};

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up or breaks an invariant.
pub(crate) fn execute(
    config: GameConfig,
    seed: Option<u64>,
    players: usize,
    characters: Vec<CharacterId>,
    max_turns: u32,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let seed = seed.unwrap_or_else(super::random_seed);
    let sim = SimConfig {
        players,
        characters: (!characters.is_empty()).then_some(characters),
        max_turns,
        record_log: !quiet,
        game: config,
    };
    let result = run_game(seed, &sim)?;

    match format {
        OutputFormat::Text => {
            for line in &result.log {
                println!("{line}");
            }
            if !result.log.is_empty() {
                println!();
            }
            print!("{}", format_result_text(&result));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
