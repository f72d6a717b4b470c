//! Catalog command implementation.

use super::{CliError, OutputFormat};
use monster_hunt::game::CharacterDef;
use monster_hunt::{GameConfig, Item};
use serde::Serialize;
use std::fmt::Write as _;

/// JSON-serializable item entry.
#[derive(Debug, Serialize)]
struct JsonItem {
    item: Item,
    name: &'static str,
    effect: &'static str,
    usable: bool,
}

/// JSON-serializable catalog.
#[derive(Debug, Serialize)]
struct JsonCatalog<'a> {
    characters: &'a [CharacterDef],
    items: Vec<JsonItem>,
    loot_table: &'a [Item],
    monsters: &'a [String],
    config: &'a GameConfig,
}

/// Execute the catalog command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn execute(config: &GameConfig, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => print!("{}", format_catalog(config)),
        OutputFormat::Json => {
            let catalog = JsonCatalog {
                characters: &config.characters,
                items: Item::ALL
                    .iter()
                    .map(|&item| JsonItem {
                        item,
                        name: item.name(),
                        effect: item.effect(),
                        usable: item.is_usable(),
                    })
                    .collect(),
                loot_table: &config.loot_table,
                monsters: &config.monster_roster,
                config,
            };
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
    }
    Ok(())
}

fn format_catalog(config: &GameConfig) -> String {
    let mut output = String::new();

    output.push_str("Characters\n==========\n");
    for def in &config.characters {
        let _ = writeln!(output, "{} {}", def.emoji, def.id);
        let _ = writeln!(
            output,
            "  Board:  {} ({}x) - {}",
            def.board_ability.name, def.board_ability.max_uses, def.board_ability.description
        );
        let _ = writeln!(
            output,
            "  Combat: {} ({}x) - {}",
            def.combat_ability.name, def.combat_ability.max_uses, def.combat_ability.description
        );
    }

    output.push_str("\nItems\n=====\n");
    for item in Item::ALL {
        let kind = if item.is_usable() { "use" } else { "passive" };
        let _ = writeln!(output, "  {:<20} [{kind}] {}", item.name(), item.effect());
    }

    let _ = writeln!(output, "\nMonsters\n========\n  {}", config.monster_roster.join(", "));

    let _ = writeln!(
        output,
        "\nBoard {n}x{n}, {} obstacles, {} monsters with {} HP, players start with {} HP",
        config.obstacle_count,
        config.monster_count,
        config.monster_health,
        config.starting_health,
        n = config.board_size,
    );

    output
}
