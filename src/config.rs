//! Game configuration.
//!
//! Every field has a default matching the standard game, so a config file
//! only needs to list what it overrides.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{
    default_characters, placement_area, CharacterDef, CharacterId, Coord, Item, MonsterId,
    PlayerId, MIN_BOARD_SIZE,
};

/// Monster kinds drawn at game start.
pub const DEFAULT_MONSTER_ROSTER: [&str; 8] = [
    "Dragon", "Ogre", "Zombie", "Spider", "Wolf", "Bat", "Ghost", "Snake",
];

/// Tunable rules and content for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square board, border included.
    pub board_size: u16,
    /// Monsters placed at game start.
    pub monster_count: usize,
    /// Random interior obstacles on top of the border.
    pub obstacle_count: usize,
    /// Health of every player at character select.
    pub starting_health: u32,
    /// Health of every monster.
    pub monster_health: u32,
    /// Fewest seats a game may start with.
    pub min_players: usize,
    /// Most seats a game may start with.
    pub max_players: usize,
    /// Health restored by a Health Potion.
    pub potion_heal: u32,
    /// Health restored by Divine Protection.
    pub divine_heal: u32,
    /// Extra moves granted by Charge.
    pub charge_moves: u32,
    /// Resolved rounds covered by Wild Shape.
    pub wild_shape_rounds: u32,
    /// Selectable characters.
    pub characters: Vec<CharacterDef>,
    /// Items a defeated monster may drop, drawn uniformly.
    pub loot_table: Vec<Item>,
    /// Monster kinds, drawn uniformly.
    pub monster_roster: Vec<String>,
    /// Explicit starting cell per seat. Derived from the board size if absent.
    pub starting_positions: Option<Vec<Coord>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 15,
            monster_count: 5,
            obstacle_count: 15,
            starting_health: 100,
            monster_health: 50,
            min_players: 2,
            max_players: 6,
            potion_heal: 30,
            divine_heal: 20,
            charge_moves: 2,
            wild_shape_rounds: 3,
            characters: default_characters(),
            loot_table: Item::ALL.to_vec(),
            monster_roster: DEFAULT_MONSTER_ROSTER.iter().map(ToString::to_string).collect(),
            starting_positions: None,
        }
    }
}

impl GameConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result does not validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Starting cell for every seat, in seat order.
    ///
    /// Defaults to the four corners inside the border followed by the top
    /// and bottom centres.
    #[must_use]
    pub fn starting_positions(&self) -> Vec<Coord> {
        if let Some(positions) = &self.starting_positions {
            return positions.clone();
        }
        let n = self.board_size;
        let far = n.saturating_sub(2);
        vec![
            Coord::new(1, 1),
            Coord::new(far, 1),
            Coord::new(1, far),
            Coord::new(far, far),
            Coord::new(n / 2, 1),
            Coord::new(n / 2, far),
        ]
    }

    /// Look up a character by id.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&CharacterDef> {
        self.characters.iter().find(|def| def.id == id)
    }

    /// Check that a game built from this config can always be set up.
    ///
    /// Obstacle and monster placement both need room to terminate, so this
    /// guards the sizes they depend on.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.board_size;
        if n < MIN_BOARD_SIZE {
            return Err(ConfigError::BoardTooSmall {
                size: n,
                min: MIN_BOARD_SIZE,
            });
        }
        let area = placement_area(n);
        if self.obstacle_count >= area {
            return Err(ConfigError::TooManyObstacles {
                count: self.obstacle_count,
                area,
            });
        }
        if self.min_players < 2
            || self.min_players > self.max_players
            || self.max_players > usize::from(PlayerId::MAX)
        {
            return Err(ConfigError::InvalidPlayerRange {
                min: self.min_players,
                max: self.max_players,
            });
        }

        let positions = self.starting_positions();
        if positions.len() < self.max_players {
            return Err(ConfigError::NotEnoughStartingPositions {
                available: positions.len(),
                required: self.max_players,
            });
        }
        let mut seen = HashSet::new();
        for &cell in &positions {
            if !is_first_ring(cell, n) || !seen.insert(cell) {
                return Err(ConfigError::BadStartingPosition(cell));
            }
        }

        if self.characters.len() < self.max_players {
            return Err(ConfigError::NotEnoughCharacters {
                available: self.characters.len(),
                required: self.max_players,
            });
        }
        let mut ids = HashSet::new();
        for def in &self.characters {
            if !ids.insert(def.id) {
                return Err(ConfigError::DuplicateCharacter(def.id));
            }
        }

        if self.monster_count == 0 {
            return Err(ConfigError::NoMonsters);
        }
        let interior = usize::from(n - 2) * usize::from(n - 2);
        let free = interior
            .saturating_sub(self.obstacle_count + self.max_players)
            .min(usize::from(MonsterId::MAX) + 1);
        if self.monster_count > free {
            return Err(ConfigError::TooManyMonsters {
                count: self.monster_count,
                free,
            });
        }
        if self.loot_table.is_empty() {
            return Err(ConfigError::EmptyLootTable);
        }
        if self.monster_roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        Ok(())
    }
}

/// Whether `cell` lies on the ring just inside the border, where random
/// obstacles never land.
fn is_first_ring(cell: Coord, size: u16) -> bool {
    let far = size - 2;
    let inside = (1..=far).contains(&cell.x) && (1..=far).contains(&cell.y);
    inside && (cell.x == 1 || cell.y == 1 || cell.x == far || cell.y == far)
}
