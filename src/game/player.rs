//! Player and monster records.

use serde::{Deserialize, Serialize};

use crate::game::{
    calculate_combat_bonuses, Ability, BoardAbilityId, CharacterDef, CharacterId, CombatAbilityId,
    CombatBonuses, Coord, Item,
};

/// Unique identifier for a player. Equal to the seat index.
pub type PlayerId = u8;

/// Unique identifier for a monster.
pub type MonsterId = u8;

/// State for a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable lookup key.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Chosen archetype.
    pub character: CharacterId,
    /// Grid position.
    pub position: Coord,
    /// Current health, `0..=max_health`.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
    /// Ordered inventory, duplicates allowed.
    pub inventory: Vec<Item>,
    /// Color tag, cosmetic.
    pub color: String,
    /// Bonuses computed at the start of the current or last combat.
    pub combat_bonuses: CombatBonuses,
    /// Set once when health reaches zero in combat. Never cleared.
    pub is_eliminated: bool,
    /// Board ability.
    pub board_ability: Ability<BoardAbilityId>,
    /// Combat ability.
    pub combat_ability: Ability<CombatAbilityId>,
    /// Rounds of halved incoming damage left.
    pub wild_shape_rounds: u32,
}

impl Player {
    /// Create a player for a seat from a character definition.
    #[must_use]
    pub fn new(id: PlayerId, def: &CharacterDef, position: Coord, health: u32) -> Self {
        Self {
            id,
            name: format!("Player {}", u32::from(id) + 1),
            character: def.id,
            position,
            health,
            max_health: health,
            inventory: Vec::new(),
            color: def.color.clone(),
            combat_bonuses: CombatBonuses::NONE,
            is_eliminated: false,
            board_ability: def.board_ability.clone(),
            combat_ability: def.combat_ability.clone(),
            wild_shape_rounds: 0,
        }
    }

    /// Whether this player can still act.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.is_eliminated
    }

    /// Health below the maximum.
    #[must_use]
    pub const fn missing_health(&self) -> u32 {
        self.max_health.saturating_sub(self.health)
    }

    /// Restore health, clamped to the maximum. Returns the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Remove health, clamped at zero. Returns the health left.
    ///
    /// Does not eliminate; the combat engine decides that.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Flag the player as eliminated.
    pub fn eliminate(&mut self) {
        self.is_eliminated = true;
    }

    /// Recompute bonuses from the current inventory.
    pub fn refresh_bonuses(&mut self) {
        self.combat_bonuses = calculate_combat_bonuses(&self.inventory);
    }

    /// Remove the item at `index`.
    pub fn remove_item(&mut self, index: usize) -> Option<Item> {
        (index < self.inventory.len()).then(|| self.inventory.remove(index))
    }

    /// Remove the first `ceil(len / 2)` items, in order.
    pub fn drain_first_half(&mut self) -> Vec<Item> {
        let count = self.inventory.len().div_ceil(2);
        self.inventory.drain(..count).collect()
    }

    /// Drop every single-combat item. Returns how many were removed.
    pub fn strip_temporary_items(&mut self) -> usize {
        let before = self.inventory.len();
        self.inventory.retain(|item| !item.is_temporary());
        before - self.inventory.len()
    }
}

/// State for a single monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Stable lookup key.
    pub id: MonsterId,
    /// Grid position.
    pub position: Coord,
    /// Roster tag, cosmetic.
    pub kind: String,
    /// Current health.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
    /// Set once when health reaches zero. Never cleared.
    pub defeated: bool,
}

impl Monster {
    /// Create a monster at full health.
    #[must_use]
    pub fn new(id: MonsterId, position: Coord, kind: &str, health: u32) -> Self {
        Self {
            id,
            position,
            kind: kind.to_string(),
            health,
            max_health: health,
            defeated: false,
        }
    }

    /// Whether this monster still blocks and fights.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.defeated
    }

    /// Remove health, clamped at zero. Returns the health left.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Flag the monster as defeated.
    pub fn defeat(&mut self) {
        self.health = 0;
        self.defeated = true;
    }
}
