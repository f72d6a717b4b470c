//! Game layer for Monster Hunt.
//!
//! Implements the rules on top of the dice:
//! - Board with a border ring and random interior obstacles
//! - Characters with limited-use board and combat abilities
//! - Items and the combat bonuses they grant
//! - King-move movement with turn rotation
//! - Two-dice combat against monsters and other players
//! - The phase controller that owns all of it

mod board;
mod character;
pub mod combat;
mod invariants;
mod items;
mod movement;
mod player;
mod state;
mod turn;

pub use board::{placement_area, Board, Coord, TileContent, MIN_BOARD_SIZE};
pub use character::{
    board_effect, combat_effect, default_characters, Ability, BoardAbilityContext,
    BoardAbilityId, BoardEffect, CharacterDef, CharacterId, CombatAbilityContext,
    CombatAbilityId, CombatEffect,
};
pub use combat::{
    Encounter, EncounterTarget, OpponentView, Roll, RollStage, RoundModifiers, RoundOutcome,
    Side,
};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use items::{calculate_combat_bonuses, CombatBonuses, Item};
pub use movement::{check_move, is_move_legal, legal_targets, MoveKind, MoveView};
pub use player::{Monster, MonsterId, Player, PlayerId};
pub use state::{Command, Game, GameEvent, GamePhase, Outcome, Snapshot};
pub use turn::{next_living_seat, TurnState};
