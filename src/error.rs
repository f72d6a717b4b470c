//! Error types for the game engine.
//!
//! Illegal commands never panic and never half-apply: they come back as a
//! [`GameError`] and the game is left exactly as it was.

use thiserror::Error;

use crate::game::{CharacterId, Coord, GamePhase, Item, MonsterId, PlayerId};

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The command is not legal in the current phase.
    #[error("not allowed during the {0} phase")]
    WrongPhase(GamePhase),
    /// Player count outside the configured range.
    #[error("player count {count} is outside {min}..={max}")]
    InvalidPlayerCount {
        /// Requested seats.
        count: usize,
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Character select must go seat by seat.
    #[error("seat {expected} chooses next, not seat {got}")]
    WrongSeat {
        /// Seat whose turn it is to choose.
        expected: PlayerId,
        /// Seat that tried to choose.
        got: PlayerId,
    },
    /// Each character can be picked once per game.
    #[error("{0} has already been chosen")]
    CharacterTaken(CharacterId),
    /// The character is not in the active roster.
    #[error("{0} is not available in this game")]
    UnknownCharacter(CharacterId),
    /// No player with that id.
    #[error("no player with id {0}")]
    UnknownPlayer(PlayerId),
    /// No monster with that id.
    #[error("no monster with id {0}")]
    UnknownMonster(MonsterId),
    /// The command must come from the player whose turn it is.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),
    /// Eliminated players cannot act.
    #[error("player {0} has been eliminated")]
    PlayerEliminated(PlayerId),
    /// The monster has already been defeated.
    #[error("monster {0} has already been defeated")]
    MonsterDefeated(MonsterId),
    /// Movement roll while moves remain.
    #[error("you still have {0} moves left")]
    MovesRemaining(u32),
    /// Move attempted with an empty budget.
    #[error("no moves left, roll the die first")]
    NoMovesLeft,
    /// Target tile is outside the board.
    #[error("{0} is outside the board")]
    OutOfBounds(Coord),
    /// Target tile is not one king-move away.
    #[error("you can only move to adjacent tiles, {0} is not adjacent")]
    NotAdjacent(Coord),
    /// Target tile holds an obstacle.
    #[error("{0} is blocked by an obstacle")]
    Blocked(Coord),
    /// Target tile holds another living player.
    #[error("another player is on {0}")]
    OccupiedByPlayer(Coord),
    /// Teleport needs an empty destination.
    #[error("cannot teleport onto {0}, the tile is not empty")]
    TeleportBlocked(Coord),
    /// Combat target is too far away.
    #[error("{0} is out of reach")]
    OutOfReach(Coord),
    /// A player cannot fight themselves.
    #[error("player {0} cannot attack themselves")]
    SelfTarget(PlayerId),
    /// Every free cell is taken.
    #[error("no free cell left to place {0} monsters")]
    BoardFull(usize),
    /// No encounter is running.
    #[error("no combat in progress")]
    NoEncounter,
    /// A roll has already started this round.
    #[error("a roll is already in progress")]
    RollInProgress,
    /// Reroll or resolution before the attack roll.
    #[error("roll for attack first")]
    NoRollYet,
    /// The one reroll has been spent.
    #[error("the reroll has already been used this combat")]
    RerollUsed,
    /// No item grants a reroll.
    #[error("no Lucky Charm, rerolling is not possible")]
    NoReroll,
    /// One side of the encounter is already down.
    #[error("the combat is already decided")]
    CombatDecided,
    /// Inventory index past the end.
    #[error("no item in inventory slot {0}")]
    NoSuchItem(usize),
    /// Permanent items work on their own.
    #[error("{} is passive and cannot be used", .0.name())]
    ItemIsPassive(Item),
    /// Item only usable outside combat.
    #[error("{} cannot be used during combat", .0.name())]
    NotUsableInCombat(Item),
    /// Ability has no uses left.
    #[error("{0} has no uses left")]
    AbilityExhausted(String),
    /// Combat ability already armed for this round.
    #[error("a combat ability is already active this round")]
    AbilityAlreadyArmed,
    /// The configuration could not produce a board.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a configuration cannot produce a playable game.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Board side below the supported minimum.
    #[error("board size {size} is too small (minimum {min})")]
    BoardTooSmall {
        /// Configured side length.
        size: u16,
        /// Minimum side length.
        min: u16,
    },
    /// Rejection sampling would not terminate.
    #[error("{count} obstacles do not fit in the {area}-cell placement area")]
    TooManyObstacles {
        /// Configured obstacle count.
        count: usize,
        /// Cells available for interior obstacles.
        area: usize,
    },
    /// Not enough free cells for the monsters.
    #[error("{count} monsters do not fit in {free} free cells")]
    TooManyMonsters {
        /// Configured monster count.
        count: usize,
        /// Worst-case free cells after obstacles and players.
        free: usize,
    },
    /// Seat range is empty or below two.
    #[error("invalid player range {min}..={max}")]
    InvalidPlayerRange {
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Fewer starting positions than seats.
    #[error("only {available} starting positions for up to {required} players")]
    NotEnoughStartingPositions {
        /// Positions configured.
        available: usize,
        /// Seats that may need one.
        required: usize,
    },
    /// Starting position on the border or inside the obstacle area.
    #[error("starting position {0} must sit on the first ring inside the border")]
    BadStartingPosition(Coord),
    /// Fewer characters than seats.
    #[error("only {available} characters for up to {required} players")]
    NotEnoughCharacters {
        /// Characters configured.
        available: usize,
        /// Seats that need a distinct character.
        required: usize,
    },
    /// The same character listed twice.
    #[error("character {0} is listed more than once")]
    DuplicateCharacter(CharacterId),
    /// Zero monsters configured.
    #[error("at least one monster is required")]
    NoMonsters,
    /// Nothing to drop from monsters.
    #[error("the loot table is empty")]
    EmptyLootTable,
    /// No monster kinds to draw from.
    #[error("the monster roster is empty")]
    EmptyRoster,
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`crate::config::GameConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for game commands.
pub type CommandResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            GameError::MovesRemaining(3).to_string(),
            "you still have 3 moves left"
        );
        assert_eq!(
            GameError::NotAdjacent(Coord::new(4, 9)).to_string(),
            "you can only move to adjacent tiles, (4, 9) is not adjacent"
        );
        assert_eq!(
            GameError::ItemIsPassive(Item::MagicSword).to_string(),
            "Magic Sword is passive and cannot be used"
        );
        assert_eq!(
            GameError::WrongPhase(GamePhase::Combat).to_string(),
            "not allowed during the combat phase"
        );
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::TooManyObstacles { count: 200, area: 121 };
        assert_eq!(
            err.to_string(),
            "200 obstacles do not fit in the 121-cell placement area"
        );
    }
}
