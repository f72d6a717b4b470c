// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Monster Hunt: a turn-based monster hunting board game engine.
//!
//! Two to six players pick characters, roll a die to walk a square board,
//! fight monsters with two-dice combat rolls, collect magical items and, once
//! every monster is gone, fight each other until one player is left.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI / Simulation driver           │
//! ├─────────────────────────────────────┤
//! │   Game phase controller (Game)      │
//! ├──────────────┬──────────────────────┤
//! │ Movement     │ Combat state machine │
//! ├──────────────┴──────────────────────┤
//! │   Board, entities, items, dice      │
//! └─────────────────────────────────────┘
//! ```
//!
//! Every random decision goes through [`Dice`], so a game is reproducible
//! from its seed, and every command either applies completely or is
//! rejected with a [`GameError`] leaving the game untouched.

pub mod config;
pub mod dice;
pub mod error;
pub mod game;
pub mod simulation;

pub use config::GameConfig;
pub use dice::{Dice, RngDice, ScriptedDice};
pub use error::{CommandResult, ConfigError, GameError};

// Re-export key game types at crate root for convenience
pub use game::{
    CharacterId, Command, Coord, Game, GameEvent, GamePhase, Item, Monster, Outcome, Player,
    PlayerId, Snapshot,
};
