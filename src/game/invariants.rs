//! Game invariants - sanity checks that detect bugs.
//!
//! None of these should ever trigger through the command API. The simulator
//! and the property tests run them after every command.

use std::collections::HashSet;

use crate::dice::Dice;
use crate::game::{EncounterTarget, Game, GamePhase};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants<D: Dice>(game: &Game<D>) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let board = game.board();
    let phase = game.phase();

    for (seat, player) in game.players().iter().enumerate() {
        if usize::from(player.id) != seat {
            violations.push(violation(format!(
                "player {} sits in seat {seat}",
                player.id
            )));
        }
        if player.health > player.max_health {
            violations.push(violation(format!(
                "{} has {} health > max {}",
                player.name, player.health, player.max_health
            )));
        }
        if player.is_eliminated != (player.health == 0) {
            violations.push(violation(format!(
                "{} eliminated={} with {} health",
                player.name, player.is_eliminated, player.health
            )));
        }
        if player.board_ability.uses > player.board_ability.max_uses
            || player.combat_ability.uses > player.combat_ability.max_uses
        {
            violations.push(violation(format!("{} has ability uses above max", player.name)));
        }
        if !board.in_bounds(player.position) || board.is_border(player.position) {
            violations.push(violation(format!(
                "{} stands off the playable area at {}",
                player.name, player.position
            )));
        }
    }

    let mut monster_cells = HashSet::new();
    for monster in game.monsters() {
        if monster.health > monster.max_health {
            violations.push(violation(format!(
                "monster {} has {} health > max {}",
                monster.id, monster.health, monster.max_health
            )));
        }
        if monster.defeated != (monster.health == 0) {
            violations.push(violation(format!(
                "monster {} defeated={} with {} health",
                monster.id, monster.defeated, monster.health
            )));
        }
        if monster.is_alive() {
            if board.is_obstacle(monster.position) {
                violations.push(violation(format!(
                    "monster {} sits on an obstacle at {}",
                    monster.id, monster.position
                )));
            }
            if !monster_cells.insert(monster.position) {
                violations.push(violation(format!(
                    "two living monsters share {}",
                    monster.position
                )));
            }
        }
    }

    match (phase, game.encounter()) {
        (GamePhase::Combat, None) => {
            violations.push(violation("combat phase without an encounter".to_string()));
        }
        (GamePhase::Combat, Some(encounter)) => {
            let alive = match encounter.target {
                EncounterTarget::Monster(id) => {
                    game.monsters().iter().any(|m| m.id == id && m.is_alive())
                }
                EncounterTarget::Player(id) => game
                    .players()
                    .get(usize::from(id))
                    .is_some_and(|p| p.is_alive()),
            };
            if !alive {
                violations.push(violation(format!(
                    "encounter target {:?} is already down",
                    encounter.target
                )));
            }
        }
        (_, Some(_)) => {
            violations.push(violation(format!("encounter outside combat during {phase}")));
        }
        (_, None) => {}
    }

    if matches!(phase, GamePhase::Playing | GamePhase::Combat | GamePhase::PvP) {
        match game.players().get(game.turn().current) {
            Some(player) if player.is_alive() => {}
            Some(player) => violations.push(violation(format!(
                "eliminated {} holds the turn",
                player.name
            ))),
            None => violations.push(violation(format!(
                "current seat {} does not exist",
                game.turn().current
            ))),
        }
    }

    if phase == GamePhase::PvP && game.monsters().iter().any(|m| m.is_alive()) {
        violations.push(violation("PvP with living monsters".to_string()));
    }

    if let Some(winner) = game.winner() {
        if phase != GamePhase::GameOver {
            violations.push(violation(format!("winner {winner} before game over")));
        }
        let living: Vec<_> = game.players().iter().filter(|p| p.is_alive()).collect();
        if living.len() != 1 || living[0].id != winner {
            violations.push(violation(format!(
                "winner {winner} is not the last player standing"
            )));
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants<D: Dice>(game: &Game<D>) {
    let violations = check_invariants(game);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants<D: Dice>(_game: &Game<D>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::dice::ScriptedDice;
    use crate::game::{default_characters, Board, CharacterId, Coord, Monster, Player};

    fn game(players: Vec<Player>, monsters: Vec<Monster>) -> Game<ScriptedDice> {
        Game::from_parts(
            GameConfig::default(),
            ScriptedDice::new([1, 1, 1, 1, 1]),
            Board::with_obstacles(15, [Coord::new(7, 7)]),
            players,
            monsters,
        )
    }

    fn seat(id: u8, at: Coord) -> Player {
        let defs = default_characters();
        let def = defs.iter().find(|d| d.id == CharacterId::ALL[usize::from(id)]).unwrap();
        Player::new(id, def, at, 100)
    }

    #[test]
    fn test_valid_game_passes() {
        let g = game(
            vec![seat(0, Coord::new(1, 1)), seat(1, Coord::new(13, 13))],
            vec![Monster::new(0, Coord::new(5, 5), "Bat", 50)],
        );
        assert!(check_invariants(&g).is_empty());
    }

    #[test]
    fn test_fresh_setup_passes() {
        let g = Game::seeded(GameConfig::default(), 3).unwrap();
        assert!(check_invariants(&g).is_empty());
    }

    #[test]
    fn test_overhealed_player_detected() {
        let mut p = seat(0, Coord::new(1, 1));
        p.health = 120;
        let g = game(vec![p, seat(1, Coord::new(2, 2))], Vec::new());
        let violations = check_invariants(&g);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("120 health"));
    }

    #[test]
    fn test_zero_health_without_elimination_detected() {
        let mut p = seat(1, Coord::new(2, 2));
        p.health = 0;
        let g = game(vec![seat(0, Coord::new(1, 1)), p], Vec::new());
        assert_eq!(check_invariants(&g).len(), 1);
    }

    #[test]
    fn test_monster_on_obstacle_detected() {
        let g = game(
            vec![seat(0, Coord::new(1, 1)), seat(1, Coord::new(2, 2))],
            vec![Monster::new(0, Coord::new(7, 7), "Bat", 50)],
        );
        let violations = check_invariants(&g);
        assert!(violations.iter().any(|v| v.message.contains("obstacle")));
    }

    #[test]
    fn test_stacked_monsters_detected() {
        let g = game(
            vec![seat(0, Coord::new(1, 1)), seat(1, Coord::new(2, 2))],
            vec![
                Monster::new(0, Coord::new(5, 5), "Bat", 50),
                Monster::new(1, Coord::new(5, 5), "Wolf", 50),
            ],
        );
        assert_eq!(check_invariants(&g).len(), 1);
    }

    #[test]
    fn test_player_on_border_detected() {
        let g = game(vec![seat(0, Coord::new(0, 3)), seat(1, Coord::new(2, 2))], Vec::new());
        assert_eq!(check_invariants(&g).len(), 1);
    }

    #[test]
    fn test_multiple_violations_all_reported() {
        let mut p = seat(0, Coord::new(1, 1));
        p.health = 300;
        let mut m = Monster::new(0, Coord::new(5, 5), "Bat", 50);
        m.health = 0;
        let g = game(vec![p, seat(1, Coord::new(0, 2))], vec![m]);
        assert_eq!(check_invariants(&g).len(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Game invariant violations")]
    fn test_assert_invariants_panics_on_violation() {
        let g = game(vec![seat(0, Coord::new(0, 3)), seat(1, Coord::new(2, 2))], Vec::new());
        assert_invariants(&g);
    }

    #[test]
    fn test_assert_invariants_quiet_on_valid_game() {
        let g = game(
            vec![seat(0, Coord::new(1, 1)), seat(1, Coord::new(13, 13))],
            vec![Monster::new(0, Coord::new(5, 5), "Bat", 50)],
        );
        assert_invariants(&g);
    }
}
