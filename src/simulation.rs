//! Simulation driver for Monster Hunt games.
//!
//! Provides a pure function interface: `(seed, config) -> GameResult`
//!
//! The driver handles:
//! - Seat and character assignment from the seed
//! - A greedy policy choosing one command at a time
//! - Invariant checks after every command
//! - A turn cap so every game terminates

use std::collections::VecDeque;

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::config::GameConfig;
use crate::dice::Dice;
use crate::error::{ConfigError, GameError};
use crate::game::{
    check_invariants, BoardAbilityId, CharacterId, Command, CombatAbilityId, Coord, Encounter,
    Game, GameEvent, GamePhase, Item, Player, PlayerId, RollStage,
};

/// Rerolls are taken below this total.
const REROLL_BELOW: u32 = 7;

/// Health at or below which a potion is drunk.
const POTION_THRESHOLD: u32 = 40;

/// Configuration for simulated games.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seats per game.
    pub players: usize,
    /// Characters by seat. Rotated through the roster by seed if absent.
    pub characters: Option<Vec<CharacterId>>,
    /// Turns before the game is called a draw.
    pub max_turns: u32,
    /// Keep the narrated log in the result.
    pub record_log: bool,
    /// Rules.
    pub game: GameConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 4,
            characters: None,
            max_turns: 500,
            record_log: false,
            game: GameConfig::default(),
        }
    }
}

/// Final result of a simulated game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// The seed used for this game.
    pub seed: u64,
    /// Last player standing (None on a wipe or timeout).
    pub winner: Option<PlayerId>,
    /// Character of the winner.
    pub winning_character: Option<CharacterId>,
    /// Character by seat.
    pub characters: Vec<CharacterId>,
    /// Turns ended.
    pub turns: u32,
    /// Commands accepted.
    pub commands: u32,
    /// Monsters defeated.
    pub monsters_defeated: usize,
    /// Stopped at the turn cap.
    pub timed_out: bool,
    /// Elimination order (first eliminated is index 0).
    pub elimination_order: Vec<PlayerId>,
    /// Narrated log, if recorded.
    pub log: Vec<String>,
}

/// Error type for simulation runs.
#[derive(Debug, Error)]
pub enum SimError {
    /// The rules do not validate.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    /// Seat count does not fit the rules.
    #[error("cannot seat {players} players with {characters} characters")]
    Seating {
        /// Requested seats.
        players: usize,
        /// Characters available.
        characters: usize,
    },
    /// A setup command was rejected.
    #[error("setup failed: {0}")]
    Setup(GameError),
    /// Neither the chosen command nor the fallback was accepted.
    #[error("policy stuck in {phase}: {error}")]
    Stuck {
        /// Phase at the time.
        phase: GamePhase,
        /// Rejection of the fallback.
        error: GameError,
    },
    /// An invariant broke.
    #[error("after {command:?}: {message}")]
    Invariant {
        /// Last command applied.
        command: Command,
        /// Joined violation messages.
        message: String,
    },
}

/// Play one game to the end with the greedy policy.
///
/// # Errors
///
/// Returns an error if the game cannot be set up, the policy gets stuck, or
/// an invariant breaks.
pub fn run_game(seed: u64, config: &SimConfig) -> Result<GameResult, SimError> {
    let characters = seat_characters(seed, config)?;
    let mut game = Game::seeded(config.game.clone(), seed)?;
    let mut log = Vec::new();

    let mut setup = vec![Command::StartCharacterSelect {
        players: config.players,
    }];
    setup.extend(characters.iter().enumerate().map(|(seat, &character)| {
        Command::SelectCharacter {
            player: PlayerId::try_from(seat).unwrap_or(PlayerId::MAX),
            character,
        }
    }));
    for command in &setup {
        let outcome = game.apply(command).map_err(SimError::Setup)?;
        if config.record_log {
            log.extend(outcome.log);
        }
    }

    let mut commands = 0u32;
    let mut elimination_order = Vec::new();
    let command_cap = config.max_turns.saturating_mul(64);
    let mut timed_out = false;

    while game.phase() != GamePhase::GameOver {
        if game.turn().turn_number >= config.max_turns || commands >= command_cap {
            timed_out = true;
            break;
        }
        let mut command = choose_command(&game);
        let outcome = match game.apply(&command) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("policy chose {command:?}, rejected: {err}");
                command = fallback(&game);
                game.apply(&command).map_err(|error| SimError::Stuck {
                    phase: game.phase(),
                    error,
                })?
            }
        };
        commands += 1;

        let violations = check_invariants(&game);
        if !violations.is_empty() {
            let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
            return Err(SimError::Invariant {
                command,
                message: messages.join("; "),
            });
        }
        elimination_order.extend(outcome.events.iter().filter_map(|event| match event {
            GameEvent::PlayerEliminated(id) => Some(*id),
            _ => None,
        }));
        if config.record_log {
            log.extend(outcome.log);
        }
    }

    let winner = game.winner();
    Ok(GameResult {
        seed,
        winner,
        winning_character: winner
            .and_then(|id| game.players().get(usize::from(id)))
            .map(|p| p.character),
        characters,
        turns: game.turn().turn_number,
        commands,
        monsters_defeated: game.monsters().iter().filter(|m| !m.is_alive()).count(),
        timed_out,
        elimination_order,
        log,
    })
}

fn seat_characters(seed: u64, config: &SimConfig) -> Result<Vec<CharacterId>, SimError> {
    let roster: Vec<CharacterId> = config.game.characters.iter().map(|def| def.id).collect();
    if let Some(chosen) = &config.characters {
        if chosen.len() != config.players {
            return Err(SimError::Seating {
                players: config.players,
                characters: chosen.len(),
            });
        }
        return Ok(chosen.clone());
    }
    if config.players > roster.len() || roster.is_empty() {
        return Err(SimError::Seating {
            players: config.players,
            characters: roster.len(),
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let offset = (seed % roster.len() as u64) as usize;
    Ok((0..config.players)
        .map(|seat| roster[(offset + seat) % roster.len()])
        .collect())
}

fn fallback<D: Dice>(game: &Game<D>) -> Command {
    match game.encounter() {
        Some(encounter) if encounter.is_rolling() => Command::ResolveRound,
        Some(_) => Command::FightRound,
        None => Command::EndTurn,
    }
}

/// Pick the next command for whoever has to act.
#[must_use]
pub fn choose_command<D: Dice>(game: &Game<D>) -> Command {
    match game.phase() {
        GamePhase::Combat => match game.encounter() {
            Some(encounter) => combat_command(game, encounter),
            None => Command::FightRound,
        },
        GamePhase::Playing | GamePhase::PvP => board_command(game),
        _ => Command::EndTurn,
    }
}

fn potion_slot(player: &Player) -> Option<usize> {
    player.inventory.iter().position(|item| *item == Item::HealthPotion)
}

fn combat_command<D: Dice>(game: &Game<D>, encounter: &Encounter) -> Command {
    let Some(actor) = game.players().get(usize::from(encounter.actor)) else {
        return Command::FightRound;
    };
    match encounter.stage {
        RollStage::AwaitingRoll => {
            if actor.health <= POTION_THRESHOLD {
                if let Some(index) = potion_slot(actor) {
                    return Command::UseItem {
                        player: actor.id,
                        index,
                    };
                }
            }
            if !encounter.modifiers.ability_armed && wants_combat_ability(actor, encounter) {
                return Command::ActivateCombatAbility;
            }
            Command::RollForAttack
        }
        RollStage::PlayerRolled => {
            let low = encounter
                .player_roll
                .is_some_and(|roll| roll.total < REROLL_BELOW);
            if low && actor.combat_bonuses.can_reroll && !encounter.reroll_used {
                Command::RerollDice
            } else {
                Command::ResolveRound
            }
        }
        RollStage::OpponentRolled => Command::ResolveRound,
    }
}

fn wants_combat_ability(actor: &Player, encounter: &Encounter) -> bool {
    if !actor.combat_ability.is_ready() {
        return false;
    }
    match actor.combat_ability.kind {
        CombatAbilityId::HolyStrike => actor.missing_health() >= 15,
        CombatAbilityId::WildShape => actor.wild_shape_rounds == 0 && actor.health < 60,
        CombatAbilityId::MagicMissile => encounter.opponent.health <= 8 || encounter.is_pvp(),
        _ => true,
    }
}

fn board_command<D: Dice>(game: &Game<D>) -> Command {
    let Some(me) = game.current_player() else {
        return Command::EndTurn;
    };
    let turn = game.turn();
    let pvp = game.phase() == GamePhase::PvP;

    if me.health <= POTION_THRESHOLD {
        if let Some(index) = potion_slot(me) {
            return Command::UseItem {
                player: me.id,
                index,
            };
        }
    }

    if turn.moves_left == 0 && !turn.teleport_armed {
        if let Some(command) = adjacent_attack(game, me, pvp) {
            return command;
        }
        if turn.last_roll.is_some() {
            return Command::EndTurn;
        }
        if wants_board_ability(game, me, false) {
            return Command::ActivateBoardAbility { player: me.id };
        }
        return Command::RollMovementDie;
    }

    if !turn.teleport_armed && wants_board_ability(game, me, true) {
        return Command::ActivateBoardAbility { player: me.id };
    }

    let goals = goals(game, me, pvp);
    let field = distance_field(game, &goals, me.board_ability.kind == BoardAbilityId::NaturesPath);
    game.reachable_tiles()
        .into_iter()
        .min_by_key(|cell| (field.get(cell), *cell))
        .map_or(Command::EndTurn, |cell| Command::MoveTo {
            x: cell.x,
            y: cell.y,
        })
}

fn adjacent_attack<D: Dice>(game: &Game<D>, me: &Player, pvp: bool) -> Option<Command> {
    if pvp {
        game.players()
            .iter()
            .find(|p| p.id != me.id && p.is_alive() && p.position.chebyshev(me.position) <= 1)
            .map(|p| Command::StartPvpCombat { opponent: p.id })
    } else {
        game.monsters()
            .iter()
            .find(|m| m.is_alive() && m.position.chebyshev(me.position) <= 1)
            .map(|m| Command::StartCombatAgainstMonster { monster: m.id })
    }
}

fn wants_board_ability<D: Dice>(game: &Game<D>, me: &Player, rolled: bool) -> bool {
    if !me.board_ability.is_ready() {
        return false;
    }
    let nearest = goals(game, me, game.phase() == GamePhase::PvP)
        .iter()
        .map(|goal| u32::from(goal.chebyshev(me.position)))
        .min()
        .unwrap_or(0);
    match (me.board_ability.kind, rolled) {
        (BoardAbilityId::Charge, true) => nearest > game.turn().moves_left,
        (BoardAbilityId::Teleport, false) => nearest > 6,
        (BoardAbilityId::DivineProtection, false) => {
            me.missing_health() >= game.config().divine_heal
        }
        _ => false,
    }
}

fn goals<D: Dice>(game: &Game<D>, me: &Player, pvp: bool) -> Vec<Coord> {
    if pvp {
        game.players()
            .iter()
            .filter(|p| p.id != me.id && p.is_alive())
            .map(|p| p.position)
            .collect()
    } else {
        game.monsters()
            .iter()
            .filter(|m| m.is_alive())
            .map(|m| m.position)
            .collect()
    }
}

/// Step distance from every walkable cell to the nearest goal.
struct DistanceField {
    size: u16,
    steps: Vec<Option<u32>>,
}

impl DistanceField {
    fn index(&self, cell: Coord) -> Option<usize> {
        (cell.x < self.size && cell.y < self.size)
            .then(|| usize::from(cell.y) * usize::from(self.size) + usize::from(cell.x))
    }

    /// Unreachable cells sort last.
    fn get(&self, cell: &Coord) -> u32 {
        self.index(*cell)
            .and_then(|i| self.steps[i])
            .unwrap_or(u32::MAX)
    }
}

fn distance_field<D: Dice>(
    game: &Game<D>,
    goals: &[Coord],
    through_obstacles: bool,
) -> DistanceField {
    let board = game.board();
    let size = board.size();
    let mut field = DistanceField {
        size,
        steps: vec![None; usize::from(size) * usize::from(size)],
    };
    let mut queue = VecDeque::new();
    for &goal in goals {
        if let Some(i) = field.index(goal) {
            field.steps[i] = Some(0);
            queue.push_back(goal);
        }
    }
    while let Some(cell) = queue.pop_front() {
        let next = field.get(&cell) + 1;
        for neighbor in cell.neighbors(size) {
            let walkable = !board.is_obstacle(neighbor)
                || (through_obstacles && !board.is_border(neighbor));
            if let Some(i) = field.index(neighbor) {
                if walkable && field.steps[i].is_none() {
                    field.steps[i] = Some(next);
                    queue.push_back(neighbor);
                }
            }
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_game_finishes_cleanly() {
        let result = run_game(7, &SimConfig::default()).unwrap();
        assert_eq!(result.characters.len(), 4);
        assert!(result.timed_out || result.winner.is_some() || result.elimination_order.len() == 4);
        assert!(result.turns <= 500);
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = SimConfig {
            players: 3,
            ..SimConfig::default()
        };
        assert_eq!(run_game(11, &config).unwrap(), run_game(11, &config).unwrap());
    }

    #[test]
    fn test_characters_rotate_with_seed() {
        let config = SimConfig::default();
        let a = seat_characters(0, &config).unwrap();
        let b = seat_characters(1, &config).unwrap();
        assert_eq!(a[0], CharacterId::Warrior);
        assert_eq!(b[0], CharacterId::Mage);
        assert_eq!(a[1], b[0]);
    }

    #[test]
    fn test_explicit_characters_must_match_seats() {
        let config = SimConfig {
            players: 2,
            characters: Some(vec![CharacterId::Druid]),
            ..SimConfig::default()
        };
        assert!(matches!(
            run_game(1, &config),
            Err(SimError::Seating { players: 2, characters: 1 })
        ));
    }

    #[test]
    fn test_record_log_keeps_narration() {
        let config = SimConfig {
            players: 2,
            record_log: true,
            ..SimConfig::default()
        };
        let result = run_game(3, &config).unwrap();
        assert!(result.log.iter().any(|line| line.contains("The hunt begins")));
    }

    #[test]
    fn test_turn_cap_times_out() {
        let config = SimConfig {
            players: 2,
            max_turns: 1,
            ..SimConfig::default()
        };
        let result = run_game(5, &config).unwrap();
        assert!(result.timed_out);
        assert_eq!(result.winner, None);
    }
}
