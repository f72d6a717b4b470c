//! Game phase controller.
//!
//! [`Game`] owns every piece of mutable state and is the only way to change
//! it. Each command either succeeds and returns an [`Outcome`] or is rejected
//! with a [`GameError`], in which case nothing observable has changed.

use std::fmt;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::dice::{Dice, RngDice};
use crate::error::{CommandResult, ConfigError, GameError};
use crate::game::{
    assert_invariants, board_effect, check_move, combat, combat_effect, legal_targets,
    next_living_seat, BoardAbilityContext, Board, CharacterId, CombatAbilityContext, Coord,
    Encounter, EncounterTarget, Item, Monster, MonsterId, MoveKind, MoveView, OpponentView,
    Player, PlayerId, RollStage, RoundOutcome, TileContent, TurnState,
};

/// Narrated lines kept in a snapshot.
const SNAPSHOT_MESSAGES: usize = 10;

/// Phase of the game. Decides which commands are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a player count.
    Setup,
    /// Seats choose characters in order.
    CharacterSelect,
    /// Moving and hunting monsters.
    Playing,
    /// An encounter is running.
    Combat,
    /// All monsters are gone; players hunt each other.
    PvP,
    /// Terminal until reset.
    GameOver,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Setup => "setup",
            GamePhase::CharacterSelect => "character select",
            GamePhase::Playing => "playing",
            GamePhase::Combat => "combat",
            GamePhase::PvP => "pvp",
            GamePhase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// Logical events produced by a command, for front ends that react to
/// transitions rather than parse the narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The phase changed.
    PhaseChanged {
        /// Phase before.
        from: GamePhase,
        /// Phase after.
        to: GamePhase,
    },
    /// The turn passed to another seat (or back to the same one).
    TurnEnded {
        /// Seat that finished.
        from: PlayerId,
        /// Seat that acts next.
        to: PlayerId,
    },
    /// An encounter opened.
    CombatStarted {
        /// Attacking player.
        actor: PlayerId,
        /// Opponent.
        target: EncounterTarget,
    },
    /// An encounter was resolved and discarded.
    CombatEnded {
        /// Attacking player.
        actor: PlayerId,
        /// Opponent.
        target: EncounterTarget,
    },
    /// A player was eliminated.
    PlayerEliminated(PlayerId),
    /// A monster was defeated.
    MonsterDefeated(MonsterId),
    /// A player received an item from a defeated monster.
    ItemLooted {
        /// Receiver.
        player: PlayerId,
        /// The item.
        item: Item,
    },
    /// The game ended. `None` means every player fell.
    GameOver {
        /// Last player standing.
        winner: Option<PlayerId>,
    },
}

/// Everything a front end needs to draw the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Board side length.
    pub board_size: u16,
    /// Every obstacle, border included.
    pub obstacles: Vec<Coord>,
    /// All players in seat order, eliminated ones included.
    pub players: Vec<Player>,
    /// All monsters, defeated ones included.
    pub monsters: Vec<Monster>,
    /// Seat whose turn it is, once play has begun.
    pub current_player: Option<PlayerId>,
    /// Moves left this turn.
    pub moves_left: u32,
    /// Last movement die.
    pub last_roll: Option<u8>,
    /// Whether the next move teleports.
    pub teleport_armed: bool,
    /// Turns ended since play began.
    pub turn_number: u32,
    /// The running encounter.
    pub encounter: Option<Encounter>,
    /// Last player standing.
    pub winner: Option<PlayerId>,
    /// Most recent narrated lines.
    pub messages: Vec<String>,
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Narrated lines this command produced.
    pub log: Vec<String>,
    /// Logical events this command produced.
    pub events: Vec<GameEvent>,
    /// State after the command.
    pub snapshot: Snapshot,
}

/// Every command, as data. See the matching methods on [`Game`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// [`Game::start_character_select`].
    StartCharacterSelect {
        /// Seats in this game.
        players: usize,
    },
    /// [`Game::select_character`].
    SelectCharacter {
        /// Choosing seat.
        player: PlayerId,
        /// Chosen archetype.
        character: CharacterId,
    },
    /// [`Game::roll_movement_die`].
    RollMovementDie,
    /// [`Game::move_to`].
    MoveTo {
        /// Column.
        x: u16,
        /// Row.
        y: u16,
    },
    /// [`Game::end_turn`].
    EndTurn,
    /// [`Game::start_combat_against_monster`].
    StartCombatAgainstMonster {
        /// Target monster.
        monster: MonsterId,
    },
    /// [`Game::start_pvp_combat`].
    StartPvpCombat {
        /// Target player.
        opponent: PlayerId,
    },
    /// [`Game::roll_for_attack`].
    RollForAttack,
    /// [`Game::roll_opponent`].
    RollOpponent,
    /// [`Game::reroll_dice`].
    RerollDice,
    /// [`Game::resolve_round`].
    ResolveRound,
    /// [`Game::fight_round`].
    FightRound,
    /// [`Game::activate_combat_ability`].
    ActivateCombatAbility,
    /// [`Game::use_item`].
    UseItem {
        /// Owner of the item.
        player: PlayerId,
        /// Inventory slot.
        index: usize,
    },
    /// [`Game::activate_board_ability`].
    ActivateBoardAbility {
        /// Current player.
        player: PlayerId,
    },
    /// [`Game::reset_game`].
    ResetGame,
}

/// Lines and events gathered while a command runs.
#[derive(Debug, Default)]
struct Effects {
    log: Vec<String>,
    events: Vec<GameEvent>,
}

impl Effects {
    fn say(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

fn seat_id(seat: usize) -> PlayerId {
    PlayerId::try_from(seat).unwrap_or(PlayerId::MAX)
}

/// A single game.
#[derive(Debug, Clone)]
pub struct Game<D: Dice = RngDice> {
    config: GameConfig,
    dice: D,
    phase: GamePhase,
    board: Board,
    players: Vec<Player>,
    monsters: Vec<Monster>,
    turn: TurnState,
    encounter: Option<Encounter>,
    seats: usize,
    winner: Option<PlayerId>,
    messages: Vec<String>,
}

impl Game<RngDice> {
    /// New game in the setup phase with seeded dice.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, RngDice::seeded(seed))
    }
}

impl<D: Dice> Game<D> {
    /// New game in the setup phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn new(config: GameConfig, dice: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::bordered(config.board_size);
        Ok(Self {
            config,
            dice,
            phase: GamePhase::Setup,
            board,
            players: Vec::new(),
            monsters: Vec::new(),
            turn: TurnState::new(0),
            encounter: None,
            seats: 0,
            winner: None,
            messages: Vec::new(),
        })
    }

    /// Game already in play with a hand-built board.
    ///
    /// Player ids must equal their seat index. The phase is Playing while any
    /// monster lives, PvP otherwise, and the first living seat acts first.
    #[must_use]
    pub fn from_parts(
        config: GameConfig,
        dice: D,
        board: Board,
        players: Vec<Player>,
        monsters: Vec<Monster>,
    ) -> Self {
        debug_assert!(
            players.iter().enumerate().all(|(seat, p)| usize::from(p.id) == seat),
            "player ids must match their seat index"
        );
        let phase = if monsters.iter().any(Monster::is_alive) {
            GamePhase::Playing
        } else {
            GamePhase::PvP
        };
        let first = players.iter().position(Player::is_alive).unwrap_or(0);
        Self {
            config,
            dice,
            phase,
            board,
            seats: players.len(),
            players,
            monsters,
            turn: TurnState::new(first),
            encounter: None,
            winner: None,
            messages: Vec::new(),
        }
    }

    // ---- queries -------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// All players in seat order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// All monsters.
    #[must_use]
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    /// Turn bookkeeping.
    #[must_use]
    pub const fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// The running encounter.
    #[must_use]
    pub const fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    /// Last player standing, once the game is over.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Every narrated line since the last reset.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The dice, for scripting rolls.
    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// The player whose turn it is, once play has begun.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        match self.phase {
            GamePhase::Playing | GamePhase::Combat | GamePhase::PvP => {
                self.players.get(self.turn.current)
            }
            _ => None,
        }
    }

    /// What a cell shows. Cells off the board read as obstacles.
    #[must_use]
    pub fn tile_content(&self, x: u16, y: u16) -> TileContent {
        let cell = Coord::new(x, y);
        if !self.board.in_bounds(cell) {
            return TileContent::Obstacle;
        }
        self.board.tile_content(cell, &self.players, &self.monsters)
    }

    /// Whether the current player may move to the cell right now.
    #[must_use]
    pub fn is_tile_clickable(&self, x: u16, y: u16) -> bool {
        check_move(&self.move_view(), Coord::new(x, y)).is_ok()
    }

    /// Every cell the current player may move to right now.
    #[must_use]
    pub fn reachable_tiles(&self) -> Vec<Coord> {
        legal_targets(&self.move_view())
    }

    /// Full view of the game.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tail = self.messages.len().saturating_sub(SNAPSHOT_MESSAGES);
        Snapshot {
            phase: self.phase,
            board_size: self.board.size(),
            obstacles: self.board.obstacles().collect(),
            players: self.players.clone(),
            monsters: self.monsters.clone(),
            current_player: self.current_player().map(|p| p.id),
            moves_left: self.turn.moves_left,
            last_roll: self.turn.last_roll,
            teleport_armed: self.turn.teleport_armed,
            turn_number: self.turn.turn_number,
            encounter: self.encounter.clone(),
            winner: self.winner,
            messages: self.messages[tail..].to_vec(),
        }
    }

    fn move_view(&self) -> MoveView<'_> {
        MoveView {
            board: &self.board,
            players: &self.players,
            monsters: &self.monsters,
            phase: self.phase,
            turn: &self.turn,
        }
    }

    // ---- commands ------------------------------------------------------

    /// Run a command given as data.
    ///
    /// # Errors
    ///
    /// Returns the command's rejection reason.
    pub fn apply(&mut self, command: &Command) -> CommandResult<Outcome> {
        match *command {
            Command::StartCharacterSelect { players } => self.start_character_select(players),
            Command::SelectCharacter { player, character } => {
                self.select_character(player, character)
            }
            Command::RollMovementDie => self.roll_movement_die(),
            Command::MoveTo { x, y } => self.move_to(x, y),
            Command::EndTurn => self.end_turn(),
            Command::StartCombatAgainstMonster { monster } => {
                self.start_combat_against_monster(monster)
            }
            Command::StartPvpCombat { opponent } => self.start_pvp_combat(opponent),
            Command::RollForAttack => self.roll_for_attack(),
            Command::RollOpponent => self.roll_opponent(),
            Command::RerollDice => self.reroll_dice(),
            Command::ResolveRound => self.resolve_round(),
            Command::FightRound => self.fight_round(),
            Command::ActivateCombatAbility => self.activate_combat_ability(),
            Command::UseItem { player, index } => self.use_item(player, index),
            Command::ActivateBoardAbility { player } => self.activate_board_ability(player),
            Command::ResetGame => self.reset_game(),
        }
    }

    /// Open character select for `count` seats.
    ///
    /// # Errors
    ///
    /// Rejected outside setup or for a count outside the configured range.
    pub fn start_character_select(&mut self, count: usize) -> CommandResult<Outcome> {
        self.command("start character select", |game, fx| {
            game.try_start_character_select(count, fx)
        })
    }

    /// Seat `player` picks `character`. The last pick starts the game.
    ///
    /// # Errors
    ///
    /// Rejected out of seat order, for an unknown character or one already
    /// taken.
    pub fn select_character(
        &mut self,
        player: PlayerId,
        character: CharacterId,
    ) -> CommandResult<Outcome> {
        self.command("select character", |game, fx| {
            game.try_select_character(player, character, fx)
        })
    }

    /// Roll one die for movement.
    ///
    /// # Errors
    ///
    /// Rejected outside Playing/PvP or while moves remain.
    pub fn roll_movement_die(&mut self) -> CommandResult<Outcome> {
        self.command("roll movement die", Self::try_roll_movement_die)
    }

    /// Move the current player to `(x, y)`.
    ///
    /// # Errors
    ///
    /// Rejected with the first movement rule the move breaks.
    pub fn move_to(&mut self, x: u16, y: u16) -> CommandResult<Outcome> {
        self.command("move", |game, fx| game.try_move_to(Coord::new(x, y), fx))
    }

    /// Pass the turn to the next living seat.
    ///
    /// # Errors
    ///
    /// Rejected outside Playing/PvP.
    pub fn end_turn(&mut self) -> CommandResult<Outcome> {
        self.command("end turn", Self::try_end_turn)
    }

    /// Attack an adjacent living monster without stepping onto it.
    ///
    /// # Errors
    ///
    /// Rejected outside Playing, for an unknown, defeated or distant monster.
    pub fn start_combat_against_monster(&mut self, monster: MonsterId) -> CommandResult<Outcome> {
        self.command("start monster combat", |game, fx| {
            game.try_start_combat_against_monster(monster, fx)
        })
    }

    /// Attack an adjacent living player.
    ///
    /// # Errors
    ///
    /// Rejected outside PvP, for yourself, an unknown, eliminated or distant
    /// player.
    pub fn start_pvp_combat(&mut self, opponent: PlayerId) -> CommandResult<Outcome> {
        self.command("start pvp combat", |game, fx| {
            game.try_start_pvp_combat(opponent, fx)
        })
    }

    /// Finalize the actor's attack roll.
    ///
    /// # Errors
    ///
    /// Rejected outside combat or while a roll is in progress.
    pub fn roll_for_attack(&mut self) -> CommandResult<Outcome> {
        self.command("roll for attack", Self::try_roll_for_attack)
    }

    /// Finalize the opponent's roll.
    ///
    /// # Errors
    ///
    /// Rejected unless the actor has just rolled.
    pub fn roll_opponent(&mut self) -> CommandResult<Outcome> {
        self.command("roll opponent", Self::try_roll_opponent)
    }

    /// Replace the actor's roll, once per encounter.
    ///
    /// # Errors
    ///
    /// Rejected without a roll to replace, without a Lucky Charm, or when
    /// the reroll is spent.
    pub fn reroll_dice(&mut self) -> CommandResult<Outcome> {
        self.command("reroll", Self::try_reroll_dice)
    }

    /// Resolve the round, rolling for the opponent first if needed.
    ///
    /// # Errors
    ///
    /// Rejected outside combat or before the actor's roll.
    pub fn resolve_round(&mut self) -> CommandResult<Outcome> {
        self.command("resolve round", Self::try_resolve_round)
    }

    /// Attack roll, opponent roll and resolution in one go.
    ///
    /// # Errors
    ///
    /// Rejected whenever [`Game::roll_for_attack`] would be.
    pub fn fight_round(&mut self) -> CommandResult<Outcome> {
        self.command("fight round", |game, fx| {
            game.try_roll_for_attack(fx)?;
            game.try_resolve_round(fx)
        })
    }

    /// Arm the actor's combat ability for this round.
    ///
    /// # Errors
    ///
    /// Rejected outside combat, mid-roll, twice per round or with no uses.
    pub fn activate_combat_ability(&mut self) -> CommandResult<Outcome> {
        self.command("combat ability", Self::try_activate_combat_ability)
    }

    /// Use the item in slot `index` of `player`'s inventory.
    ///
    /// # Errors
    ///
    /// Rejected for passive items, empty slots, players who may not act now,
    /// or a Strength Elixir during combat.
    pub fn use_item(&mut self, player: PlayerId, index: usize) -> CommandResult<Outcome> {
        self.command("use item", |game, fx| game.try_use_item(player, index, fx))
    }

    /// Activate the current player's board ability.
    ///
    /// # Errors
    ///
    /// Rejected outside Playing/PvP, out of turn, or with no uses left.
    pub fn activate_board_ability(&mut self, player: PlayerId) -> CommandResult<Outcome> {
        self.command("board ability", |game, fx| {
            game.try_activate_board_ability(player, fx)
        })
    }

    /// Throw the game away and return to setup. Always succeeds.
    ///
    /// # Errors
    ///
    /// Never; the signature matches the other commands.
    pub fn reset_game(&mut self) -> CommandResult<Outcome> {
        self.command("reset", |game, fx| {
            game.reset(fx);
            Ok(())
        })
    }

    // ---- command bodies ------------------------------------------------
    //
    // Each body checks every precondition before its first write.

    fn command(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self, &mut Effects) -> CommandResult<()>,
    ) -> CommandResult<Outcome> {
        let mut fx = Effects::default();
        match body(self, &mut fx) {
            Ok(()) => {
                assert_invariants(self);
                self.messages.extend(fx.log.iter().cloned());
                Ok(Outcome {
                    log: fx.log,
                    events: fx.events,
                    snapshot: self.snapshot(),
                })
            }
            Err(err) => {
                debug!("{name} rejected: {err}");
                Err(err)
            }
        }
    }

    fn require_phase(&self, allowed: &[GamePhase]) -> CommandResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase))
        }
    }

    fn current_alive(&self) -> CommandResult<&Player> {
        let player = self
            .players
            .get(self.turn.current)
            .ok_or_else(|| GameError::UnknownPlayer(seat_id(self.turn.current)))?;
        if player.is_alive() {
            Ok(player)
        } else {
            Err(GameError::PlayerEliminated(player.id))
        }
    }

    fn set_phase(&mut self, to: GamePhase, fx: &mut Effects) {
        if self.phase != to {
            info!("phase {} -> {}", self.phase, to);
            fx.emit(GameEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }

    fn advance_turn(&mut self, fx: &mut Effects) {
        let from = self.turn.current;
        let next = next_living_seat(&self.players, from);
        self.turn.advance_to(next);
        fx.emit(GameEvent::TurnEnded {
            from: seat_id(from),
            to: seat_id(next),
        });
        if let Some(player) = self.players.get(next) {
            fx.say(format!("{}'s turn!", player.name));
        }
    }

    fn game_over(&mut self, winner: Option<PlayerId>, fx: &mut Effects) {
        self.winner = winner;
        self.turn.moves_left = 0;
        self.set_phase(GamePhase::GameOver, fx);
        fx.emit(GameEvent::GameOver { winner });
        match winner.and_then(|id| self.players.get(usize::from(id))) {
            Some(player) => {
                info!("game over, {} wins", player.name);
                fx.say(format!("{} wins the game!", player.name));
            }
            None => {
                info!("game over, no survivors");
                fx.say("Every player has fallen. The monsters win!");
            }
        }
    }

    fn try_start_character_select(&mut self, count: usize, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Setup])?;
        let (min, max) = (self.config.min_players, self.config.max_players);
        if !(min..=max).contains(&count) {
            return Err(GameError::InvalidPlayerCount { count, min, max });
        }
        self.seats = count;
        self.players.clear();
        self.set_phase(GamePhase::CharacterSelect, fx);
        fx.say(format!(
            "Choose characters for {count} players. Player 1 picks first."
        ));
        Ok(())
    }

    fn try_select_character(
        &mut self,
        player: PlayerId,
        character: CharacterId,
        fx: &mut Effects,
    ) -> CommandResult<()> {
        self.require_phase(&[GamePhase::CharacterSelect])?;
        let seat = self.players.len();
        if usize::from(player) != seat {
            return Err(GameError::WrongSeat {
                expected: seat_id(seat),
                got: player,
            });
        }
        let def = self
            .config
            .character(character)
            .ok_or(GameError::UnknownCharacter(character))?;
        if self.players.iter().any(|p| p.character == character) {
            return Err(GameError::CharacterTaken(character));
        }
        let position = self
            .config
            .starting_positions()
            .get(seat)
            .copied()
            .unwrap_or(Coord::new(1, 1));
        let new_player = Player::new(player, def, position, self.config.starting_health);
        let line = format!("{} chose the {character}.", new_player.name);

        if seat + 1 < self.seats {
            self.players.push(new_player);
            fx.say(line);
            fx.say(format!("Player {} picks next.", seat + 2));
            return Ok(());
        }

        let mut players = self.players.clone();
        players.push(new_player);
        let board = Board::generate(
            self.config.board_size,
            self.config.obstacle_count,
            &mut self.dice,
        )
        .map_err(|err| GameError::InvalidConfig(err.to_string()))?;
        let monsters = place_monsters(&board, &players, &self.config, &mut self.dice)?;

        self.board = board;
        self.players = players;
        self.monsters = monsters;
        self.turn = TurnState::new(0);
        self.encounter = None;
        self.winner = None;
        fx.say(line);
        self.set_phase(GamePhase::Playing, fx);
        fx.say(format!(
            "The hunt begins! {} monsters roam the board. {} rolls first.",
            self.monsters.len(),
            self.players[0].name
        ));
        Ok(())
    }

    fn try_roll_movement_die(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Playing, GamePhase::PvP])?;
        let name = self.current_alive()?.name.clone();
        if self.turn.moves_left > 0 {
            return Err(GameError::MovesRemaining(self.turn.moves_left));
        }
        let face = self.dice.roll_die();
        debug!("{name} rolled {face} for movement");
        self.turn.moves_left = u32::from(face);
        self.turn.last_roll = Some(face);
        fx.say(format!(
            "{name} rolled {face}! Move to adjacent tiles."
        ));
        Ok(())
    }

    fn try_move_to(&mut self, target: Coord, fx: &mut Effects) -> CommandResult<()> {
        let kind = check_move(&self.move_view(), target)?;
        let seat = self.turn.current;
        match kind {
            MoveKind::Step => {
                let player = &mut self.players[seat];
                player.position = target;
                self.turn.moves_left -= 1;
                debug!("{} stepped to {target}", player.name);
                fx.say(format!("{} moved to {target}.", player.name));
                if self.turn.moves_left == 0 {
                    self.advance_turn(fx);
                }
            }
            MoveKind::Teleport => {
                let player = &mut self.players[seat];
                player.position = target;
                self.turn.teleport_armed = false;
                fx.say(format!("{} teleported to {target}!", player.name));
            }
            MoveKind::EnterMonster(id) => {
                self.begin_combat(seat, EncounterTarget::Monster(id), fx)?;
                self.players[seat].position = target;
            }
            MoveKind::AttackPlayer(id) => {
                self.begin_combat(seat, EncounterTarget::Player(id), fx)?;
            }
        }
        Ok(())
    }

    fn try_end_turn(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Playing, GamePhase::PvP])?;
        self.advance_turn(fx);
        Ok(())
    }

    fn try_start_combat_against_monster(
        &mut self,
        id: MonsterId,
        fx: &mut Effects,
    ) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Playing])?;
        let actor = self.current_alive()?;
        let monster = self
            .monsters
            .iter()
            .find(|m| m.id == id)
            .ok_or(GameError::UnknownMonster(id))?;
        if !monster.is_alive() {
            return Err(GameError::MonsterDefeated(id));
        }
        if actor.position.chebyshev(monster.position) > 1 {
            return Err(GameError::OutOfReach(monster.position));
        }
        self.begin_combat(self.turn.current, EncounterTarget::Monster(id), fx)
    }

    fn try_start_pvp_combat(&mut self, id: PlayerId, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::PvP])?;
        let actor = self.current_alive()?;
        if actor.id == id {
            return Err(GameError::SelfTarget(id));
        }
        let opponent = self
            .players
            .get(usize::from(id))
            .ok_or(GameError::UnknownPlayer(id))?;
        if !opponent.is_alive() {
            return Err(GameError::PlayerEliminated(id));
        }
        if actor.position.chebyshev(opponent.position) > 1 {
            return Err(GameError::OutOfReach(opponent.position));
        }
        self.begin_combat(self.turn.current, EncounterTarget::Player(id), fx)
    }

    /// Open an encounter. Fails only on a missing participant, before any write.
    fn begin_combat(
        &mut self,
        seat: usize,
        target: EncounterTarget,
        fx: &mut Effects,
    ) -> CommandResult<()> {
        if self.players.get(seat).is_none() {
            return Err(GameError::UnknownPlayer(seat_id(seat)));
        }
        let opponent = match target {
            EncounterTarget::Monster(id) => self
                .monsters
                .iter()
                .find(|m| m.id == id)
                .map(OpponentView::of_monster)
                .ok_or(GameError::UnknownMonster(id))?,
            EncounterTarget::Player(id) => {
                let defender = self
                    .players
                    .get_mut(usize::from(id))
                    .ok_or(GameError::UnknownPlayer(id))?;
                defender.refresh_bonuses();
                OpponentView::of_player(defender)
            }
        };
        let actor = &mut self.players[seat];
        actor.refresh_bonuses();
        let encounter = Encounter::new(actor, target, opponent);
        info!("combat: {} vs {}", actor.name, encounter.opponent.name);
        fx.log.extend(encounter.log.iter().cloned());
        fx.emit(GameEvent::CombatStarted {
            actor: actor.id,
            target,
        });
        self.turn.moves_left = 0;
        self.turn.teleport_armed = false;
        self.encounter = Some(encounter);
        self.set_phase(GamePhase::Combat, fx);
        Ok(())
    }

    fn try_roll_for_attack(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Combat])?;
        let encounter = self.encounter.as_mut().ok_or(GameError::NoEncounter)?;
        let actor = self
            .players
            .get(usize::from(encounter.actor))
            .ok_or(GameError::UnknownPlayer(encounter.actor))?;
        let line = encounter.roll_attack(&mut self.dice, actor)?;
        fx.say(line);
        Ok(())
    }

    fn try_roll_opponent(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Combat])?;
        let encounter = self.encounter.as_mut().ok_or(GameError::NoEncounter)?;
        let line = encounter.roll_opponent(&mut self.dice)?;
        fx.say(line);
        Ok(())
    }

    fn try_reroll_dice(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Combat])?;
        let encounter = self.encounter.as_mut().ok_or(GameError::NoEncounter)?;
        let actor = self
            .players
            .get(usize::from(encounter.actor))
            .ok_or(GameError::UnknownPlayer(encounter.actor))?;
        let line = encounter.reroll(&mut self.dice, actor)?;
        fx.say(line);
        Ok(())
    }

    fn try_resolve_round(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Combat])?;
        let encounter = self.encounter.as_mut().ok_or(GameError::NoEncounter)?;
        match encounter.stage {
            RollStage::AwaitingRoll => return Err(GameError::NoRollYet),
            RollStage::PlayerRolled => {
                let line = encounter.roll_opponent(&mut self.dice)?;
                fx.say(line);
            }
            RollStage::OpponentRolled => {}
        }
        let (lines, outcome) =
            combat::resolve_round(encounter, &mut self.players, &mut self.monsters)?;
        fx.log.extend(lines);
        self.conclude_round(outcome, fx);
        Ok(())
    }

    fn conclude_round(&mut self, outcome: RoundOutcome, fx: &mut Effects) {
        let Some(actor) = self.encounter.as_ref().map(|e| e.actor) else {
            return;
        };
        match outcome {
            RoundOutcome::Continue => {}
            RoundOutcome::MonsterDefeated(id) => {
                info!("monster {id} defeated by player {actor}");
                fx.emit(GameEvent::MonsterDefeated(id));
                self.award_loot(usize::from(actor), fx);
                self.end_combat(fx);
            }
            RoundOutcome::PlayerDefeated { loser, .. } => {
                info!("player {loser} eliminated");
                fx.emit(GameEvent::PlayerEliminated(loser));
                self.end_combat(fx);
            }
        }
    }

    /// The loot lands first, then every temporary item is stripped,
    /// a freshly looted elixir included.
    fn award_loot(&mut self, seat: usize, fx: &mut Effects) {
        let index = self.dice.below(self.config.loot_table.len());
        let Some(&item) = self.config.loot_table.get(index) else {
            return;
        };
        let Some(player) = self.players.get_mut(seat) else {
            return;
        };
        player.inventory.push(item);
        debug!("{} looted {}", player.name, item.name());
        fx.say(format!("{} found a {}!", player.name, item));
        fx.emit(GameEvent::ItemLooted {
            player: player.id,
            item,
        });
        if player.strip_temporary_items() > 0 {
            fx.say(format!("{}'s Strength Elixir wears off.", player.name));
        }
    }

    fn end_combat(&mut self, fx: &mut Effects) {
        let Some(encounter) = self.encounter.take() else {
            return;
        };
        fx.emit(GameEvent::CombatEnded {
            actor: encounter.actor,
            target: encounter.target,
        });

        let living: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect();
        if living.is_empty() {
            self.game_over(None, fx);
            return;
        }
        if self.monsters.iter().any(Monster::is_alive) {
            self.set_phase(GamePhase::Playing, fx);
        } else {
            if living.len() == 1 {
                self.game_over(living.first().copied(), fx);
                return;
            }
            if !encounter.is_pvp() {
                fx.say("All monsters have been defeated! Player versus player begins!");
            }
            self.set_phase(GamePhase::PvP, fx);
        }
        self.advance_turn(fx);
    }

    fn try_activate_combat_ability(&mut self, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Combat])?;
        let encounter = self.encounter.as_mut().ok_or(GameError::NoEncounter)?;
        let actor = self
            .players
            .get_mut(usize::from(encounter.actor))
            .ok_or(GameError::UnknownPlayer(encounter.actor))?;
        encounter.check_ability(actor)?;
        actor.combat_ability.consume();
        let line = match combat_effect(actor.combat_ability.kind) {
            Some(effect) => effect(&mut CombatAbilityContext {
                player: actor,
                modifiers: &mut encounter.modifiers,
                config: &self.config,
            }),
            None => format!("{} hesitates.", actor.name),
        };
        encounter.modifiers.ability_armed = true;
        encounter.log.push(line.clone());
        fx.say(line);
        Ok(())
    }

    fn try_use_item(&mut self, id: PlayerId, index: usize, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Playing, GamePhase::PvP, GamePhase::Combat])?;
        let seat = usize::from(id);
        let player = self.players.get(seat).ok_or(GameError::UnknownPlayer(id))?;
        if !player.is_alive() {
            return Err(GameError::PlayerEliminated(id));
        }
        let in_combat = self.phase == GamePhase::Combat;
        let may_act = match &self.encounter {
            Some(encounter) if in_combat => {
                encounter.actor == id || encounter.target == EncounterTarget::Player(id)
            }
            _ => seat == self.turn.current,
        };
        if !may_act {
            return Err(GameError::NotYourTurn(id));
        }
        let item = *player
            .inventory
            .get(index)
            .ok_or(GameError::NoSuchItem(index))?;
        if !item.is_usable() {
            return Err(GameError::ItemIsPassive(item));
        }

        match item {
            Item::HealthPotion => {
                let player = &mut self.players[seat];
                player.remove_item(index);
                let healed = player.heal(self.config.potion_heal);
                let line = format!("{} drank a Health Potion and healed {healed} HP!", player.name);
                if let Some(encounter) = self.encounter.as_mut() {
                    if encounter.target == EncounterTarget::Player(id) {
                        encounter.opponent.health = player.health;
                    }
                    encounter.log.push(line.clone());
                }
                fx.say(line);
            }
            _ if in_combat => return Err(GameError::NotUsableInCombat(item)),
            _ => fx.say(format!(
                "{} readies the {}. It takes effect in the next fight.",
                player.name,
                item.name()
            )),
        }
        Ok(())
    }

    fn try_activate_board_ability(&mut self, id: PlayerId, fx: &mut Effects) -> CommandResult<()> {
        self.require_phase(&[GamePhase::Playing, GamePhase::PvP])?;
        let current = self.current_alive()?;
        if current.id != id {
            return Err(GameError::NotYourTurn(id));
        }
        if !current.board_ability.is_ready() {
            return Err(GameError::AbilityExhausted(current.board_ability.name.clone()));
        }
        let player = &mut self.players[self.turn.current];
        player.board_ability.consume();
        let line = match board_effect(player.board_ability.kind) {
            Some(effect) => effect(&mut BoardAbilityContext {
                player,
                turn: &mut self.turn,
                monsters: &self.monsters,
                config: &self.config,
            }),
            None => format!("{} hesitates.", player.name),
        };
        fx.say(line);
        Ok(())
    }

    fn reset(&mut self, fx: &mut Effects) {
        self.board = Board::bordered(self.config.board_size);
        self.players.clear();
        self.monsters.clear();
        self.turn = TurnState::new(0);
        self.encounter = None;
        self.seats = 0;
        self.winner = None;
        self.messages.clear();
        self.set_phase(GamePhase::Setup, fx);
        fx.say("New game. Choose the number of players.");
    }
}

/// Scatter the configured monsters over free interior cells.
fn place_monsters(
    board: &Board,
    players: &[Player],
    config: &GameConfig,
    dice: &mut impl Dice,
) -> CommandResult<Vec<Monster>> {
    let mut free: Vec<Coord> = board
        .open_interior()
        .filter(|cell| players.iter().all(|p| p.position != *cell))
        .collect();
    if free.len() < config.monster_count {
        return Err(GameError::BoardFull(config.monster_count));
    }
    let mut monsters = Vec::with_capacity(config.monster_count);
    for i in 0..config.monster_count {
        let cell = free.swap_remove(dice.below(free.len()));
        let kind = config
            .monster_roster
            .get(dice.below(config.monster_roster.len()))
            .map_or("Monster", String::as_str);
        let id = MonsterId::try_from(i).unwrap_or(MonsterId::MAX);
        trace!("{kind} placed at {cell}");
        monsters.push(Monster::new(id, cell, kind, config.monster_health));
    }
    Ok(monsters)
}
