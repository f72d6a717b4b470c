//! Movement legality.
//!
//! Adjacency is the king-move (Chebyshev) metric everywhere: diagonal steps
//! cost one move, the same as orthogonal ones. The same check backs both the
//! move executor and the clickable-tile query, so the two can never disagree.

use crate::error::GameError;
use crate::game::{
    BoardAbilityId, Board, Coord, GamePhase, Monster, MonsterId, Player, PlayerId, TileContent,
    TurnState,
};

/// What a legal move does once executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Plain step onto a free (or passable) tile.
    Step,
    /// Step onto a living monster, starting a fight.
    EnterMonster(MonsterId),
    /// Attack the living player on the target tile. The attacker stays put.
    AttackPlayer(PlayerId),
    /// Armed teleport onto any empty tile. Costs no move.
    Teleport,
}

/// Read-only view of everything movement depends on.
#[derive(Debug, Clone, Copy)]
pub struct MoveView<'a> {
    /// The board.
    pub board: &'a Board,
    /// All players, indexed by seat.
    pub players: &'a [Player],
    /// All monsters.
    pub monsters: &'a [Monster],
    /// Current phase.
    pub phase: GamePhase,
    /// Current turn.
    pub turn: &'a TurnState,
}

impl MoveView<'_> {
    fn living_player_at(&self, cell: Coord, except: PlayerId) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.id != except && p.is_alive() && p.position == cell)
    }

    fn living_monster_at(&self, cell: Coord) -> Option<&Monster> {
        self.monsters
            .iter()
            .find(|m| m.is_alive() && m.position == cell)
    }
}

/// Classify a move of the current player to `target`, or say why it is illegal.
///
/// # Errors
///
/// Returns the first rule the move breaks, checked in this order: phase,
/// actor alive, bounds, teleport target, move budget, adjacency, obstacles,
/// other players.
pub fn check_move(view: &MoveView<'_>, target: Coord) -> Result<MoveKind, GameError> {
    if !matches!(view.phase, GamePhase::Playing | GamePhase::PvP) {
        return Err(GameError::WrongPhase(view.phase));
    }
    let actor = view.players.get(view.turn.current).ok_or_else(|| {
        GameError::UnknownPlayer(PlayerId::try_from(view.turn.current).unwrap_or(PlayerId::MAX))
    })?;
    if !actor.is_alive() {
        return Err(GameError::PlayerEliminated(actor.id));
    }
    if !view.board.in_bounds(target) {
        return Err(GameError::OutOfBounds(target));
    }

    if view.turn.teleport_armed {
        let content = view
            .board
            .tile_content(target, view.players, view.monsters);
        return if content == TileContent::Empty {
            Ok(MoveKind::Teleport)
        } else {
            Err(GameError::TeleportBlocked(target))
        };
    }

    if view.turn.moves_left == 0 {
        return Err(GameError::NoMovesLeft);
    }
    if !actor.position.is_adjacent(target) {
        return Err(GameError::NotAdjacent(target));
    }

    let ability = actor.board_ability.kind;
    if view.board.is_obstacle(target)
        && (ability != BoardAbilityId::NaturesPath || view.board.is_border(target))
    {
        return Err(GameError::Blocked(target));
    }

    if let Some(other) = view.living_player_at(target, actor.id) {
        return match view.phase {
            GamePhase::PvP => Ok(MoveKind::AttackPlayer(other.id)),
            _ if ability == BoardAbilityId::Stealth => Ok(MoveKind::Step),
            _ => Err(GameError::OccupiedByPlayer(target)),
        };
    }

    if let Some(monster) = view.living_monster_at(target) {
        return Ok(MoveKind::EnterMonster(monster.id));
    }
    Ok(MoveKind::Step)
}

/// Whether the current player may move to `target`.
#[must_use]
pub fn is_move_legal(view: &MoveView<'_>, target: Coord) -> bool {
    check_move(view, target).is_ok()
}

/// Every tile the current player may move to right now, row by row.
#[must_use]
pub fn legal_targets(view: &MoveView<'_>) -> Vec<Coord> {
    let size = view.board.size();
    (0..size)
        .flat_map(|y| (0..size).map(move |x| Coord::new(x, y)))
        .filter(|&cell| is_move_legal(view, cell))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{default_characters, CharacterId};

    struct Fixture {
        board: Board,
        players: Vec<Player>,
        monsters: Vec<Monster>,
        phase: GamePhase,
        turn: TurnState,
    }

    impl Fixture {
        fn new(actor: CharacterId) -> Self {
            let defs = default_characters();
            let def = |id| defs.iter().find(|d| d.id == id).unwrap();
            let players = vec![
                Player::new(0, def(actor), Coord::new(5, 5), 100),
                Player::new(1, def(CharacterId::Paladin), Coord::new(6, 5), 100),
            ];
            let board = Board::with_obstacles(15, [Coord::new(4, 4)]);
            let mut turn = TurnState::new(0);
            turn.moves_left = 3;
            Self {
                board,
                players,
                monsters: vec![Monster::new(0, Coord::new(5, 6), "Wolf", 50)],
                phase: GamePhase::Playing,
                turn,
            }
        }

        fn view(&self) -> MoveView<'_> {
            MoveView {
                board: &self.board,
                players: &self.players,
                monsters: &self.monsters,
                phase: self.phase,
                turn: &self.turn,
            }
        }
    }

    #[test]
    fn test_diagonal_step_is_adjacent() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(check_move(&f.view(), Coord::new(6, 6)), Ok(MoveKind::Step));
    }

    #[test]
    fn test_two_away_rejected() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(
            check_move(&f.view(), Coord::new(7, 5)),
            Err(GameError::NotAdjacent(Coord::new(7, 5)))
        );
    }

    #[test]
    fn test_no_moves_left() {
        let mut f = Fixture::new(CharacterId::Warrior);
        f.turn.moves_left = 0;
        assert_eq!(check_move(&f.view(), Coord::new(6, 6)), Err(GameError::NoMovesLeft));
    }

    #[test]
    fn test_obstacle_blocks() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(
            check_move(&f.view(), Coord::new(4, 4)),
            Err(GameError::Blocked(Coord::new(4, 4)))
        );
    }

    #[test]
    fn test_natures_path_walks_through_interior_obstacles() {
        let mut f = Fixture::new(CharacterId::Druid);
        assert_eq!(check_move(&f.view(), Coord::new(4, 4)), Ok(MoveKind::Step));
        f.players[0].position = Coord::new(1, 1);
        assert_eq!(
            check_move(&f.view(), Coord::new(0, 1)),
            Err(GameError::Blocked(Coord::new(0, 1)))
        );
    }

    #[test]
    fn test_player_blocks_without_stealth() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(
            check_move(&f.view(), Coord::new(6, 5)),
            Err(GameError::OccupiedByPlayer(Coord::new(6, 5)))
        );
    }

    #[test]
    fn test_stealth_passes_players() {
        let f = Fixture::new(CharacterId::Rogue);
        assert_eq!(check_move(&f.view(), Coord::new(6, 5)), Ok(MoveKind::Step));
    }

    #[test]
    fn test_eliminated_player_does_not_block() {
        let mut f = Fixture::new(CharacterId::Warrior);
        f.players[1].eliminate();
        assert_eq!(check_move(&f.view(), Coord::new(6, 5)), Ok(MoveKind::Step));
    }

    #[test]
    fn test_pvp_landing_on_player_attacks() {
        let mut f = Fixture::new(CharacterId::Warrior);
        f.phase = GamePhase::PvP;
        assert_eq!(
            check_move(&f.view(), Coord::new(6, 5)),
            Ok(MoveKind::AttackPlayer(1))
        );
    }

    #[test]
    fn test_monster_tile_starts_fight() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(
            check_move(&f.view(), Coord::new(5, 6)),
            Ok(MoveKind::EnterMonster(0))
        );
    }

    #[test]
    fn test_defeated_monster_is_walkable() {
        let mut f = Fixture::new(CharacterId::Warrior);
        f.monsters[0].defeat();
        assert_eq!(check_move(&f.view(), Coord::new(5, 6)), Ok(MoveKind::Step));
    }

    #[test]
    fn test_teleport_needs_empty_tile_only() {
        let mut f = Fixture::new(CharacterId::Mage);
        f.turn.teleport_armed = true;
        f.turn.moves_left = 0;
        assert_eq!(check_move(&f.view(), Coord::new(12, 12)), Ok(MoveKind::Teleport));
        assert_eq!(
            check_move(&f.view(), Coord::new(5, 6)),
            Err(GameError::TeleportBlocked(Coord::new(5, 6)))
        );
        assert_eq!(
            check_move(&f.view(), Coord::new(4, 4)),
            Err(GameError::TeleportBlocked(Coord::new(4, 4)))
        );
    }

    #[test]
    fn test_wrong_phase() {
        let mut f = Fixture::new(CharacterId::Warrior);
        f.phase = GamePhase::Combat;
        assert_eq!(
            check_move(&f.view(), Coord::new(6, 6)),
            Err(GameError::WrongPhase(GamePhase::Combat))
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let f = Fixture::new(CharacterId::Warrior);
        assert_eq!(
            check_move(&f.view(), Coord::new(15, 3)),
            Err(GameError::OutOfBounds(Coord::new(15, 3)))
        );
    }

    #[test]
    fn test_legal_targets_are_all_adjacent() {
        let f = Fixture::new(CharacterId::Warrior);
        let targets = legal_targets(&f.view());
        // 8 neighbours minus the obstacle and the other player.
        assert_eq!(targets.len(), 6);
        assert!(targets.iter().all(|c| c.is_adjacent(Coord::new(5, 5))));
    }
}
