//! Turn bookkeeping: whose turn it is and how many moves remain.

use serde::{Deserialize, Serialize};

use crate::game::Player;

/// Turn state for the seat currently acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Index of the current seat.
    pub current: usize,
    /// Moves left this turn. Zero until the movement die is rolled.
    pub moves_left: u32,
    /// Last movement die face, for display.
    pub last_roll: Option<u8>,
    /// Whether the next move is a teleport.
    pub teleport_armed: bool,
    /// Turns ended since play began.
    pub turn_number: u32,
}

impl TurnState {
    /// Fresh turn for `seat` with an empty move budget.
    #[must_use]
    pub const fn new(seat: usize) -> Self {
        Self {
            current: seat,
            moves_left: 0,
            last_roll: None,
            teleport_armed: false,
            turn_number: 0,
        }
    }

    /// Hand the turn to `seat`, clearing per-turn state.
    pub fn advance_to(&mut self, seat: usize) {
        self.current = seat;
        self.moves_left = 0;
        self.last_roll = None;
        self.teleport_armed = false;
        self.turn_number = self.turn_number.saturating_add(1);
    }
}

/// Next living seat after `current`, cycling round the table.
///
/// Returns `current` when no other seat is alive, so the search always
/// terminates.
#[must_use]
pub fn next_living_seat(players: &[Player], current: usize) -> usize {
    let count = players.len();
    if count == 0 {
        return current;
    }
    (1..=count)
        .map(|offset| (current + offset) % count)
        .find(|&seat| players[seat].is_alive())
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{default_characters, Coord};

    fn table(alive: &[bool]) -> Vec<Player> {
        let defs = default_characters();
        alive
            .iter()
            .enumerate()
            .map(|(i, &alive)| {
                #[allow(clippy::cast_possible_truncation)]
                let mut p = Player::new(i as u8, &defs[i], Coord::new(1, 1), 100);
                if !alive {
                    p.eliminate();
                }
                p
            })
            .collect()
    }

    #[test]
    fn test_next_seat_cycles() {
        let players = table(&[true, true, true]);
        assert_eq!(next_living_seat(&players, 0), 1);
        assert_eq!(next_living_seat(&players, 2), 0);
    }

    #[test]
    fn test_next_seat_skips_eliminated() {
        let players = table(&[true, false, false, true]);
        assert_eq!(next_living_seat(&players, 0), 3);
        assert_eq!(next_living_seat(&players, 3), 0);
    }

    #[test]
    fn test_next_seat_sole_survivor_stays() {
        let players = table(&[false, true, false]);
        assert_eq!(next_living_seat(&players, 1), 1);
    }

    #[test]
    fn test_next_seat_everyone_down() {
        let players = table(&[false, false]);
        assert_eq!(next_living_seat(&players, 1), 1);
    }

    #[test]
    fn test_advance_clears_turn() {
        let mut turn = TurnState::new(0);
        turn.moves_left = 4;
        turn.last_roll = Some(4);
        turn.teleport_armed = true;
        turn.advance_to(2);
        assert_eq!(turn, TurnState { current: 2, turn_number: 1, ..TurnState::new(2) });
    }
}
