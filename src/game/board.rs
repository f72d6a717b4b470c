//! Board geometry, obstacles and tile queries.

use std::collections::BTreeSet;
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::error::ConfigError;
use crate::game::{Monster, MonsterId, Player, PlayerId};

/// Smallest supported board side.
pub const MIN_BOARD_SIZE: u16 = 7;

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// King-move distance: diagonals count as one step.
    #[must_use]
    pub const fn chebyshev(self, other: Coord) -> u16 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Whether `other` is exactly one king-move away.
    #[must_use]
    pub const fn is_adjacent(self, other: Coord) -> bool {
        self.chebyshev(other) == 1
    }

    /// The up to eight neighbours inside a `size` x `size` board.
    #[must_use]
    pub fn neighbors(self, size: u16) -> Vec<Coord> {
        let mut result = Vec::with_capacity(8);
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = i32::from(self.x) + dx;
                let y = i32::from(self.y) + dy;
                if let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) {
                    if x < size && y < size {
                        result.push(Coord::new(x, y));
                    }
                }
            }
        }
        result
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What a tile shows, in priority order obstacle > player > monster > empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileContent {
    /// Nothing here.
    Empty,
    /// Impassable rock.
    Obstacle,
    /// A living player.
    Player(PlayerId),
    /// A living monster.
    Monster(MonsterId),
}

/// Square board with an immutable obstacle set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: u16,
    obstacles: BTreeSet<Coord>,
}

impl Board {
    /// Board with only the border ring blocked.
    #[must_use]
    pub fn bordered(size: u16) -> Self {
        let mut obstacles = BTreeSet::new();
        let last = size.saturating_sub(1);
        for i in 0..size {
            obstacles.insert(Coord::new(0, i));
            obstacles.insert(Coord::new(last, i));
            obstacles.insert(Coord::new(i, 0));
            obstacles.insert(Coord::new(i, last));
        }
        Self { size, obstacles }
    }

    /// Border ring plus the given cells. Out-of-bounds cells are ignored.
    #[must_use]
    pub fn with_obstacles(size: u16, cells: impl IntoIterator<Item = Coord>) -> Self {
        let mut board = Self::bordered(size);
        board
            .obstacles
            .extend(cells.into_iter().filter(|c| c.x < size && c.y < size));
        board
    }

    /// Border ring plus `interior` random obstacles.
    ///
    /// Interior obstacles are drawn by rejection sampling from the placement
    /// area, which keeps the first ring inside the border clear for starting
    /// positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the board is too small or the placement area
    /// cannot hold `interior` obstacles.
    pub fn generate(size: u16, interior: usize, dice: &mut impl Dice) -> Result<Self, ConfigError> {
        if size < MIN_BOARD_SIZE {
            return Err(ConfigError::BoardTooSmall {
                size,
                min: MIN_BOARD_SIZE,
            });
        }
        let area = placement_area(size);
        if interior >= area {
            return Err(ConfigError::TooManyObstacles {
                count: interior,
                area,
            });
        }

        let mut board = Self::bordered(size);
        let span = usize::from(size - 4);
        for _ in 0..interior {
            loop {
                let x = 2 + dice.below(span);
                let y = 2 + dice.below(span);
                #[allow(clippy::cast_possible_truncation)]
                let cell = Coord::new(x as u16, y as u16);
                if board.obstacles.insert(cell) {
                    trace!("obstacle placed at {cell}");
                    break;
                }
            }
        }
        Ok(board)
    }

    /// Side length.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Check if a coordinate is on the board.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }

    /// Whether the cell lies on the outer ring.
    #[must_use]
    pub const fn is_border(&self, coord: Coord) -> bool {
        let last = self.size - 1;
        coord.x == 0 || coord.y == 0 || coord.x == last || coord.y == last
    }

    /// Whether the cell holds an obstacle.
    #[must_use]
    pub fn is_obstacle(&self, coord: Coord) -> bool {
        self.obstacles.contains(&coord)
    }

    /// All obstacles, sorted.
    pub fn obstacles(&self) -> impl Iterator<Item = Coord> + '_ {
        self.obstacles.iter().copied()
    }

    /// Number of obstacles including the border.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Number of cells on the border ring.
    #[must_use]
    pub const fn border_count(&self) -> usize {
        4 * self.size as usize - 4
    }

    /// What occupies a cell.
    #[must_use]
    pub fn tile_content(&self, coord: Coord, players: &[Player], monsters: &[Monster]) -> TileContent {
        if self.is_obstacle(coord) {
            return TileContent::Obstacle;
        }
        if let Some(player) = players.iter().find(|p| p.is_alive() && p.position == coord) {
            return TileContent::Player(player.id);
        }
        if let Some(monster) = monsters.iter().find(|m| m.is_alive() && m.position == coord) {
            return TileContent::Monster(monster.id);
        }
        TileContent::Empty
    }

    /// Whether anything blocks or occupies a cell.
    #[must_use]
    pub fn is_occupied(&self, coord: Coord, players: &[Player], monsters: &[Monster]) -> bool {
        self.tile_content(coord, players, monsters) != TileContent::Empty
    }

    /// All non-border cells that are not obstacles.
    pub fn open_interior(&self) -> impl Iterator<Item = Coord> + '_ {
        (1..self.size - 1)
            .flat_map(|y| (1..self.size - 1).map(move |x| Coord::new(x, y)))
            .filter(|c| !self.is_obstacle(*c))
    }
}

/// Cells available for random interior obstacles on a board of `size`.
#[must_use]
pub fn placement_area(size: u16) -> usize {
    let span = usize::from(size.saturating_sub(4));
    span * span
}
