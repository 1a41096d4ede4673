//! # Game Module
//!
//! Core data model shared by the grid, the generator, and the engine:
//! grid coordinates, the four movement directions, and treasure kinds.

pub mod engine;
pub mod grid;
pub mod monster;
pub mod node;
pub mod player;

use crate::{WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A cell coordinate in the dungeon grid.
///
/// Nodes refer to their neighbors by `Position` rather than by live
/// references, so the cyclic cave graph is stored without reference cycles
/// and nodes stay plain clonable values.
///
/// # Examples
///
/// ```
/// use warren::Position;
///
/// let pos = Position::new(2, 3);
/// assert_eq!(pos.row, 2);
/// assert_eq!(pos.col, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Creates a new position with the given row and column.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four movement directions.
///
/// Every edge in the dungeon is one of these; there is no diagonal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All four directions in N/S/E/W order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The opposite direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::Direction;
    ///
    /// assert_eq!(Direction::North.reverse(), Direction::South);
    /// assert_eq!(Direction::East.reverse(), Direction::West);
    /// ```
    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Index of this direction into a node's link table.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    /// Lowercase name for error messages ("north", "east", ...).
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = WarrenError;

    fn from_str(s: &str) -> WarrenResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "u" | "up" => Ok(Direction::North),
            "s" | "south" | "d" | "down" => Ok(Direction::South),
            "e" | "east" | "r" | "right" => Ok(Direction::East),
            "w" | "west" | "l" | "left" => Ok(Direction::West),
            other => Err(WarrenError::Validation(format!(
                "unknown direction '{}'",
                other
            ))),
        }
    }
}

/// Kinds of treasure found in caves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Treasure {
    Ruby,
    Sapphire,
    Diamond,
}

impl Treasure {
    /// All treasure kinds.
    pub const ALL: [Treasure; 3] = [Treasure::Ruby, Treasure::Sapphire, Treasure::Diamond];

    /// Singular display name.
    pub fn singular(self) -> &'static str {
        match self {
            Treasure::Ruby => "ruby",
            Treasure::Sapphire => "sapphire",
            Treasure::Diamond => "diamond",
        }
    }

    /// Plural display name.
    pub fn plural(self) -> &'static str {
        match self {
            Treasure::Ruby => "rubies",
            Treasure::Sapphire => "sapphires",
            Treasure::Diamond => "diamonds",
        }
    }

    /// Display name pluralized by `count`.
    pub fn pluralized(self, count: usize) -> &'static str {
        if count == 1 {
            self.singular()
        } else {
            self.plural()
        }
    }
}

impl fmt::Display for Treasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for Treasure {
    type Err = WarrenError;

    fn from_str(s: &str) -> WarrenResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ruby" | "rubies" => Ok(Treasure::Ruby),
            "sapphire" | "sapphires" => Ok(Treasure::Sapphire),
            "diamond" | "diamonds" => Ok(Treasure::Diamond),
            other => Err(WarrenError::Validation(format!(
                "unknown treasure '{}'",
                other
            ))),
        }
    }
}
