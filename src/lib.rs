//! # Warren
//!
//! A grid-based dungeon crawl core: a maze of caves and tunnels is generated
//! as a randomized spanning tree with controlled extra connectivity, populated
//! with treasure, arrows, monsters, and hazards, and then evolved turn by turn
//! as a single player explores it.
//!
//! ## Architecture Overview
//!
//! The crate is split along the same seams as the rest of the design:
//!
//! - **Game Model**: positions, directions, treasure, the cave/tunnel node
//!   union, monsters, and the player inventory
//! - **Grid**: an index-addressed arena of nodes with adjacency, BFS distance
//!   queries, and room descriptions
//! - **Generation System**: the randomized spanning-tree maze generator and
//!   its content-distribution passes
//! - **Engine**: the `Dungeon` state machine exposing movement, pickup,
//!   shooting, and monster ticks to external drivers
//!
//! Drivers (console, GUI) are external collaborators: they construct a
//! [`Dungeon`], register a [`Player`], and call the verb surface. Everything
//! they read back is a detached copy, so live engine state can never be
//! mutated through a returned reference.

pub mod game;
pub mod generation;

pub use game::engine::{Dungeon, MoveOutcome, ShotOutcome, ShotReport};
pub use game::grid::Grid;
pub use game::monster::{Lurker, LurkerHealth, MoveStrategy, RandomMove, Stalker};
pub use game::node::{Node, NodeKind};
pub use game::player::Player;
pub use game::{Direction, Position, Treasure};
pub use generation::{DungeonConfig, MazeGenerator};

/// Core error type for the warren engine.
#[derive(thiserror::Error, Debug)]
pub enum WarrenError {
    /// Bad caller input: unknown direction, malformed treasure name,
    /// non-positive distance, out-of-range parameter.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Operation is legal in principle but not in the current state: no
    /// registered player, player already dead, no edge in that direction,
    /// nothing left to pick up.
    #[error("invalid state: {0}")]
    State(String),

    /// Operation does not exist for this node kind, e.g. treasure in a
    /// tunnel. Indicates a caller/model mismatch rather than bad input.
    #[error("capability error: {0}")]
    Capability(String),

    /// Dungeon construction could not satisfy its invariants; no partial
    /// dungeon is ever returned.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Result type used throughout the warren codebase.
pub type WarrenResult<T> = Result<T, WarrenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Minimum number of rows and columns in a dungeon grid.
    pub const MIN_ROWS_COLS: usize = 4;

    /// Most arrows a single node receives during generation.
    pub const MAX_NODE_ARROWS: u8 = 4;

    /// Most treasure items a single cave receives during generation.
    pub const MAX_CAVE_TREASURES: usize = 4;

    /// Arrows a freshly created player carries.
    pub const STARTING_ARROWS: u32 = 3;

    /// Minimum BFS distance between the start and end nodes.
    pub const MIN_START_END_DISTANCE: u32 = 5;

    /// Retry budget for sampling a viable start/end pair.
    pub const START_END_PATIENCE: u32 = 1_000;
}
