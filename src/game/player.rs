//! # Player Module
//!
//! The adventurer's inventory and life state. The player owns nothing
//! spatial: position, movement, and combat all live in the engine, which
//! mutates the inventory symmetrically with node contents.

use crate::config::STARTING_ARROWS;
use crate::game::Treasure;
use crate::{WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single adventurer: name, arrow count, treasure bag, alive flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    name: String,
    arrows: u32,
    treasures: HashMap<Treasure, u32>,
    alive: bool,
}

impl Player {
    /// Creates a living player with the standard three starting arrows.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::Player;
    ///
    /// let player = Player::new("Aster").unwrap();
    /// assert_eq!(player.arrows(), 3);
    /// assert!(player.is_alive());
    /// ```
    pub fn new(name: impl Into<String>) -> WarrenResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WarrenError::Validation(
                "player name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            arrows: STARTING_ARROWS,
            treasures: HashMap::new(),
            alive: true,
        })
    }

    /// The player's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the player.
    pub fn set_name(&mut self, name: impl Into<String>) -> WarrenResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WarrenError::Validation(
                "player name cannot be empty".to_string(),
            ));
        }
        self.name = name;
        Ok(())
    }

    /// Whether the player is still alive.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Marks the player dead. Dead is terminal.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Arrows left in the quiver.
    pub fn arrows(&self) -> u32 {
        self.arrows
    }

    /// Adds one picked-up arrow.
    pub fn gain_arrow(&mut self) {
        self.arrows += 1;
    }

    /// Consumes one arrow for a shot.
    pub fn spend_arrow(&mut self) -> WarrenResult<()> {
        if self.arrows == 0 {
            return Err(WarrenError::State(
                "no arrows to shoot, pick up arrows first".to_string(),
            ));
        }
        self.arrows -= 1;
        Ok(())
    }

    /// Count of a given treasure kind in the bag.
    pub fn treasure_count(&self, kind: Treasure) -> u32 {
        self.treasures.get(&kind).copied().unwrap_or(0)
    }

    /// Adds one item of `kind` to the bag.
    pub fn gain_treasure(&mut self, kind: Treasure) {
        *self.treasures.entry(kind).or_insert(0) += 1;
    }

    /// Empties the bag (the thief's work). Arrows are not stolen.
    pub fn strip_treasure(&mut self) {
        self.treasures.clear();
    }

    /// Bag contents as (kind, count) pairs in a stable order.
    pub fn treasure_summary(&self) -> Vec<(Treasure, u32)> {
        Treasure::ALL
            .into_iter()
            .filter_map(|kind| {
                let count = self.treasure_count(kind);
                (count > 0).then_some((kind, count))
            })
            .collect()
    }
}
