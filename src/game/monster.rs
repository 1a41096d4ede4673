//! # Monster Module
//!
//! The two monster kinds that inhabit a dungeon: the lurker, a stationary
//! ambush creature with a two-stage health model, and the stalker, a roaming
//! creature whose movement is delegated to a pluggable strategy.

use crate::game::Direction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Health stages of a lurker.
///
/// A lurker that takes a second arrow hit is removed from its cave entirely,
/// so a dead stage is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LurkerHealth {
    /// Unhurt. Contact with the player is a certain kill.
    Healthy,
    /// Hit once. Contact kills the player with 50% probability.
    Wounded,
}

impl LurkerHealth {
    /// Health expressed on the conventional 0..=100 scale.
    pub fn points(self) -> u8 {
        match self {
            LurkerHealth::Healthy => 100,
            LurkerHealth::Wounded => 50,
        }
    }
}

/// A stationary ambush creature fixed to a cave.
///
/// Lurkers never move. They die to two arrow hits and eat players who walk
/// into their cave, with the kill chance depending on remaining health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lurker {
    id: Uuid,
    health: LurkerHealth,
}

impl Lurker {
    /// Creates a healthy lurker with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            health: LurkerHealth::Healthy,
        }
    }

    /// Unique identity of this lurker.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current health stage.
    pub fn health(&self) -> LurkerHealth {
        self.health
    }

    /// Whether this lurker has been hit once already.
    pub fn is_wounded(&self) -> bool {
        self.health == LurkerHealth::Wounded
    }

    /// Applies one arrow hit. Returns `true` if the hit was fatal, in which
    /// case the caller must remove the lurker from its cave.
    pub fn hit_by_arrow(&mut self) -> bool {
        match self.health {
            LurkerHealth::Healthy => {
                self.health = LurkerHealth::Wounded;
                false
            }
            LurkerHealth::Wounded => true,
        }
    }
}

impl Default for Lurker {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability for choosing a stalker's next move.
///
/// Implementations see only the open directions out of the current node and
/// pick one (or none, to stay put). Keeping the decision behind a trait lets
/// new behaviors plug in without touching the engine.
pub trait MoveStrategy {
    /// Chooses a direction out of `open`, or `None` to stay in place.
    fn choose(&self, open: &[Direction], rng: &mut StdRng) -> Option<Direction>;

    /// Short name for logging and diagnostics.
    fn strategy_name(&self) -> &'static str;
}

/// Default strategy: a uniformly random open direction each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMove;

impl MoveStrategy for RandomMove {
    fn choose(&self, open: &[Direction], rng: &mut StdRng) -> Option<Direction> {
        open.choose(rng).copied()
    }

    fn strategy_name(&self) -> &'static str {
        "random"
    }
}

/// A roaming creature with a replaceable movement strategy.
///
/// Stalkers have no health model: contact with the player resolves through a
/// coin-flip hand-to-hand battle that kills one of the two.
pub struct Stalker {
    id: Uuid,
    strategy: Box<dyn MoveStrategy>,
}

impl Stalker {
    /// Creates a stalker with the default random-walk strategy.
    pub fn new() -> Self {
        Self::with_strategy(Box::new(RandomMove))
    }

    /// Creates a stalker driven by the given strategy.
    pub fn with_strategy(strategy: Box<dyn MoveStrategy>) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy,
        }
    }

    /// Unique identity of this stalker.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Asks the strategy for the next move out of `open`.
    pub fn choose_move(&self, open: &[Direction], rng: &mut StdRng) -> Option<Direction> {
        self.strategy.choose(open, rng)
    }
}

impl Default for Stalker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stalker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stalker")
            .field("id", &self.id)
            .field("strategy", &self.strategy.strategy_name())
            .finish()
    }
}
