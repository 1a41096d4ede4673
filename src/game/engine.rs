//! # Engine Module
//!
//! The [`Dungeon`] state machine. Drivers construct one (either generated or
//! hand-built), register a [`Player`], and steer the game through the verb
//! surface: move, pick up, shoot, and the monster/hazard ticks. Every query
//! that exposes a node hands back a detached clone, so live engine state is
//! never mutable from outside.

use crate::config::{MIN_START_END_DISTANCE, STARTING_ARROWS};
use crate::game::grid::Grid;
use crate::game::monster::Stalker;
use crate::game::node::Node;
use crate::game::player::Player;
use crate::game::{Direction, Position, Treasure};
use crate::generation::{DungeonConfig, MazeGenerator};
use crate::{WarrenError, WarrenResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Result of a single player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the player now stands.
    pub position: Position,
    /// True when the destination's lurker ate the player.
    pub player_died: bool,
}

/// What an arrow did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// The arrow wounded a healthy lurker.
    Injured,
    /// The arrow finished off a wounded lurker.
    Killed,
    /// The arrow hit nothing and now lies where it stopped.
    MissedIntoDarkness,
}

/// Full report of a shot: what happened and where the arrow ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    /// The node the arrow finally came to rest in (or struck a lurker in).
    pub position: Position,
    pub outcome: ShotOutcome,
}

/// The live game: grid, player, monsters, and hazards, advanced one verb at
/// a time.
///
/// All randomness flows through the single owned rng, so a seeded dungeon
/// replays identically given the same verb sequence.
#[derive(Debug)]
pub struct Dungeon {
    grid: Grid,
    /// Pristine copy taken the moment construction finished, for restarts.
    initial_grid: Grid,
    config: DungeonConfig,
    rng: StdRng,
    start: Position,
    end: Position,
    player: Option<Player>,
    player_pos: Option<Position>,
    stalker: Option<Stalker>,
    stalker_pos: Option<Position>,
    initial_stalker_pos: Option<Position>,
    thief_pos: Option<Position>,
    pit_pos: Option<Position>,
}

impl Dungeon {
    /// Generates a dungeon from the configuration, driving all randomness
    /// from the supplied rng.
    pub fn generate(config: DungeonConfig, mut rng: StdRng) -> WarrenResult<Self> {
        let layout = MazeGenerator::new(config.clone()).generate(&mut rng)?;

        let stalker = layout.stalker_pos.map(|_| Stalker::new());
        if stalker.is_none() {
            warn!("no free cave for a stalker; dungeon has none");
        }

        Ok(Self {
            initial_grid: layout.grid.clone(),
            grid: layout.grid,
            config,
            rng,
            start: layout.start,
            end: layout.end,
            player: None,
            player_pos: None,
            stalker,
            stalker_pos: layout.stalker_pos,
            initial_stalker_pos: layout.stalker_pos,
            thief_pos: layout.thief_pos,
            pit_pos: layout.pit_pos,
        })
    }

    /// Convenience constructor seeding the rng from a plain integer.
    pub fn with_seed(config: DungeonConfig, seed: u64) -> WarrenResult<Self> {
        Self::generate(config, StdRng::seed_from_u64(seed))
    }

    /// Builds a dungeon around a hand-assembled grid, re-validating every
    /// invariant generation would have guaranteed.
    ///
    /// Used by tests and scripted scenarios; the echoed configuration is
    /// synthesized from the grid shape.
    #[allow(clippy::too_many_arguments)]
    pub fn from_grid(
        grid: Grid,
        start_name: &str,
        end_name: &str,
        stalker: Option<(Position, Stalker)>,
        thief_pos: Option<Position>,
        pit_pos: Option<Position>,
        rng: StdRng,
    ) -> WarrenResult<Self> {
        grid.validate()?;

        if !grid.has_treasure_cave() {
            return Err(WarrenError::Generation(
                "dungeon must contain at least one treasure cave".to_string(),
            ));
        }

        let start = grid.find_by_name(start_name)?;
        let end = grid.find_by_name(end_name)?;
        if !grid.node(end)?.is_cave() {
            return Err(WarrenError::Generation(
                "end node must be a cave".to_string(),
            ));
        }
        match grid.shortest_distance(start, end) {
            Some(d) if d >= MIN_START_END_DISTANCE => {}
            _ => {
                return Err(WarrenError::Generation(format!(
                    "start and end must be at least {} apart",
                    MIN_START_END_DISTANCE
                )))
            }
        }

        let monster_count = grid.nodes().iter().filter(|n| n.lurker().is_some()).count();
        let config = DungeonConfig {
            rows: grid.rows(),
            cols: grid.cols(),
            interconnectivity: 0,
            wrapping: grid.is_wrapping(),
            treasure_pct: 1.0,
            force_interconnectivity_range: false,
            monster_count,
        };

        let mut grid = grid;
        let (stalker, stalker_pos) = match stalker {
            Some((pos, s)) => {
                grid.node_mut(pos)?.set_stalker(true)?;
                (Some(s), Some(pos))
            }
            None => (None, None),
        };
        if let Some(pos) = thief_pos {
            grid.node_mut(pos)?.place_thief()?;
        }
        if let Some(pos) = pit_pos {
            grid.node_mut(pos)?.add_pit()?;
        }

        Ok(Self {
            initial_grid: grid.clone(),
            grid,
            config,
            rng,
            start,
            end,
            player: None,
            player_pos: None,
            stalker,
            stalker_pos,
            initial_stalker_pos: stalker_pos,
            thief_pos,
            pit_pos,
        })
    }

    // ---- player registration --------------------------------------------

    /// Places the player at the start node. A dungeon hosts exactly one.
    pub fn enter_player(&mut self, player: Player) -> WarrenResult<()> {
        if let Some(existing) = &self.player {
            if existing.name() == player.name() {
                return Err(WarrenError::State(
                    "the same player cannot enter the dungeon twice".to_string(),
                ));
            }
            return Err(WarrenError::State(
                "another player is already in the dungeon".to_string(),
            ));
        }

        info!(
            "player '{}' enters at {} with {} arrows",
            player.name(),
            self.start,
            STARTING_ARROWS
        );
        self.player = Some(player);
        self.player_pos = Some(self.start);
        Ok(())
    }

    fn require_player(&self) -> WarrenResult<(&Player, Position)> {
        match (&self.player, self.player_pos) {
            (Some(p), Some(pos)) => Ok((p, pos)),
            _ => Err(WarrenError::State(
                "no player has entered the dungeon".to_string(),
            )),
        }
    }

    fn require_living_player(&self) -> WarrenResult<(&Player, Position)> {
        let (player, pos) = self.require_player()?;
        if !player.is_alive() {
            return Err(WarrenError::State("the player is dead".to_string()));
        }
        Ok((player, pos))
    }

    // ---- verbs -----------------------------------------------------------

    /// Moves the player one node in the given direction, then resolves
    /// contact with any lurker waiting there.
    ///
    /// A healthy lurker kills outright; a wounded one kills with even odds.
    pub fn move_player(&mut self, dir: Direction) -> WarrenResult<MoveOutcome> {
        let (_, pos) = self.require_living_player()?;

        let next = self.grid.node(pos)?.link(dir).ok_or_else(|| {
            WarrenError::State(format!("there is no door to the {} from here", dir))
        })?;
        self.player_pos = Some(next);
        debug!("player moves {} to {}", dir, next);

        let mut died = false;
        if let Some(lurker) = self.grid.node(next)?.lurker() {
            died = if lurker.is_wounded() {
                self.rng.gen_range(1..=100) <= 50
            } else {
                true
            };
        }
        if died {
            info!("a lurker devours the player at {}", next);
            self.kill_player()?;
        }

        Ok(MoveOutcome {
            position: next,
            player_died: died,
        })
    }

    /// Transfers one piece of the named treasure from the player's cave to
    /// the player.
    pub fn pick_up_treasure(&mut self, kind: Treasure) -> WarrenResult<()> {
        let (_, pos) = self.require_living_player()?;
        self.grid.node_mut(pos)?.remove_treasure(kind)?;
        if let Some(player) = self.player.as_mut() {
            player.gain_treasure(kind);
        }
        debug!("player picks up a {} at {}", kind, pos);
        Ok(())
    }

    /// Transfers one arrow from the player's node to the player.
    pub fn pick_up_arrow(&mut self) -> WarrenResult<()> {
        let (_, pos) = self.require_living_player()?;
        self.grid.node_mut(pos)?.remove_arrow()?;
        if let Some(player) = self.player.as_mut() {
            player.gain_arrow();
        }
        debug!("player picks up an arrow at {}", pos);
        Ok(())
    }

    /// Shoots a crooked arrow a given cave-distance in the given direction.
    ///
    /// Arrows only consume distance on entering caves; a tunnel bends the
    /// arrow toward its open exit and costs nothing. The arrow is spent the
    /// moment validation passes and a miss never refunds it; a spent arrow
    /// lies where it stopped and can be recovered.
    pub fn shoot(&mut self, dir: Direction, distance: u32) -> WarrenResult<ShotReport> {
        if distance == 0 {
            return Err(WarrenError::Validation(
                "arrow distance must be at least 1".to_string(),
            ));
        }
        let (player, start_pos) = self.require_living_player()?;
        if player.arrows() == 0 {
            return Err(WarrenError::State(
                "no arrows to shoot, pick up arrows first".to_string(),
            ));
        }
        if let Some(player) = self.player.as_mut() {
            player.spend_arrow()?;
        }

        let mut pos = start_pos;
        let mut heading = dir;
        let mut remaining = distance;
        loop {
            let Some(next) = self.grid.node(pos)?.link(heading) else {
                break;
            };
            pos = next;
            let node = self.grid.node(pos)?;
            if node.is_cave() {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            } else {
                // A tunnel has exactly two doors; the arrow leaves by the
                // one it did not come in through.
                for cand in [
                    Direction::West,
                    Direction::East,
                    Direction::North,
                    Direction::South,
                ] {
                    if cand != heading.reverse() && node.link(cand).is_some() {
                        heading = cand;
                        break;
                    }
                }
            }
        }

        if remaining == 0 && self.grid.node(pos)?.lurker().is_some() {
            let fatal = self
                .grid
                .node_mut(pos)?
                .lurker_mut()
                .map(|l| l.hit_by_arrow())
                .unwrap_or(false);
            if fatal {
                self.grid.node_mut(pos)?.remove_lurker()?;
                info!("arrow kills the lurker at {}", pos);
                return Ok(ShotReport {
                    position: pos,
                    outcome: ShotOutcome::Killed,
                });
            }
            info!("arrow wounds the lurker at {}", pos);
            return Ok(ShotReport {
                position: pos,
                outcome: ShotOutcome::Injured,
            });
        }

        self.grid.node_mut(pos)?.add_arrow()?;
        debug!("arrow misses and falls at {}", pos);
        Ok(ShotReport {
            position: pos,
            outcome: ShotOutcome::MissedIntoDarkness,
        })
    }

    /// Resolves an even-odds brawl between the player and the stalker.
    /// Returns true when the player wins; the driver applies the outcome.
    pub fn hand_to_hand_battle(&mut self) -> WarrenResult<bool> {
        self.require_living_player()?;
        if self.stalker.is_none() {
            return Err(WarrenError::State(
                "there is no stalker to fight".to_string(),
            ));
        }
        let player_wins = self.rng.gen_range(1..=100) <= 50;
        info!(
            "hand to hand battle: the {} wins",
            if player_wins { "player" } else { "stalker" }
        );
        Ok(player_wins)
    }

    // ---- monster and hazard ticks ----------------------------------------

    /// Advances the stalker one step using its movement strategy. Returns
    /// its new position, unchanged when the strategy declines to move.
    pub fn move_stalker(&mut self) -> WarrenResult<Position> {
        let (stalker, pos) = match (&self.stalker, self.stalker_pos) {
            (Some(s), Some(pos)) => (s, pos),
            _ => {
                return Err(WarrenError::State(
                    "there is no stalker in the dungeon".to_string(),
                ))
            }
        };

        let open = self.grid.node(pos)?.open_directions();
        match stalker.choose_move(&open, &mut self.rng) {
            Some(dir) => {
                let next = self.grid.node(pos)?.link(dir).ok_or_else(|| {
                    WarrenError::State(format!("stalker strategy chose a closed door: {}", dir))
                })?;
                self.grid.node_mut(pos)?.set_stalker(false)?;
                self.grid.node_mut(next)?.set_stalker(true)?;
                self.stalker_pos = Some(next);
                debug!("stalker prowls {} to {}", dir, next);
                Ok(next)
            }
            None => Ok(pos),
        }
    }

    /// Removes the stalker from the game after the player wins the brawl.
    pub fn kill_stalker(&mut self) -> WarrenResult<()> {
        let pos = self.stalker_pos.ok_or_else(|| {
            WarrenError::State("there is no stalker to kill".to_string())
        })?;
        self.grid.node_mut(pos)?.set_stalker(false)?;
        self.stalker = None;
        self.stalker_pos = None;
        info!("the stalker is slain at {}", pos);
        Ok(())
    }

    /// Empties the player's treasure bag. Called by the driver when the
    /// player walks into the thief's cave.
    pub fn rob_player(&mut self) -> WarrenResult<()> {
        self.require_living_player()?;
        if let Some(player) = self.player.as_mut() {
            player.strip_treasure();
        }
        info!("the thief strips the player of all treasure");
        Ok(())
    }

    /// Kills the player outright. Called by the driver for pit falls and
    /// lost brawls.
    pub fn kill_player(&mut self) -> WarrenResult<()> {
        let player = self
            .player
            .as_mut()
            .ok_or_else(|| WarrenError::State("no player has entered the dungeon".to_string()))?;
        player.kill();
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    /// Where the player currently stands.
    pub fn player_position(&self) -> WarrenResult<Position> {
        self.require_player().map(|(_, pos)| pos)
    }

    /// Detached copy of the node the player stands in.
    pub fn player_node(&self) -> WarrenResult<Node> {
        let (_, pos) = self.require_player()?;
        Ok(self.grid.node(pos)?.clone())
    }

    /// The room description for the player's current node: kind, doors,
    /// contents, and the lurker smell.
    pub fn describe_current_room(&self) -> WarrenResult<String> {
        let (_, pos) = self.require_player()?;
        self.grid.room_description(pos)
    }

    /// The registered player, if any.
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn start_position(&self) -> Position {
        self.start
    }

    pub fn end_position(&self) -> Position {
        self.end
    }

    /// Detached copy of the start node.
    pub fn start_node(&self) -> WarrenResult<Node> {
        Ok(self.grid.node(self.start)?.clone())
    }

    /// Detached copy of the end node.
    pub fn end_node(&self) -> WarrenResult<Node> {
        Ok(self.grid.node(self.end)?.clone())
    }

    /// True once the player stands in the end cave.
    pub fn has_reached_end(&self) -> WarrenResult<bool> {
        let (_, pos) = self.require_player()?;
        Ok(pos == self.end)
    }

    /// Detached copy of the current grid.
    pub fn snapshot(&self) -> Grid {
        self.grid.clone()
    }

    /// Detached copy of the grid exactly as construction left it.
    pub fn initial_snapshot(&self) -> Grid {
        self.initial_grid.clone()
    }

    /// Positions of every cave that still holds a lurker.
    pub fn lurker_positions(&self) -> Vec<Position> {
        self.grid
            .positions()
            .filter(|&p| {
                self.grid
                    .node(p)
                    .map(|n| n.lurker().is_some())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Every node that still holds treasure, with its contents.
    pub fn treasure_locations(&self) -> Vec<(Position, Vec<Treasure>)> {
        self.grid
            .positions()
            .filter_map(|p| {
                let node = self.grid.node(p).ok()?;
                match node.treasures() {
                    Ok(t) if !t.is_empty() => Some((p, t)),
                    _ => None,
                }
            })
            .collect()
    }

    /// Every node that still holds arrows, with the count.
    pub fn arrow_locations(&self) -> Vec<(Position, u8)> {
        self.grid
            .positions()
            .filter_map(|p| {
                let node = self.grid.node(p).ok()?;
                (node.arrows() > 0).then(|| (p, node.arrows()))
            })
            .collect()
    }

    pub fn stalker_position(&self) -> Option<Position> {
        self.stalker_pos
    }

    pub fn initial_stalker_position(&self) -> Option<Position> {
        self.initial_stalker_pos
    }

    pub fn thief_position(&self) -> Option<Position> {
        self.thief_pos
    }

    pub fn pit_position(&self) -> Option<Position> {
        self.pit_pos
    }

    /// The configuration this dungeon was built with, for echoing back to
    /// the user.
    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    pub fn is_wrapping(&self) -> bool {
        self.grid.is_wrapping()
    }
}

/// ASCII sketch of the maze: node names laid out on the lattice, `--` and
/// `|` for doors, `*` marking the start and `+` the end.
impl fmt::Display for Dungeon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .grid
            .nodes()
            .iter()
            .map(|n| n.name().len())
            .max()
            .unwrap_or(1)
            + 2;

        for row in 0..self.grid.rows() {
            let mut names = String::new();
            let mut doors = String::new();
            for col in 0..self.grid.cols() {
                let pos = Position::new(row, col);
                let node = self.grid.node(pos).map_err(|_| fmt::Error)?;
                let marker = if pos == self.start {
                    "*"
                } else if pos == self.end {
                    "+"
                } else {
                    ""
                };
                names.push_str(&format!("{:>width$}", format!("{}{}", marker, node.name())));
                names.push_str(if node.link(Direction::East).is_some() {
                    " --"
                } else {
                    "   "
                });
                doors.push_str(&format!(
                    "{:>width$}",
                    if node.link(Direction::South).is_some() {
                        "|"
                    } else {
                        ""
                    }
                ));
                doors.push_str("   ");
            }
            writeln!(f, "{}", names.trim_end())?;
            writeln!(f, "{}", doors.trim_end())?;
        }
        Ok(())
    }
}
