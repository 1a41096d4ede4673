//! # Node Module
//!
//! A single cell of the dungeon grid. Nodes start out generic, get their
//! adjacency fixed during maze generation, and are then cast exactly once to
//! a cave or a tunnel based on their final degree. Kind-specific contents
//! (treasure, a lurker, thief and pit flags) live in the kind payload so an
//! invalid combination such as treasure in a tunnel is unrepresentable.

use crate::config::MAX_NODE_ARROWS;
use crate::game::monster::Lurker;
use crate::game::{Direction, Position, Treasure};
use crate::{WarrenError, WarrenResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The kind of a node along with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Placeholder used during grid construction, before degrees are final.
    Generic,
    /// A room with 1, 3, or 4 open sides.
    Cave {
        /// Ordered multiset of treasure items.
        treasures: Vec<Treasure>,
        /// At most one stationary monster.
        lurker: Option<Lurker>,
        /// Whether a thief waits here.
        has_thief: bool,
        /// Whether the floor hides a pit.
        has_pit: bool,
    },
    /// A corridor with exactly 2 open sides. Holds arrows only.
    Tunnel,
}

/// One cell of the dungeon grid.
///
/// Neighbors are stored as grid coordinates, never as live references, so a
/// `Node` is a plain value: cloning it detaches it completely from the grid
/// it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    position: Position,
    links: [Option<Position>; 4],
    kind: NodeKind,
    arrows: u8,
    has_stalker: bool,
}

impl Node {
    /// Creates a generic, unlinked node.
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            links: [None; 4],
            kind: NodeKind::Generic,
            arrows: 0,
            has_stalker: false,
        }
    }

    /// Stable name of this node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid coordinate of this node.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The node's kind tag and payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is a cave.
    pub fn is_cave(&self) -> bool {
        matches!(self.kind, NodeKind::Cave { .. })
    }

    /// Whether this node is a tunnel.
    pub fn is_tunnel(&self) -> bool {
        matches!(self.kind, NodeKind::Tunnel)
    }

    /// Whether this node is still an uncast generic placeholder.
    pub fn is_generic(&self) -> bool {
        matches!(self.kind, NodeKind::Generic)
    }

    // ---- adjacency ------------------------------------------------------

    /// The neighbor coordinate in `dir`, if an edge exists.
    pub fn link(&self, dir: Direction) -> Option<Position> {
        self.links[dir.index()]
    }

    /// Sets the neighbor in `dir`. A node may not be its own neighbor.
    pub fn set_link(&mut self, dir: Direction, neighbor: Position) -> WarrenResult<()> {
        if neighbor == self.position {
            return Err(WarrenError::Validation(format!(
                "cannot connect node {} to itself",
                self.name
            )));
        }

        self.links[dir.index()] = Some(neighbor);
        Ok(())
    }

    /// Removes the edge in `dir`, if any.
    pub fn clear_link(&mut self, dir: Direction) {
        self.links[dir.index()] = None;
    }

    /// Number of open sides.
    pub fn degree(&self) -> usize {
        self.links.iter().filter(|l| l.is_some()).count()
    }

    /// Open directions in N/S/E/W order.
    pub fn open_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.link(*d).is_some())
            .collect()
    }

    /// The direction from this node to `neighbor`, if adjacent.
    pub fn direction_to(&self, neighbor: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.link(*d) == Some(neighbor))
    }

    // ---- casting --------------------------------------------------------

    /// Casts this generic node to a cave. Fails if already cast.
    pub fn cast_to_cave(&mut self) -> WarrenResult<()> {
        if !self.is_generic() {
            return Err(WarrenError::State(format!(
                "node {} has already been cast",
                self.name
            )));
        }

        self.kind = NodeKind::Cave {
            treasures: Vec::new(),
            lurker: None,
            has_thief: false,
            has_pit: false,
        };
        Ok(())
    }

    /// Casts this generic node to a tunnel. Fails if already cast.
    pub fn cast_to_tunnel(&mut self) -> WarrenResult<()> {
        if !self.is_generic() {
            return Err(WarrenError::State(format!(
                "node {} has already been cast",
                self.name
            )));
        }

        self.kind = NodeKind::Tunnel;
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Generic => "generic node",
            NodeKind::Cave { .. } => "cave",
            NodeKind::Tunnel => "tunnel",
        }
    }

    // ---- treasure (caves only) ------------------------------------------

    /// Fills this cave with 1..=4 random treasure items, replacing any
    /// existing contents.
    pub fn place_random_treasure(&mut self, rng: &mut StdRng) -> WarrenResult<()> {
        if !self.is_cave() {
            return Err(WarrenError::Capability(format!(
                "cannot place treasure in a {}",
                self.kind_name()
            )));
        }

        let count = rng.gen_range(1..=crate::config::MAX_CAVE_TREASURES);
        let items: Vec<Treasure> = (0..count)
            .map(|_| Treasure::ALL[rng.gen_range(0..Treasure::ALL.len())])
            .collect();

        if let NodeKind::Cave { treasures, .. } = &mut self.kind {
            *treasures = items;
        }
        Ok(())
    }

    /// Adds `count` items of `treasure` to this cave.
    pub fn add_treasure(&mut self, treasure: Treasure, count: usize) -> WarrenResult<()> {
        if count == 0 {
            return Err(WarrenError::Validation(format!(
                "cannot place 0 {}",
                treasure.plural()
            )));
        }

        match &mut self.kind {
            NodeKind::Cave { treasures, .. } => {
                treasures.extend(std::iter::repeat(treasure).take(count));
                Ok(())
            }
            _ => Err(WarrenError::Capability(format!(
                "cannot place treasure in a {}",
                self.kind_name()
            ))),
        }
    }

    /// Removes one item of `treasure` from this cave.
    pub fn remove_treasure(&mut self, treasure: Treasure) -> WarrenResult<()> {
        let kind_name = self.kind_name();
        match &mut self.kind {
            NodeKind::Cave { treasures, .. } => {
                if treasures.is_empty() {
                    return Err(WarrenError::State(
                        "cannot pick treasure from an empty treasure box".to_string(),
                    ));
                }

                match treasures.iter().position(|t| *t == treasure) {
                    Some(idx) => {
                        treasures.remove(idx);
                        Ok(())
                    }
                    None => Err(WarrenError::State(format!(
                        "no {} in this treasure box",
                        treasure.singular()
                    ))),
                }
            }
            _ => Err(WarrenError::Capability(format!(
                "a {} holds no treasure",
                kind_name
            ))),
        }
    }

    /// Treasure items in this cave, in placement order.
    pub fn treasures(&self) -> WarrenResult<Vec<Treasure>> {
        match &self.kind {
            NodeKind::Cave { treasures, .. } => Ok(treasures.clone()),
            _ => Err(WarrenError::Capability(format!(
                "a {} holds no treasure",
                self.kind_name()
            ))),
        }
    }

    // ---- arrows (caves and tunnels) -------------------------------------

    fn check_holds_arrows(&self) -> WarrenResult<()> {
        if self.is_generic() {
            return Err(WarrenError::Capability(
                "a generic node cannot hold arrows".to_string(),
            ));
        }
        Ok(())
    }

    /// Stocks this node with 1..=4 arrows, replacing the current count.
    pub fn place_random_arrows(&mut self, rng: &mut StdRng) -> WarrenResult<()> {
        self.check_holds_arrows()?;
        self.arrows = rng.gen_range(1..=MAX_NODE_ARROWS);
        Ok(())
    }

    /// Drops a single (spent) arrow in this node. The count saturates
    /// rather than wrapping, so a node can absorb any number of misses.
    pub fn add_arrow(&mut self) -> WarrenResult<()> {
        self.check_holds_arrows()?;
        self.arrows = self.arrows.saturating_add(1);
        Ok(())
    }

    /// Removes a single arrow from this node.
    pub fn remove_arrow(&mut self) -> WarrenResult<()> {
        self.check_holds_arrows()?;
        if self.arrows == 0 {
            return Err(WarrenError::State("no arrows to pick up here".to_string()));
        }
        self.arrows -= 1;
        Ok(())
    }

    /// Number of arrows lying in this node.
    pub fn arrows(&self) -> u8 {
        self.arrows
    }

    // ---- lurker (caves only) --------------------------------------------

    /// Places a lurker in this cave. At most one may be present.
    pub fn place_lurker(&mut self, new: Lurker) -> WarrenResult<()> {
        let kind_name = self.kind_name();
        match &mut self.kind {
            NodeKind::Cave { lurker, .. } => {
                if lurker.is_some() {
                    return Err(WarrenError::State(
                        "another lurker already haunts this cave".to_string(),
                    ));
                }
                *lurker = Some(new);
                Ok(())
            }
            _ => Err(WarrenError::Capability(format!(
                "a {} cannot hold a lurker",
                kind_name
            ))),
        }
    }

    /// Removes the lurker from this cave.
    pub fn remove_lurker(&mut self) -> WarrenResult<Lurker> {
        let kind_name = self.kind_name();
        match &mut self.kind {
            NodeKind::Cave { lurker, .. } => lurker
                .take()
                .ok_or_else(|| WarrenError::State("no lurker to remove".to_string())),
            _ => Err(WarrenError::Capability(format!(
                "a {} cannot hold a lurker",
                kind_name
            ))),
        }
    }

    /// The lurker in this node, if it is a cave with one present.
    pub fn lurker(&self) -> Option<&Lurker> {
        match &self.kind {
            NodeKind::Cave { lurker, .. } => lurker.as_ref(),
            _ => None,
        }
    }

    /// Mutable access to the lurker, if present.
    pub(crate) fn lurker_mut(&mut self) -> Option<&mut Lurker> {
        match &mut self.kind {
            NodeKind::Cave { lurker, .. } => lurker.as_mut(),
            _ => None,
        }
    }

    // ---- hazards (caves only) -------------------------------------------

    /// Marks this cave as the thief's hideout.
    pub fn place_thief(&mut self) -> WarrenResult<()> {
        let kind_name = self.kind_name();
        match &mut self.kind {
            NodeKind::Cave { has_thief, .. } => {
                *has_thief = true;
                Ok(())
            }
            _ => Err(WarrenError::Capability(format!(
                "a {} cannot hide a thief",
                kind_name
            ))),
        }
    }

    /// Digs a pit into this cave's floor.
    pub fn add_pit(&mut self) -> WarrenResult<()> {
        let kind_name = self.kind_name();
        match &mut self.kind {
            NodeKind::Cave { has_pit, .. } => {
                *has_pit = true;
                Ok(())
            }
            _ => Err(WarrenError::Capability(format!(
                "a {} cannot have a pit",
                kind_name
            ))),
        }
    }

    /// Whether a thief waits in this node.
    pub fn has_thief(&self) -> bool {
        matches!(self.kind, NodeKind::Cave { has_thief: true, .. })
    }

    /// Whether this node's floor hides a pit.
    pub fn has_pit(&self) -> bool {
        matches!(self.kind, NodeKind::Cave { has_pit: true, .. })
    }

    // ---- stalker occupancy ----------------------------------------------

    /// Whether the stalker currently occupies this node.
    pub fn has_stalker(&self) -> bool {
        self.has_stalker
    }

    /// Updates the stalker occupancy flag (caves and tunnels only).
    pub fn set_stalker(&mut self, present: bool) -> WarrenResult<()> {
        if self.is_generic() {
            return Err(WarrenError::Capability(
                "a generic node cannot hold a stalker".to_string(),
            ));
        }
        self.has_stalker = present;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn cave_at(row: usize, col: usize) -> Node {
        let mut node = Node::new(format!("{}", row * 4 + col + 1), Position::new(row, col));
        node.cast_to_cave().unwrap();
        node
    }

    #[test]
    fn test_self_link_rejected() {
        let mut node = Node::new("1", Position::new(0, 0));
        let err = node.set_link(Direction::North, Position::new(0, 0));
        assert!(matches!(err, Err(WarrenError::Validation(_))));
    }

    #[test]
    fn test_links_and_degree() {
        let mut node = Node::new("1", Position::new(0, 0));
        node.set_link(Direction::East, Position::new(0, 1)).unwrap();
        node.set_link(Direction::South, Position::new(1, 0)).unwrap();

        assert_eq!(node.degree(), 2);
        assert_eq!(node.link(Direction::East), Some(Position::new(0, 1)));
        assert_eq!(node.link(Direction::North), None);
        assert_eq!(
            node.open_directions(),
            vec![Direction::South, Direction::East]
        );
        assert_eq!(
            node.direction_to(Position::new(1, 0)),
            Some(Direction::South)
        );

        node.clear_link(Direction::East);
        assert_eq!(node.degree(), 1);
    }

    #[test]
    fn test_cast_exactly_once() {
        let mut node = Node::new("1", Position::new(0, 0));
        assert!(node.is_generic());

        node.cast_to_cave().unwrap();
        assert!(node.is_cave());
        assert!(node.cast_to_cave().is_err());
        assert!(node.cast_to_tunnel().is_err());
    }

    #[test]
    fn test_treasure_in_cave() {
        let mut cave = cave_at(0, 0);
        cave.add_treasure(Treasure::Ruby, 2).unwrap();
        cave.add_treasure(Treasure::Diamond, 1).unwrap();
        assert_eq!(
            cave.treasures().unwrap(),
            vec![Treasure::Ruby, Treasure::Ruby, Treasure::Diamond]
        );

        cave.remove_treasure(Treasure::Ruby).unwrap();
        assert_eq!(cave.treasures().unwrap().len(), 2);

        // Kind not present.
        assert!(matches!(
            cave.remove_treasure(Treasure::Sapphire),
            Err(WarrenError::State(_))
        ));
    }

    #[test]
    fn test_treasure_capability_errors() {
        let mut tunnel = Node::new("2", Position::new(0, 1));
        tunnel.cast_to_tunnel().unwrap();

        assert!(matches!(
            tunnel.add_treasure(Treasure::Ruby, 1),
            Err(WarrenError::Capability(_))
        ));
        assert!(matches!(tunnel.treasures(), Err(WarrenError::Capability(_))));

        let mut generic = Node::new("3", Position::new(0, 2));
        assert!(matches!(
            generic.add_treasure(Treasure::Ruby, 1),
            Err(WarrenError::Capability(_))
        ));
    }

    #[test]
    fn test_zero_count_treasure_is_validation_error() {
        let mut cave = cave_at(0, 0);
        assert!(matches!(
            cave.add_treasure(Treasure::Ruby, 0),
            Err(WarrenError::Validation(_))
        ));
    }

    #[test]
    fn test_random_treasure_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let mut cave = cave_at(0, 0);
            cave.place_random_treasure(&mut rng).unwrap();
            let n = cave.treasures().unwrap().len();
            assert!((1..=4).contains(&n));
        }
    }

    #[test]
    fn test_arrows_in_caves_and_tunnels() {
        let mut rng = StdRng::seed_from_u64(3);

        let mut tunnel = Node::new("2", Position::new(0, 1));
        tunnel.cast_to_tunnel().unwrap();
        tunnel.place_random_arrows(&mut rng).unwrap();
        assert!((1..=4).contains(&tunnel.arrows()));

        let before = tunnel.arrows();
        tunnel.add_arrow().unwrap();
        assert_eq!(tunnel.arrows(), before + 1);

        let mut generic = Node::new("3", Position::new(0, 2));
        assert!(matches!(
            generic.add_arrow(),
            Err(WarrenError::Capability(_))
        ));
    }

    #[test]
    fn test_arrow_counter_saturates() {
        let mut cave = cave_at(0, 0);
        for _ in 0..300 {
            cave.add_arrow().unwrap();
        }
        assert_eq!(cave.arrows(), u8::MAX);

        // Draining still works one arrow at a time.
        cave.remove_arrow().unwrap();
        assert_eq!(cave.arrows(), u8::MAX - 1);
    }

    #[test]
    fn test_remove_arrow_when_empty() {
        let mut cave = cave_at(0, 0);
        assert!(matches!(cave.remove_arrow(), Err(WarrenError::State(_))));
    }

    #[test]
    fn test_lurker_placement_rules() {
        let mut cave = cave_at(0, 0);
        cave.place_lurker(Lurker::new()).unwrap();
        assert!(cave.lurker().is_some());

        // Only one lurker per cave.
        assert!(matches!(
            cave.place_lurker(Lurker::new()),
            Err(WarrenError::State(_))
        ));

        cave.remove_lurker().unwrap();
        assert!(cave.lurker().is_none());
        assert!(matches!(cave.remove_lurker(), Err(WarrenError::State(_))));

        let mut tunnel = Node::new("2", Position::new(0, 1));
        tunnel.cast_to_tunnel().unwrap();
        assert!(matches!(
            tunnel.place_lurker(Lurker::new()),
            Err(WarrenError::Capability(_))
        ));
    }

    #[test]
    fn test_thief_and_pit_cave_only() {
        let mut cave = cave_at(0, 0);
        cave.place_thief().unwrap();
        cave.add_pit().unwrap();
        assert!(cave.has_thief());
        assert!(cave.has_pit());

        let mut tunnel = Node::new("2", Position::new(0, 1));
        tunnel.cast_to_tunnel().unwrap();
        assert!(matches!(
            tunnel.place_thief(),
            Err(WarrenError::Capability(_))
        ));
        assert!(matches!(tunnel.add_pit(), Err(WarrenError::Capability(_))));
        assert!(!tunnel.has_thief());
    }

    #[test]
    fn test_clone_is_detached_and_equal() {
        let mut cave = cave_at(1, 1);
        cave.add_treasure(Treasure::Sapphire, 2).unwrap();
        cave.set_link(Direction::North, Position::new(0, 1)).unwrap();

        let copy1 = cave.clone();
        let copy2 = cave.clone();
        assert_eq!(copy1, copy2);

        // Mutating a copy leaves the original untouched.
        let mut copy3 = cave.clone();
        copy3.remove_treasure(Treasure::Sapphire).unwrap();
        assert_eq!(cave.treasures().unwrap().len(), 2);
    }
}
