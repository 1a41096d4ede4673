//! # Grid Module
//!
//! The index-addressed arena holding every node of a dungeon. All adjacency
//! is expressed as `Position` coordinates into this arena, which keeps the
//! cyclic neighbor graph free of reference cycles and makes deep snapshots a
//! plain `clone()`.
//!
//! The grid also owns the graph-wide queries: BFS shortest-path distance
//! (used for start/end viability and win checks), the exact-distance lurker
//! census behind smell annotations, room descriptions, and the structural
//! invariant validation run after construction.

use crate::config::MIN_ROWS_COLS;
use crate::game::node::Node;
use crate::game::{Direction, Position, Treasure};
use crate::{WarrenError, WarrenResult};
use pathfinding::prelude::bfs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Smell radius: lurkers further than this are imperceptible.
const MAX_SMELL_DISTANCE: u32 = 2;

/// A rows x cols arena of dungeon nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    wrapping: bool,
    nodes: Vec<Node>,
}

impl Grid {
    /// Builds a fully wired grid of generic nodes.
    ///
    /// Every cell is linked to its four neighbors; border cells reach across
    /// to the opposite edge only when `wrapping` is enabled. Node names are
    /// the 1-based row-major counter the rest of the system keys on.
    pub fn new(rows: usize, cols: usize, wrapping: bool) -> WarrenResult<Self> {
        if rows < MIN_ROWS_COLS {
            return Err(WarrenError::Generation(format!(
                "minimum number of rows allowed is {}",
                MIN_ROWS_COLS
            )));
        }
        if cols < MIN_ROWS_COLS {
            return Err(WarrenError::Generation(format!(
                "minimum number of columns allowed is {}",
                MIN_ROWS_COLS
            )));
        }

        let mut nodes = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let name = (row * cols + col + 1).to_string();
                nodes.push(Node::new(name, Position::new(row, col)));
            }
        }

        let mut grid = Self {
            rows,
            cols,
            wrapping,
            nodes,
        };
        grid.wire_adjacency()?;
        Ok(grid)
    }

    /// Assembles a grid from externally built nodes (deterministic tests).
    ///
    /// The nodes must form a `rows * cols` row-major arena; structural
    /// invariants are checked later by [`Grid::validate`].
    pub fn from_nodes(
        rows: usize,
        cols: usize,
        wrapping: bool,
        nodes: Vec<Node>,
    ) -> WarrenResult<Self> {
        if nodes.len() != rows * cols {
            return Err(WarrenError::Validation(format!(
                "expected {} nodes for a {}x{} grid, got {}",
                rows * cols,
                rows,
                cols,
                nodes.len()
            )));
        }

        Ok(Self {
            rows,
            cols,
            wrapping,
            nodes,
        })
    }

    fn wire_adjacency(&mut self) -> WarrenResult<()> {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let pos = Position::new(row, col);

                if self.wrapping || row > 0 {
                    let north = Position::new((row + self.rows - 1) % self.rows, col);
                    self.node_mut(pos)?.set_link(Direction::North, north)?;
                }
                if self.wrapping || row + 1 < self.rows {
                    let south = Position::new((row + 1) % self.rows, col);
                    self.node_mut(pos)?.set_link(Direction::South, south)?;
                }
                if self.wrapping || col > 0 {
                    let west = Position::new(row, (col + self.cols - 1) % self.cols);
                    self.node_mut(pos)?.set_link(Direction::West, west)?;
                }
                if self.wrapping || col + 1 < self.cols {
                    let east = Position::new(row, (col + 1) % self.cols);
                    self.node_mut(pos)?.set_link(Direction::East, east)?;
                }
            }
        }

        Ok(())
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether border cells wrap to the opposite edge.
    pub fn is_wrapping(&self) -> bool {
        self.wrapping
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed grid; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn flat_index(&self, pos: Position) -> WarrenResult<usize> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return Err(WarrenError::Validation(format!(
                "position {} outside {}x{} grid",
                pos, self.rows, self.cols
            )));
        }
        Ok(pos.row * self.cols + pos.col)
    }

    /// The node at `pos`.
    pub fn node(&self, pos: Position) -> WarrenResult<&Node> {
        let idx = self.flat_index(pos)?;
        Ok(&self.nodes[idx])
    }

    /// Mutable access to the node at `pos`.
    pub fn node_mut(&mut self, pos: Position) -> WarrenResult<&mut Node> {
        let idx = self.flat_index(pos)?;
        Ok(&mut self.nodes[idx])
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }

    /// Read-only view of all nodes in row-major order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Finds the position of the node with the given name.
    pub fn find_by_name(&self, name: &str) -> WarrenResult<Position> {
        self.nodes
            .iter()
            .find(|n| n.name() == name)
            .map(|n| n.position())
            .ok_or_else(|| {
                WarrenError::Validation(format!("node with name {} not found in the grid", name))
            })
    }

    // ---- edge bookkeeping ------------------------------------------------

    /// Every undirected edge exactly once, in deterministic row-major order.
    pub fn undirected_edges(&self) -> Vec<(Position, Position)> {
        let mut edges: Vec<(Position, Position)> = Vec::new();
        for node in &self.nodes {
            for dir in Direction::ALL {
                if let Some(neighbor) = node.link(dir) {
                    let a = node.position().min(neighbor);
                    let b = node.position().max(neighbor);
                    edges.push((a, b));
                }
            }
        }
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Live undirected edge count.
    pub fn edge_count(&self) -> usize {
        self.undirected_edges().len()
    }

    /// Removes the undirected edge between two adjacent nodes.
    pub fn unlink(&mut self, a: Position, b: Position) -> WarrenResult<()> {
        let dir = self.node(a)?.direction_to(b).ok_or_else(|| {
            WarrenError::State(format!("nodes {} and {} are not connected", a, b))
        })?;

        self.node_mut(a)?.clear_link(dir);
        self.node_mut(b)?.clear_link(dir.reverse());
        Ok(())
    }

    /// Restores an undirected edge: `a --dir--> b` and the reverse link.
    pub fn link(&mut self, a: Position, dir: Direction, b: Position) -> WarrenResult<()> {
        self.node_mut(a)?.set_link(dir, b)?;
        self.node_mut(b)?.set_link(dir.reverse(), a)?;
        Ok(())
    }

    // ---- graph queries ---------------------------------------------------

    fn open_neighbors(&self, pos: Position) -> Vec<Position> {
        match self.node(pos) {
            Ok(node) => Direction::ALL.into_iter().filter_map(|d| node.link(d)).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// BFS shortest-path distance between two nodes, if connected.
    pub fn shortest_distance(&self, from: Position, to: Position) -> Option<u32> {
        let path = bfs(&from, |p| self.open_neighbors(*p), |p| *p == to)?;
        Some((path.len() - 1) as u32)
    }

    /// Counts lurker-occupied caves at exactly `distance` steps from `from`.
    ///
    /// Distance 0 (the node itself) is never counted; smell comes from
    /// neighboring caves, not the one the player stands in.
    pub fn lurkers_at_exact_distance(&self, from: Position, distance: u32) -> usize {
        let mut distances: HashMap<Position, u32> = HashMap::new();
        let mut queue = VecDeque::new();
        distances.insert(from, 0);
        queue.push_back(from);

        let mut count = 0;
        while let Some(current) = queue.pop_front() {
            let d = distances[&current];
            if d >= distance {
                continue;
            }

            for neighbor in self.open_neighbors(current) {
                if distances.contains_key(&neighbor) {
                    continue;
                }
                distances.insert(neighbor, d + 1);

                if d + 1 == distance {
                    if let Ok(node) = self.node(neighbor) {
                        if node.lurker().is_some() {
                            count += 1;
                        }
                    }
                } else {
                    queue.push_back(neighbor);
                }
            }
        }

        count
    }

    /// Whether at least one cave holds treasure.
    pub fn has_treasure_cave(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.treasures().map(|t| !t.is_empty()).unwrap_or(false))
    }

    // ---- descriptions ----------------------------------------------------

    /// Human-readable description of the room at `pos`.
    ///
    /// Lists the room kind, open directions, treasure (pluralized), lying
    /// arrows, and the smell annotation derived from nearby lurkers. Fails
    /// on generic nodes, disconnected nodes, and kind/degree mismatches
    /// (the latter should be unreachable after generation).
    pub fn room_description(&self, pos: Position) -> WarrenResult<String> {
        let node = self.node(pos)?;

        if node.is_generic() {
            return Err(WarrenError::Capability(
                "cannot describe a generic node".to_string(),
            ));
        }

        let degree = node.degree();
        if degree == 0 {
            return Err(WarrenError::State(format!(
                "node {} is disconnected, there are no openings on any side",
                node.name()
            )));
        }
        if node.is_cave() && !matches!(degree, 1 | 3 | 4) {
            return Err(WarrenError::State(format!(
                "cave {} has {} openings, expected 1, 3, or 4",
                node.name(),
                degree
            )));
        }
        if node.is_tunnel() && degree != 2 {
            return Err(WarrenError::State(format!(
                "tunnel {} has {} openings, expected exactly 2",
                node.name(),
                degree
            )));
        }

        let mut out = String::new();
        if node.is_cave() {
            out.push_str("You are in a cave\nDoors lead to the ");
        } else {
            out.push_str("You are in a tunnel\nthat continues to the ");
        }

        let compass: Vec<&str> = [
            (Direction::North, "N"),
            (Direction::East, "E"),
            (Direction::South, "S"),
            (Direction::West, "W"),
        ]
        .iter()
        .filter(|(d, _)| node.link(*d).is_some())
        .map(|(_, label)| *label)
        .collect();
        out.push_str(&compass.join(", "));

        if let Ok(treasures) = node.treasures() {
            for kind in Treasure::ALL {
                let count = treasures.iter().filter(|t| **t == kind).count();
                if count > 0 {
                    out.push_str(&format!(
                        "\nYou find {} {} here",
                        count,
                        kind.pluralized(count)
                    ));
                }
            }
        }

        match node.arrows() {
            0 => {}
            1 => out.push_str("\nYou find 1 arrow here"),
            n => out.push_str(&format!("\nYou find {} arrows here", n)),
        }

        if let Some(smell) = self.smell_at(pos) {
            out.push('\n');
            out.push_str(smell);
        }

        Ok(out)
    }

    /// Smell annotation at `pos`, if any lurker is close enough.
    pub fn smell_at(&self, pos: Position) -> Option<&'static str> {
        if self.lurkers_at_exact_distance(pos, 1) >= 1 {
            return Some("You smell a strong pungent smell");
        }

        match self.lurkers_at_exact_distance(pos, MAX_SMELL_DISTANCE) {
            0 => None,
            1 => Some("You smell a pungent smell"),
            _ => Some("You smell a strong pungent smell"),
        }
    }

    // ---- invariants ------------------------------------------------------

    /// Checks the structural invariants every finished dungeon grid holds:
    /// minimum size, every node in the slot matching its coordinate, no
    /// uncast nodes, degree/kind agreement, mutual links, and a single
    /// connected component.
    pub fn validate(&self) -> WarrenResult<()> {
        if self.rows < MIN_ROWS_COLS {
            return Err(WarrenError::Generation(format!(
                "minimum number of rows allowed is {}",
                MIN_ROWS_COLS
            )));
        }
        if self.cols < MIN_ROWS_COLS {
            return Err(WarrenError::Generation(format!(
                "minimum number of columns allowed is {}",
                MIN_ROWS_COLS
            )));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let slot = Position::new(idx / self.cols, idx % self.cols);
            if node.position() != slot {
                return Err(WarrenError::Generation(format!(
                    "node {} sits in slot {} but claims position {}",
                    node.name(),
                    slot,
                    node.position()
                )));
            }

            let degree = node.degree();
            if node.is_generic() {
                return Err(WarrenError::Generation(format!(
                    "node {} was never cast to a cave or tunnel",
                    node.name()
                )));
            }
            if node.is_cave() && !matches!(degree, 1 | 3 | 4) {
                return Err(WarrenError::Generation(format!(
                    "cave {} has {} openings, a cave can have 1, 3, or 4",
                    node.name(),
                    degree
                )));
            }
            if node.is_tunnel() && degree != 2 {
                return Err(WarrenError::Generation(format!(
                    "tunnel {} has {} openings, a tunnel has exactly 2",
                    node.name(),
                    degree
                )));
            }

            // Links must be mutual.
            for dir in Direction::ALL {
                if let Some(neighbor) = node.link(dir) {
                    let back = self.node(neighbor)?.link(dir.reverse());
                    if back != Some(node.position()) {
                        return Err(WarrenError::Generation(format!(
                            "edge {} -> {} is not mutual",
                            node.name(),
                            neighbor
                        )));
                    }
                }
            }
        }

        // Single connected component.
        let origin = Position::new(0, 0);
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(origin);
        queue.push_back(origin);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.open_neighbors(current) {
                if seen.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(WarrenError::Generation(format!(
                "grid is not connected: reached {} of {} nodes",
                seen.len(),
                self.nodes.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::monster::Lurker;

    #[test]
    fn test_grid_too_small() {
        assert!(matches!(
            Grid::new(3, 5, false),
            Err(WarrenError::Generation(_))
        ));
        assert!(matches!(
            Grid::new(5, 3, false),
            Err(WarrenError::Generation(_))
        ));
    }

    #[test]
    fn test_nonwrapping_adjacency() {
        let grid = Grid::new(4, 4, false).unwrap();

        let corner = grid.node(Position::new(0, 0)).unwrap();
        assert_eq!(corner.degree(), 2);
        assert_eq!(corner.link(Direction::North), None);
        assert_eq!(corner.link(Direction::West), None);
        assert_eq!(corner.link(Direction::East), Some(Position::new(0, 1)));
        assert_eq!(corner.link(Direction::South), Some(Position::new(1, 0)));

        let center = grid.node(Position::new(1, 1)).unwrap();
        assert_eq!(center.degree(), 4);
    }

    #[test]
    fn test_wrapping_adjacency() {
        let grid = Grid::new(4, 5, true).unwrap();

        let corner = grid.node(Position::new(0, 0)).unwrap();
        assert_eq!(corner.degree(), 4);
        assert_eq!(corner.link(Direction::North), Some(Position::new(3, 0)));
        assert_eq!(corner.link(Direction::West), Some(Position::new(0, 4)));
    }

    #[test]
    fn test_node_names_are_row_major_counters() {
        let grid = Grid::new(4, 4, false).unwrap();
        assert_eq!(grid.node(Position::new(0, 0)).unwrap().name(), "1");
        assert_eq!(grid.node(Position::new(0, 3)).unwrap().name(), "4");
        assert_eq!(grid.node(Position::new(3, 3)).unwrap().name(), "16");
        assert_eq!(grid.find_by_name("7").unwrap(), Position::new(1, 2));
        assert!(grid.find_by_name("17").is_err());
    }

    #[test]
    fn test_undirected_edge_count() {
        // A full non-wrapping r x c lattice has r*(c-1) + c*(r-1) edges.
        let grid = Grid::new(4, 5, false).unwrap();
        assert_eq!(grid.edge_count(), 4 * 4 + 5 * 3);

        // A wrapping lattice has 2*r*c edges.
        let wrapped = Grid::new(4, 5, true).unwrap();
        assert_eq!(wrapped.edge_count(), 2 * 4 * 5);
    }

    #[test]
    fn test_unlink_and_relink() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        let a = Position::new(0, 0);
        let b = Position::new(0, 1);

        grid.unlink(a, b).unwrap();
        assert_eq!(grid.node(a).unwrap().link(Direction::East), None);
        assert_eq!(grid.node(b).unwrap().link(Direction::West), None);

        // Unlinking again is a state error.
        assert!(grid.unlink(a, b).is_err());

        grid.link(a, Direction::East, b).unwrap();
        assert_eq!(grid.node(a).unwrap().link(Direction::East), Some(b));
        assert_eq!(grid.node(b).unwrap().link(Direction::West), Some(a));
    }

    #[test]
    fn test_shortest_distance() {
        let grid = Grid::new(4, 4, false).unwrap();
        assert_eq!(
            grid.shortest_distance(Position::new(0, 0), Position::new(0, 0)),
            Some(0)
        );
        assert_eq!(
            grid.shortest_distance(Position::new(0, 0), Position::new(3, 3)),
            Some(6)
        );
    }

    #[test]
    fn test_shortest_distance_disconnected() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        // Cut the corner off completely.
        grid.unlink(Position::new(0, 0), Position::new(0, 1)).unwrap();
        grid.unlink(Position::new(0, 0), Position::new(1, 0)).unwrap();
        assert_eq!(
            grid.shortest_distance(Position::new(0, 0), Position::new(3, 3)),
            None
        );
    }

    fn cast_all_full_grid(grid: &mut Grid) {
        // On a full lattice every node has degree 2 (corners) or 3/4, so the
        // degree rule gives corners -> tunnel, everything else -> cave.
        for pos in grid.positions().collect::<Vec<_>>() {
            let degree = grid.node(pos).unwrap().degree();
            let node = grid.node_mut(pos).unwrap();
            if degree == 2 {
                node.cast_to_tunnel().unwrap();
            } else {
                node.cast_to_cave().unwrap();
            }
        }
    }

    #[test]
    fn test_smell_radius() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        cast_all_full_grid(&mut grid);

        // Lurker two steps east of (1, 1).
        grid.node_mut(Position::new(1, 3))
            .unwrap()
            .place_lurker(Lurker::new())
            .unwrap();

        assert_eq!(grid.smell_at(Position::new(1, 1)), Some("You smell a pungent smell"));
        assert_eq!(
            grid.smell_at(Position::new(1, 2)),
            Some("You smell a strong pungent smell")
        );
        assert_eq!(grid.smell_at(Position::new(1, 0)), None);

        // A second lurker within distance 2 upgrades the smell to strong.
        grid.node_mut(Position::new(3, 1))
            .unwrap()
            .place_lurker(Lurker::new())
            .unwrap();
        assert_eq!(
            grid.smell_at(Position::new(1, 1)),
            Some("You smell a strong pungent smell")
        );
    }

    #[test]
    fn test_description_contents() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        cast_all_full_grid(&mut grid);

        let pos = Position::new(1, 1);
        grid.node_mut(pos)
            .unwrap()
            .add_treasure(Treasure::Ruby, 2)
            .unwrap();
        grid.node_mut(pos).unwrap().add_arrow().unwrap();

        let description = grid.room_description(pos).unwrap();
        assert!(description.starts_with("You are in a cave\nDoors lead to the N, E, S, W"));
        assert!(description.contains("You find 2 rubies here"));
        assert!(description.contains("You find 1 arrow here"));
        assert!(!description.contains("smell"));
    }

    #[test]
    fn test_description_rejects_generic_and_disconnected() {
        let grid = Grid::new(4, 4, false).unwrap();
        // Still generic.
        assert!(matches!(
            grid.room_description(Position::new(0, 0)),
            Err(WarrenError::Capability(_))
        ));

        let mut grid = Grid::new(4, 4, false).unwrap();
        let pos = Position::new(0, 0);
        grid.unlink(pos, Position::new(0, 1)).unwrap();
        grid.unlink(pos, Position::new(1, 0)).unwrap();
        grid.node_mut(pos).unwrap().cast_to_cave().unwrap();
        assert!(matches!(
            grid.room_description(pos),
            Err(WarrenError::State(_))
        ));
    }

    #[test]
    fn test_validate_catches_degree_mismatch() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        // Cast a degree-4 center node to tunnel: invalid.
        for pos in grid.positions().collect::<Vec<_>>() {
            let degree = grid.node(pos).unwrap().degree();
            let node = grid.node_mut(pos).unwrap();
            if pos == Position::new(1, 1) {
                node.cast_to_tunnel().unwrap();
            } else if degree == 2 {
                node.cast_to_tunnel().unwrap();
            } else {
                node.cast_to_cave().unwrap();
            }
        }
        assert!(matches!(grid.validate(), Err(WarrenError::Generation(_))));
    }

    #[test]
    fn test_validate_full_cast_grid() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        cast_all_full_grid(&mut grid);
        grid.validate().unwrap();
    }

    #[test]
    fn test_validate_catches_transposed_nodes() {
        let mut grid = Grid::new(4, 4, false).unwrap();
        cast_all_full_grid(&mut grid);

        // Swap two arena slots without touching the nodes themselves; each
        // now claims a coordinate other than the one it sits in.
        let mut nodes = grid.nodes().to_vec();
        nodes.swap(5, 6);
        let shuffled = Grid::from_nodes(4, 4, false, nodes).unwrap();
        assert!(matches!(
            shuffled.validate(),
            Err(WarrenError::Generation(_))
        ));
    }
}
