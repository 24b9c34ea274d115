//! Routing graph built from road tiles
//!
//! Every road segment of a tile owns an entry and an exit node. Entries lead
//! into the tile's other exits, exits bridge into the neighboring tile's
//! entry, and dead ends loop back on themselves so vehicles can turn around.

use log::debug;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::graph::{DirectedGraph, GraphError};
use super::tile_matrix::{Neighbors, TileType};
use super::types::{Direction, NodeId, Position};

/// Whether traffic flows into or out of a tile at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Entry,
    Exit,
}

/// A routing-graph vertex
#[derive(Debug, Clone, PartialEq)]
pub struct TravelNode {
    pub id: NodeId,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub role: NodeRole,
    pub position: Position,
    /// Cleared when the segment owning this node disappears
    pub live: bool,
}

/// World position of a node: a third of a tile out from the center along
/// its segment, an eighth of a tile to the side for its lane
pub fn node_position(
    row: usize,
    col: usize,
    direction: Direction,
    role: NodeRole,
    tile_size: f32,
) -> Position {
    let center = Position::new(
        col as f32 * tile_size + tile_size / 2.0,
        row as f32 * tile_size + tile_size / 2.0,
    );
    let outward = direction.unit();
    // Left-hand normal of the outward direction, in y-down coordinates
    let left = Position::new(outward.y, -outward.x);
    let lane = match role {
        NodeRole::Entry => left.scale(tile_size / 8.0),
        NodeRole::Exit => left.scale(-tile_size / 8.0),
    };
    let along = outward.scale(tile_size / 3.0);
    center.offset(along.x + lane.x, along.y + lane.y)
}

/// Entry/exit node pair of one road segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub entry: NodeId,
    pub exit: NodeId,
}

/// All segment nodes of a single tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelIntersection {
    pub row: usize,
    pub col: usize,
    segments: [Option<Segment>; 4],
    /// An isolated tile whose single stub is looped both ways
    isolated: bool,
}

impl TravelIntersection {
    fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            segments: [None; 4],
            isolated: false,
        }
    }

    pub fn segment(&self, direction: Direction) -> Option<Segment> {
        self.segments[direction.index()]
    }

    pub fn segment_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.segments[d.index()].is_some())
            .collect()
    }

    pub fn segments(&self) -> impl Iterator<Item = (Direction, Segment)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.segments[d.index()].map(|s| (d, s)))
    }

    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.segments().map(|(_, s)| s.entry).collect()
    }

    pub fn exit_nodes(&self) -> Vec<NodeId> {
        self.segments().map(|(_, s)| s.exit).collect()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.iter().flatten().count()
    }
}

/// Routing graph over all road tiles
#[derive(Debug, Clone)]
pub struct SimRoadNetwork {
    graph: DirectedGraph,

    /// Node arena; a node's id is its index
    nodes: Vec<TravelNode>,

    /// Tile intersections by packed cell key
    intersections: Vec<Option<TravelIntersection>>,

    cols: usize,
    tile_size: f32,
}

impl SimRoadNetwork {
    pub fn new(rows: usize, cols: usize, tile_size: f32) -> Self {
        Self {
            graph: DirectedGraph::new(),
            nodes: Vec::new(),
            intersections: vec![None; rows * cols],
            cols,
            tile_size,
        }
    }

    fn key(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn graph(&self) -> &DirectedGraph {
        &self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&TravelNode> {
        self.nodes.get(id.0)
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.live)
    }

    pub fn live_nodes(&self) -> impl Iterator<Item = &TravelNode> + '_ {
        self.nodes.iter().filter(|n| n.live)
    }

    pub fn live_node_count(&self) -> usize {
        self.live_nodes().count()
    }

    /// Routing nodes of a cell; `None` for empty or off-grid cells
    pub fn intersection(&self, row: usize, col: usize) -> Option<&TravelIntersection> {
        if col >= self.cols {
            return None;
        }
        // Rows past the grid land past the end of the table
        self.intersections.get(self.key(row, col))?.as_ref()
    }

    /// Shortest path between two nodes, both included
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.graph.shortest_path(from, to)
    }

    /// A live node reachable from `start`, chosen uniformly
    pub fn random_node_along_path<R: Rng + ?Sized>(
        &self,
        start: NodeId,
        rng: &mut R,
    ) -> Result<Option<NodeId>, GraphError> {
        let reachable = self.graph.reachable_from(start)?;
        let candidates: Vec<NodeId> = reachable
            .iter()
            .copied()
            .filter(|id| self.is_live(*id))
            .collect();
        Ok(candidates.choose(rng).copied())
    }

    /// Any live node, chosen uniformly
    pub fn random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NodeId> {
        let live: Vec<NodeId> = self.live_nodes().map(|n| n.id).collect();
        live.choose(rng).copied()
    }

    /// The most recently created live node
    pub fn newest_node(&self) -> Option<NodeId> {
        self.nodes.iter().rev().find(|n| n.live).map(|n| n.id)
    }

    /// Live node closest to a world position
    pub fn nearest_live_node(&self, position: &Position) -> Option<NodeId> {
        self.live_nodes()
            .min_by_key(|n| OrderedFloat(n.position.distance(position)))
            .map(|n| n.id)
    }

    /// Edges as `(source, target)` pairs, for debug overlays
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph.serialize_edges()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn create_node(&mut self, row: usize, col: usize, direction: Direction, role: NodeRole) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TravelNode {
            id,
            row,
            col,
            direction,
            role,
            position: node_position(row, col, direction, role, self.tile_size),
            live: true,
        });
        id
    }

    fn retire_node(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.live = false;
        }
        self.graph.remove_node(id);
    }

    /// Remove every edge that stays inside an intersection
    fn clear_intraconnections(&mut self, insct: &TravelIntersection) {
        for entry in insct.entry_nodes() {
            for exit in insct.exit_nodes() {
                self.graph.remove_edge(entry, exit);
                self.graph.remove_edge(exit, entry);
            }
        }
    }

    /// Wire entries to exits inside an intersection.
    ///
    /// Dead ends get a U-turn edge; an isolated tile is looped both ways.
    /// Otherwise every entry feeds every exit of a different segment.
    fn intraconnect(&mut self, insct: &TravelIntersection) {
        let segments: Vec<(Direction, Segment)> = insct.segments().collect();
        if let [(_, segment)] = segments.as_slice() {
            self.graph.add_edge(segment.entry, segment.exit);
            if insct.isolated {
                self.graph.add_edge(segment.exit, segment.entry);
            }
            return;
        }

        for (entry_dir, entry) in &segments {
            for (exit_dir, exit) in &segments {
                if entry_dir != exit_dir {
                    self.graph.add_edge(entry.entry, exit.exit);
                }
            }
        }
    }

    /// Bring a tile's segments in line with its shape and rewire its interior
    fn sync_intersection(&mut self, row: usize, col: usize, tile_type: TileType) {
        let key = self.key(row, col);
        let mut insct = self.intersections[key]
            .take()
            .unwrap_or_else(|| TravelIntersection::new(row, col));

        self.clear_intraconnections(&insct);

        let wanted = tile_type.segment_directions();
        for direction in Direction::ALL {
            let present = insct.segments[direction.index()];
            match (present, wanted.contains(&direction)) {
                (Some(segment), false) => {
                    self.retire_node(segment.entry);
                    self.retire_node(segment.exit);
                    insct.segments[direction.index()] = None;
                }
                (None, true) => {
                    let exit = self.create_node(row, col, direction, NodeRole::Exit);
                    let entry = self.create_node(row, col, direction, NodeRole::Entry);
                    insct.segments[direction.index()] = Some(Segment { entry, exit });
                }
                _ => {}
            }
        }
        insct.isolated = tile_type == TileType::Alone;

        self.intraconnect(&insct);
        self.intersections[key] = Some(insct);
    }

    /// Add the routing nodes of a freshly placed tile and bridge them to its neighbors
    pub fn register_intersection(
        &mut self,
        row: usize,
        col: usize,
        tile_type: TileType,
        neighbors: &Neighbors,
    ) {
        self.sync_intersection(row, col, tile_type);

        for (_, neighbor) in neighbors.iter() {
            self.sync_intersection(neighbor.row, neighbor.col, neighbor.tile_type);
        }

        for (direction, neighbor) in neighbors.iter() {
            self.bridge(row, col, direction, neighbor.row, neighbor.col, true);
        }

        debug!(
            "Registered {:?} tile at ({}, {}) with {} neighbors",
            tile_type,
            row,
            col,
            neighbors.len()
        );
    }

    /// Disconnect and retire the routing nodes of a tile being removed.
    /// `neighbors` must carry the neighbors' shapes after the removal.
    pub fn unregister_intersection(&mut self, row: usize, col: usize, neighbors: &Neighbors) {
        for (direction, neighbor) in neighbors.iter() {
            self.bridge(row, col, direction, neighbor.row, neighbor.col, false);
        }

        let key = self.key(row, col);
        if let Some(insct) = self.intersections[key].take() {
            for (_, segment) in insct.segments() {
                self.retire_node(segment.entry);
                self.retire_node(segment.exit);
            }
        }

        for (_, neighbor) in neighbors.iter() {
            self.sync_intersection(neighbor.row, neighbor.col, neighbor.tile_type);
        }

        debug!("Unregistered tile at ({}, {})", row, col);
    }

    /// Add or remove the two edges joining facing segments of adjacent tiles
    fn bridge(
        &mut self,
        row: usize,
        col: usize,
        direction: Direction,
        n_row: usize,
        n_col: usize,
        connect: bool,
    ) {
        let own = self
            .intersection(row, col)
            .and_then(|i| i.segment(direction));
        let theirs = self
            .intersection(n_row, n_col)
            .and_then(|i| i.segment(direction.opposite()));

        if let (Some(own), Some(theirs)) = (own, theirs) {
            if connect {
                self.graph.add_edge(own.exit, theirs.entry);
                self.graph.add_edge(theirs.exit, own.entry);
            } else {
                self.graph.remove_edge(own.exit, theirs.entry);
                self.graph.remove_edge(theirs.exit, own.entry);
            }
        }
    }
}
