//! Vehicle movement logic for the traffic simulation

use anyhow::{Context, Result};
use log::{debug, warn};
use rand::Rng;
use std::collections::VecDeque;

use super::collision::Rectangle;
use super::graph::GraphError;
use super::road_network::{NodeRole, SimRoadNetwork};
use super::tile_matrix::TileMatrix;
use super::types::{
    Direction, NodeId, Position, VehicleId, PROBE_FORWARD_OFFSET, PROBE_LENGTH, PROBE_WIDTH,
    VEHICLE_LENGTH, VEHICLE_WIDTH,
};

/// How many random destinations a vehicle tries before giving up for this tick
const MAX_PATH_ATTEMPTS: usize = 8;

/// Result of a vehicle update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    /// Vehicle keeps driving
    Continue,
    /// Vehicle stopped at an intersection entry and must be queued there
    ArrivedAtIntersection {
        row: usize,
        col: usize,
        direction: Direction,
    },
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    /// Speed in world units per second
    pub speed: f32,
    /// Hue in degrees, for renderers
    pub hue: u16,
    body: Rectangle,
    probe: Rectangle,
    /// Nodes still to visit, next target first
    path: VecDeque<NodeId>,
    /// Last node the vehicle actually reached
    prev_target: NodeId,
    pub waiting_at_intersection: bool,
}

impl SimVehicle {
    pub fn new(id: VehicleId, position: Position, start_node: NodeId, speed: f32, hue: u16) -> Self {
        Self {
            id,
            speed,
            hue,
            body: Rectangle::new(position, VEHICLE_LENGTH, VEHICLE_WIDTH, 0.0, Position::default()),
            probe: Rectangle::new(
                position,
                PROBE_LENGTH,
                PROBE_WIDTH,
                0.0,
                Position::new(PROBE_FORWARD_OFFSET, 0.0),
            ),
            path: VecDeque::new(),
            prev_target: start_node,
            waiting_at_intersection: false,
        }
    }

    pub fn position(&self) -> Position {
        self.body.center()
    }

    pub fn angle(&self) -> f32 {
        self.body.angle()
    }

    pub fn body(&self) -> &Rectangle {
        &self.body
    }

    pub fn probe(&self) -> &Rectangle {
        &self.probe
    }

    pub fn path(&self) -> &VecDeque<NodeId> {
        &self.path
    }

    pub fn prev_target(&self) -> NodeId {
        self.prev_target
    }

    pub fn set_path(&mut self, path: impl IntoIterator<Item = NodeId>) {
        self.path = path.into_iter().collect();
    }

    /// Whether this vehicle's probe touches another vehicle's body
    pub fn probe_hits(&self, other: &SimVehicle) -> bool {
        self.id != other.id && self.probe.collides_with(&other.body)
    }

    /// Shortest route from `start` to a random reachable live node.
    /// Unreachable picks are re-rolled a few times.
    fn random_path<R: Rng + ?Sized>(
        network: &SimRoadNetwork,
        start: NodeId,
        rng: &mut R,
    ) -> Option<Vec<NodeId>> {
        for _ in 0..MAX_PATH_ATTEMPTS {
            let target = match network.random_node_along_path(start, rng) {
                Ok(Some(target)) => target,
                Ok(None) => return None,
                Err(e) => {
                    debug!("Cannot route from {}: {}", start, e);
                    return None;
                }
            };

            match network.shortest_path(start, target) {
                Ok(path) => return Some(path),
                Err(GraphError::NoPath { .. }) => continue,
                Err(e) => {
                    debug!("Cannot route from {}: {}", start, e);
                    return None;
                }
            }
        }
        None
    }

    /// Pick a fresh destination starting from the last reached node
    pub fn set_random_path<R: Rng + ?Sized>(&mut self, network: &SimRoadNetwork, rng: &mut R) {
        match Self::random_path(network, self.prev_target, rng) {
            Some(path) => self.set_path(path),
            None => {
                warn!("Vehicle {:?} found no route from node {}", self.id, self.prev_target);
                self.path.clear();
            }
        }
    }

    /// Re-route after the road layout changed.
    ///
    /// Keeps heading for the current target when it still exists, falls back
    /// to the last reached node, and as a last resort re-anchors on the
    /// nearest live node.
    pub fn reset_random_path<R: Rng + ?Sized>(&mut self, network: &SimRoadNetwork, rng: &mut R) {
        if let Some(&target) = self.path.front() {
            if network.is_live(target) {
                if let Some(path) = Self::random_path(network, target, rng) {
                    self.set_path(path);
                    return;
                }
            }
        }

        let anchor = if network.is_live(self.prev_target) {
            Some(self.prev_target)
        } else {
            network.nearest_live_node(&self.position())
        };

        let Some(anchor) = anchor else {
            self.path.clear();
            return;
        };

        if anchor != self.prev_target {
            debug!("Vehicle {:?} re-anchored on node {}", self.id, anchor);
            self.prev_target = anchor;
        }

        match Self::random_path(network, anchor, rng) {
            Some(path) => self.set_path(path),
            None => self.set_path([anchor]),
        }
    }

    /// Drive straight at `target`, spending at most `budget` distance.
    /// Returns the unspent budget and whether the target was reached.
    fn move_towards(&mut self, budget: f32, target: Position) -> (f32, bool) {
        let current = self.body.center();
        let distance = current.distance(&target);

        if distance > 0.0 {
            let angle = current.angle_to(&target);
            self.body.rotate_to(angle);
            self.probe.rotate_to(angle);
        }

        if budget >= distance {
            self.body.move_to(target);
            self.probe.move_to(target);
            return (budget - distance, true);
        }

        let step = current.lerp(&target, budget / distance);
        self.body.move_to(step);
        self.probe.move_to(step);
        (0.0, false)
    }

    fn is_intersection_entry(node_id: NodeId, network: &SimRoadNetwork, tiles: &TileMatrix) -> bool {
        network.node(node_id).is_some_and(|node| {
            node.role == NodeRole::Entry && tiles.get(node.row, node.col).is_intersection()
        })
    }

    /// Move the vehicle along its path for one tick
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        tick_ms: f32,
        network: &SimRoadNetwork,
        tiles: &TileMatrix,
        rng: &mut R,
    ) -> Result<VehicleUpdateResult> {
        if self.path.is_empty() {
            self.set_random_path(network, rng);
        }

        let mut budget = self.speed * (tick_ms / 1000.0);

        while !self.waiting_at_intersection && budget > 0.0 {
            let Some(&target_id) = self.path.front() else {
                break;
            };

            // The path anchor is where the vehicle already is
            let anchored = target_id == self.prev_target;
            let reached = if anchored {
                true
            } else {
                let target = network
                    .node(target_id)
                    .with_context(|| format!("Target node {} not found", target_id))?;
                let (left, reached) = self.move_towards(budget, target.position);
                budget = left;
                reached
            };

            if !reached {
                break;
            }

            self.prev_target = self
                .path
                .pop_front()
                .context("Path emptied while driving")?;

            if self.path.is_empty() {
                self.set_random_path(network, rng);
            }

            if !anchored && Self::is_intersection_entry(self.prev_target, network, tiles) {
                let node = network
                    .node(self.prev_target)
                    .context("Intersection entry node not found")?;
                return Ok(VehicleUpdateResult::ArrivedAtIntersection {
                    row: node.row,
                    col: node.col,
                    direction: node.direction,
                });
            }
        }

        Ok(VehicleUpdateResult::Continue)
    }
}
