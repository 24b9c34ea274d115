//! Main simulation world that ties everything together
//!
//! Owns the tile grid, the routing graph, the intersection arbiters and all
//! vehicles, and is the only place where they are mutated.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

use super::car::{SimVehicle, VehicleUpdateResult};
use super::car_manager;
use super::config::SimConfig;
use super::intersection::SimIntersection;
use super::road_network::SimRoadNetwork;
use super::tile_matrix::{TileMatrix, TileType};
use super::types::{NodeId, Position, VehicleId};

/// Read-only view of a vehicle for renderers
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub position: Position,
    pub angle: f32,
    pub hue: u16,
    pub body: [Position; 4],
    pub probe: [Position; 4],
    pub waiting_at_intersection: bool,
}

/// Read-only view of a routing edge for debug overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSnapshot {
    pub source: NodeId,
    pub target: NodeId,
    pub from: Position,
    pub to: Position,
}

/// Aggregate counters for logging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub tiles: usize,
    pub live_nodes: usize,
    pub edges: usize,
    pub vehicles: usize,
    pub waiting_vehicles: usize,
    pub vehicles_spawned: usize,
    pub vehicles_removed: usize,
    pub ticks: u64,
    pub time_ms: f64,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    tiles: TileMatrix,

    road_network: SimRoadNetwork,

    /// Arbitration state by packed cell key, created on first arrival
    intersections: Vec<Option<SimIntersection>>,

    /// All vehicles, iterated in id order
    vehicles: BTreeMap<VehicleId, SimVehicle>,

    /// Next ID to assign
    next_vehicle_id: usize,

    vehicles_spawned: usize,
    vehicles_removed: usize,

    ticks: u64,

    /// Simulation time in milliseconds
    time_ms: f64,

    rng: StdRng,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            tiles: TileMatrix::new(config.rows, config.cols),
            road_network: SimRoadNetwork::new(config.rows, config.cols, config.tile_size),
            intersections: vec![None; config.rows * config.cols],
            vehicles: BTreeMap::new(),
            next_vehicle_id: 0,
            vehicles_spawned: 0,
            vehicles_removed: 0,
            ticks: 0,
            time_ms: 0.0,
            rng,
            config,
        }
    }

    fn next_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_vehicle_id);
        self.next_vehicle_id += 1;
        id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tiles(&self) -> &TileMatrix {
        &self.tiles
    }

    pub fn road_network(&self) -> &SimRoadNetwork {
        &self.road_network
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> + '_ {
        self.vehicles.values()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn intersection(&self, row: usize, col: usize) -> Option<&SimIntersection> {
        if !self.tiles.contains(row, col) {
            return None;
        }
        self.intersections[self.tiles.key(row, col)].as_ref()
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Place a road tile and wire it into the routing graph.
    /// Returns false when the tile cannot be placed; nothing changes then.
    pub fn add_tile(&mut self, row: usize, col: usize, restrict_to_neighbors: bool) -> bool {
        if !self.tiles.add_tile(row, col, restrict_to_neighbors) {
            return false;
        }

        let tile_type = self.tiles.get(row, col);
        let neighbors = self.tiles.neighbors(row, col);
        self.road_network
            .register_intersection(row, col, tile_type, &neighbors);

        if self.rng.random_bool(self.config.spawn_probability()) {
            if let Some(node) = self.road_network.newest_node() {
                let _ = self.spawn_vehicle(node);
            }
        }

        // Paths may run over edges that were just rewired
        car_manager::reroute_all_vehicles(&mut self.vehicles, &self.road_network, &mut self.rng);

        debug!("Added {:?} tile at ({}, {})", tile_type, row, col);
        true
    }

    /// Remove a road tile along with the vehicles on it and next to it.
    /// Returns false when there is no tile to remove.
    pub fn remove_tile(&mut self, row: usize, col: usize) -> bool {
        if self.tiles.get(row, col).is_empty() {
            return false;
        }

        let neighbors = self.tiles.neighbors(row, col);
        let removed = car_manager::remove_vehicles_near(
            &mut self.vehicles,
            &mut self.intersections,
            row,
            col,
            &neighbors,
            self.config.tile_size,
        );
        self.vehicles_removed += removed.len();

        if !self.tiles.remove_tile(row, col) {
            return false;
        }

        // Neighbors as they look without the removed tile
        let reshaped = self.tiles.neighbors(row, col);
        self.road_network.unregister_intersection(row, col, &reshaped);

        car_manager::reroute_all_vehicles(&mut self.vehicles, &self.road_network, &mut self.rng);

        debug!(
            "Removed tile at ({}, {}), {} vehicles cleared",
            row,
            col,
            removed.len()
        );
        true
    }

    /// Spawn a vehicle on a live routing node
    pub fn spawn_vehicle(&mut self, node: NodeId) -> Result<VehicleId> {
        let id = self.next_id();
        let vehicle = car_manager::spawn_vehicle(
            id,
            node,
            &self.road_network,
            self.config.vehicle_speed,
            &mut self.rng,
        )
        .with_context(|| format!("Cannot spawn vehicle {:?}", id))?;

        self.vehicles.insert(id, vehicle);
        self.vehicles_spawned += 1;
        debug!("Spawned vehicle {:?} on node {}", id, node);
        Ok(id)
    }

    /// Spawn a vehicle on a random live node, if there is one
    pub fn spawn_random_vehicle(&mut self) -> Option<VehicleId> {
        let node = self.road_network.random_node(&mut self.rng)?;
        self.spawn_vehicle(node).ok()
    }

    /// Remove a vehicle
    pub fn despawn_vehicle(&mut self, id: VehicleId) -> bool {
        if !self.vehicles.contains_key(&id) {
            return false;
        }
        car_manager::despawn_vehicle(id, &mut self.vehicles, &mut self.intersections);
        self.vehicles_removed += 1;
        true
    }

    /// Release vehicles from intersections. Returns who was let go.
    fn update_intersections(&mut self, tick_ms: f32) -> HashSet<VehicleId> {
        let mut released = HashSet::new();
        for insct in self.intersections.iter_mut().flatten() {
            if let Some(id) = insct.step(tick_ms) {
                if let Some(vehicle) = self.vehicles.get_mut(&id) {
                    vehicle.waiting_at_intersection = false;
                    released.insert(id);
                }
            }
        }
        released
    }

    /// Move every vehicle that is free to move
    fn update_vehicles(&mut self, tick_ms: f32, released: &HashSet<VehicleId>) {
        let blocked = car_manager::vehicles_in_collision(&self.vehicles);
        let cols = self.tiles.cols();
        let mut failed = Vec::new();
        let mut displaced_ids = Vec::new();

        let vehicle_ids: Vec<VehicleId> = self.vehicles.keys().copied().collect();
        for id in vehicle_ids {
            if blocked.contains(&id) || released.contains(&id) {
                continue;
            }
            let Some(vehicle) = self.vehicles.get_mut(&id) else {
                continue;
            };

            match vehicle.update(tick_ms, &self.road_network, &self.tiles, &mut self.rng) {
                Ok(VehicleUpdateResult::Continue) => {}
                Ok(VehicleUpdateResult::ArrivedAtIntersection {
                    row,
                    col,
                    direction,
                }) => {
                    let insct = self.intersections[row * cols + col]
                        .get_or_insert_with(SimIntersection::new);
                    let displaced = insct.enqueue(id, direction).filter(|d| *d != id);
                    if let Some(displaced) = displaced {
                        warn!(
                            "Vehicle {:?} displaced {:?} at intersection ({}, {})",
                            id, displaced, row, col
                        );
                        displaced_ids.push(displaced);
                    }
                    vehicle.waiting_at_intersection = true;
                }
                Err(e) => {
                    warn!("Vehicle {:?} could not move: {:#}", id, e);
                    failed.push(id);
                }
            }
        }

        // A displaced vehicle lost its slot and drives on
        for id in displaced_ids {
            if let Some(vehicle) = self.vehicles.get_mut(&id) {
                vehicle.waiting_at_intersection = false;
            }
        }

        for id in failed {
            self.despawn_vehicle(id);
        }
    }

    /// Main simulation tick
    pub fn step(&mut self, tick_ms: f32) {
        self.ticks += 1;
        self.time_ms += f64::from(tick_ms);

        let released = self.update_intersections(tick_ms);
        self.update_vehicles(tick_ms, &released);
    }

    /// Tile shapes, one vector per row
    pub fn tile_grid(&self) -> Vec<Vec<TileType>> {
        self.tiles.grid()
    }

    /// Routing edges with endpoint positions
    pub fn edge_snapshots(&self) -> Vec<EdgeSnapshot> {
        self.road_network
            .edges()
            .into_iter()
            .filter_map(|(source, target)| {
                let from = self.road_network.node(source)?.position;
                let to = self.road_network.node(target)?.position;
                Some(EdgeSnapshot {
                    source,
                    target,
                    from,
                    to,
                })
            })
            .collect()
    }

    pub fn vehicle_snapshots(&self) -> Vec<VehicleSnapshot> {
        self.vehicles
            .values()
            .map(|v| VehicleSnapshot {
                id: v.id,
                position: v.position(),
                angle: v.angle(),
                hue: v.hue,
                body: v.body().corners(),
                probe: v.probe().corners(),
                waiting_at_intersection: v.waiting_at_intersection,
            })
            .collect()
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            tiles: self.tiles.tile_count(),
            live_nodes: self.road_network.live_node_count(),
            edges: self.road_network.edge_count(),
            vehicles: self.vehicles.len(),
            waiting_vehicles: self
                .vehicles
                .values()
                .filter(|v| v.waiting_at_intersection)
                .count(),
            vehicles_spawned: self.vehicles_spawned,
            vehicles_removed: self.vehicles_removed,
            ticks: self.ticks,
            time_ms: self.time_ms,
        }
    }

    /// Create a world with a ring road and a central cross
    pub fn create_test_world(config: SimConfig) -> Self {
        let mut world = SimWorld::new(config);
        let rows = world.tiles.rows();
        let cols = world.tiles.cols();

        if rows < 4 || cols < 4 {
            let mid = rows / 2;
            for col in 0..cols {
                world.add_tile(mid, col, false);
            }
            return world;
        }

        let (top, bottom, left, right) = (1, rows - 2, 1, cols - 2);
        for col in left..=right {
            world.add_tile(top, col, false);
            world.add_tile(bottom, col, false);
        }
        for row in top..=bottom {
            world.add_tile(row, left, false);
            world.add_tile(row, right, false);
        }

        let (mid_row, mid_col) = (rows / 2, cols / 2);
        for col in left..=right {
            world.add_tile(mid_row, col, false);
        }
        for row in top..=bottom {
            world.add_tile(row, mid_col, false);
        }

        world
    }

    /// Text map of the grid: one glyph per tile, vehicles drawn on top.
    /// A cell shows `*` for one vehicle, a digit for several and `!` when
    /// one of them waits at an intersection.
    pub fn draw_map(&self) -> String {
        let rows = self.tiles.rows();
        let cols = self.tiles.cols();
        let tile_size = self.config.tile_size;

        let mut counts = vec![0usize; rows * cols];
        let mut waiting = vec![false; rows * cols];
        for vehicle in self.vehicles.values() {
            let position = vehicle.position();
            if position.x < 0.0 || position.y < 0.0 {
                continue;
            }
            let row = (position.y / tile_size) as usize;
            let col = (position.x / tile_size) as usize;
            if !self.tiles.contains(row, col) {
                continue;
            }
            let key = self.tiles.key(row, col);
            counts[key] += 1;
            waiting[key] |= vehicle.waiting_at_intersection;
        }

        let mut map = String::with_capacity((cols + 3) * (rows + 2));
        map.push('+');
        map.push_str(&"-".repeat(cols));
        map.push_str("+\n");
        for row in 0..rows {
            map.push('|');
            for col in 0..cols {
                let key = self.tiles.key(row, col);
                let glyph = match counts[key] {
                    0 => self.tiles.get(row, col).glyph(),
                    _ if waiting[key] => '!',
                    1 => '*',
                    n => char::from_digit(n.min(9) as u32, 10).unwrap_or('#'),
                };
                map.push(glyph);
            }
            map.push_str("|\n");
        }
        map.push('+');
        map.push_str(&"-".repeat(cols));
        map.push('+');
        map
    }

    /// Log a summary of the world state
    pub fn print_summary(&self) {
        let stats = self.stats();
        info!("=== Traffic Simulation Summary ===");
        info!("Time: {:.2}s ({} ticks)", stats.time_ms / 1000.0, stats.ticks);
        info!(
            "Tiles: {}, Nodes: {}, Edges: {}",
            stats.tiles, stats.live_nodes, stats.edges
        );
        info!(
            "Vehicles: {} ({} waiting at intersections)",
            stats.vehicles, stats.waiting_vehicles
        );
    }
}
