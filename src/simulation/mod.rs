//! Standalone tile traffic simulation
//!
//! Road tiles on a grid are turned into a directed routing graph that
//! vehicles drive along. Everything here runs headless and is driven by
//! explicit ticks, so it can be tested without any renderer.

mod car;
mod car_manager;
mod collision;
mod config;
mod graph;
mod intersection;
mod road_network;
mod tile_matrix;
mod types;
mod world;

pub use car::{SimVehicle, VehicleUpdateResult};
pub use car_manager::{
    despawn_vehicle, remove_vehicles_near, reroute_all_vehicles, spawn_vehicle, vehicle_in_cell,
    vehicles_in_collision,
};
pub use collision::Rectangle;
pub use config::SimConfig;
pub use graph::{DirectedGraph, GraphError};
pub use intersection::{SimIntersection, CLEAR_TIME_DURATION, WAIT_TIME_DURATION};
pub use road_network::{node_position, NodeRole, Segment, SimRoadNetwork, TravelIntersection, TravelNode};
pub use tile_matrix::{Neighbor, Neighbors, TileMatrix, TileType};
pub use types::{
    Direction, NodeId, Position, VehicleId, PROBE_FORWARD_OFFSET, PROBE_LENGTH, PROBE_WIDTH,
    TILE_SIZE, VEHICLE_LENGTH, VEHICLE_SPEED, VEHICLE_WIDTH,
};
pub use world::{EdgeSnapshot, SimStats, SimWorld, VehicleSnapshot};
