//! Vehicle spawning and management for the traffic simulation
//!
//! Free functions over the vehicle collection, kept apart from the main
//! world coordination.

use anyhow::{bail, Context, Result};
use log::debug;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use super::car::SimVehicle;
use super::intersection::SimIntersection;
use super::road_network::SimRoadNetwork;
use super::tile_matrix::Neighbors;
use super::types::{NodeId, VehicleId};

/// Create a vehicle parked on a routing node
pub fn spawn_vehicle<R: Rng + ?Sized>(
    id: VehicleId,
    node: NodeId,
    network: &SimRoadNetwork,
    speed: f32,
    rng: &mut R,
) -> Result<SimVehicle> {
    let travel_node = network
        .node(node)
        .with_context(|| format!("Node {} not found in road network", node))?;

    if !travel_node.live {
        bail!("Node {} belongs to a removed road segment", node);
    }

    let hue = rng.random_range(0..360);
    Ok(SimVehicle::new(id, travel_node.position, node, speed, hue))
}

/// Vehicles whose probe overlaps another vehicle's body.
///
/// Evaluated on the poses at the time of the call, so every vehicle in a
/// tick is judged against the same picture.
pub fn vehicles_in_collision(vehicles: &BTreeMap<VehicleId, SimVehicle>) -> HashSet<VehicleId> {
    vehicles
        .values()
        .filter(|vehicle| vehicles.values().any(|other| vehicle.probe_hits(other)))
        .map(|vehicle| vehicle.id)
        .collect()
}

/// Whether a vehicle's center lies inside a grid cell
pub fn vehicle_in_cell(vehicle: &SimVehicle, row: usize, col: usize, tile_size: f32) -> bool {
    let position = vehicle.position();
    let x1 = col as f32 * tile_size;
    let y1 = row as f32 * tile_size;
    position.x >= x1
        && position.x < x1 + tile_size
        && position.y >= y1
        && position.y < y1 + tile_size
}

/// Remove every vehicle inside a cell or any of its neighbors.
/// Returns the removed ids.
pub fn remove_vehicles_near(
    vehicles: &mut BTreeMap<VehicleId, SimVehicle>,
    intersections: &mut [Option<SimIntersection>],
    row: usize,
    col: usize,
    neighbors: &Neighbors,
    tile_size: f32,
) -> Vec<VehicleId> {
    let cells: Vec<(usize, usize)> = std::iter::once((row, col))
        .chain(neighbors.iter().map(|(_, n)| (n.row, n.col)))
        .collect();

    let doomed: Vec<VehicleId> = vehicles
        .values()
        .filter(|v| cells.iter().any(|&(r, c)| vehicle_in_cell(v, r, c, tile_size)))
        .map(|v| v.id)
        .collect();

    for id in &doomed {
        despawn_vehicle(*id, vehicles, intersections);
    }

    doomed
}

/// Remove a vehicle and any intersection slot it occupies
pub fn despawn_vehicle(
    id: VehicleId,
    vehicles: &mut BTreeMap<VehicleId, SimVehicle>,
    intersections: &mut [Option<SimIntersection>],
) {
    if let Some(vehicle) = vehicles.remove(&id) {
        if vehicle.waiting_at_intersection {
            for insct in intersections.iter_mut().flatten() {
                insct.remove_vehicle(id);
            }
        }
        debug!("Despawned vehicle {:?}", id);
    }
}

/// Re-route every vehicle against the current road layout
pub fn reroute_all_vehicles<R: Rng + ?Sized>(
    vehicles: &mut BTreeMap<VehicleId, SimVehicle>,
    network: &SimRoadNetwork,
    rng: &mut R,
) {
    for vehicle in vehicles.values_mut() {
        vehicle.reset_random_path(network, rng);
    }
}
