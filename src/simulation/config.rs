//! Simulation settings

use super::types::{TILE_SIZE, VEHICLE_SPEED};

/// Settings fixed for the lifetime of a [`super::SimWorld`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Grid height in tiles
    pub rows: usize,
    /// Grid width in tiles
    pub cols: usize,
    /// Edge length of a tile in world units
    pub tile_size: f32,
    /// Vehicle speed in world units per second
    pub vehicle_speed: f32,
    /// Chance, 0.0 to 1.0, that placing a tile spawns a vehicle on it
    pub spawn_chance: f64,
    /// Seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 16,
            tile_size: TILE_SIZE,
            vehicle_speed: VEHICLE_SPEED,
            spawn_chance: 0.4,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Non-finite chances are treated as zero
    pub fn with_spawn_chance(mut self, spawn_chance: f64) -> Self {
        self.spawn_chance = sanitize_chance(spawn_chance);
        self
    }

    /// `spawn_chance` as a valid probability, whatever was written to the field
    pub fn spawn_probability(&self) -> f64 {
        sanitize_chance(self.spawn_chance)
    }
}

fn sanitize_chance(chance: f64) -> f64 {
    if chance.is_finite() {
        chance.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
