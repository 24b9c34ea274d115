//! Stop-sign arbitration for a single grid cell
//!
//! Every approach direction behaves as if it had a stop sign: an arriving
//! vehicle waits a fixed time, then vehicles are let through one at a time,
//! clockwise, with a clearance gap between releases.

use super::types::{Direction, VehicleId};

/// Time a vehicle has to wait after stopping, in milliseconds
pub const WAIT_TIME_DURATION: f32 = 1000.0;

/// Time reserved for a released vehicle to leave the intersection, in milliseconds
pub const CLEAR_TIME_DURATION: f32 = 1000.0;

/// An intersection in the traffic simulation
#[derive(Debug, Clone, Default)]
pub struct SimIntersection {
    /// The vehicle stopped at each approach
    waiting: [Option<VehicleId>; 4],
    /// Remaining stop time per approach
    wait_timers: [f32; 4],
    /// Remaining time before anyone else may go
    clear_timer: f32,
    /// Next direction to inspect when looking for a vehicle to release
    cursor: usize,
}

impl SimIntersection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop a vehicle at the given approach.
    /// Only one vehicle may wait per approach; a previous one is displaced and returned.
    pub fn enqueue(&mut self, vehicle: VehicleId, direction: Direction) -> Option<VehicleId> {
        self.wait_timers[direction.index()] = WAIT_TIME_DURATION;
        self.waiting[direction.index()].replace(vehicle)
    }

    fn dequeue(&mut self, direction: Direction) -> Option<VehicleId> {
        self.waiting[direction.index()].take()
    }

    /// Advance timers and release at most one vehicle
    pub fn step(&mut self, delta_ms: f32) -> Option<VehicleId> {
        for timer in &mut self.wait_timers {
            *timer = (*timer - delta_ms).max(0.0);
        }

        self.clear_timer = (self.clear_timer - delta_ms).max(0.0);
        if self.clear_timer > 0.0 {
            return None;
        }

        for _ in 0..Direction::ALL.len() {
            let direction = Direction::ALL[self.cursor];
            self.cursor = (self.cursor + 1) % Direction::ALL.len();

            if self.wait_timers[direction.index()] > 0.0 {
                continue;
            }

            if self.waiting[direction.index()].is_some() {
                self.clear_timer = CLEAR_TIME_DURATION;
                return self.dequeue(direction);
            }
        }

        None
    }

    /// Drop a vehicle from whichever approach holds it
    pub fn remove_vehicle(&mut self, vehicle: VehicleId) -> bool {
        match self.waiting.iter_mut().find(|slot| **slot == Some(vehicle)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn waiting_vehicle(&self, direction: Direction) -> Option<VehicleId> {
        self.waiting[direction.index()]
    }

    pub fn wait_timer(&self, direction: Direction) -> f32 {
        self.wait_timers[direction.index()]
    }

    pub fn clear_timer(&self) -> f32 {
        self.clear_timer
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.iter().flatten().count()
    }
}
