//! Core types for the traffic simulation
//!
//! These are standalone types shared by every simulation component.

use std::fmt;
use std::str::FromStr;

use super::graph::GraphError;

/// Identifier of a routing-graph node.
/// Doubles as the index of the node in the road network's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for NodeId {
    type Error = GraphError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .map(NodeId)
            .map_err(|_| GraphError::InvalidNode(value.to_string()))
    }
}

impl FromStr for NodeId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map(NodeId)
            .map_err(|_| GraphError::InvalidNode(s.to_string()))
    }
}

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub usize);

/// Cardinal direction of a road segment or grid neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// Clockwise order, starting at the top.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Bit of this direction in a neighbor-presence mask
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Unit step as (d_row, d_col)
    pub fn grid_offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    /// Unit vector in world space (y grows downward, like grid rows)
    pub fn unit(self) -> Position {
        let (dr, dc) = self.grid_offset();
        Position::new(dc as f32, dr as f32)
    }
}

/// A 2D position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Heading from this position to another, in radians
    pub fn angle_to(&self, other: &Position) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn scale(&self, factor: f32) -> Position {
        Position::new(self.x * factor, self.y * factor)
    }

    /// Rotate this point about `pivot` by `angle` radians
    pub fn rotate_about(&self, pivot: &Position, angle: f32) -> Position {
        let (sin, cos) = angle.sin_cos();
        let x = self.x - pivot.x;
        let y = self.y - pivot.y;
        Position {
            x: x * cos - y * sin + pivot.x,
            y: x * sin + y * cos + pivot.y,
        }
    }
}

/// Length of a vehicle body along its heading
pub const VEHICLE_LENGTH: f32 = 8.0;

/// Width of a vehicle body
pub const VEHICLE_WIDTH: f32 = 4.0;

/// Size of the forward collision probe
pub const PROBE_LENGTH: f32 = 4.0;
pub const PROBE_WIDTH: f32 = 2.0;

/// Distance from the body center to the probe center, along the heading
pub const PROBE_FORWARD_OFFSET: f32 = 6.0;

/// Default vehicle speed in world units per second
pub const VEHICLE_SPEED: f32 = 30.0;

/// Default edge length of one grid tile in world units
pub const TILE_SIZE: f32 = 60.0;
