//! Oriented rectangles and separating-axis overlap tests

use super::types::Position;

/// A rectangle rotated about its center.
///
/// `offset` shifts the shape away from the center in the rectangle's own
/// frame before rotation, which lets a collider ride ahead of a body while
/// sharing its pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    center: Position,
    width: f32,
    height: f32,
    angle: f32,
    offset: Position,
    corners: [Position; 4],
}

impl Rectangle {
    pub fn new(center: Position, width: f32, height: f32, angle: f32, offset: Position) -> Self {
        let mut rect = Self {
            center,
            width,
            height,
            angle,
            offset,
            corners: [Position::default(); 4],
        };
        rect.update_corners();
        rect
    }

    /// Corners before rotation, clockwise from top-left (y grows downward)
    fn unrotated_corners(&self) -> [Position; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let c = self.center.offset(self.offset.x, self.offset.y);
        [
            c.offset(-hw, -hh),
            c.offset(hw, -hh),
            c.offset(hw, hh),
            c.offset(-hw, hh),
        ]
    }

    fn update_corners(&mut self) {
        let center = self.center;
        let angle = self.angle;
        self.corners = self
            .unrotated_corners()
            .map(|corner| corner.rotate_about(&center, angle));
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn corners(&self) -> [Position; 4] {
        self.corners
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.center = self.center.offset(dx, dy);
        self.update_corners();
    }

    pub fn move_to(&mut self, center: Position) {
        self.center = center;
        self.update_corners();
    }

    pub fn rotate_to(&mut self, angle: f32) {
        self.angle = angle;
        self.update_corners();
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Position, Position) {
        self.corners.iter().fold(
            (
                Position::new(f32::INFINITY, f32::INFINITY),
                Position::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), c| {
                (
                    Position::new(min.x.min(c.x), min.y.min(c.y)),
                    Position::new(max.x.max(c.x), max.y.max(c.y)),
                )
            },
        )
    }

    /// Whether the two rectangles overlap
    pub fn collides_with(&self, other: &Rectangle) -> bool {
        !has_separating_axis(self, other) && !has_separating_axis(other, self)
    }
}

/// True when one edge of `a` has every corner of `b` strictly on its outer side
fn has_separating_axis(a: &Rectangle, b: &Rectangle) -> bool {
    let sides = a.corners.len();
    (0..sides).any(|i| {
        let start = a.corners[i];
        let end = a.corners[(i + 1) % sides];
        let normal = Position::new(end.y - start.y, start.x - end.x);
        b.corners.iter().all(|corner| {
            (corner.x - start.x) * normal.x + (corner.y - start.y) * normal.y > 0.0
        })
    })
}
