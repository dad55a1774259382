use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A 2D point or vector in table-local pixels (Y grows downward).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Snapshot of the rendered table, taken by the host whenever the layout
/// may have changed. Everything is in table-local pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TableGeometry {
    /// Outer width, border included.
    pub width: f32,
    /// Outer height, border included.
    pub height: f32,
    /// Thickness of the cushion border on every side.
    pub border: f32,
}

impl TableGeometry {
    pub const fn new(width: f32, height: f32, border: f32) -> Self {
        Self {
            width,
            height,
            border,
        }
    }

    pub fn interior_width(&self) -> f32 {
        (self.width - 2.0 * self.border).max(0.0)
    }

    pub fn interior_height(&self) -> f32 {
        (self.height - 2.0 * self.border).max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.border.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
            && self.border >= 0.0
    }

    /// Legal top-left range for a body of `size` on the x axis.
    /// Collapses to `border..=border` when the body is wider than the interior.
    pub fn x_range(&self, size: Vec2) -> (f32, f32) {
        let min = self.border;
        let max = (self.border + self.interior_width() - size.x).max(min);
        (min, max)
    }

    /// Legal top-left range for a body of `size` on the y axis.
    pub fn y_range(&self, size: Vec2) -> (f32, f32) {
        let min = self.border;
        let max = (self.border + self.interior_height() - size.y).max(min);
        (min, max)
    }

    /// Clamp a top-left position so a body of `size` stays inside the interior.
    pub fn clamp_position(&self, position: Vec2, size: Vec2) -> Vec2 {
        let (min_x, max_x) = self.x_range(size);
        let (min_y, max_y) = self.y_range(size);
        Vec2::new(position.x.clamp(min_x, max_x), position.y.clamp(min_y, max_y))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self::new(620.0, 620.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_excludes_both_borders() {
        let g = TableGeometry::new(620.0, 400.0, 10.0);
        assert_eq!(g.interior_width(), 600.0);
        assert_eq!(g.interior_height(), 380.0);
    }

    #[test]
    fn ranges_account_for_ball_size() {
        let g = TableGeometry::new(620.0, 620.0, 10.0);
        let (min, max) = g.x_range(Vec2::new(50.0, 50.0));
        assert_eq!(min, 10.0);
        assert_eq!(max, 560.0);
    }

    #[test]
    fn oversized_body_collapses_range() {
        let g = TableGeometry::new(40.0, 40.0, 10.0);
        let (min, max) = g.y_range(Vec2::new(50.0, 50.0));
        assert_eq!(min, max);
    }

    #[test]
    fn zero_sized_table_has_no_interior() {
        let g = TableGeometry::new(0.0, 0.0, 10.0);
        assert_eq!(g.interior_width(), 0.0);
        let p = g.clamp_position(Vec2::new(100.0, -5.0), Vec2::new(5.0, 5.0));
        assert_eq!(p, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn non_finite_geometry_is_invalid() {
        assert!(!TableGeometry::new(f32::NAN, 10.0, 1.0).is_valid());
        assert!(!TableGeometry::new(10.0, 10.0, -1.0).is_valid());
        assert!(TableGeometry::default().is_valid());
    }

    #[test]
    fn rect_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(r.center(), Vec2::new(60.0, 40.0));
    }
}
