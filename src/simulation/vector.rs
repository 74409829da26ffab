//! 2D vector primitives
//!
//! `Vector2D` is a plain nalgebra vector; the `Polar` trait adds the polar
//! form and rotation used when setting up launches and orbits

use nalgebra::{Rotation2, Vector2};

pub type Vector2D = Vector2<f64>;

/// Polar helpers on top of `Vector2D`
pub trait Polar: Sized {
    /// Build from `(norm, angle)`, angle in radians
    fn from_polar(norm: f64, angle: f64) -> Self;

    /// `atan2(y, x)`; named apart from nalgebra's `angle(&other)`
    fn polar_angle(&self) -> f64;

    /// `(norm, angle)`
    fn to_polar(&self) -> (f64, f64);

    /// Rotate counter-clockwise by `delta` radians
    fn rotated(&self, delta: f64) -> Self;
}

impl Polar for Vector2D {
    fn from_polar(norm: f64, angle: f64) -> Self {
        Vector2D::new(norm * angle.cos(), norm * angle.sin())
    }

    fn polar_angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    fn to_polar(&self) -> (f64, f64) {
        (self.norm(), self.polar_angle())
    }

    fn rotated(&self, delta: f64) -> Self {
        Rotation2::new(delta) * *self
    }
}
