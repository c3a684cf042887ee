//! Minimal 2D vector math used by the geometry stages.

use std::ops::{Add, Mul, Sub};

use crate::stroke::Sample;

/// Lengths below this are treated as zero when normalizing.
pub(crate) const DEGENERATE_LENGTH: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn of(sample: &Sample) -> Self {
        Self::new(sample.x, sample.y)
    }

    /// Vector from `a` to `b`.
    pub fn between(a: &Sample, b: &Sample) -> Self {
        Self::new(b.x - a.x, b.y - a.y)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector, or zero for degenerate input.
    pub fn normalized_or_zero(self) -> Vec2 {
        let len = self.length();
        if len < DEGENERATE_LENGTH || !len.is_finite() {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Angle between two directions in radians, 0 for degenerate input.
    pub fn angle_to(self, other: Vec2) -> f64 {
        let a = self.normalized_or_zero();
        let b = other.normalized_or_zero();
        if a.is_zero() || b.is_zero() {
            return 0.0;
        }
        a.dot(b).clamp(-1.0, 1.0).acos()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}
