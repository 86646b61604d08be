//! 2-D vector type and interpolation helpers.
//!
//! `Vec2` uses `f32` components — behavior code works in world units where
//! single precision is ample, and halving the size keeps `Value`s small.
//! All interpolation helpers are pure so they stay testable under any clock.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2-D vector in world units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Squared magnitude — prefer this for distance comparisons.
    #[inline]
    pub fn magn2(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn magn(self) -> f32 {
        self.magn2().sqrt()
    }

    #[inline]
    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector has no direction; it normalizes to `(1, 0)` rather
    /// than NaN so downstream motion code stays finite.
    pub fn norm(self) -> Self {
        let m2 = self.magn2();
        if m2 <= f32::EPSILON {
            return Vec2::new(1.0, 0.0);
        }
        self.scale(1.0 / m2.sqrt())
    }

    /// Component-wise linear interpolation from `self` to `other` by `t`.
    #[inline]
    pub fn lerp(self, other: Vec2, t: f32) -> Self {
        self + (other - self).scale(t)
    }

    /// Spherical linear interpolation between two direction vectors.
    ///
    /// Interpolates the angle (shortest arc) and the magnitude separately,
    /// so unit inputs stay unit for every `t`.  Opposite directions have no
    /// unique arc; this implementation rotates counter-clockwise.
    pub fn slerp(self, other: Vec2, t: f32) -> Self {
        let a0 = self.y.atan2(self.x);
        let a1 = other.y.atan2(other.x);

        let mut delta = a1 - a0;
        if delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        } else if delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }

        let angle = a0 + delta * t;
        let magn = self.magn() + (other.magn() - self.magn()) * t;
        Vec2::new(angle.cos(), angle.sin()).scale(magn)
    }

    /// Step vector of length `step` pointing from `self` toward `target`.
    ///
    /// Add the result to a position to ease toward `target`; callers that
    /// might overshoot should clamp against the remaining distance.
    #[inline]
    pub fn toward(self, target: Vec2, step: f32) -> Self {
        (target - self).norm().scale(step)
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec2) {
        *self = *self - rhs;
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        self.scale(-1.0)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        self.scale(rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}
