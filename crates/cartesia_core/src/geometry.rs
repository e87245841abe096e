//! 2D geometry for the logical and render coordinate spaces
//!
//! Logical space grows upward (mathematical convention); render space grows
//! downward. Both use [`Vec2`]; the coordinate transform in `cartesia_scene`
//! is the only place that converts between them.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use thiserror::Error;

/// Vectors shorter than this cannot be normalized or used as a direction.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Errors raised by degenerate geometry.
///
/// These must surface to the caller: a NaN produced by dividing through a
/// zero length would silently poison every dependent curve.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("cannot normalize zero-length vector ({x}, {y})")]
    ZeroLength { x: f32, y: f32 },
    #[error("spacing is zero; render space cannot be mapped back to logical units")]
    DegenerateSpacing,
}

// ─────────────────────────────────────────────────────────────────────────────
// Vec2
// ─────────────────────────────────────────────────────────────────────────────

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        (other - *self).length()
    }

    /// Unit vector in the same direction.
    ///
    /// Fails with [`GeometryError::ZeroLength`] when the length is below
    /// [`NORMALIZE_EPSILON`].
    pub fn try_normalize(&self) -> Result<Self, GeometryError> {
        let len = self.length();
        if !(len >= NORMALIZE_EPSILON) {
            return Err(GeometryError::ZeroLength {
                x: self.x,
                y: self.y,
            });
        }
        Ok(Self::new(self.x / len, self.y / len))
    }

    /// Counter-clockwise quarter turn in logical space: `(x, y) -> (-y, x)`.
    ///
    /// The curve generator derives wave normals from this; the sign
    /// convention must not change.
    pub fn rotate_90(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Mirror across the horizontal axis (logical <-> render orientation).
    pub fn flip_y(&self) -> Self {
        Self::new(self.x, -self.y)
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Linear interpolation written as `a(1 - t) + bt` so that `t = 1`
    /// lands exactly on `b`.
    pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        let s = 1.0 - t;
        Vec2::new(a.x * s + b.x * t, a.y * s + b.y * t)
    }

    pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
        Vec2::lerp(a, b, 0.5)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        self.scale(rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        let s = 1.0 - t;
        Color::rgba(
            a.r * s + b.r * t,
            a.g * s + b.g * t,
            a.b * s + b.b * t,
            a.a * s + b.a * t,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_normalize_has_unit_length_and_same_direction() {
        for v in [
            Vec2::new(3.0, 4.0),
            Vec2::new(-2.0, 1.0),
            Vec2::new(0.001, -0.002),
            Vec2::new(400.0, 0.0),
        ] {
            let n = v.try_normalize().unwrap();
            assert!((n.length() - 1.0).abs() < EPS);
            // Parallel and pointing the same way
            let cross = v.x * n.y - v.y * n.x;
            assert!(cross.abs() < 1e-3 * v.length());
            assert!(v.dot(n) > 0.0);
        }
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        let err = Vec2::ZERO.try_normalize().unwrap_err();
        assert_eq!(err, GeometryError::ZeroLength { x: 0.0, y: 0.0 });
        assert!(Vec2::new(1e-9, 0.0).try_normalize().is_err());
        assert!(Vec2::new(f32::NAN, 0.0).try_normalize().is_err());
    }

    #[test]
    fn test_rotate_90_is_counter_clockwise() {
        assert_eq!(Vec2::new(1.0, 0.0).rotate_90(), Vec2::new(0.0, 1.0));
        assert_eq!(Vec2::new(0.0, 1.0).rotate_90(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_double_rotation_negates() {
        for v in [Vec2::new(2.0, 1.0), Vec2::new(-3.5, 0.25), Vec2::ZERO] {
            assert_eq!(v.rotate_90().rotate_90(), -v);
        }
    }

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let a = Vec2::new(-160.0, 80.3);
        let b = Vec2::new(321.7, -0.1);
        assert_eq!(Vec2::lerp(a, b, 0.0), a);
        assert_eq!(Vec2::lerp(a, b, 1.0), b);
        assert_eq!(Vec2::midpoint(Vec2::ZERO, Vec2::new(2.0, 4.0)), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_vector_arithmetic() {
        let u = Vec2::new(2.0, 1.0);
        let v = Vec2::new(4.0, 2.0);
        assert_eq!(u + v, Vec2::new(6.0, 3.0));
        assert_eq!(Vec2::new(6.0, 3.0) - u, v);
        assert_eq!(u * 2.0, v);
        assert_eq!(v / 2.0, u);
        assert_eq!(u.flip_y(), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex(0xFF0000);
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.0));
        let mid = Color::lerp(Color::BLACK, Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < EPS);
        assert_eq!(Color::lerp(Color::BLACK, Color::WHITE, 1.0), Color::WHITE);
    }
}
