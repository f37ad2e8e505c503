//! Immutable 3D vectors used for positions (m) and velocities (m/s).

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Cartesian vector in whatever physical unit the caller works in.
///
/// Serialises as a plain `[x, y, z]` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Spherical coordinates: polar angle measured from +z, azimuth from +x towards +y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f64,
    pub polar: f64,
    pub azimuth: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
    pub const Y: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const Z: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn scale(&self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }

    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Unit vector in the same direction. The zero vector yields NaN components.
    #[inline]
    pub fn unit(&self) -> Vector3 {
        self.scale(1.0 / self.norm())
    }

    /// Angle between two vectors in `[0, π]`.
    ///
    /// The cosine is clamped to `[-1, 1]` so nearly parallel vectors do not produce NaN.
    pub fn angle_to(&self, other: &Vector3) -> f64 {
        let cos = self.dot(other) / (self.norm() * other.norm());
        cos.clamp(-1.0, 1.0).acos()
    }

    /// Rotate about `axis` by `angle` (right-handed) using Rodrigues' formula.
    pub fn rotated(&self, axis: &Vector3, angle: f64) -> Vector3 {
        let k = axis.unit();
        let (sin, cos) = angle.sin_cos();
        self.scale(cos) + k.cross(self).scale(sin) + k.scale(k.dot(self) * (1.0 - cos))
    }

    pub fn to_spherical(&self) -> Spherical {
        let radius = self.norm();
        let polar = if radius == 0.0 { 0.0 } else { (self.z / radius).clamp(-1.0, 1.0).acos() };
        Spherical { radius, polar, azimuth: self.y.atan2(self.x) }
    }

    pub fn from_spherical(s: &Spherical) -> Vector3 {
        let (sin_polar, cos_polar) = s.polar.sin_cos();
        let (sin_az, cos_az) = s.azimuth.sin_cos();
        Vector3::new(
            s.radius * sin_polar * cos_az,
            s.radius * sin_polar * sin_az,
            s.radius * cos_polar,
        )
    }

    /// True when any component is NaN.
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Exact component-wise equality. Only meaningful for round-trip checks.
    #[inline]
    pub fn is_equal(&self, other: &Vector3) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Vector3::new(v[0], v[1], v[2])
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        self.scale(rhs)
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, rhs: Vector3) -> Vector3 {
        rhs.scale(self)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;

    fn div(self, rhs: f64) -> Vector3 {
        self.scale(1.0 / rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        self.scale(-1.0)
    }
}
