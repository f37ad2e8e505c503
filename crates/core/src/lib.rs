//! Core units, constants, and shared primitives for the Conic Planner workspace.

pub mod vector;

pub use vector::{Spherical, Vector3};

/// Physical and numerical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Full turn in radians.
    pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
    /// Metres per kilometre.
    pub const METRES_PER_KM: f64 = 1_000.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::METRES_PER_KM;

    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        v * METRES_PER_KM
    }

    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / METRES_PER_KM
    }

    /// Convert a gravitational parameter from km³/s² to m³/s².
    #[inline]
    pub fn km3_s2_to_m3_s2(mu: f64) -> f64 {
        mu * METRES_PER_KM.powi(3)
    }

    /// Wrap an angle into `(-π, π]`.
    pub fn wrap_pi(angle: f64) -> f64 {
        use std::f64::consts::PI;
        let wrapped = angle.rem_euclid(super::constants::TWO_PI);
        if wrapped > PI { wrapped - super::constants::TWO_PI } else { wrapped }
    }

    /// Wrap an angle into `[0, 2π)`.
    pub fn wrap_two_pi(angle: f64) -> f64 {
        let wrapped = angle.rem_euclid(super::constants::TWO_PI);
        // rem_euclid can round up to exactly 2π for tiny negative inputs
        if wrapped >= super::constants::TWO_PI { 0.0 } else { wrapped }
    }
}

