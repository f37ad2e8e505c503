//! Lambert's boundary-value problem.
//!
//! Only the Bate, Mueller & White (1971) universal-variable solver is implemented. It handles
//! single-revolution transfers; requests for more revolutions or an explicit path are refused
//! before any iteration starts.

use std::cell::Cell;
use std::f64::consts::PI;

use conic_core::Vector3;
use conic_core::constants::TWO_PI;
use conic_numeric::find_zero_newton;
use tracing::debug;

use crate::orbit::check_gravity;
use crate::{Orbit, OrbitError, stumpff};

/// Lower end of the z scan used to seed Newton.
const Z_SCAN_START: f64 = -100.0;
const Z_SCAN_STEP: f64 = 0.1;
/// `z = 4π²` is the single-revolution limit where `C(z)` vanishes.
const Z_SCAN_LIMIT: f64 = 4.0 * PI * PI;
const Z_TOLERANCE: f64 = 1e-12;
/// `|r1 × r2| / (|r1| |r2|)` below this is treated as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Sense of motion about +z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferDirection {
    #[default]
    Prograde,
    Retrograde,
}

/// Branch selection for multi-revolution solvers. Not supported by [`solve_lambert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPath {
    Short,
    Long,
}

/// Inputs of a Lambert solve. Positions in metres, time of flight in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertProblem {
    pub gravity: f64,
    pub r1: Vector3,
    pub r2: Vector3,
    pub time_of_flight: f64,
    pub direction: TransferDirection,
    /// Time at which the transfer leaves `r1`; becomes the epoch of the resulting orbit.
    pub t0: f64,
    pub revolutions: u32,
    pub path: Option<TransferPath>,
}

impl LambertProblem {
    pub fn new(gravity: f64, r1: Vector3, r2: Vector3, time_of_flight: f64) -> Self {
        Self {
            gravity,
            r1,
            r2,
            time_of_flight,
            direction: TransferDirection::Prograde,
            t0: 0.0,
            revolutions: 0,
            path: None,
        }
    }

    pub fn with_direction(mut self, direction: TransferDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_t0(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }
}

/// Result of a transfer solve.
pub trait LambertSolution {
    /// Transfer orbit with its epoch at departure.
    fn orbit(&self) -> &Orbit;
    /// Angle swept between `r1` and `r2`, in `(0, 2π)`.
    fn transfer_angle(&self) -> f64;
    /// Velocity at `r1`.
    fn v1(&self) -> Vector3;
    /// Velocity at `r2`.
    fn v2(&self) -> Vector3;
    fn iterations(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bate1971Solution {
    orbit: Orbit,
    transfer_angle: f64,
    v1: Vector3,
    v2: Vector3,
    iterations: usize,
    z: f64,
}

impl Bate1971Solution {
    /// Converged universal-variable parameter `z = αχ²`.
    pub fn z(&self) -> f64 {
        self.z
    }
}

impl LambertSolution for Bate1971Solution {
    fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    fn transfer_angle(&self) -> f64 {
        self.transfer_angle
    }

    fn v1(&self) -> Vector3 {
        self.v1
    }

    fn v2(&self) -> Vector3 {
        self.v2
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Solve `problem` with the default solver.
pub fn solve_lambert(problem: &LambertProblem) -> Result<Bate1971Solution, OrbitError> {
    solve_bate1971(problem)
}

/// Bate–Mueller–White universal-variable Lambert solver.
pub fn solve_bate1971(problem: &LambertProblem) -> Result<Bate1971Solution, OrbitError> {
    let LambertProblem { gravity: mu, r1, r2, time_of_flight: dt, direction, t0, .. } = *problem;
    check_gravity(mu)?;
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(OrbitError::InvalidTimeOfFlight(dt));
    }
    if problem.revolutions > 0 {
        return Err(OrbitError::UnsupportedLambert("multi-revolution transfers"));
    }
    if problem.path.is_some() {
        return Err(OrbitError::UnsupportedLambert("explicit path selection"));
    }
    if !r1.is_finite() || !r2.is_finite() || r1.norm() == 0.0 || r2.norm() == 0.0 {
        return Err(OrbitError::InvalidState);
    }

    let r1n = r1.norm();
    let r2n = r2.norm();
    let cos_dtheta = (r1.dot(&r2) / (r1n * r2n)).clamp(-1.0, 1.0);
    let mut dtheta = cos_dtheta.acos();
    let cross_z = r1.cross(&r2).z;
    let flip = match direction {
        TransferDirection::Prograde => cross_z < 0.0,
        TransferDirection::Retrograde => cross_z >= 0.0,
    };
    if flip {
        dtheta = TWO_PI - dtheta;
    }

    let a = dtheta.sin() * (r1n * r2n / (1.0 - cos_dtheta)).sqrt();
    let plane = r1.cross(&r2).norm() / (r1n * r2n);
    if plane <= COLLINEAR_TOLERANCE || a == 0.0 || !a.is_finite() {
        return Err(OrbitError::Degenerate("transfer angle of 0 or π leaves the plane undefined"));
    }

    let sqrt_mu_dt = mu.sqrt() * dt;
    let y = |z: f64| r1n + r2n + a * (z * stumpff::s(z) - 1.0) / stumpff::c(z).sqrt();
    let evaluations = Cell::new(0usize);
    let time_error = |z: f64| {
        evaluations.set(evaluations.get() + 1);
        let (c, s, yz) = (stumpff::c(z), stumpff::s(z), y(z));
        (yz / c).powf(1.5) * s + a * yz.sqrt() - sqrt_mu_dt
    };
    let slope = |z: f64| {
        let yz = y(z);
        if z.abs() < stumpff::SERIES_BAND {
            let y0 = y(0.0);
            2f64.sqrt() / 40.0 * y0.powf(1.5) + a / 8.0 * (y0.sqrt() + a * (0.5 / y0).sqrt())
        } else {
            let (c, s) = (stumpff::c(z), stumpff::s(z));
            (yz / c).powf(1.5) * (0.5 / z * (c - 1.5 * s / c) + 0.75 * s * s / c)
                + a / 8.0 * (3.0 * s / c * yz.sqrt() + a * (c / yz).sqrt())
        }
    };

    let mut z0 = Z_SCAN_START;
    loop {
        let value = time_error(z0);
        if value.is_finite() && value > 0.0 {
            break;
        }
        z0 += Z_SCAN_STEP;
        if z0 >= Z_SCAN_LIMIT {
            return Err(OrbitError::Degenerate("no single-revolution transfer for this time of flight"));
        }
    }
    evaluations.set(0);

    let z = find_zero_newton(&time_error, &slope, z0, Z_TOLERANCE)?;
    let iterations = evaluations.get();
    debug!(z, z0, iterations, "lambert solve converged");

    let yz = y(z);
    let f = 1.0 - yz / r1n;
    let g = a * (yz / mu).sqrt();
    let g_dot = 1.0 - yz / r2n;
    let v1 = (r2 - r1 * f) / g;
    let v2 = (r2 * g_dot - r1) / g;

    let orbit = Orbit::from_state_vector(mu, r1, v1, t0)?;
    Ok(Bate1971Solution { orbit, transfer_angle: dtheta, v1, v2, iterations, z })
}

impl Orbit {
    /// Transfer orbit from `r1` at `t0` to `r2` at `t0 + time_of_flight`.
    pub fn from_lambert(
        gravity: f64,
        r1: Vector3,
        r2: Vector3,
        time_of_flight: f64,
        direction: TransferDirection,
        t0: f64,
    ) -> Result<Orbit, OrbitError> {
        let problem = LambertProblem::new(gravity, r1, r2, time_of_flight)
            .with_direction(direction)
            .with_t0(t0);
        solve_lambert(&problem).map(|solution| solution.orbit)
    }
}
