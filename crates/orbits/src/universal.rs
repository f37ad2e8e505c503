//! Universal-variable Kepler propagation.

use conic_core::Vector3;
use conic_numeric::{SolverError, find_zero_newton};
use tracing::debug;

use crate::OrbitError;
use crate::stumpff;

/// Relative step tolerance on the universal anomaly χ.
const CHI_TOLERANCE: f64 = 1e-12;
/// Seeds are halved after a non-finite solve until they drop below this magnitude.
const SEED_FLOOR: f64 = 1e-6;

/// Propagate `(r0, v0)` by `dt` seconds under gravity `mu`, where `alpha = 2/|r0| − |v0|²/mu`.
pub(crate) fn propagate(
    mu: f64,
    r0: &Vector3,
    v0: &Vector3,
    alpha: f64,
    dt: f64,
) -> Result<(Vector3, Vector3), OrbitError> {
    let sqrt_mu = mu.sqrt();
    let r0_mag = r0.norm();
    let chi = solve_chi(sqrt_mu, r0_mag, r0.dot(v0) / sqrt_mu, alpha, dt)?;

    let z = alpha * chi * chi;
    let c = stumpff::c(z);
    let s = stumpff::s(z);

    let f = 1.0 - chi * chi / r0_mag * c;
    let g = dt - chi.powi(3) / sqrt_mu * s;
    let r = *r0 * f + *v0 * g;
    let r_mag = r.norm();

    let f_dot = sqrt_mu / (r_mag * r0_mag) * (z * s - 1.0) * chi;
    let g_dot = 1.0 - chi * chi / r_mag * c;
    let v = *r0 * f_dot + *v0 * g_dot;

    if !r.is_finite() || !v.is_finite() {
        return Err(OrbitError::Propagation { dt, source: SolverError::NonFinite { x: chi } });
    }
    Ok((r, v))
}

/// Solve the universal Kepler equation
/// `σ·χ²C(z) + (1 − α r0)·χ³S(z) + r0·χ − √μ·Δt = 0` with `σ = r0·v0/√μ` and `z = αχ²`.
fn solve_chi(sqrt_mu: f64, r0: f64, sigma: f64, alpha: f64, dt: f64) -> Result<f64, OrbitError> {
    let kepler = |chi: f64| {
        let z = alpha * chi * chi;
        sigma * chi * chi * stumpff::c(z)
            + (1.0 - alpha * r0) * chi.powi(3) * stumpff::s(z)
            + r0 * chi
            - sqrt_mu * dt
    };
    // dF/dχ is the radius at χ, which is strictly positive.
    let radius = |chi: f64| {
        let z = alpha * chi * chi;
        sigma * chi * (1.0 - z * stumpff::s(z))
            + (1.0 - alpha * r0) * chi * chi * stumpff::c(z)
            + r0
    };

    if !dt.is_finite() {
        return Err(OrbitError::Propagation {
            dt,
            source: SolverError::InvalidInput(format!("time step must be finite, got {dt}")),
        });
    }

    let mut seed = sqrt_mu * alpha.abs() * dt;
    loop {
        match find_zero_newton(&kepler, &radius, seed, CHI_TOLERANCE) {
            Ok(chi) => return Ok(chi),
            Err(SolverError::NonFinite { .. }) if seed.abs() > SEED_FLOOR => {
                debug!(seed, dt, "universal anomaly solve went non-finite, halving seed");
                seed *= 0.5;
            }
            Err(source) => return Err(OrbitError::Propagation { dt, source }),
        }
    }
}
