//! Hyperbolic orbits targeted at an asymptotic (excess) velocity.

use conic_core::Vector3;
use conic_core::constants::TWO_PI;
use conic_numeric::find_zero_bisect;
use tracing::debug;

use crate::orbit::check_gravity;
use crate::{Orbit, OrbitError};

/// Keeps the searched flight direction away from the radial (degenerate) trajectories.
const DIRECTION_MARGIN: f64 = 1e-9;
const DIRECTION_TOLERANCE: f64 = 1e-13;

/// Which way the trajectory bends around the central body on its way to the asymptote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Turn {
    /// The shortest turn from the current position to the asymptote.
    #[default]
    Direct,
    /// The long way around the body, as used for gravity assists.
    Indirect,
}

impl Orbit {
    /// Hyperbolic orbit through `position` at `t0` whose outgoing asymptotic velocity is `v_inf`.
    ///
    /// The speed at `position` follows from the energy of `v_inf`; the flight direction in the
    /// plane spanned by `position` and `v_inf` is bisected until the asymptote lines up.
    pub fn from_position_and_hyperbolic_excess_velocity(
        gravity: f64,
        position: Vector3,
        v_inf: Vector3,
        turn: Turn,
        t0: f64,
    ) -> Result<Orbit, OrbitError> {
        check_gravity(gravity)?;
        if !position.is_finite() || !v_inf.is_finite() || position.norm() == 0.0 {
            return Err(OrbitError::InvalidState);
        }
        if v_inf.norm() == 0.0 {
            return Err(OrbitError::Degenerate("zero excess velocity has no asymptote"));
        }

        let radial = position.unit();
        let speed = (v_inf.norm_squared() + 2.0 * gravity / position.norm()).sqrt();
        let mut normal = position.cross(&v_inf);
        if normal.norm() <= 1e-12 * position.norm() * v_inf.norm() {
            // Any plane containing the radial line works; pick one perpendicular to it.
            let helper = if radial.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
            normal = radial.cross(&helper);
        }
        let beta = radial.angle_to(&v_inf);
        let (normal, target) = match turn {
            Turn::Direct => (normal.unit(), beta),
            Turn::Indirect => (-normal.unit(), TWO_PI - beta),
        };
        let transverse = normal.cross(&radial);

        let build = |phi: f64| {
            let velocity = (radial * phi.cos() + transverse * phi.sin()) * speed;
            Orbit::from_state_vector(gravity, position, velocity, t0)
        };
        // Angle from the position to the outgoing asymptote, measured about the orbit normal.
        // Near-radial trajectories have e within rounding of 1 on either side.
        let turn_error = |phi: f64| match build(phi) {
            Ok(orbit) => (-1.0 / orbit.eccentricity()).max(-1.0).acos() - orbit.ta_at_epoch() - target,
            Err(_) => f64::NAN,
        };

        let phi = find_zero_bisect(
            turn_error,
            DIRECTION_MARGIN,
            std::f64::consts::PI - DIRECTION_MARGIN,
            DIRECTION_TOLERANCE,
        )?;
        debug!(phi, target, ?turn, "matched hyperbolic excess velocity");
        build(phi)
    }
}
