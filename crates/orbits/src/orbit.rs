//! The [`Orbit`] value type: construction, derived elements, and closed-form queries.

use std::f64::consts::PI;

use conic_core::units::{wrap_pi, wrap_two_pi};
use conic_core::{Vector3, constants::TWO_PI};
use serde::{Deserialize, Serialize};

use crate::{OrbitError, universal};

/// Eccentricities within this distance of 1 are treated as parabolic.
pub const PARABOLIC_TOLERANCE: f64 = 1e-10;
/// Below this eccentricity the argument of periapsis is pinned to 0.
const CIRCULAR_TOLERANCE: f64 = 1e-11;
/// Node vectors shorter than this fraction of |h| mark an equatorial orbit (Ω pinned to 0).
const EQUATORIAL_TOLERANCE: f64 = 1e-12;

/// Conic section family, decided by eccentricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Elliptic,
    Parabolic,
    Hyperbolic,
}

impl Regime {
    pub fn from_eccentricity(e: f64) -> Regime {
        if (e - 1.0).abs() <= PARABOLIC_TOLERANCE {
            Regime::Parabolic
        } else if e < 1.0 {
            Regime::Elliptic
        } else {
            Regime::Hyperbolic
        }
    }
}

/// Shape and orientation used by [`Orbit::from_orbital_elements`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementsInput {
    /// Classical elements; angles in radians. Parabolic eccentricity is rejected because `sma`
    /// cannot describe it; use [`ElementsInput::AngularMomentum`] instead.
    Classical { sma: f64, e: f64, argp: f64, inc: f64, lon_an: f64 },
    /// Specific angular momentum and eccentricity vectors.
    AngularMomentum { h: Vector3, e_vec: Vector3 },
}

/// Where on the orbit the state is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Regime anomaly (mean, Barker or hyperbolic) at time 0.
    MeanAnomaly { ma0: f64 },
    /// True anomaly `ta` reached at time `t0`.
    TrueAnomaly { ta: f64, t0: f64 },
}

/// Partial override applied by [`Orbit::from_orbit_with_updated_elements`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementsUpdate {
    pub sma: Option<f64>,
    pub e: Option<f64>,
    pub argp: Option<f64>,
    pub inc: Option<f64>,
    pub lon_an: Option<f64>,
    pub ma0: Option<f64>,
}

/// Persisted form of an orbit: `{"g": μ, "r": [x, y, z], "v": [x, y, z], "t": epoch}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitRecord {
    pub g: f64,
    pub r: Vector3,
    pub v: Vector3,
    pub t: f64,
}

#[derive(Debug, Clone, Copy)]
struct Derived {
    h: Vector3,
    e_vec: Vector3,
    e: f64,
    alpha: f64,
    p: f64,
    inclination: f64,
    lon_an: f64,
    argp: f64,
    /// Perifocal basis expressed in the global frame.
    basis: [Vector3; 3],
    regime: Regime,
    ta_epoch: f64,
    anomaly_epoch: f64,
    mean_motion: f64,
}

/// Immutable two-body orbit keyed by `{gravity, position, velocity, epoch}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "OrbitRecord", into = "OrbitRecord")]
pub struct Orbit {
    gravity: f64,
    position: Vector3,
    velocity: Vector3,
    epoch: f64,
    derived: Derived,
}

impl PartialEq for Orbit {
    fn eq(&self, other: &Self) -> bool {
        self.gravity == other.gravity
            && self.position.is_equal(&other.position)
            && self.velocity.is_equal(&other.velocity)
            && self.epoch == other.epoch
    }
}

impl TryFrom<OrbitRecord> for Orbit {
    type Error = OrbitError;

    fn try_from(record: OrbitRecord) -> Result<Self, Self::Error> {
        Orbit::from_state_vector(record.g, record.r, record.v, record.t)
    }
}

impl From<Orbit> for OrbitRecord {
    fn from(orbit: Orbit) -> Self {
        OrbitRecord { g: orbit.gravity, r: orbit.position, v: orbit.velocity, t: orbit.epoch }
    }
}

pub(crate) fn check_gravity(mu: f64) -> Result<(), OrbitError> {
    if mu.is_finite() && mu > 0.0 { Ok(()) } else { Err(OrbitError::InvalidGravity(mu)) }
}

impl Orbit {
    /// Build an orbit from a Cartesian state at time `t`.
    pub fn from_state_vector(mu: f64, r: Vector3, v: Vector3, t: f64) -> Result<Orbit, OrbitError> {
        check_gravity(mu)?;
        if !r.is_finite() || !v.is_finite() || !t.is_finite() || r.norm() == 0.0 {
            return Err(OrbitError::InvalidState);
        }
        Ok(Orbit { gravity: mu, position: r, velocity: v, epoch: t, derived: derive(mu, &r, &v) })
    }

    /// Build an orbit from a shape/orientation and a phase.
    ///
    /// The perifocal state is rotated into the global frame by the 3-1-3 sequence (Ω, i, ω).
    /// With [`Phase::MeanAnomaly`] the state is placed at periapsis and the epoch is
    /// back-solved, so Kepler's equation never has to be inverted far from periapsis.
    pub fn from_orbital_elements(
        mu: f64,
        elements: ElementsInput,
        phase: Phase,
    ) -> Result<Orbit, OrbitError> {
        check_gravity(mu)?;
        let (p, e, inc, lon_an, argp) = match elements {
            ElementsInput::Classical { sma, e, argp, inc, lon_an } => {
                if !(e >= 0.0) || Regime::from_eccentricity(e) == Regime::Parabolic {
                    return Err(OrbitError::InvalidElements(format!(
                        "eccentricity {e} cannot be described by a semi-major axis"
                    )));
                }
                if (e < 1.0 && !(sma > 0.0)) || (e > 1.0 && !(sma < 0.0)) {
                    return Err(OrbitError::InvalidElements(format!(
                        "semi-major axis {sma} does not match eccentricity {e}"
                    )));
                }
                (sma * (1.0 - e * e), e, inc, lon_an, argp)
            }
            ElementsInput::AngularMomentum { h, e_vec } => {
                if !h.is_finite() || !e_vec.is_finite() || h.norm() == 0.0 {
                    return Err(OrbitError::InvalidElements(
                        "angular momentum must be finite and non-zero".to_string(),
                    ));
                }
                let (inc, lon_an, argp) = orientation(&h, &e_vec);
                (h.norm_squared() / mu, e_vec.norm(), inc, lon_an, argp)
            }
        };

        let (ta, t0) = match phase {
            Phase::TrueAnomaly { ta, t0 } => (ta, t0),
            Phase::MeanAnomaly { ma0 } => {
                let regime = Regime::from_eccentricity(e);
                let n = mean_motion(mu, p, (1.0 - e * e) / p, regime);
                (0.0, -ma0 / n)
            }
        };

        let basis = perifocal_basis(lon_an, inc, argp);
        let (sin, cos) = ta.sin_cos();
        let radius = p / (1.0 + e * cos);
        let k = (mu / p).sqrt();
        let r = to_global(&basis, &Vector3::new(radius * cos, radius * sin, 0.0));
        let v = to_global(&basis, &Vector3::new(-k * sin, k * (e + cos), 0.0));
        Orbit::from_state_vector(mu, r, v, t0)
    }

    /// Rebuild `orbit` from its own classical elements and `ma0`, with overrides applied.
    pub fn from_orbit_with_updated_elements(
        orbit: &Orbit,
        update: ElementsUpdate,
    ) -> Result<Orbit, OrbitError> {
        let elements = ElementsInput::Classical {
            sma: update.sma.unwrap_or_else(|| orbit.sma()),
            e: update.e.unwrap_or_else(|| orbit.eccentricity()),
            argp: update.argp.unwrap_or_else(|| orbit.argp()),
            inc: update.inc.unwrap_or_else(|| orbit.inclination()),
            lon_an: update.lon_an.unwrap_or_else(|| orbit.lon_an()),
        };
        let ma0 = update.ma0.unwrap_or_else(|| orbit.ma0());
        Orbit::from_orbital_elements(orbit.gravity, elements, Phase::MeanAnomaly { ma0 })
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Specific angular momentum `r0 × v0`.
    pub fn angular_momentum(&self) -> Vector3 {
        self.derived.h
    }

    pub fn eccentricity_vector(&self) -> Vector3 {
        self.derived.e_vec
    }

    pub fn eccentricity(&self) -> f64 {
        self.derived.e
    }

    pub fn regime(&self) -> Regime {
        self.derived.regime
    }

    /// `1/a = 2/|r0| − |v0|²/μ`.
    pub fn alpha(&self) -> f64 {
        self.derived.alpha
    }

    /// Semi-major axis `1/α`: positive for ellipses, negative for hyperbolas.
    pub fn sma(&self) -> f64 {
        1.0 / self.derived.alpha
    }

    /// Semi-latus rectum `|h|²/μ`, the shape parameter that stays meaningful for parabolas.
    pub fn parameter(&self) -> f64 {
        self.derived.p
    }

    pub fn inclination(&self) -> f64 {
        self.derived.inclination
    }

    /// Longitude of the ascending node in `[0, 2π)`; 0 for equatorial orbits.
    pub fn lon_an(&self) -> f64 {
        self.derived.lon_an
    }

    /// Argument of periapsis in `[0, 2π)`; 0 for circular orbits.
    pub fn argp(&self) -> f64 {
        self.derived.argp
    }

    pub fn ta_at_epoch(&self) -> f64 {
        self.derived.ta_epoch
    }

    /// Regime anomaly (mean / Barker / hyperbolic) at the epoch.
    pub fn mean_anomaly_at_epoch(&self) -> f64 {
        self.derived.anomaly_epoch
    }

    /// Rate of change of the regime anomaly (rad/s).
    pub fn mean_motion(&self) -> f64 {
        self.derived.mean_motion
    }

    /// Regime anomaly at time 0; wrapped to `(-π, π]` for elliptic orbits.
    pub fn ma0(&self) -> f64 {
        let ma0 = -self.derived.mean_motion * self.t_periapsis();
        match self.derived.regime {
            Regime::Elliptic => wrap_pi(ma0),
            _ => ma0,
        }
    }

    /// Time of the periapsis passage closest to the epoch.
    pub fn t_periapsis(&self) -> f64 {
        self.epoch - self.time_since_periapsis_at_ta(self.derived.ta_epoch)
    }

    /// Orbital period, `None` for open orbits.
    pub fn period(&self) -> Option<f64> {
        match self.derived.regime {
            Regime::Elliptic => Some(TWO_PI / self.derived.mean_motion),
            _ => None,
        }
    }

    pub fn periapsis(&self) -> f64 {
        self.derived.p / (1.0 + self.derived.e)
    }

    /// Apoapsis distance, `None` for open orbits.
    pub fn apoapsis(&self) -> Option<f64> {
        match self.derived.regime {
            Regime::Elliptic => Some(self.derived.p / (1.0 - self.derived.e)),
            _ => None,
        }
    }

    /// Specific orbital energy `−μα/2`.
    pub fn energy(&self) -> f64 {
        -0.5 * self.gravity * self.derived.alpha
    }

    pub fn distance_at_ta(&self, ta: f64) -> f64 {
        self.derived.p / (1.0 + self.derived.e * ta.cos())
    }

    pub fn speed_at_ta(&self, ta: f64) -> f64 {
        (self.gravity * (2.0 / self.distance_at_ta(ta) - self.derived.alpha)).sqrt()
    }

    pub fn position_at_ta(&self, ta: f64) -> Vector3 {
        let (sin, cos) = ta.sin_cos();
        let r = self.distance_at_ta(ta);
        self.perifocal_to_global(&Vector3::new(r * cos, r * sin, 0.0))
    }

    pub fn velocity_at_ta(&self, ta: f64) -> Vector3 {
        let (sin, cos) = ta.sin_cos();
        let k = (self.gravity / self.derived.p).sqrt();
        self.perifocal_to_global(&Vector3::new(-k * sin, k * (self.derived.e + cos), 0.0))
    }

    /// Flight-path angle above the local horizontal.
    pub fn flight_angle_at_ta(&self, ta: f64) -> f64 {
        let e = self.derived.e;
        (e * ta.sin()).atan2(1.0 + e * ta.cos())
    }

    /// True anomaly (outbound branch, in `[0, π]`) where the distance equals `distance`.
    pub fn ta_at_distance(&self, distance: f64) -> Option<f64> {
        let cos = (self.derived.p / distance - 1.0) / self.derived.e;
        // Apsis distances land a rounding error outside [-1, 1].
        if cos.is_finite() && cos.abs() <= 1.0 + 1e-12 { Some(cos.clamp(-1.0, 1.0).acos()) } else { None }
    }

    /// Time since periapsis at `ta`, from Kepler's, Barker's or the hyperbolic Kepler equation.
    pub fn time_since_periapsis_at_ta(&self, ta: f64) -> f64 {
        anomaly_from_ta(ta, self.derived.e, self.derived.regime) / self.derived.mean_motion
    }

    /// Time at which `ta` is reached, relative to the periapsis passage nearest the epoch.
    pub fn t_at_ta(&self, ta: f64) -> f64 {
        self.t_periapsis() + self.time_since_periapsis_at_ta(ta)
    }

    /// Position and velocity at time `t`. Returns the canonical state exactly at the epoch.
    pub fn state_vector_at_t(&self, t: f64) -> Result<(Vector3, Vector3), OrbitError> {
        let dt = t - self.epoch;
        if dt == 0.0 {
            return Ok((self.position, self.velocity));
        }
        universal::propagate(self.gravity, &self.position, &self.velocity, self.derived.alpha, dt)
    }

    pub fn position_at_t(&self, t: f64) -> Result<Vector3, OrbitError> {
        self.state_vector_at_t(t).map(|(r, _)| r)
    }

    pub fn velocity_at_t(&self, t: f64) -> Result<Vector3, OrbitError> {
        self.state_vector_at_t(t).map(|(_, v)| v)
    }

    /// True anomaly at time `t`, in `(-π, π]`.
    pub fn ta_at_t(&self, t: f64) -> Result<f64, OrbitError> {
        let r = self.global_to_perifocal(&self.position_at_t(t)?);
        let ta = r.y.atan2(r.x);
        Ok(if ta == -PI { PI } else { ta })
    }

    pub fn perifocal_to_global(&self, v: &Vector3) -> Vector3 {
        to_global(&self.derived.basis, v)
    }

    pub fn global_to_perifocal(&self, v: &Vector3) -> Vector3 {
        let [p, q, w] = &self.derived.basis;
        Vector3::new(v.dot(p), v.dot(q), v.dot(w))
    }

    /// Convert prograde / radial-in / normal components at `ta` to the global frame.
    pub fn prn_to_global(&self, ta: f64, prn: &Vector3) -> Vector3 {
        to_global(&self.prn_basis(&self.velocity_at_ta(ta)), prn)
    }

    /// Convert a global vector to prograde / radial-in / normal components at `ta`.
    pub fn global_to_prn(&self, ta: f64, v: &Vector3) -> Vector3 {
        let [p, r, n] = self.prn_basis(&self.velocity_at_ta(ta));
        Vector3::new(v.dot(&p), v.dot(&r), v.dot(&n))
    }

    /// Apply an impulsive burn given in prograde / radial-in / normal components at time `t`.
    pub fn with_burn_at_t(&self, t: f64, prn: &Vector3) -> Result<Orbit, OrbitError> {
        let (r, v) = self.state_vector_at_t(t)?;
        let dv = to_global(&self.prn_basis(&v), prn);
        Orbit::from_state_vector(self.gravity, r, v + dv, t)
    }

    fn prn_basis(&self, velocity: &Vector3) -> [Vector3; 3] {
        let prograde = velocity.unit();
        let normal = self.derived.basis[2];
        [prograde, normal.cross(&prograde), normal]
    }
}

fn to_global(basis: &[Vector3; 3], v: &Vector3) -> Vector3 {
    basis[0] * v.x + basis[1] * v.y + basis[2] * v.z
}

/// Rotate the perifocal axes by ω about z, i about x, then Ω about z.
fn perifocal_basis(lon_an: f64, inc: f64, argp: f64) -> [Vector3; 3] {
    [Vector3::X, Vector3::Y, Vector3::Z].map(|axis| {
        axis.rotated(&Vector3::Z, argp)
            .rotated(&Vector3::X, inc)
            .rotated(&Vector3::Z, lon_an)
    })
}

/// Inclination, longitude of the ascending node and argument of periapsis from `h` and `e_vec`.
fn orientation(h: &Vector3, e_vec: &Vector3) -> (f64, f64, f64) {
    let inclination = h.angle_to(&Vector3::Z);
    let node = Vector3::Z.cross(h);
    let (lon_an, node_dir) = if node.norm() <= EQUATORIAL_TOLERANCE * h.norm() {
        (0.0, Vector3::X)
    } else {
        (wrap_two_pi(node.y.atan2(node.x)), node.unit())
    };
    let argp = if e_vec.norm() < CIRCULAR_TOLERANCE {
        0.0
    } else {
        let normal = h.unit();
        wrap_two_pi(node_dir.cross(e_vec).dot(&normal).atan2(node_dir.dot(e_vec)))
    };
    (inclination, lon_an, argp)
}

fn mean_motion(mu: f64, p: f64, alpha: f64, regime: Regime) -> f64 {
    match regime {
        Regime::Elliptic => (mu * alpha.powi(3)).sqrt(),
        Regime::Hyperbolic => (mu * (-alpha).powi(3)).sqrt(),
        Regime::Parabolic => 2.0 * (mu / p.powi(3)).sqrt(),
    }
}

fn anomaly_from_ta(ta: f64, e: f64, regime: Regime) -> f64 {
    let half = 0.5 * ta;
    match regime {
        Regime::Elliptic => {
            let ea = 2.0 * ((1.0 - e).sqrt() * half.sin()).atan2((1.0 + e).sqrt() * half.cos());
            ea - e * ea.sin()
        }
        Regime::Parabolic => {
            let d = half.tan();
            d + d.powi(3) / 3.0
        }
        Regime::Hyperbolic => {
            let fa = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * half.tan()).atanh();
            e * fa.sinh() - fa
        }
    }
}

fn derive(mu: f64, r: &Vector3, v: &Vector3) -> Derived {
    let r_mag = r.norm();
    let h = r.cross(v);
    let e_vec = v.cross(&h) / mu - *r / r_mag;
    let e = e_vec.norm();
    let alpha = 2.0 / r_mag - v.norm_squared() / mu;
    let p = h.norm_squared() / mu;
    let regime = Regime::from_eccentricity(e);

    let (inclination, lon_an, argp) = orientation(&h, &e_vec);
    let basis = perifocal_basis(lon_an, inclination, argp);
    let ta_epoch = wrap_pi(r.dot(&basis[1]).atan2(r.dot(&basis[0])));

    Derived {
        h,
        e_vec,
        e,
        alpha,
        p,
        inclination,
        lon_an,
        argp,
        basis,
        regime,
        ta_epoch,
        anomaly_epoch: anomaly_from_ta(ta_epoch, e, regime),
        mean_motion: mean_motion(mu, p, alpha, regime),
    }
}
