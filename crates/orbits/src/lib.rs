//! Two-body Keplerian orbits for patched-conic calculations.
//!
//! [`Orbit`] is an immutable value keyed by its canonical state (gravity parameter, position,
//! velocity, epoch). Classical elements are derived from that state once, at construction.
//! Time queries go through the universal-variable formulation so the same code path serves
//! elliptic, parabolic and hyperbolic orbits; true-anomaly queries are closed form.

pub mod excess;
pub mod intercept;
pub mod lambert;
pub mod orbit;
pub mod stumpff;
mod universal;

pub use excess::Turn;
pub use intercept::{Intercept, InterceptSearch, SearchProgress};
pub use lambert::{
    Bate1971Solution, LambertProblem, LambertSolution, TransferDirection, TransferPath,
    solve_bate1971, solve_lambert,
};
pub use orbit::{ElementsInput, ElementsUpdate, Orbit, OrbitRecord, PARABOLIC_TOLERANCE, Phase, Regime};

pub use conic_core::Vector3;

use conic_numeric::SolverError;
use thiserror::Error;

/// Errors raised while building or querying orbits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrbitError {
    #[error("gravity parameter must be positive and finite, got {0}")]
    InvalidGravity(f64),
    #[error("state vector must be finite with a non-zero position")]
    InvalidState,
    #[error("time of flight must be positive, got {0}")]
    InvalidTimeOfFlight(f64),
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("unsupported lambert request: {0}")]
    UnsupportedLambert(&'static str),
    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),
    #[error("search accuracy must be positive and finite, got {0}")]
    InvalidAccuracy(f64),
    #[error("propagation by {dt} s failed: {source}")]
    Propagation {
        dt: f64,
        #[source]
        source: SolverError,
    },
    #[error(transparent)]
    Solver(#[from] SolverError),
}
