//! Patched-conic planning across a hierarchy of attracting bodies.
//!
//! An [`OrbitAround`] pairs an [`Orbit`](conic_orbits::Orbit) with the body it is currently
//! bound to. Event detection finds where the trajectory leaves that body's sphere of
//! influence, enters a child's, or reaches the atmosphere; transitions build a new
//! `OrbitAround` around the next reference body and leave the old one untouched.

pub mod bodies;
pub mod events;
pub mod orbit_around;
pub mod records;
pub mod trajectory;

pub use bodies::{Body, BodyId, BodySpec, BodySystem, BodySystemBuilder};
pub use events::{DEFAULT_INTERCEPT_ACCURACY, Event, EventKind, EventScan};
pub use orbit_around::OrbitAround;
pub use records::{OrbitAroundRecord, SystemCatalog};
pub use trajectory::{Segment, Trajectory};

use conic_config::ConfigError;
use conic_orbits::OrbitError;
use thiserror::Error;

/// Relative tolerance on the SoI radius accepted by the transition operations.
pub const SOI_BOUNDARY_TOLERANCE: f64 = 0.01;

/// Errors produced by body systems and patched-conic transitions.
#[derive(Debug, Error)]
pub enum PatchedError {
    #[error(transparent)]
    Orbit(#[from] OrbitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid body system `{system}`: {reason}")]
    InvalidSystem { system: String, reason: String },
    #[error("unknown body `{0}`")]
    UnknownBody(String),
    #[error("unknown body system `{0}`")]
    UnknownSystem(String),
    #[error("orbit of `{body}` uses gravity {found}, expected {expected}")]
    GravityMismatch { body: String, expected: f64, found: f64 },
    #[error("body `{0}` has no parent to transition to")]
    NoParent(String),
    #[error("body `{child}` does not orbit `{body}`")]
    NotAChild { body: String, child: String },
    #[error("body `{0}` has an unbounded sphere of influence")]
    UnboundedSoi(String),
    #[error("probe at {distance} m is not at the sphere-of-influence boundary ({soi} m)")]
    NotAtSoiBoundary { distance: f64, soi: f64 },
}
