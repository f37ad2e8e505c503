//! Two-body orbital mechanics and patched-conic planning.
//!
//! The physics lives in the workspace crates; this crate re-exports them under one roof so
//! front-ends and the integration tests only need a single dependency.

pub use conic_config as config;
pub use conic_core::{constants, units, vector};
pub use conic_export as export;
pub use conic_numeric as numeric;
pub use conic_orbits as orbits;
pub use conic_patched as patched;

pub use conic_core::Vector3;
pub use conic_orbits::{Orbit, OrbitError};
pub use conic_patched::{BodySystem, OrbitAround, PatchedError};

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
