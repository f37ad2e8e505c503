//! The [`OrbitAround`] state: an orbit plus the body it is bound to.

use std::sync::Arc;

use conic_orbits::{Orbit, Vector3};
use tracing::debug;

use crate::{Body, BodyId, BodySystem, PatchedError, SOI_BOUNDARY_TOLERANCE};

/// An orbit around one body of a shared [`BodySystem`].
///
/// The orbit always uses the gravity parameter of that body. Transitions return new values.
#[derive(Debug, Clone)]
pub struct OrbitAround {
    system: Arc<BodySystem>,
    body: BodyId,
    orbit: Orbit,
}

impl PartialEq for OrbitAround {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.system, &other.system) || *self.system == *other.system)
            && self.body == other.body
            && self.orbit == other.orbit
    }
}

impl OrbitAround {
    pub fn new(system: Arc<BodySystem>, body: BodyId, orbit: Orbit) -> Result<Self, PatchedError> {
        let Some(reference) = system.get(body) else {
            return Err(PatchedError::UnknownBody(format!("#{}", body.index())));
        };
        if orbit.gravity() != reference.gravity() {
            return Err(PatchedError::GravityMismatch {
                body: reference.name().to_string(),
                expected: reference.gravity(),
                found: orbit.gravity(),
            });
        }
        Ok(Self { system, body, orbit })
    }

    pub fn system(&self) -> &Arc<BodySystem> {
        &self.system
    }

    pub fn body_id(&self) -> BodyId {
        self.body
    }

    pub fn body(&self) -> &Body {
        self.system.body(self.body)
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    /// Same body, different orbit.
    pub fn with_orbit(&self, orbit: Orbit) -> Result<Self, PatchedError> {
        OrbitAround::new(Arc::clone(&self.system), self.body, orbit)
    }

    /// Apply an impulsive burn in prograde / radial-in / normal components at `t`.
    pub fn with_burn_at_t(&self, t: f64, prn: &Vector3) -> Result<Self, PatchedError> {
        self.with_orbit(self.orbit.with_burn_at_t(t, prn)?)
    }

    /// Re-express the state at `t` around the parent body.
    pub fn exit_soi(&self, t: f64) -> Result<Self, PatchedError> {
        let body = self.body();
        let parent = body.parent().ok_or_else(|| PatchedError::NoParent(body.name().to_string()))?;
        let soi = body.soi().ok_or_else(|| PatchedError::UnboundedSoi(body.name().to_string()))?;

        let (r, v) = self.orbit.state_vector_at_t(t)?;
        check_boundary(r.norm(), soi)?;
        let (rb, vb) = self.system.state_at_t(self.body, t)?;

        let gravity = self.system.body(parent).gravity();
        let orbit = Orbit::from_state_vector(gravity, rb + r, vb + v, t)?;
        debug!(t, from = body.name(), to = self.system.body(parent).name(), "left sphere of influence");
        OrbitAround::new(Arc::clone(&self.system), parent, orbit)
    }

    /// Re-express the state at `t` around `child`, one of the current body's children.
    pub fn enter_soi(&self, t: f64, child: BodyId) -> Result<Self, PatchedError> {
        let body = self.body();
        let target = self
            .system
            .get(child)
            .filter(|target| target.parent() == Some(self.body))
            .ok_or_else(|| PatchedError::NotAChild {
                body: body.name().to_string(),
                child: self
                    .system
                    .get(child)
                    .map(|target| target.name().to_string())
                    .unwrap_or_else(|| format!("#{}", child.index())),
            })?;
        let soi = target.soi().ok_or_else(|| PatchedError::UnboundedSoi(target.name().to_string()))?;

        let (r, v) = self.orbit.state_vector_at_t(t)?;
        let (rc, vc) = self.system.state_at_t(child, t)?;
        let relative = r - rc;
        check_boundary(relative.norm(), soi)?;

        let orbit = Orbit::from_state_vector(target.gravity(), relative, v - vc, t)?;
        debug!(t, from = body.name(), to = target.name(), "entered sphere of influence");
        OrbitAround::new(Arc::clone(&self.system), child, orbit)
    }
}

fn check_boundary(distance: f64, soi: f64) -> Result<(), PatchedError> {
    if (distance - soi).abs() <= SOI_BOUNDARY_TOLERANCE * soi {
        Ok(())
    } else {
        Err(PatchedError::NotAtSoiBoundary { distance, soi })
    }
}
