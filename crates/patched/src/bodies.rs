//! Static body hierarchies stored as an arena indexed by [`BodyId`].

use std::collections::HashMap;

use conic_config::SystemConfig;
use conic_orbits::{ElementsInput, Orbit, Phase, Vector3};
use serde::{Deserialize, Serialize};

use crate::PatchedError;

/// Index of a body inside its [`BodySystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(usize);

impl BodyId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An attracting body. Never mutated once its system is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    name: String,
    gravity: f64,
    radius: f64,
    atmosphere_height: f64,
    soi: Option<f64>,
    parent: Option<BodyId>,
    children: Vec<BodyId>,
    orbit: Option<Orbit>,
}

impl Body {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn atmosphere_height(&self) -> f64 {
        self.atmosphere_height
    }

    /// Distance below which a probe is in the atmosphere, or on the surface for airless bodies.
    pub fn atmosphere_radius(&self) -> f64 {
        self.radius + self.atmosphere_height
    }

    pub fn has_atmosphere(&self) -> bool {
        self.atmosphere_height > 0.0
    }

    /// Sphere-of-influence radius; `None` for an unbounded root.
    pub fn soi(&self) -> Option<f64> {
        self.soi
    }

    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    pub fn children(&self) -> &[BodyId] {
        &self.children
    }

    /// Orbit around the parent body; `None` for the root.
    pub fn orbit(&self) -> Option<&Orbit> {
        self.orbit.as_ref()
    }
}

/// A named tree of bodies with a single root.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySystem {
    name: String,
    bodies: Vec<Body>,
    root: BodyId,
}

impl BodySystem {
    pub fn builder(name: impl Into<String>) -> BodySystemBuilder {
        BodySystemBuilder::new(name)
    }

    /// Build a system from configuration; each orbit is placed with its mean anomaly at time 0.
    pub fn from_config(config: &SystemConfig) -> Result<BodySystem, PatchedError> {
        config.validate()?;
        let mut builder = BodySystemBuilder::new(config.name.clone());
        for body in &config.bodies {
            let orbit = match (&body.parent, &body.orbit) {
                (Some(parent), Some(elements)) => {
                    let gravity = config
                        .body(parent)
                        .map(|parent| parent.gravity_m3_s2)
                        .ok_or_else(|| PatchedError::UnknownBody(parent.clone()))?;
                    let orbit = Orbit::from_orbital_elements(
                        gravity,
                        ElementsInput::Classical {
                            sma: elements.sma_m,
                            e: elements.eccentricity,
                            argp: elements.argp_deg.to_radians(),
                            inc: elements.inclination_deg.to_radians(),
                            lon_an: elements.lon_an_deg.to_radians(),
                        },
                        Phase::MeanAnomaly { ma0: elements.ma0_rad },
                    )?;
                    Some(orbit)
                }
                _ => None,
            };
            builder = builder.body(BodySpec {
                name: body.name.clone(),
                parent: body.parent.clone(),
                gravity: body.gravity_m3_s2,
                radius: body.radius_m,
                atmosphere_height: body.atmosphere_height_m,
                soi: body.soi_radius_m,
                orbit,
            });
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> BodyId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        (0..self.bodies.len()).map(BodyId)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    /// Body by id.
    ///
    /// Ids are only handed out by the system that owns them; passing an id from another system
    /// panics if it is out of range.
    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|body| body.name == name).map(BodyId)
    }

    /// State of `id` relative to its parent at `t`; the root sits at the origin.
    pub fn state_at_t(&self, id: BodyId, t: f64) -> Result<(Vector3, Vector3), PatchedError> {
        match &self.body(id).orbit {
            Some(orbit) => Ok(orbit.state_vector_at_t(t)?),
            None => Ok((Vector3::ZERO, Vector3::ZERO)),
        }
    }

    /// State of `id` relative to the root at `t`, summed along the parent chain.
    pub fn absolute_state_at_t(&self, id: BodyId, t: f64) -> Result<(Vector3, Vector3), PatchedError> {
        let mut position = Vector3::ZERO;
        let mut velocity = Vector3::ZERO;
        let mut current = Some(id);
        while let Some(body) = current {
            let (r, v) = self.state_at_t(body, t)?;
            position = position + r;
            velocity = velocity + v;
            current = self.body(body).parent;
        }
        Ok((position, velocity))
    }
}

/// Input for one body of a [`BodySystemBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub name: String,
    pub parent: Option<String>,
    pub gravity: f64,
    pub radius: f64,
    pub atmosphere_height: f64,
    pub soi: Option<f64>,
    /// Orbit around `parent`, using the parent's gravity parameter.
    pub orbit: Option<Orbit>,
}

/// Collects bodies in any order and resolves the hierarchy on [`BodySystemBuilder::build`].
#[derive(Debug, Clone)]
pub struct BodySystemBuilder {
    name: String,
    specs: Vec<BodySpec>,
}

impl BodySystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), specs: Vec::new() }
    }

    pub fn body(mut self, spec: BodySpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn build(self) -> Result<BodySystem, PatchedError> {
        let invalid = |reason: String| PatchedError::InvalidSystem { system: self.name.clone(), reason };

        let mut ids = HashMap::new();
        for (index, spec) in self.specs.iter().enumerate() {
            if ids.insert(spec.name.as_str(), BodyId(index)).is_some() {
                return Err(invalid(format!("body `{}` is declared twice", spec.name)));
            }
        }

        let mut bodies = Vec::with_capacity(self.specs.len());
        let mut root = None;
        for spec in &self.specs {
            let parent = match &spec.parent {
                Some(parent) => Some(
                    *ids.get(parent.as_str())
                        .ok_or_else(|| PatchedError::UnknownBody(parent.clone()))?,
                ),
                None => None,
            };
            match (parent, &spec.orbit) {
                (None, _) => {
                    if root.replace(BodyId(bodies.len())).is_some() {
                        return Err(invalid("more than one root body".to_string()));
                    }
                }
                (Some(parent), Some(orbit)) => {
                    let expected = self.specs[parent.0].gravity;
                    if orbit.gravity() != expected {
                        return Err(PatchedError::GravityMismatch {
                            body: spec.name.clone(),
                            expected,
                            found: orbit.gravity(),
                        });
                    }
                }
                (Some(_), None) => {
                    return Err(invalid(format!("body `{}` has no orbit", spec.name)));
                }
            }
            bodies.push(Body {
                name: spec.name.clone(),
                gravity: spec.gravity,
                radius: spec.radius,
                atmosphere_height: spec.atmosphere_height,
                soi: spec.soi,
                parent,
                children: Vec::new(),
                orbit: if parent.is_some() { spec.orbit } else { None },
            });
        }
        let root = root.ok_or_else(|| invalid("no root body".to_string()))?;

        // Every chain of parents has to end at the root within `len` hops.
        for start in 0..bodies.len() {
            let mut current = BodyId(start);
            let mut hops = 0;
            while let Some(parent) = bodies[current.0].parent {
                hops += 1;
                if hops > bodies.len() {
                    return Err(invalid(format!("body `{}` is part of a cycle", bodies[start].name)));
                }
                current = parent;
            }
        }

        for index in 0..bodies.len() {
            if let Some(parent) = bodies[index].parent {
                bodies[parent.0].children.push(BodyId(index));
            }
        }

        Ok(BodySystem { name: self.name, bodies, root })
    }
}
