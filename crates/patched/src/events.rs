//! Event detection for [`OrbitAround`].

use conic_numeric::find_zero_bisect;
use conic_orbits::{InterceptSearch, Orbit, OrbitError};
use tracing::trace;

use crate::{BodyId, OrbitAround, PatchedError};

/// Step bound, in seconds, used when searching for encounters with child bodies.
pub const DEFAULT_INTERCEPT_ACCURACY: f64 = 600.0;
/// Time tolerance for SoI-entry crossings.
const CROSSING_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Distance reaches the current body's sphere of influence.
    ExitSoi,
    /// Distance drops to the top of the atmosphere.
    EnterAtmosphere,
    /// Distance drops to the surface of an airless body.
    CollideSurface,
    /// Entry into a child's sphere of influence.
    EnterSoi(BodyId),
    /// Closest approach to a child that stays outside its sphere of influence.
    Intercept(BodyId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub t: f64,
    pub kind: EventKind,
    /// Distance to the current body, or to the child for child events.
    pub distance: f64,
}

impl Event {
    /// Whether the trajectory ends at this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::EnterAtmosphere | EventKind::CollideSurface)
    }
}

/// Result of [`OrbitAround::scan_events`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventScan {
    /// Earliest transition within the window.
    pub next: Option<Event>,
    /// Non-entering closest approaches before `next`.
    pub intercepts: Vec<Event>,
}

impl OrbitAround {
    /// Earliest SoI exit, atmosphere entry / surface collision or SoI entry in `[t, t_end]`.
    pub fn next_event(&self, t: f64, t_end: f64) -> Result<Option<Event>, PatchedError> {
        Ok(self.scan_events(t, t_end, DEFAULT_INTERCEPT_ACCURACY)?.next)
    }

    /// Like [`OrbitAround::next_event`], also collecting closest approaches to children that
    /// do not enter their sphere of influence.
    pub fn scan_events(&self, t: f64, t_end: f64, accuracy: f64) -> Result<EventScan, PatchedError> {
        let mut scan = EventScan::default();
        if !(t <= t_end) {
            return Ok(scan);
        }

        let mut next = earliest(self.exit_soi_event(t)?, self.atmosphere_event(t)?);
        let horizon = next.map(|event| event.t.min(t_end)).unwrap_or(t_end);

        for &child in self.body().children() {
            let entry = self.child_events(child, t, horizon, accuracy, &mut scan.intercepts)?;
            next = earliest(next, entry);
        }

        scan.next = next.filter(|event| event.t <= t_end);
        if let Some(event) = scan.next {
            scan.intercepts.retain(|intercept| intercept.t <= event.t);
        }
        scan.intercepts.sort_by(|a, b| a.t.total_cmp(&b.t));
        trace!(
            body = self.body().name(),
            next = ?scan.next,
            intercepts = scan.intercepts.len(),
            "event scan"
        );
        Ok(scan)
    }

    fn exit_soi_event(&self, t: f64) -> Result<Option<Event>, PatchedError> {
        let Some(soi) = self.body().soi() else {
            return Ok(None);
        };
        let orbit = self.orbit();
        let (r, v) = orbit.state_vector_at_t(t)?;
        if r.norm() >= soi && r.dot(&v) > 0.0 {
            return Ok(Some(Event { t, kind: EventKind::ExitSoi, distance: r.norm() }));
        }
        let Some(ta) = orbit.ta_at_distance(soi) else {
            return Ok(None);
        };
        let exit = not_before(orbit, orbit.t_at_ta(ta), t);
        Ok(Some(Event { t: exit, kind: EventKind::ExitSoi, distance: soi }))
    }

    fn atmosphere_event(&self, t: f64) -> Result<Option<Event>, PatchedError> {
        let body = self.body();
        let limit = body.atmosphere_radius();
        let kind =
            if body.has_atmosphere() { EventKind::EnterAtmosphere } else { EventKind::CollideSurface };
        let orbit = self.orbit();
        let (r, v) = orbit.state_vector_at_t(t)?;
        if r.norm() <= limit && r.dot(&v) < 0.0 {
            return Ok(Some(Event { t, kind, distance: r.norm() }));
        }
        let Some(ta) = orbit.ta_at_distance(limit) else {
            return Ok(None);
        };
        let entry = orbit.t_at_ta(-ta);
        if entry < t && orbit.period().is_none() {
            return Ok(None);
        }
        Ok(Some(Event { t: not_before(orbit, entry, t), kind, distance: limit }))
    }

    /// SoI entry into `child` before `t_end`, if any; misses are pushed onto `intercepts`.
    fn child_events(
        &self,
        child: BodyId,
        t: f64,
        t_end: f64,
        accuracy: f64,
        intercepts: &mut Vec<Event>,
    ) -> Result<Option<Event>, PatchedError> {
        let system = self.system();
        let body = system.body(child);
        let (Some(soi), Some(child_orbit)) = (body.soi(), body.orbit()) else {
            return Ok(None);
        };

        let search = InterceptSearch::new(*self.orbit(), *child_orbit, t, t_end, accuracy)?;
        let step = search.step();
        for intercept in search {
            let intercept = intercept?;
            if intercept.distance >= soi {
                intercepts.push(Event {
                    t: intercept.t,
                    kind: EventKind::Intercept(child),
                    distance: intercept.distance,
                });
                continue;
            }
            return self.soi_entry(child, child_orbit, soi, t, intercept.t, step).map(Some);
        }

        // The window can close after the crossing but before the closest approach.
        if t_end > t {
            let (r, v) = self.orbit().state_vector_at_t(t_end)?;
            let (child_r, child_v) = child_orbit.state_vector_at_t(t_end)?;
            let (dr, dv) = (r - child_r, v - child_v);
            if dr.norm() < soi && dr.dot(&dv) < 0.0 {
                return self.soi_entry(child, child_orbit, soi, t, t_end, step).map(Some);
            }
        }
        Ok(None)
    }

    /// Entry into `child`'s SoI, given a time `inside` it that is not earlier than `t`.
    fn soi_entry(
        &self,
        child: BodyId,
        child_orbit: &Orbit,
        soi: f64,
        t: f64,
        inside: f64,
        step: f64,
    ) -> Result<Event, PatchedError> {
        let separation = |tau: f64| -> Result<f64, PatchedError> {
            Ok((self.orbit().position_at_t(tau)? - child_orbit.position_at_t(tau)?).norm())
        };
        // Walk back until the probe is outside the SoI again.
        let mut inside = inside;
        let mut outside = inside;
        loop {
            if outside <= t {
                outside = t;
                break;
            }
            inside = outside;
            outside = (outside - step).max(t);
            if separation(outside)? > soi {
                break;
            }
        }
        if separation(outside)? <= soi {
            return Ok(Event { t, kind: EventKind::EnterSoi(child), distance: separation(t)? });
        }

        let crossing = find_zero_bisect(
            |tau| separation(tau).map(|d| d - soi).unwrap_or(f64::NAN),
            outside,
            inside,
            CROSSING_TOLERANCE,
        )
        .map_err(OrbitError::from)?;
        Ok(Event { t: crossing, kind: EventKind::EnterSoi(child), distance: soi })
    }
}

/// Shift `event` by whole periods, in either direction, to its first occurrence at or after `t`.
fn not_before(orbit: &Orbit, event: f64, t: f64) -> f64 {
    match orbit.period() {
        Some(period) => (event - ((event - t) / period).floor() * period).max(t),
        None => event.max(t),
    }
}

fn earliest(a: Option<Event>, b: Option<Event>) -> Option<Event> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.t < a.t { b } else { a }),
        (a, b) => a.or(b),
    }
}
