//! Unpowered flight across sphere-of-influence transitions.

use crate::{DEFAULT_INTERCEPT_ACCURACY, Event, EventKind, OrbitAround, PatchedError};

/// A stretch of flight spent around a single body.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub orbit: OrbitAround,
    pub t_start: f64,
    pub t_end: f64,
    /// Event that closed the segment; `None` when the window ran out first.
    pub end: Option<Event>,
}

/// Iterator over the segments of an unpowered trajectory.
///
/// Each call to `next` runs one event scan, so the iterator can be driven a segment at a time
/// and abandoned at any point. Iteration stops after an atmosphere entry, a surface collision,
/// the end of the window or the first error.
#[derive(Debug, Clone)]
pub struct Trajectory {
    current: Option<OrbitAround>,
    t: f64,
    t_end: f64,
    accuracy: f64,
}

impl Trajectory {
    /// Step bound used for child encounter searches.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }
}

impl OrbitAround {
    /// Follow this orbit through SoI transitions over `[t, t_end]`.
    pub fn trajectory(&self, t: f64, t_end: f64) -> Trajectory {
        Trajectory { current: Some(self.clone()), t, t_end, accuracy: DEFAULT_INTERCEPT_ACCURACY }
    }

    /// Transition across `event`; `None` for events that end the flight or need no transition.
    pub fn apply_event(&self, event: &Event) -> Result<Option<OrbitAround>, PatchedError> {
        match event.kind {
            EventKind::ExitSoi => self.exit_soi(event.t).map(Some),
            EventKind::EnterSoi(child) => self.enter_soi(event.t, child).map(Some),
            EventKind::EnterAtmosphere | EventKind::CollideSurface | EventKind::Intercept(_) => {
                Ok(None)
            }
        }
    }
}

impl Iterator for Trajectory {
    type Item = Result<Segment, PatchedError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let t_start = self.t;

        let event = match current.scan_events(t_start, self.t_end, self.accuracy) {
            Ok(scan) => scan.next,
            Err(error) => return Some(Err(error)),
        };
        let Some(event) = event else {
            return Some(Ok(Segment { orbit: current, t_start, t_end: self.t_end, end: None }));
        };

        match current.apply_event(&event) {
            Ok(next) => self.current = next,
            Err(error) => return Some(Err(error)),
        }
        self.t = event.t;
        Some(Ok(Segment { orbit: current, t_start, t_end: event.t, end: Some(event) }))
    }
}
