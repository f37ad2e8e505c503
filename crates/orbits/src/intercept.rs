//! Closest-approach search between two orbits sharing a central body.

use conic_numeric::find_zero_bisect;
use tracing::trace;

use crate::{Orbit, OrbitError};

/// Fraction of a period that bounds a single search step.
const STEPS_PER_PERIOD: f64 = 64.0;
/// Time tolerance used when refining a minimum.
const REFINE_TOLERANCE: f64 = 1e-6;

/// A local minimum of separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intercept {
    pub t: f64,
    pub distance: f64,
    /// Search step in which the range rate changed sign.
    pub bracket: (f64, f64),
}

/// Outcome of one [`InterceptSearch::advance`] slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchProgress {
    /// The step budget ran out before anything was found; call again to continue.
    Pending,
    Found(Intercept),
    /// The end of the window was reached.
    Finished,
}

/// Resumable march over `[t, t_end]` looking for minima of `|r_a − r_b|`.
///
/// Minima are located where the range rate turns from negative to positive between two
/// samples. Encounters shorter than a step can be missed.
#[derive(Debug, Clone)]
pub struct InterceptSearch {
    a: Orbit,
    b: Orbit,
    t: f64,
    t_end: f64,
    step: f64,
    rate: Option<f64>,
    finished: bool,
}

impl InterceptSearch {
    pub fn new(a: Orbit, b: Orbit, t: f64, t_end: f64, accuracy: f64) -> Result<Self, OrbitError> {
        if !(accuracy > 0.0) || !accuracy.is_finite() {
            return Err(OrbitError::InvalidAccuracy(accuracy));
        }
        let step = [a.period(), b.period()]
            .into_iter()
            .flatten()
            .fold(accuracy, |step, period| step.min(period / STEPS_PER_PERIOD));
        Ok(Self { a, b, t, t_end, step, rate: None, finished: !(t < t_end) })
    }

    /// Time the search has reached.
    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Range rate `d|r_a − r_b|/dt` at `t`.
    pub fn range_rate(&self, t: f64) -> Result<f64, OrbitError> {
        let (ra, va) = self.a.state_vector_at_t(t)?;
        let (rb, vb) = self.b.state_vector_at_t(t)?;
        let dr = ra - rb;
        let distance = dr.norm();
        Ok(if distance == 0.0 { 0.0 } else { dr.dot(&(va - vb)) / distance })
    }

    pub fn distance(&self, t: f64) -> Result<f64, OrbitError> {
        Ok((self.a.position_at_t(t)? - self.b.position_at_t(t)?).norm())
    }

    /// Take at most `max_steps` steps, stopping early at the next minimum.
    pub fn advance(&mut self, max_steps: usize) -> Result<SearchProgress, OrbitError> {
        if self.finished {
            return Ok(SearchProgress::Finished);
        }
        let mut rate = match self.rate {
            Some(rate) => rate,
            None => self.range_rate(self.t)?,
        };

        for _ in 0..max_steps {
            if self.t >= self.t_end {
                self.finished = true;
                return Ok(SearchProgress::Finished);
            }
            let lo = self.t;
            let hi = (lo + self.step).min(self.t_end);
            let next = self.range_rate(hi)?;
            self.t = hi;
            self.rate = Some(next);

            if rate < 0.0 && next >= 0.0 {
                let t = find_zero_bisect(
                    |t| self.range_rate(t).unwrap_or(f64::NAN),
                    lo,
                    hi,
                    REFINE_TOLERANCE,
                )?;
                let distance = self.distance(t)?;
                trace!(t, distance, "closest approach");
                return Ok(SearchProgress::Found(Intercept { t, distance, bracket: (lo, hi) }));
            }
            rate = next;
        }
        Ok(SearchProgress::Pending)
    }
}

impl Iterator for InterceptSearch {
    type Item = Result<Intercept, OrbitError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.advance(usize::MAX) {
                Ok(SearchProgress::Pending) => continue,
                Ok(SearchProgress::Found(intercept)) => return Some(Ok(intercept)),
                Ok(SearchProgress::Finished) => return None,
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl Orbit {
    /// First closest approach to `other` within `[t, t_end]`, searched in steps of at most
    /// `accuracy` seconds.
    pub fn next_intercept(
        &self,
        other: &Orbit,
        t: f64,
        t_end: f64,
        accuracy: f64,
    ) -> Result<Option<Intercept>, OrbitError> {
        InterceptSearch::new(*self, *other, t, t_end, accuracy)?.next().transpose()
    }
}
