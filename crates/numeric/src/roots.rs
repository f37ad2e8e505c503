//! One-dimensional root finding.

use tracing::debug;

use crate::SolverError;

/// Iteration budget for [`find_zero_newton`] before it falls back to bisection.
pub const NEWTON_MAX_ITERATIONS: usize = 1000;

/// Upper bound on bisection halvings; enough to exhaust the f64 mantissa from any finite interval.
const BISECT_MAX_ITERATIONS: usize = 2_200;

/// Find a root of `f` with Newton's method starting at `x0`.
///
/// Converges when `f(x)` is exactly zero or the step satisfies `|Δx| <= tol·max(1, |x|)`.
/// While iterating, the most recent negative and positive evaluations are remembered; if the
/// iteration budget runs out and such a bracket exists the root is finished by bisection,
/// otherwise [`SolverError::NoConvergence`] is returned. Any non-finite `f`, `f'` or iterate
/// fails immediately with [`SolverError::NonFinite`].
pub fn find_zero_newton<F, D>(mut f: F, mut df: D, x0: f64, tol: f64) -> Result<f64, SolverError>
where
    F: FnMut(f64) -> f64,
    D: FnMut(f64) -> f64,
{
    if tol.is_nan() || tol <= 0.0 {
        return Err(SolverError::InvalidInput(format!("tolerance must be positive, got {tol}")));
    }

    let mut x = x0;
    let mut below: Option<f64> = None;
    let mut above: Option<f64> = None;

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let fx = f(x);
        if !fx.is_finite() || !x.is_finite() {
            return Err(SolverError::NonFinite { x });
        }
        if fx == 0.0 {
            return Ok(x);
        }
        if fx < 0.0 {
            below = Some(x);
        } else {
            above = Some(x);
        }

        let slope = df(x);
        let next = x - fx / slope;
        if !next.is_finite() {
            return Err(SolverError::NonFinite { x });
        }
        if (next - x).abs() <= tol * x.abs().max(1.0) {
            return Ok(next);
        }
        x = next;
    }

    match (below, above) {
        (Some(lo), Some(hi)) => {
            debug!(lo, hi, "newton exhausted its budget, falling back to bisection");
            find_zero_bisect(f, lo, hi, tol * lo.abs().max(hi.abs()).max(1.0))
        }
        _ => Err(SolverError::NoConvergence { iterations: NEWTON_MAX_ITERATIONS }),
    }
}

/// Find a root of `f` inside `[lo, hi]` (in either order) by bisection.
///
/// Stops once the bracket is no wider than `tol` or can no longer be split.
pub fn find_zero_bisect<F>(mut f: F, lo: f64, hi: f64, tol: f64) -> Result<f64, SolverError>
where
    F: FnMut(f64) -> f64,
{
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.is_nan() || f_hi.is_nan() || f_lo.signum() == f_hi.signum() {
        return Err(SolverError::NoSignChange { lo, hi });
    }

    let (mut lo, mut hi) = (lo, hi);
    for _ in 0..BISECT_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if (hi - lo).abs() <= tol || mid == lo || mid == hi {
            return Ok(mid);
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.is_nan() {
            return Err(SolverError::NonFinite { x: mid });
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(SolverError::NoConvergence { iterations: BISECT_MAX_ITERATIONS })
}
