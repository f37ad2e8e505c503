//! Generic numeric solvers: 1-D root finding and N-D derivative-free minimisation.

pub mod nelder_mead;
pub mod roots;

pub use nelder_mead::{
    AsyncObjective, Minimum, NelderMead, NelderMeadOptions, Objective, Seed,
    find_minimum_nelder_mead, find_minimum_nelder_mead_async,
};
pub use roots::{NEWTON_MAX_ITERATIONS, find_zero_bisect, find_zero_newton};

use thiserror::Error;

/// Failures reported by the solvers. None of them is ever replaced by a silent guess.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("f({lo}) and f({hi}) share a sign; no root is bracketed")]
    NoSignChange { lo: f64, hi: f64 },
    #[error("non-finite value encountered at x = {x}")]
    NonFinite { x: f64 },
    #[error("invalid solver input: {0}")]
    InvalidInput(String),
}
