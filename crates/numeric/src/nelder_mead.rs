//! Nelder–Mead simplex minimisation.
//!
//! The algorithm lives in [`NelderMead`], an ask/tell state machine: it hands out one point at a
//! time and waits for its value. The synchronous and asynchronous drivers below only differ in
//! how they obtain that value, so both visit exactly the same sequence of points.

use std::future::Future;

use tracing::trace;

use crate::SolverError;

const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Synchronous objective port.
pub trait Objective {
    fn evaluate(&mut self, x: &[f64]) -> f64;
}

impl<F> Objective for F
where
    F: FnMut(&[f64]) -> f64,
{
    fn evaluate(&mut self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Objective whose evaluation may suspend (e.g. it needs out-of-process work).
pub trait AsyncObjective {
    fn evaluate(&mut self, x: Vec<f64>) -> impl Future<Output = f64>;
}

impl<F, Fut> AsyncObjective for F
where
    F: FnMut(Vec<f64>) -> Fut,
    Fut: Future<Output = f64>,
{
    fn evaluate(&mut self, x: Vec<f64>) -> impl Future<Output = f64> {
        self(x)
    }
}

/// Tuning knobs for the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadOptions {
    pub max_iters: usize,
    pub min_x_delta: f64,
    pub min_fx_delta: f64,
    /// Offset used when expanding a zero seed coordinate into a simplex.
    pub abs_expand: f64,
    /// Factor used when expanding a non-zero seed coordinate into a simplex.
    pub rel_expand: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iters: 100,
            min_x_delta: 1e-9,
            min_fx_delta: 1e-12,
            abs_expand: 1e-3,
            rel_expand: 1.01,
        }
    }
}

/// Starting configuration: a single point or a full simplex of `n + 1` points.
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    Point(Vec<f64>),
    Simplex(Vec<Vec<f64>>),
}

/// Result of a minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    /// Whether the tolerance test passed (as opposed to running out of iterations).
    pub converged: bool,
}

#[derive(Debug, Clone)]
struct Vertex {
    x: Vec<f64>,
    fx: f64,
}

#[derive(Debug, Clone)]
enum Stage {
    Seeding { remaining: Vec<Vec<f64>> },
    Reflect,
    Expand { xr: Vec<f64>, fr: f64 },
    ContractOutside { fr: f64 },
    ContractInside,
    Shrink { index: usize },
    Done,
}

/// Ask/tell Nelder–Mead search.
///
/// Call [`NelderMead::next_point`] to get the point that needs evaluating, then feed its value
/// back with [`NelderMead::tell`]. When `next_point` returns `None` the search is over and
/// [`NelderMead::into_minimum`] yields the best vertex.
#[derive(Debug, Clone)]
pub struct NelderMead {
    options: NelderMeadOptions,
    vertices: Vec<Vertex>,
    centroid: Vec<f64>,
    pending: Option<Vec<f64>>,
    stage: Stage,
    iterations: usize,
    converged: bool,
}

impl NelderMead {
    pub fn new(seed: Seed, options: NelderMeadOptions) -> Result<Self, SolverError> {
        let points = match seed {
            Seed::Point(x0) => expand_seed(&x0, &options),
            Seed::Simplex(points) => points,
        };
        let dim = points.first().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(SolverError::InvalidInput("empty seed".to_string()));
        }
        if points.len() != dim + 1 || points.iter().any(|p| p.len() != dim) {
            return Err(SolverError::InvalidInput(format!(
                "a {dim}-dimensional simplex needs {} points of equal dimension",
                dim + 1
            )));
        }

        let mut remaining = points;
        remaining.reverse();
        let first = remaining.pop();
        Ok(Self {
            options,
            vertices: Vec::with_capacity(dim + 1),
            centroid: vec![0.0; dim],
            pending: first,
            stage: Stage::Seeding { remaining },
            iterations: 0,
            converged: false,
        })
    }

    /// The point awaiting evaluation, or `None` once the search has finished.
    pub fn next_point(&self) -> Option<&[f64]> {
        self.pending.as_deref()
    }

    /// Number of completed simplex iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Supply the objective value of the point returned by [`NelderMead::next_point`].
    pub fn tell(&mut self, fx: f64) {
        let Some(x) = self.pending.take() else {
            return;
        };

        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Seeding { mut remaining } => {
                self.vertices.push(Vertex { x, fx });
                match remaining.pop() {
                    Some(next) => {
                        self.pending = Some(next);
                        self.stage = Stage::Seeding { remaining };
                    }
                    None => self.begin_iteration(),
                }
            }
            Stage::Reflect => {
                let n = self.vertices.len() - 1;
                let best = self.vertices[0].fx;
                let second_worst = self.vertices[n - 1].fx;
                let worst = self.vertices[n].fx;
                if fx < best {
                    self.pending = Some(self.towards(&x, GAMMA));
                    self.stage = Stage::Expand { xr: x, fr: fx };
                } else if fx < second_worst {
                    self.replace_worst(x, fx);
                    self.begin_iteration();
                } else if fx < worst {
                    self.pending = Some(self.towards(&x, RHO));
                    self.stage = Stage::ContractOutside { fr: fx };
                } else {
                    let xw = self.vertices[n].x.clone();
                    self.pending = Some(self.towards(&xw, RHO));
                    self.stage = Stage::ContractInside;
                }
            }
            Stage::Expand { xr, fr } => {
                if fx < fr {
                    self.replace_worst(x, fx);
                } else {
                    self.replace_worst(xr, fr);
                }
                self.begin_iteration();
            }
            Stage::ContractOutside { fr } => {
                if fx <= fr {
                    self.replace_worst(x, fx);
                    self.begin_iteration();
                } else {
                    self.begin_shrink();
                }
            }
            Stage::ContractInside => {
                let worst = self.vertices[self.vertices.len() - 1].fx;
                if fx < worst {
                    self.replace_worst(x, fx);
                    self.begin_iteration();
                } else {
                    self.begin_shrink();
                }
            }
            Stage::Shrink { index } => {
                self.vertices[index] = Vertex { x, fx };
                if index + 1 < self.vertices.len() {
                    self.shrink_vertex(index + 1);
                } else {
                    self.begin_iteration();
                }
            }
            Stage::Done => {}
        }
    }

    /// Best vertex found so far.
    pub fn into_minimum(mut self) -> Minimum {
        self.sort();
        let best = self.vertices.swap_remove(0);
        Minimum {
            x: best.x,
            fx: best.fx,
            iterations: self.iterations,
            converged: self.converged,
        }
    }

    fn begin_iteration(&mut self) {
        self.sort();

        if self.is_converged() {
            self.converged = true;
            self.finish();
            return;
        }
        if self.iterations >= self.options.max_iters {
            self.finish();
            return;
        }

        self.iterations += 1;
        let n = self.vertices.len() - 1;
        let dim = self.centroid.len();
        for d in 0..dim {
            self.centroid[d] = self.vertices[..n].iter().map(|v| v.x[d]).sum::<f64>() / n as f64;
        }
        trace!(
            iteration = self.iterations,
            best = self.vertices[0].fx,
            worst = self.vertices[n].fx,
            "nelder-mead iteration"
        );

        let xw = self.vertices[n].x.clone();
        self.pending = Some(self.towards(&xw, -ALPHA));
        self.stage = Stage::Reflect;
    }

    fn begin_shrink(&mut self) {
        self.shrink_vertex(1);
    }

    fn shrink_vertex(&mut self, index: usize) {
        let best = &self.vertices[0].x;
        let point = best
            .iter()
            .zip(&self.vertices[index].x)
            .map(|(b, x)| b + SIGMA * (x - b))
            .collect();
        self.pending = Some(point);
        self.stage = Stage::Shrink { index };
    }

    fn finish(&mut self) {
        self.pending = None;
        self.stage = Stage::Done;
    }

    fn is_converged(&self) -> bool {
        let best = &self.vertices[0];
        let second = &self.vertices[1];
        let worst = &self.vertices[self.vertices.len() - 1];
        let x_close = best
            .x
            .iter()
            .zip(&second.x)
            .all(|(a, b)| (a - b).abs() < self.options.min_x_delta);
        x_close && (worst.fx - best.fx).abs() < self.options.min_fx_delta
    }

    /// `c + k·(p − c)` where `c` is the current centroid.
    fn towards(&self, p: &[f64], k: f64) -> Vec<f64> {
        self.centroid.iter().zip(p).map(|(c, x)| c + k * (x - c)).collect()
    }

    fn replace_worst(&mut self, x: Vec<f64>, fx: f64) {
        let n = self.vertices.len() - 1;
        self.vertices[n] = Vertex { x, fx };
    }

    fn sort(&mut self) {
        // NaN values sort last, so a failed evaluation is the first vertex to be replaced.
        self.vertices.sort_by(|a, b| a.fx.total_cmp(&b.fx));
    }
}

fn expand_seed(x0: &[f64], options: &NelderMeadOptions) -> Vec<Vec<f64>> {
    let mut points = Vec::with_capacity(x0.len() + 1);
    points.push(x0.to_vec());
    for d in 0..x0.len() {
        let mut p = x0.to_vec();
        p[d] = if p[d] == 0.0 { options.abs_expand } else { p[d] * options.rel_expand };
        points.push(p);
    }
    points
}

/// Minimise a synchronous objective.
pub fn find_minimum_nelder_mead<O>(
    mut objective: O,
    seed: Seed,
    options: NelderMeadOptions,
) -> Result<Minimum, SolverError>
where
    O: Objective,
{
    let mut search = NelderMead::new(seed, options)?;
    while let Some(x) = search.next_point() {
        let fx = objective.evaluate(x);
        search.tell(fx);
    }
    Ok(search.into_minimum())
}

/// Minimise an objective that may suspend. Points are evaluated one at a time, in the same order
/// as [`find_minimum_nelder_mead`]; nothing is evaluated concurrently.
pub async fn find_minimum_nelder_mead_async<O>(
    mut objective: O,
    seed: Seed,
    options: NelderMeadOptions,
) -> Result<Minimum, SolverError>
where
    O: AsyncObjective,
{
    let mut search = NelderMead::new(seed, options)?;
    while let Some(x) = search.next_point() {
        let fx = objective.evaluate(x.to_vec()).await;
        search.tell(fx);
    }
    Ok(search.into_minimum())
}
