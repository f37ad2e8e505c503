use std::error::Error;

use approx::assert_abs_diff_eq;
use conic_planner::numeric::{
    NelderMead, NelderMeadOptions, Seed, SolverError, find_minimum_nelder_mead,
    find_minimum_nelder_mead_async,
};

fn bowl(x: &[f64]) -> f64 {
    (x[0] - 5.0).powi(2) + (x[1] - 7.0).powi(2)
}

fn precise() -> NelderMeadOptions {
    NelderMeadOptions { max_iters: 1_000, ..NelderMeadOptions::default() }
}

#[test]
fn finds_the_bottom_of_a_bowl() -> Result<(), Box<dyn Error>> {
    let minimum = find_minimum_nelder_mead(bowl, Seed::Point(vec![2.0, 3.0]), precise())?;
    assert!(minimum.converged);
    assert_abs_diff_eq!(minimum.x[0], 5.0, epsilon = 1e-4);
    assert_abs_diff_eq!(minimum.x[1], 7.0, epsilon = 1e-4);
    assert!(minimum.fx < 1e-8);
    Ok(())
}

#[tokio::test]
async fn async_objective_visits_the_same_points() -> Result<(), Box<dyn Error>> {
    let mut sync_points = Vec::new();
    let sync = find_minimum_nelder_mead(
        |x: &[f64]| {
            sync_points.push(x.to_vec());
            bowl(x)
        },
        Seed::Point(vec![2.0, 3.0]),
        NelderMeadOptions::default(),
    )?;

    let mut async_points = Vec::new();
    let asynchronous = find_minimum_nelder_mead_async(
        |x: Vec<f64>| {
            async_points.push(x.clone());
            async move {
                tokio::task::yield_now().await;
                bowl(&x)
            }
        },
        Seed::Point(vec![2.0, 3.0]),
        NelderMeadOptions::default(),
    )
    .await?;

    assert_eq!(sync, asynchronous);
    assert_eq!(sync_points, async_points);
    assert_abs_diff_eq!(asynchronous.x[0], 5.0, epsilon = 1e-2);
    assert_abs_diff_eq!(asynchronous.x[1], 7.0, epsilon = 1e-2);
    Ok(())
}

#[test]
fn seed_point_is_expanded_per_dimension() -> Result<(), Box<dyn Error>> {
    let mut search = NelderMead::new(Seed::Point(vec![0.0, 2.0]), NelderMeadOptions::default())?;
    let mut seeded = Vec::new();
    while seeded.len() < 3 {
        let Some(x) = search.next_point() else { break };
        seeded.push(x.to_vec());
        let fx = bowl(x);
        search.tell(fx);
    }
    assert_eq!(seeded[0], vec![0.0, 2.0]);
    assert_eq!(seeded[1], vec![1e-3, 2.0]);
    assert_eq!(seeded[2], vec![0.0, 2.0 * 1.01]);
    Ok(())
}

#[test]
fn explicit_simplex_is_used_as_given() -> Result<(), Box<dyn Error>> {
    let simplex = vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![0.0, 10.0]];
    let minimum = find_minimum_nelder_mead(bowl, Seed::Simplex(simplex), precise())?;
    assert_abs_diff_eq!(minimum.x[0], 5.0, epsilon = 1e-4);
    assert_abs_diff_eq!(minimum.x[1], 7.0, epsilon = 1e-4);
    Ok(())
}

#[test]
fn iteration_budget_is_respected() -> Result<(), Box<dyn Error>> {
    let options = NelderMeadOptions { max_iters: 5, ..NelderMeadOptions::default() };
    let minimum = find_minimum_nelder_mead(bowl, Seed::Point(vec![2.0, 3.0]), options)?;
    assert_eq!(minimum.iterations, 5);
    assert!(!minimum.converged);
    Ok(())
}

#[test]
fn malformed_simplex_is_rejected() {
    let simplex = vec![vec![0.0, 0.0], vec![1.0, 0.0]];
    assert!(matches!(
        find_minimum_nelder_mead(bowl, Seed::Simplex(simplex), NelderMeadOptions::default()),
        Err(SolverError::InvalidInput(_))
    ));
    assert!(matches!(
        find_minimum_nelder_mead(bowl, Seed::Point(Vec::new()), NelderMeadOptions::default()),
        Err(SolverError::InvalidInput(_))
    ));
}
