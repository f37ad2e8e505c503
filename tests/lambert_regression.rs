//! Cross-checks the universal-variable solver against the `lambert-bate` crate.

use std::error::Error;

use conic_planner::Vector3;
use conic_planner::orbits::{LambertProblem, LambertSolution, TransferDirection, solve_lambert};
use conic_planner::units::{km3_s2_to_m3_s2, km_to_m, m_to_km};
use lambert_bate::get_velocities;

const MU_EARTH_KM: f64 = 398_600.0;
const MU_SUN_KM: f64 = 1.327_124_400_18e11;

struct Case {
    mu_km3_s2: f64,
    r1_km: [f64; 3],
    r2_km: [f64; 3],
    tof_s: f64,
}

fn to_m(v: [f64; 3]) -> Vector3 {
    Vector3::new(km_to_m(v[0]), km_to_m(v[1]), km_to_m(v[2]))
}

fn to_km_s(v: Vector3) -> [f64; 3] {
    [m_to_km(v.x), m_to_km(v.y), m_to_km(v.z)]
}

fn assert_close(ours: [f64; 3], reference: [f64; 3], label: &str) {
    let error = ours.iter().zip(&reference).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt();
    let scale = reference.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!(
        error <= 1e-4 * scale,
        "{label}: ours {ours:?} vs lambert-bate {reference:?} (error {error} km/s)"
    );
}

fn check(case: &Case, direction: TransferDirection, short: bool) -> Result<(), Box<dyn Error>> {
    let problem = LambertProblem::new(
        km3_s2_to_m3_s2(case.mu_km3_s2),
        to_m(case.r1_km),
        to_m(case.r2_km),
        case.tof_s,
    )
    .with_direction(direction);
    let ours = solve_lambert(&problem)?;

    let (v1, v2) = get_velocities(case.r1_km, case.r2_km, case.tof_s, case.mu_km3_s2, short, 1e-8, 500)
        .map_err(|e| format!("lambert-bate failed: {e:?}"))?;

    assert_close(to_km_s(ours.v1()), v1, "v1");
    assert_close(to_km_s(ours.v2()), v2, "v2");
    Ok(())
}

#[test]
fn short_way_transfers_agree() -> Result<(), Box<dyn Error>> {
    let cases = [
        Case {
            mu_km3_s2: MU_EARTH_KM,
            r1_km: [5000.0, 10_000.0, 2100.0],
            r2_km: [-14_600.0, 2500.0, 7000.0],
            tof_s: 3600.0,
        },
        Case {
            mu_km3_s2: MU_EARTH_KM,
            r1_km: [7000.0, 0.0, 0.0],
            r2_km: [0.0, 8000.0, 1000.0],
            tof_s: 2000.0,
        },
        Case {
            mu_km3_s2: MU_SUN_KM,
            r1_km: [1.496e8, 0.0, 0.0],
            r2_km: [-1.2e8, 1.8e8, 4.0e6],
            tof_s: 200.0 * 86_400.0,
        },
    ];
    for case in &cases {
        check(case, TransferDirection::Prograde, true)?;
    }
    Ok(())
}

#[test]
fn long_way_transfers_agree() -> Result<(), Box<dyn Error>> {
    let case = Case {
        mu_km3_s2: MU_EARTH_KM,
        r1_km: [7000.0, 0.0, 0.0],
        r2_km: [0.0, 8000.0, 1000.0],
        tof_s: 5000.0,
    };
    check(&case, TransferDirection::Retrograde, false)
}
