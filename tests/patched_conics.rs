use std::error::Error;
use std::f64::consts::PI;
use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use conic_planner::config::load_system;
use conic_planner::orbits::{ElementsInput, Phase};
use conic_planner::patched::{BodySpec, EventKind, SOI_BOUNDARY_TOLERANCE};
use conic_planner::units::wrap_two_pi;
use conic_planner::{BodySystem, Orbit, OrbitAround, PatchedError, Vector3};

const MU_KERBOL: f64 = 1.1723328e18;
const MU_KERBIN: f64 = 3.5316e12;
const KERBIN_SOI: f64 = 84_159_286.0;

/// Kerbol and Kerbin only, so nothing can interrupt an escape.
fn kerbin_only() -> Result<Arc<BodySystem>, Box<dyn Error>> {
    kerbin_with_radius(600_000.0)
}

fn kerbin_with_radius(radius: f64) -> Result<Arc<BodySystem>, Box<dyn Error>> {
    let kerbin_orbit = Orbit::from_orbital_elements(
        MU_KERBOL,
        ElementsInput::Classical { sma: 13_599_840_256.0, e: 0.0, argp: 0.0, inc: 0.0, lon_an: 0.0 },
        Phase::MeanAnomaly { ma0: 3.14 },
    )?;
    let system = BodySystem::builder("bare")
        .body(BodySpec {
            name: "Kerbin".to_string(),
            parent: Some("Kerbol".to_string()),
            gravity: MU_KERBIN,
            radius,
            atmosphere_height: 70_000.0,
            soi: Some(KERBIN_SOI),
            orbit: Some(kerbin_orbit),
        })
        .body(BodySpec {
            name: "Kerbol".to_string(),
            parent: None,
            gravity: MU_KERBOL,
            radius: 261_600_000.0,
            atmosphere_height: 0.0,
            soi: None,
            orbit: None,
        })
        .build()?;
    Ok(Arc::new(system))
}

fn bundled() -> Result<Arc<BodySystem>, Box<dyn Error>> {
    let config = load_system("data/systems/kerbol.yaml")?;
    Ok(Arc::new(BodySystem::from_config(&config)?))
}

fn escape(system: &Arc<BodySystem>) -> Result<OrbitAround, Box<dyn Error>> {
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let orbit = Orbit::from_state_vector(
        MU_KERBIN,
        Vector3::new(700_000.0, 0.0, 0.0),
        Vector3::new(0.0, 3_600.0, 0.0),
        0.0,
    )?;
    Ok(OrbitAround::new(Arc::clone(system), kerbin, orbit)?)
}

#[test]
fn escaping_probe_exits_at_the_soi_radius() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let probe = escape(&system)?;
    let event = probe.next_event(0.0, 1e7)?.ok_or("expected an SoI exit")?;
    assert_eq!(event.kind, EventKind::ExitSoi);
    assert!(event.t > 0.0);
    let distance = probe.orbit().position_at_t(event.t)?.norm();
    assert!((distance - KERBIN_SOI).abs() <= SOI_BOUNDARY_TOLERANCE * KERBIN_SOI);

    let around_sun = probe.exit_soi(event.t)?;
    assert_eq!(around_sun.body_id(), system.root());
    assert_eq!(around_sun.orbit().gravity(), MU_KERBOL);
    assert_eq!(around_sun.orbit().epoch(), event.t);

    let (r, v) = probe.orbit().state_vector_at_t(event.t)?;
    let (rb, vb) = system.state_at_t(probe.body_id(), event.t)?;
    assert!(around_sun.orbit().position().is_equal(&(rb + r)));
    assert!(around_sun.orbit().velocity().is_equal(&(vb + v)));
    Ok(())
}

#[test]
fn exit_is_reported_immediately_when_already_outside() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let probe = escape(&system)?;
    let first = probe.next_event(0.0, 1e7)?.ok_or("exit")?;
    let later = probe.next_event(first.t + 100.0, 1e7)?.ok_or("exit")?;
    assert_eq!(later.kind, EventKind::ExitSoi);
    assert_eq!(later.t, first.t + 100.0);
    Ok(())
}

#[test]
fn transitions_require_the_soi_boundary() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let probe = escape(&system)?;
    assert!(matches!(probe.exit_soi(0.0), Err(PatchedError::NotAtSoiBoundary { .. })));

    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let kerbin_orbit = *system.body(kerbin).orbit().ok_or("Kerbin orbit")?;
    let around_sun = OrbitAround::new(Arc::clone(&system), system.root(), kerbin_orbit)?;
    assert!(matches!(around_sun.exit_soi(0.0), Err(PatchedError::NoParent(_))));
    Ok(())
}

#[test]
fn orbit_must_use_the_body_gravity() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let wrong = Orbit::from_state_vector(
        MU_KERBOL,
        Vector3::new(700_000.0, 0.0, 0.0),
        Vector3::new(0.0, 3_000.0, 0.0),
        0.0,
    )?;
    assert!(matches!(
        OrbitAround::new(system, kerbin, wrong),
        Err(PatchedError::GravityMismatch { .. })
    ));
    Ok(())
}

/// Apoapsis 900 km, periapsis 650 km: inside the 670 km atmosphere boundary.
fn dipping_orbit(epoch: f64) -> Result<Orbit, Box<dyn Error>> {
    let (ra, rp) = (900_000.0, 650_000.0);
    let sma = 0.5 * (ra + rp);
    let speed = (MU_KERBIN * (2.0 / ra - 1.0 / sma)).sqrt();
    Ok(Orbit::from_state_vector(
        MU_KERBIN,
        Vector3::new(ra, 0.0, 0.0),
        Vector3::new(0.0, speed, 0.0),
        epoch,
    )?)
}

#[test]
fn low_periapsis_enters_the_atmosphere() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let orbit = dipping_orbit(0.0)?;
    let probe = OrbitAround::new(system, kerbin, orbit)?;
    let event = probe.next_event(0.0, 1e5)?.ok_or("expected atmosphere entry")?;
    assert_eq!(event.kind, EventKind::EnterAtmosphere);
    let period = orbit.period().ok_or("closed orbit")?;
    assert!(event.t > 0.0 && event.t < 0.5 * period);
    assert_relative_eq!(orbit.position_at_t(event.t)?.norm(), 670_000.0, max_relative = 1e-6);
    assert!(event.is_terminal());
    Ok(())
}

#[test]
fn events_before_a_distant_epoch_are_not_deferred() -> Result<(), Box<dyn Error>> {
    let system = kerbin_only()?;
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let period = dipping_orbit(0.0)?.period().ok_or("closed orbit")?;

    let near = OrbitAround::new(Arc::clone(&system), kerbin, dipping_orbit(0.0)?)?;
    let far = OrbitAround::new(system, kerbin, dipping_orbit(10.0 * period)?)?;
    let expected = near.next_event(0.0, 1e6)?.ok_or("entry near the epoch")?;
    let event = far.next_event(0.0, 1e6)?.ok_or("entry long before the epoch")?;
    assert_eq!(event.kind, EventKind::EnterAtmosphere);
    assert!(event.t < period, "entry at {}", event.t);
    assert_abs_diff_eq!(event.t, expected.t, epsilon = 1e-6);

    // Also after the epoch: the first entry following t, not the one next to the epoch.
    let later = far.next_event(25.0 * period, 1e7)?.ok_or("entry after the epoch")?;
    assert!(later.t >= 25.0 * period && later.t < 26.0 * period, "entry at {}", later.t);
    Ok(())
}

#[test]
fn equality_compares_the_whole_system() -> Result<(), Box<dyn Error>> {
    let orbit = dipping_orbit(0.0)?;
    let probe = |system: Arc<BodySystem>| -> Result<OrbitAround, Box<dyn Error>> {
        let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
        Ok(OrbitAround::new(system, kerbin, orbit)?)
    };
    let reference = probe(kerbin_only()?)?;
    assert_eq!(reference, probe(kerbin_only()?)?);
    // Same system name, different Kerbin.
    let bigger = probe(kerbin_with_radius(620_000.0)?)?;
    assert_eq!(bigger.system().name(), reference.system().name());
    assert_ne!(reference, bigger);
    Ok(())
}

#[test]
fn absolute_states_sum_along_the_parent_chain() -> Result<(), Box<dyn Error>> {
    let system = bundled()?;
    assert_eq!(system.ids().count(), system.len());
    assert!(system.ids().all(|id| system.get(id).is_some()));

    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let mun = system.find("Mun").ok_or("Mun")?;
    let t = 12_345.0;
    let (rk, vk) = system.state_at_t(kerbin, t)?;
    let (rm, vm) = system.state_at_t(mun, t)?;
    let (r, v) = system.absolute_state_at_t(mun, t)?;
    assert!(r.is_equal(&(rm + rk)));
    assert!(v.is_equal(&(vm + vk)));

    let (r, v) = system.absolute_state_at_t(kerbin, t)?;
    assert!(r.is_equal(&rk) && v.is_equal(&vk));
    let (r, _) = system.absolute_state_at_t(system.root(), t)?;
    assert!(r.is_equal(&Vector3::ZERO));
    Ok(())
}

/// Hohmann transfer from a 700 km circular orbit that meets the Mun at apoapsis.
fn mun_transfer(system: &Arc<BodySystem>) -> Result<OrbitAround, Box<dyn Error>> {
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let mun = system.find("Mun").ok_or("Mun")?;
    let mun_orbit = system.body(mun).orbit().ok_or("Mun orbit")?;

    let (rp, ra) = (700_000.0, mun_orbit.sma());
    let sma = 0.5 * (rp + ra);
    let arrival = PI * (sma.powi(3) / MU_KERBIN).sqrt();
    let mun_angle = mun_orbit.ta_at_t(arrival)? + mun_orbit.argp() + mun_orbit.lon_an();
    let orbit = Orbit::from_orbital_elements(
        MU_KERBIN,
        ElementsInput::Classical {
            sma,
            e: (ra - rp) / (ra + rp),
            argp: wrap_two_pi(mun_angle - PI),
            inc: 0.0,
            lon_an: 0.0,
        },
        Phase::TrueAnomaly { ta: 0.0, t0: 0.0 },
    )?;
    Ok(OrbitAround::new(Arc::clone(system), kerbin, orbit)?)
}

#[test]
fn hohmann_transfer_enters_the_mun_soi() -> Result<(), Box<dyn Error>> {
    let system = bundled()?;
    let mun = system.find("Mun").ok_or("Mun")?;
    let probe = mun_transfer(&system)?;

    let scan = probe.scan_events(0.0, 60_000.0, 600.0)?;
    let event = scan.next.ok_or("expected an SoI entry")?;
    assert_eq!(event.kind, EventKind::EnterSoi(mun));
    assert!(event.t > 10_000.0 && event.t < 27_000.0, "entry at {}", event.t);
    assert!(scan.intercepts.iter().all(|intercept| intercept.t <= event.t));

    let soi = system.body(mun).soi().ok_or("Mun SoI")?;
    let (rm, _) = system.state_at_t(mun, event.t)?;
    let separation = (probe.orbit().position_at_t(event.t)? - rm).norm();
    assert_relative_eq!(separation, soi, max_relative = 1e-6);

    let around_mun = probe.enter_soi(event.t, mun)?;
    assert_eq!(around_mun.body_id(), mun);
    assert_eq!(around_mun.orbit().gravity(), system.body(mun).gravity());
    assert_relative_eq!(around_mun.orbit().position().norm(), soi, max_relative = 1e-6);
    Ok(())
}

#[test]
fn entry_is_found_when_the_window_closes_before_closest_approach() -> Result<(), Box<dyn Error>> {
    let system = bundled()?;
    let mun = system.find("Mun").ok_or("Mun")?;
    let probe = mun_transfer(&system)?;

    let entry = probe.next_event(0.0, 60_000.0)?.ok_or("expected an SoI entry")?;
    let clipped = probe.next_event(0.0, entry.t + 300.0)?.ok_or("entry inside a short window")?;
    assert_eq!(clipped.kind, EventKind::EnterSoi(mun));
    assert_abs_diff_eq!(clipped.t, entry.t, epsilon = 1e-3);

    assert!(probe.next_event(0.0, entry.t - 300.0)?.is_none());
    Ok(())
}

#[test]
fn trajectory_follows_the_transfer_into_the_mun() -> Result<(), Box<dyn Error>> {
    let system = bundled()?;
    let mun = system.find("Mun").ok_or("Mun")?;
    let probe = mun_transfer(&system)?;

    let segments = probe.trajectory(0.0, 60_000.0).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].orbit.body().name(), "Kerbin");
    assert_eq!(segments[0].end.map(|event| event.kind), Some(EventKind::EnterSoi(mun)));
    assert_eq!(segments[1].orbit.body_id(), mun);
    assert_eq!(segments[1].t_start, segments[0].t_end);
    let end = segments[1].end.ok_or("the probe should hit the Mun")?;
    assert_eq!(end.kind, EventKind::CollideSurface);
    assert!(end.t < 60_000.0);
    Ok(())
}

#[test]
fn entering_a_non_child_is_rejected() -> Result<(), Box<dyn Error>> {
    let system = bundled()?;
    let ike = system.find("Ike").ok_or("Ike")?;
    let probe = mun_transfer(&system)?;
    assert!(matches!(probe.enter_soi(0.0, ike), Err(PatchedError::NotAChild { .. })));
    Ok(())
}
