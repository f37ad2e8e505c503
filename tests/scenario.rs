use std::error::Error;
use std::fs;

use approx::assert_relative_eq;
use conic_planner::BodySystem;
use conic_planner::config::{ConfigError, SystemConfig, load_system, load_systems};
use conic_planner::patched::SystemCatalog;

const MOON_SYSTEM_TOML: &str = r#"
name = "moon"

[[bodies]]
name = "Planet"
gravity_m3_s2 = 3.986e14
radius_m = 6.371e6

[[bodies]]
name = "Moon"
parent = "Planet"
gravity_m3_s2 = 4.9e12
radius_m = 1.737e6
soi_radius_m = 6.6e7

[bodies.orbit]
sma_m = 3.844e8
eccentricity = 0.055
inclination_deg = 5.1
"#;

#[test]
fn bundled_system_has_the_expected_hierarchy() -> Result<(), Box<dyn Error>> {
    let config = load_system("data/systems/kerbol.yaml")?;
    assert_eq!(config.name, "kerbol");
    assert_eq!(config.bodies.len(), 8);
    assert_eq!(config.root().map(|body| body.name.as_str()), Some("Kerbol"));
    assert_eq!(config.body("Mun").and_then(|body| body.parent.as_deref()), Some("Kerbin"));

    let system = BodySystem::from_config(&config)?;
    let kerbin = system.find("Kerbin").ok_or("Kerbin")?;
    let body = system.body(kerbin);
    assert_eq!(body.parent(), Some(system.root()));
    assert_eq!(body.children().len(), 2);
    let period = body.orbit().and_then(|orbit| orbit.period()).ok_or("closed orbit")?;
    assert_relative_eq!(period, 9_203_545.0, max_relative = 1e-3);
    assert!(system.body(system.root()).soi().is_none());
    Ok(())
}

#[test]
fn toml_systems_load_by_extension() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("moon.toml");
    fs::write(&path, MOON_SYSTEM_TOML)?;

    let config = load_system(&path)?;
    assert_eq!(config.name, "moon");
    let moon = config.body("Moon").ok_or("Moon")?;
    let orbit = moon.orbit.ok_or("Moon orbit")?;
    assert_eq!(orbit.eccentricity, 0.055);
    assert_eq!(orbit.argp_deg, 0.0);
    assert_eq!(config.body("Planet").map(|body| body.atmosphere_height_m), Some(0.0));

    let system = BodySystem::from_config(&config)?;
    let moon = system.find("Moon").ok_or("Moon")?;
    let inclination = system.body(moon).orbit().ok_or("orbit")?.inclination();
    assert_relative_eq!(inclination, 5.1_f64.to_radians(), max_relative = 1e-12);
    Ok(())
}

#[test]
fn directories_load_every_system_in_path_order() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("b_moon.toml"), MOON_SYSTEM_TOML)?;
    fs::copy("data/systems/kerbol.yaml", dir.path().join("a_kerbol.yaml"))?;
    fs::write(dir.path().join("notes.txt"), "not a system")?;

    let configs = load_systems(dir.path())?;
    let names: Vec<&str> = configs.iter().map(|config| config.name.as_str()).collect();
    assert_eq!(names, ["kerbol", "moon"]);

    let catalog = SystemCatalog::from_configs(&configs)?;
    assert_eq!(catalog.names().collect::<Vec<_>>(), ["kerbol", "moon"]);
    assert!(catalog.get("moon").is_some_and(|system| system.len() == 2));
    Ok(())
}

#[test]
fn unreadable_directory_entries_fail_the_load() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("b_moon.toml"), MOON_SYSTEM_TOML)?;
    fs::create_dir(dir.path().join("a_broken.toml"))?;
    assert!(matches!(load_systems(dir.path()), Err(ConfigError::Io(_))));

    assert!(matches!(load_systems(dir.path().join("missing")), Err(ConfigError::Io(_))));
    Ok(())
}

#[test]
fn structural_errors_are_reported() {
    let duplicate = MOON_SYSTEM_TOML.replace("name = \"Moon\"", "name = \"Planet\"");
    assert!(matches!(SystemConfig::from_toml_str(&duplicate), Err(ConfigError::Invalid { .. })));

    let orphan = MOON_SYSTEM_TOML.replace("parent = \"Planet\"", "parent = \"Sun\"");
    match SystemConfig::from_toml_str(&orphan) {
        Err(ConfigError::Invalid { system, reason }) => {
            assert_eq!(system, "moon");
            assert!(reason.contains("Sun"), "{reason}");
        }
        other => panic!("expected an invalid system, got {other:?}"),
    }

    let no_root = "name: loop\nbodies:\n  - name: A\n    parent: A\n    gravity_m3_s2: 1.0\n    radius_m: 1.0\n    orbit: { sma_m: 10.0 }\n";
    assert!(matches!(SystemConfig::from_yaml_str(no_root), Err(ConfigError::Invalid { .. })));
    assert!(matches!(SystemConfig::from_yaml_str("name: ["), Err(ConfigError::Yaml(_))));
}
