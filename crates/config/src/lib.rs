//! Configuration models and loaders for body systems.
//!
//! A system file lists every body with its physical data and, for everything but the root, the
//! classical elements of its orbit around its parent. YAML and TOML are both accepted; the
//! format is picked from the file extension.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A named hierarchy of bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    pub bodies: Vec<BodyConfig>,
}

/// Physical data of one body, in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    /// Name of the parent body; absent for the root.
    #[serde(default)]
    pub parent: Option<String>,
    pub gravity_m3_s2: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub atmosphere_height_m: f64,
    /// Sphere-of-influence radius; absent means unbounded.
    #[serde(default)]
    pub soi_radius_m: Option<f64>,
    #[serde(default)]
    pub orbit: Option<OrbitConfig>,
}

/// Classical elements of a body's orbit around its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    pub sma_m: f64,
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    #[serde(default)]
    pub lon_an_deg: f64,
    #[serde(default)]
    pub argp_deg: f64,
    /// Mean anomaly at time 0.
    #[serde(default)]
    pub ma0_rad: f64,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("system `{system}`: {reason}")]
    Invalid { system: String, reason: String },
}

impl SystemConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let system: SystemConfig = serde_yaml::from_str(contents)?;
        system.validate()?;
        Ok(system)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let system: SystemConfig = toml::from_str(contents)?;
        system.validate()?;
        Ok(system)
    }

    /// The body without a parent.
    pub fn root(&self) -> Option<&BodyConfig> {
        self.bodies.iter().find(|body| body.parent.is_none())
    }

    pub fn body(&self, name: &str) -> Option<&BodyConfig> {
        self.bodies.iter().find(|body| body.name == name)
    }

    /// Check the structural rules a body system has to satisfy.
    ///
    /// Names are unique, there is exactly one root, every parent is declared, every non-root
    /// body has an orbit and all physical quantities are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { system: self.name.clone(), reason };

        let mut names = HashSet::new();
        for body in &self.bodies {
            if !names.insert(body.name.as_str()) {
                return Err(invalid(format!("body `{}` is declared twice", body.name)));
            }
        }

        let roots = self.bodies.iter().filter(|body| body.parent.is_none()).count();
        if roots != 1 {
            return Err(invalid(format!("expected exactly one root body, found {roots}")));
        }

        for body in &self.bodies {
            if !(body.gravity_m3_s2 > 0.0) || !(body.radius_m > 0.0) {
                return Err(invalid(format!(
                    "body `{}` needs a positive gravity parameter and radius",
                    body.name
                )));
            }
            if !(body.atmosphere_height_m >= 0.0) {
                return Err(invalid(format!("body `{}` has a negative atmosphere", body.name)));
            }
            if let Some(soi) = body.soi_radius_m {
                if !(soi > body.radius_m) {
                    return Err(invalid(format!(
                        "body `{}` has a sphere of influence inside its surface",
                        body.name
                    )));
                }
            }
            if let Some(parent) = &body.parent {
                if !names.contains(parent.as_str()) {
                    return Err(invalid(format!(
                        "body `{}` references unknown parent `{parent}`",
                        body.name
                    )));
                }
                if body.orbit.is_none() {
                    return Err(invalid(format!("body `{}` has no orbit", body.name)));
                }
            }
        }
        Ok(())
    }
}

/// Load a single system from a YAML or TOML file.
pub fn load_system<P: AsRef<Path>>(path: P) -> Result<SystemConfig, ConfigError> {
    let path = path.as_ref();
    let system: SystemConfig = if is_toml(path) {
        toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        serde_yaml::from_reader(File::open(path)?)?
    };
    system.validate()?;
    debug!(system = %system.name, bodies = system.bodies.len(), path = %path.display(), "loaded body system");
    Ok(system)
}

/// Load one system from a file, or every `*.yaml`, `*.yml` and `*.toml` system in a directory
/// (sorted by path).
pub fn load_systems<P: AsRef<Path>>(path: P) -> Result<Vec<SystemConfig>, ConfigError> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(vec![load_system(path)?]);
    }

    let mut entries = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, _>>()?;
    entries.retain(|path| is_toml(path) || is_yaml(path));
    entries.sort();
    entries.iter().map(load_system).collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn is_yaml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "yaml" || ext == "yml").unwrap_or(false)
}
