//! Persisted form of [`OrbitAround`] and the catalog used to resolve it.

use std::collections::BTreeMap;
use std::sync::Arc;

use conic_config::SystemConfig;
use conic_orbits::Orbit;
use serde::{Deserialize, Serialize, Serializer};

use crate::{BodySystem, OrbitAround, PatchedError};

/// `{"sys": system name, "b": body name, "o": orbit}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitAroundRecord {
    pub sys: String,
    pub b: String,
    pub o: Orbit,
}

/// Body systems by name.
#[derive(Debug, Clone, Default)]
pub struct SystemCatalog {
    systems: BTreeMap<String, Arc<BodySystem>>,
}

impl SystemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs<'a>(
        configs: impl IntoIterator<Item = &'a SystemConfig>,
    ) -> Result<Self, PatchedError> {
        let mut catalog = SystemCatalog::new();
        for config in configs {
            catalog.insert(BodySystem::from_config(config)?);
        }
        Ok(catalog)
    }

    /// Add `system`, replacing any system of the same name.
    pub fn insert(&mut self, system: BodySystem) -> Arc<BodySystem> {
        let system = Arc::new(system);
        self.systems.insert(system.name().to_string(), Arc::clone(&system));
        system
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BodySystem>> {
        self.systems.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(String::as_str)
    }
}

impl OrbitAround {
    pub fn to_record(&self) -> OrbitAroundRecord {
        OrbitAroundRecord {
            sys: self.system().name().to_string(),
            b: self.body().name().to_string(),
            o: *self.orbit(),
        }
    }

    pub fn from_record(
        record: &OrbitAroundRecord,
        catalog: &SystemCatalog,
    ) -> Result<Self, PatchedError> {
        let system = catalog
            .get(&record.sys)
            .ok_or_else(|| PatchedError::UnknownSystem(record.sys.clone()))?;
        let body = system.find(&record.b).ok_or_else(|| PatchedError::UnknownBody(record.b.clone()))?;
        OrbitAround::new(Arc::clone(system), body, record.o)
    }
}

impl Serialize for OrbitAround {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}
