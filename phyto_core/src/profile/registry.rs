use std::collections::BTreeMap;
use std::path::Path;

use super::{builtin, OrganismProfile};
use crate::config::ConfigError;
use crate::error::{EngineError, EngineResult};

/// Named collection of organism profiles.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, OrganismProfile>,
}

impl ProfileRegistry {
    /// Registry with no profiles.
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in profiles.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for profile in builtin::all() {
            registry.insert(profile);
        }
        registry
    }

    /// Add or replace a profile, keyed by its lowercase name.
    pub fn insert(&mut self, profile: OrganismProfile) {
        self.profiles.insert(profile.name.to_ascii_lowercase(), profile);
    }

    /// Load a TOML profile and register it. Returns the registered name.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<String, ConfigError> {
        let profile = OrganismProfile::load_from_file(path)?;
        let name = profile.name.clone();
        tracing::info!("registered organism profile '{}'", name);
        self.insert(profile);
        Ok(name)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> EngineResult<&OrganismProfile> {
        self.profiles
            .get(&name.trim().to_ascii_lowercase())
            .ok_or_else(|| EngineError::UnknownOrganism {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(&name.trim().to_ascii_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_plant_and_fungus() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(registry.names(), vec!["fungus", "plant"]);
        assert_eq!(registry.get("Plant").unwrap().name, "plant");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(
            registry.get("lichen").unwrap_err(),
            EngineError::UnknownOrganism {
                name: "lichen".into()
            }
        );
    }

    #[test]
    fn load_file_registers_profile() {
        let mut registry = ProfileRegistry::builtin();
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/profiles/lichen.toml");
        let name = registry.load_file(path).unwrap();
        assert_eq!(name, "lichen");
        assert!(registry.contains("LICHEN"));
        assert_eq!(registry.len(), 3);
    }
}
