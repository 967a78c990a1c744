use crate::entities::allocation::ServiceAllocation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub const REGISTRY_VERSION: u32 = 1;

fn default_replicas() -> u32 {
    1
}

/// What a previous full run allocated for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub service_name: String,
    pub port: u16,
    pub image: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
}

/// Persisted map of project path to allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    pub version: u32,
    #[serde(default)]
    pub projects: BTreeMap<String, RegistryEntry>,
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            projects: BTreeMap::new(),
        }
    }
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.projects.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn ports(&self) -> BTreeSet<u16> {
        self.projects.values().map(|e| e.port).collect()
    }

    pub fn service_names(&self) -> BTreeSet<String> {
        self.projects
            .values()
            .map(|e| e.service_name.clone())
            .collect()
    }

    /// Records (or replaces) the allocation of a project.
    pub fn record(&mut self, allocation: &ServiceAllocation, image: &str) {
        self.projects.insert(
            allocation.path.to_string_lossy().into_owned(),
            RegistryEntry {
                name: allocation.name.clone(),
                service_name: allocation.service_name.clone(),
                port: allocation.port,
                image: image.to_string(),
                replicas: allocation.replicas,
            },
        );
    }

    /// Entries as allocations, in key order.
    pub fn allocations(&self) -> Vec<ServiceAllocation> {
        self.projects
            .iter()
            .map(|(path, entry)| ServiceAllocation {
                name: entry.name.clone(),
                path: PathBuf::from(path),
                port: entry.port,
                service_name: entry.service_name.clone(),
                replicas: entry.replicas,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(path: &str, port: u16, service: &str) -> ServiceAllocation {
        ServiceAllocation {
            name: service.to_string(),
            path: PathBuf::from(path),
            port,
            service_name: service.to_string(),
            replicas: 1,
        }
    }

    #[test]
    fn record_replaces_existing_entry() {
        let mut registry = ProjectRegistry::new();
        registry.record(&alloc("/p/a", 25565, "a"), "img/a:1");
        registry.record(&alloc("/p/a", 25565, "a"), "img/a:2");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("/p/a").map(|e| e.image.as_str()), Some("img/a:2"));
    }

    #[test]
    fn missing_replicas_default_to_one() {
        let json = r#"{"version":1,"projects":{"/p/a":{"name":"a","service_name":"a","port":25565,"image":"x"}}}"#;
        let registry: ProjectRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(registry.get("/p/a").map(|e| e.replicas), Some(1));
    }
}
