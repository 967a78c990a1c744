use super::atomic::write_atomic;
use domain::entities::registry::ProjectRegistry;
use domain::error::OrchestratorError;
use std::path::{Path, PathBuf};

/// JSON file holding the [`ProjectRegistry`] between runs.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `Ok(None)` when no full run has written the registry yet.
    pub fn load(&self) -> Result<Option<ProjectRegistry>, OrchestratorError> {
        if !self.exists() {
            return Ok(None);
        }
        let read_failed = |reason: String| OrchestratorError::RegistryReadFailed {
            path: self.path.clone(),
            reason,
        };

        let content = std::fs::read_to_string(&self.path).map_err(|e| read_failed(e.to_string()))?;
        let registry = serde_json::from_str(&content).map_err(|e| read_failed(e.to_string()))?;
        Ok(Some(registry))
    }

    /// Like [`load`](Self::load), but an absent file is an empty registry.
    pub fn load_or_default(&self) -> Result<ProjectRegistry, OrchestratorError> {
        Ok(self.load()?.unwrap_or_default())
    }

    pub fn save(&self, registry: &ProjectRegistry) -> Result<(), OrchestratorError> {
        let write_failed = |reason: String| OrchestratorError::RegistryWriteFailed {
            path: self.path.clone(),
            reason,
        };

        let mut json = serde_json::to_string_pretty(registry).map_err(|e| write_failed(e.to_string()))?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).map_err(|e| write_failed(e.to_string()))?;

        tracing::info!(path = ?self.path, projects = registry.len(), "Project registry saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ServiceAllocation;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join(".shipyard/registry.json"));
        assert!(store.load().unwrap().is_none());
        assert!(store.load_or_default().unwrap().is_empty());
    }

    #[test]
    fn saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join(".shipyard/registry.json"));

        let mut registry = ProjectRegistry::new();
        registry.record(
            &ServiceAllocation {
                name: "a".into(),
                path: PathBuf::from("/work/a"),
                port: 25565,
                service_name: "a".into(),
                replicas: 1,
            },
            "shipyard/a:0000aaaa",
        );
        store.save(&registry).unwrap();

        assert_eq!(store.load().unwrap(), Some(registry));
    }

    #[test]
    fn corrupt_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = RegistryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, OrchestratorError::RegistryReadFailed { .. }));
    }
}
