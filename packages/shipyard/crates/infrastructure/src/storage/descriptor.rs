use super::atomic::write_atomic;
use domain::descriptor::DeploymentDescriptor;
use domain::error::OrchestratorError;
use std::path::{Path, PathBuf};

/// The deployment descriptor file on disk.
///
/// Read once and written once per run; the merge happens in memory between
/// the two calls.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    path: PathBuf,
}

impl DescriptorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// The current descriptor, or the baseline when the file does not exist.
    pub fn load(&self) -> Result<DeploymentDescriptor, OrchestratorError> {
        let read_failed = |reason: String| OrchestratorError::DescriptorReadFailed {
            path: self.path.clone(),
            reason,
        };

        if !self.exists() {
            tracing::info!(path = ?self.path, "No deployment descriptor yet, starting from baseline");
            return DeploymentDescriptor::baseline().map_err(|e| read_failed(e.to_string()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| read_failed(e.to_string()))?;
        DeploymentDescriptor::parse(&content).map_err(|e| read_failed(e.to_string()))
    }

    pub fn save(&self, descriptor: &DeploymentDescriptor) -> Result<(), OrchestratorError> {
        let write_failed = |reason: String| OrchestratorError::DescriptorWriteFailed {
            path: self.path.clone(),
            reason,
        };

        let yaml = descriptor.to_yaml().map_err(|e| write_failed(e.to_string()))?;
        write_atomic(&self.path, yaml.as_bytes()).map_err(|e| write_failed(e.to_string()))?;

        tracing::info!(path = ?self.path, "Deployment descriptor written");
        Ok(())
    }
}
