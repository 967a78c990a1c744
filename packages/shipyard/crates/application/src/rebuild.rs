//! Redeploys what the last full run produced, without building anything.

use crate::deploy::{DeployMode, Deployer};
use domain::{OrchestratorError, ServiceAllocation};
use infrastructure::{DescriptorStore, RegistryStore};

#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    pub allocations: Vec<ServiceAllocation>,
    /// Registry services the descriptor no longer defines.
    pub missing_services: Vec<String>,
    pub mode: DeployMode,
}

pub struct RebuildOrchestrator {
    registry: RegistryStore,
    descriptor: DescriptorStore,
    deployer: Deployer,
}

impl RebuildOrchestrator {
    pub fn new(registry: RegistryStore, descriptor: DescriptorStore, deployer: Deployer) -> Self {
        Self {
            registry,
            descriptor,
            deployer,
        }
    }

    /// Loads the registry and triggers deployment of the existing descriptor.
    /// The registry and descriptor are only read.
    pub async fn run(&self) -> Result<RebuildReport, OrchestratorError> {
        let registry = self
            .registry
            .load()?
            .ok_or_else(|| OrchestratorError::NoRegistryFound(self.registry.path().to_path_buf()))?;

        if !self.descriptor.exists() {
            return Err(OrchestratorError::DescriptorNotFound(
                self.descriptor.path().to_path_buf(),
            ));
        }
        let descriptor = self.descriptor.load()?;

        let allocations = registry.allocations();
        let defined = descriptor.service_names();
        let missing_services: Vec<String> = allocations
            .iter()
            .filter(|a| !defined.contains(&a.service_name))
            .map(|a| a.service_name.clone())
            .collect();
        for service in &missing_services {
            tracing::warn!(%service, "Registered project has no service in the descriptor");
        }

        tracing::info!(projects = allocations.len(), "Redeploying registered projects");
        self.deployer.deploy().await?;

        Ok(RebuildReport {
            allocations,
            missing_services,
            mode: self.deployer.mode(),
        })
    }
}
