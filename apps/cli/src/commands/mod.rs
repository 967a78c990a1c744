pub mod build;
pub mod console;
pub mod rebuild;

pub use build::BuildCommand;
pub use console::ConsoleCommand;
pub use rebuild::RebuildCommand;

use crate::core::config::ShipyardConfig;
use shipyard::application::{DeployMode, Deployer};
use shipyard::domain::ports::process::CommandRunner;
use shipyard::infrastructure::{DescriptorStore, DockerCli, RegistryStore, TokioCommandRunner};
use std::sync::Arc;

pub(crate) fn runner() -> Arc<dyn CommandRunner> {
    Arc::new(TokioCommandRunner::new())
}

pub(crate) fn stores(config: &ShipyardConfig) -> (DescriptorStore, RegistryStore) {
    (
        DescriptorStore::new(&config.paths.compose_file),
        RegistryStore::new(&config.paths.registry_file),
    )
}

pub(crate) fn deployer(
    config: &ShipyardConfig,
    mode: Option<DeployMode>,
    runner: Arc<dyn CommandRunner>,
) -> Deployer {
    Deployer::new(
        DockerCli::new(runner),
        mode.unwrap_or(config.deploy.mode),
        &config.paths.compose_file,
        config.deploy.stack_name.as_str(),
    )
}
