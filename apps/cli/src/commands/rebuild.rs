use crate::core::config::ShipyardConfig;
use crate::core::error::CliError;
use crate::ui::components::table::rebuild_summary;
use clap::Args;
use shipyard::application::{DeployMode, RebuildOrchestrator};

/// Redeploys the registered projects without building anything.
#[derive(Args, Debug)]
pub struct RebuildCommand {
    /// Deployment mode (compose or swarm)
    #[arg(long)]
    pub mode: Option<DeployMode>,
}

impl RebuildCommand {
    pub async fn execute(self, config: &ShipyardConfig) -> Result<(), CliError> {
        cliclack::intro(console::style(" shipyard rebuild ").on_cyan().black())?;

        let (descriptor, registry) = super::stores(config);
        let deployer = super::deployer(config, self.mode, super::runner());

        let spinner = cliclack::spinner();
        spinner.start(format!("Redeploying from {}", registry.path().display()));
        let report = match RebuildOrchestrator::new(registry, descriptor, deployer)
            .run()
            .await
        {
            Ok(report) => {
                spinner.stop(format!("Stack redeployed ({})", report.mode));
                report
            }
            Err(e) => {
                spinner.error("Redeploy failed");
                return Err(e.into());
            }
        };

        crate::ui::println(rebuild_summary(&report).to_string());
        for service in &report.missing_services {
            cliclack::log::warning(format!(
                "{} is registered but not in the descriptor; run `shipyard build` for it",
                service
            ))?;
        }

        cliclack::outro(format!("{} project(s) redeployed", report.allocations.len()))?;
        Ok(())
    }
}
