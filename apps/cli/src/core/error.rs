use shipyard::domain::OrchestratorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Console error: {0:#}")]
    Console(anyhow::Error),

    #[error("{0:#}")]
    Runtime(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled by user")]
    Cancelled,
}

impl CliError {
    /// Returns a themed, actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CliError::Config(_) => {
                Some("Check shipyard.toml for syntax errors or invalid values.".to_string())
            }
            CliError::Orchestrator(err) => match err {
                OrchestratorError::NoProjects => Some(
                    "Pass project directories as arguments or with --projects-file.".to_string(),
                ),
                OrchestratorError::NoRegistryFound(_) => {
                    Some("Run `shipyard build` once to create the registry.".to_string())
                }
                OrchestratorError::DescriptorNotFound(_) => Some(
                    "The compose file is gone; run `shipyard build` to regenerate it.".to_string(),
                ),
                OrchestratorError::DeploymentFailed { .. } => Some(
                    "Make sure the Docker daemon is running and the images exist locally."
                        .to_string(),
                ),
                OrchestratorError::Allocation(_) => {
                    Some("Lower [ports].base or free some reserved ports.".to_string())
                }
                _ => None,
            },
            CliError::Console(_) => Some(
                "Check the service name with `docker service ls` or `docker ps`.".to_string(),
            ),
            _ => None,
        }
    }

    pub fn render(&self) {
        eprintln!("\n{} {}", console::style("Error:").red().bold(), self);
        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", console::style("  help:").dim(), s);
        }
    }
}
