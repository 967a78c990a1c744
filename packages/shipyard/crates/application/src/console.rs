//! Server console commands through `rcon-cli` inside a running container.

use anyhow::{bail, Context, Result};
use infrastructure::DockerCli;

pub struct ServerConsole {
    docker: DockerCli,
}

impl ServerConsole {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker }
    }

    /// Container id of the service's first running replica.
    pub async fn container_for(&self, service: &str) -> Result<String> {
        self.docker
            .find_container(service)
            .await
            .context("Failed to query running containers")?
            .with_context(|| format!("No running container found for service '{}'", service))
    }

    /// Runs one console command and returns what the server printed.
    pub async fn send(&self, container: &str, command: &str) -> Result<String> {
        let command = command.trim();
        if command.is_empty() {
            bail!("Empty console command");
        }

        let mut args = vec!["rcon-cli".to_string()];
        args.extend(command.split_whitespace().map(str::to_string));

        let output = self
            .docker
            .exec(container, &args)
            .await
            .context("Failed to run docker exec")?;
        if !output.success() {
            bail!(
                "rcon-cli exited with status {:?}: {}",
                output.status,
                output.output.trim()
            );
        }
        Ok(output.output.trim_end().to_string())
    }
}
