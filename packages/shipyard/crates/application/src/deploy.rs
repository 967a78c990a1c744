use domain::ports::process::{CommandOutput, ProcessError};
use domain::OrchestratorError;
use infrastructure::adapters::docker::SwarmState;
use infrastructure::DockerCli;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    Compose,
    #[default]
    Swarm,
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeployMode::Compose => "compose",
            DeployMode::Swarm => "swarm",
        })
    }
}

impl FromStr for DeployMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compose" => Ok(DeployMode::Compose),
            "swarm" | "stack" => Ok(DeployMode::Swarm),
            other => Err(format!("unknown deploy mode '{}' (expected compose or swarm)", other)),
        }
    }
}

/// Hands the descriptor to the container engine.
///
/// Never retries: a half-applied deployment is left for the engine to
/// reconcile, and the failure goes to the operator as is.
pub struct Deployer {
    docker: DockerCli,
    mode: DeployMode,
    compose_file: PathBuf,
    stack_name: String,
}

impl Deployer {
    pub fn new(
        docker: DockerCli,
        mode: DeployMode,
        compose_file: impl Into<PathBuf>,
        stack_name: impl Into<String>,
    ) -> Self {
        Self {
            docker,
            mode,
            compose_file: compose_file.into(),
            stack_name: stack_name.into(),
        }
    }

    pub fn mode(&self) -> DeployMode {
        self.mode
    }

    pub async fn deploy(&self) -> Result<CommandOutput, OrchestratorError> {
        tracing::info!(mode = %self.mode, stack = %self.stack_name, file = ?self.compose_file, "Deploying");

        // The shared network is an attachable overlay, which only a swarm
        // manager can create, in compose mode too.
        self.ensure_swarm().await;
        let result = match self.mode {
            DeployMode::Compose => {
                self.docker
                    .compose_up(&self.compose_file, &self.stack_name)
                    .await
            }
            DeployMode::Swarm => {
                self.docker
                    .stack_deploy(&self.compose_file, &self.stack_name)
                    .await
            }
        };

        let output = result.map_err(|e| OrchestratorError::DeploymentFailed {
            status: None,
            output: match e {
                ProcessError::Spawn { reason, .. } => reason,
                other => other.to_string(),
            },
        })?;

        if !output.success() {
            return Err(OrchestratorError::DeploymentFailed {
                status: output.status,
                output: output.output,
            });
        }
        Ok(output)
    }

    /// Makes the local node a swarm manager when it is not part of a swarm.
    /// Problems here are only logged; the deploy command reports the real
    /// error.
    async fn ensure_swarm(&self) {
        match self.docker.swarm_state().await {
            Ok(SwarmState::Active) => {}
            Ok(SwarmState::Inactive) => {
                tracing::info!("Docker Swarm not active, initializing");
                match self.docker.swarm_init().await {
                    Ok(out) if out.success() => tracing::info!("Docker Swarm initialized"),
                    Ok(out) => tracing::warn!(output = %out.output.trim(), "docker swarm init failed"),
                    Err(e) => tracing::warn!(error = %e, "docker swarm init failed"),
                }
            }
            Ok(SwarmState::Other(state)) => {
                tracing::warn!(%state, "Unexpected swarm state, deploying anyway")
            }
            Err(e) => tracing::warn!(error = %e, "Could not check swarm state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes() {
        assert_eq!("Compose".parse::<DeployMode>(), Ok(DeployMode::Compose));
        assert_eq!("swarm".parse::<DeployMode>(), Ok(DeployMode::Swarm));
        assert!("k8s".parse::<DeployMode>().is_err());
    }
}
