use crate::allocation::AllocationError;
use std::path::PathBuf;
use thiserror::Error;

fn exit_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}

/// Failures local to one project. They end that project's pipeline and are
/// recorded in its `BuildResult`; sibling projects keep going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("InvalidProject: {path:?} is missing {missing}")]
    InvalidProject { path: PathBuf, missing: String },

    #[error("UnknownDependency: {0}")]
    UnknownDependency(String),

    #[error("FetchFailed: {artifact}: {reason}")]
    FetchFailed { artifact: String, reason: String },

    #[error("BuildFailed: {reason}")]
    BuildFailed { reason: String, output: String },

    #[error("ImageBuildFailed: exit status {}", exit_status(.status))]
    ImageBuildFailed { status: Option<i32>, output: String },

    #[error("Staging failed: {0}")]
    Staging(String),
}

impl PipelineError {
    /// Captured tool output, when the failure came from an external command.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::BuildFailed { output, .. } | Self::ImageBuildFailed { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

/// Failures that abort the whole run.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No projects were supplied")]
    NoProjects,

    #[error("Failed to read deployment descriptor {path:?}: {reason}")]
    DescriptorReadFailed { path: PathBuf, reason: String },

    #[error("Failed to write deployment descriptor {path:?}: {reason}")]
    DescriptorWriteFailed { path: PathBuf, reason: String },

    #[error("Failed to read project registry {path:?}: {reason}")]
    RegistryReadFailed { path: PathBuf, reason: String },

    #[error("Failed to write project registry {path:?}: {reason}")]
    RegistryWriteFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("DeploymentFailed: exit status {}\n{output}", exit_status(.status))]
    DeploymentFailed { status: Option<i32>, output: String },

    #[error("No project registry found at {0:?}; run `shipyard build` first")]
    NoRegistryFound(PathBuf),

    #[error("Deployment descriptor not found at {0:?}")]
    DescriptorNotFound(PathBuf),
}
