use crate::entities::project::ProjectSpec;
use crate::error::PipelineError;
use crate::image::ImageRef;
use std::path::PathBuf;

/// Everything a finished pipeline hands to the deployment stage.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltProject {
    pub spec: ProjectSpec,
    /// Artifact produced by the build tool.
    pub artifact: PathBuf,
    pub image: ImageRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Succeeded(Box<BuiltProject>),
    Failed(PipelineError),
}

/// One per input project per run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub name: String,
    pub path: PathBuf,
    pub outcome: BuildOutcome,
}

impl BuildResult {
    pub fn succeeded(built: BuiltProject) -> Self {
        Self {
            name: built.spec.name.clone(),
            path: built.spec.path.clone(),
            outcome: BuildOutcome::Succeeded(Box::new(built)),
        }
    }

    pub fn failed(name: impl Into<String>, path: impl Into<PathBuf>, error: PipelineError) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            outcome: BuildOutcome::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Succeeded(_))
    }

    pub fn built(&self) -> Option<&BuiltProject> {
        match &self.outcome {
            BuildOutcome::Succeeded(built) => Some(&**built),
            BuildOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            BuildOutcome::Succeeded(_) => None,
            BuildOutcome::Failed(err) => Some(err),
        }
    }
}
