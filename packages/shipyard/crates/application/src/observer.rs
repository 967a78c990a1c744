use domain::BuildResult;
use std::fmt;
use std::path::Path;

/// Steps of one project's pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    FetchingEngine,
    Building,
    FetchingDependencies,
    Staging,
    BuildingImage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Loading => "loading project",
            Stage::FetchingEngine => "fetching engine",
            Stage::Building => "building plugin",
            Stage::FetchingDependencies => "fetching dependencies",
            Stage::Staging => "staging image context",
            Stage::BuildingImage => "building image",
        };
        f.write_str(label)
    }
}

/// Progress hooks for front ends. Called from concurrent pipelines, so
/// implementations must be thread-safe.
///
/// `path` is the project root the pipeline was started with. Names can
/// repeat across projects; paths cannot.
pub trait PipelineObserver: Send + Sync {
    fn stage(&self, _project: &str, _path: &Path, _stage: Stage) {}
    fn finished(&self, _path: &Path, _result: &BuildResult) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Supplies values for a project's secret environment keys.
///
/// Called once per successful project after all builds finished, never
/// concurrently.
pub trait SecretSource: Send + Sync {
    fn resolve(&self, project: &str, keys: &[String]) -> Vec<(String, String)>;
}

/// Reads secrets from the process environment; missing keys are skipped.
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn resolve(&self, project: &str, keys: &[String]) -> Vec<(String, String)> {
        keys.iter()
            .filter_map(|key| match std::env::var(key) {
                Ok(value) => Some((key.clone(), value)),
                Err(_) => {
                    tracing::warn!(project, key = %key, "Secret not set in environment, leaving it out");
                    None
                }
            })
            .collect()
    }
}
