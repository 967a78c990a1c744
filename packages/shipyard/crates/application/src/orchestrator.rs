//! The full build run.
//!
//! Pipelines run on a bounded pool; once every one of them has finished the
//! results go through a single allocation, descriptor merge and registry
//! write.

use crate::context::PipelineContext;
use crate::observer::{EnvSecretSource, SecretSource};
use crate::pipeline::ProjectPipeline;
use crate::report::RunReport;
use domain::allocation::{allocate, shared_names, AllocationRequest, PortPolicy};
use domain::descriptor::{service_definition, ProjectService, BASELINE_SERVICES};
use domain::{BuildResult, OrchestratorError, ProjectRegistry, ServiceAllocation};
use futures_util::stream::{self, StreamExt};
use infrastructure::{DescriptorStore, RegistryStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Upper bound for the default pool size.
pub const DEFAULT_MAX_WORKERS: usize = 4;

pub struct BuildOrchestrator {
    ctx: PipelineContext,
    descriptor: DescriptorStore,
    registry: RegistryStore,
    port_policy: PortPolicy,
    workers: Option<usize>,
    engine_override: Option<PathBuf>,
    secrets: Arc<dyn SecretSource>,
}

impl BuildOrchestrator {
    pub fn new(ctx: PipelineContext, descriptor: DescriptorStore, registry: RegistryStore) -> Self {
        Self {
            ctx,
            descriptor,
            registry,
            port_policy: PortPolicy::default(),
            workers: None,
            engine_override: None,
            secrets: Arc::new(EnvSecretSource),
        }
    }

    pub fn with_port_policy(mut self, policy: PortPolicy) -> Self {
        self.port_policy = policy;
        self
    }

    /// Pool size; defaults to the number of projects, capped at
    /// [`DEFAULT_MAX_WORKERS`].
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_engine_override(mut self, path: Option<PathBuf>) -> Self {
        self.engine_override = path;
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Builds every project, then updates the descriptor and the registry.
    ///
    /// Per-project failures end up in the report. Only run-level problems
    /// (no input, descriptor/registry I/O, allocation) are errors.
    pub async fn run(&self, paths: Vec<PathBuf>) -> Result<RunReport, OrchestratorError> {
        let paths = dedupe(paths);
        if paths.is_empty() {
            return Err(OrchestratorError::NoProjects);
        }

        let mut registry = self.registry.load_or_default()?;
        let results = self.build_all(&paths, &registry).await;
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            succeeded,
            failed = results.len() - succeeded,
            "All pipelines finished"
        );

        if succeeded == 0 {
            return Ok(RunReport {
                results,
                allocations: Vec::new(),
                descriptor_path: None,
                registry_path: None,
            });
        }

        let requests: Vec<AllocationRequest> = results
            .iter()
            .filter_map(BuildResult::built)
            .map(|b| AllocationRequest {
                name: b.spec.name.clone(),
                path: b.spec.path.clone(),
            })
            .collect();
        let allocations = allocate(&requests, &registry, &self.port_policy, &BASELINE_SERVICES)?;

        self.write_descriptor(&results, &allocations)?;

        for result in &results {
            let Some(built) = result.built() else {
                continue;
            };
            if let Some(allocation) = find_allocation(&allocations, &built.spec.path) {
                registry.record(allocation, &built.image.reference());
            }
        }
        self.registry.save(&registry)?;

        Ok(RunReport {
            results,
            allocations,
            descriptor_path: Some(self.descriptor.path().to_path_buf()),
            registry_path: Some(self.registry.path().to_path_buf()),
        })
    }

    async fn build_all(&self, paths: &[PathBuf], registry: &ProjectRegistry) -> Vec<BuildResult> {
        let workers = self
            .workers
            .unwrap_or_else(|| paths.len().min(DEFAULT_MAX_WORKERS))
            .max(1);
        tracing::info!(projects = paths.len(), workers, "Starting pipelines");

        let pipeline = ProjectPipeline::new(self.ctx.clone(), self.engine_override.clone())
            .with_shared_names(shared_names(paths, registry));
        let pipeline = &pipeline;

        let mut indexed: Vec<(usize, BuildResult)> = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| async move { (index, pipeline.run(path).await) })
            .buffer_unordered(workers)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// The run's single read-merge-write of the descriptor.
    fn write_descriptor(
        &self,
        results: &[BuildResult],
        allocations: &[ServiceAllocation],
    ) -> Result<(), OrchestratorError> {
        let mut descriptor = self.descriptor.load()?;

        let mut services = Vec::with_capacity(allocations.len());
        for built in results.iter().filter_map(BuildResult::built) {
            let Some(allocation) = find_allocation(allocations, &built.spec.path) else {
                continue;
            };
            let secrets = if built.spec.properties.secret_environment_variable_keys.is_empty() {
                Vec::new()
            } else {
                self.secrets.resolve(
                    &built.spec.name,
                    &built.spec.properties.secret_environment_variable_keys,
                )
            };
            let image = built.image.reference();

            let definition = service_definition(
                &ProjectService {
                    allocation,
                    image: &image,
                    game_name: built.spec.game_name(),
                    properties: &built.spec.properties,
                    secrets: &secrets,
                },
                &self.ctx.settings.image,
            )
            .map_err(|e| OrchestratorError::DescriptorWriteFailed {
                path: self.descriptor.path().to_path_buf(),
                reason: e.to_string(),
            })?;
            services.push((allocation.service_name.clone(), definition));
        }

        descriptor
            .merge(&services)
            .map_err(|e| OrchestratorError::DescriptorReadFailed {
                path: self.descriptor.path().to_path_buf(),
                reason: e.to_string(),
            })?;
        self.descriptor.save(&descriptor)
    }
}

fn find_allocation<'a>(
    allocations: &'a [ServiceAllocation],
    path: &std::path::Path,
) -> Option<&'a ServiceAllocation> {
    allocations.iter().find(|a| a.path == path)
}

/// Canonicalizes where possible and drops repeats, keeping first-seen order.
/// Paths that cannot be canonicalized are kept so the loader reports them.
fn dedupe(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(|p| p.canonicalize().unwrap_or(p))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        std::fs::create_dir(&a).unwrap();

        let out = dedupe(vec![
            a.clone(),
            PathBuf::from("/missing/x"),
            a.join("."),
            PathBuf::from("/missing/x"),
        ]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], a.canonicalize().unwrap());
        assert_eq!(out[1], PathBuf::from("/missing/x"));
    }
}
