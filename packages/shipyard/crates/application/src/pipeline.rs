//! One project's pipeline: load, fetch, build, stage, image.
//!
//! Stages run strictly in order and the first failure ends the pipeline.
//! Pipelines share nothing mutable; each returns its own `BuildResult`.

use crate::build_executor::BuildExecutor;
use crate::context::PipelineContext;
use crate::fetcher::{ArtifactFetcher, ENGINE_FILE_NAME};
use crate::image_assembler::{ImageAssembler, PLUGINS_DIR};
use crate::observer::Stage;
use domain::entities::project::name_from_path;
use domain::project::ProjectLoader;
use domain::{BuildResult, BuiltProject, PipelineError, ProjectSpec};
use shipyard_manifest::{PropertiesValidator, PROPERTIES_FILE};
use infrastructure::DockerCli;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct ProjectPipeline {
    ctx: PipelineContext,
    loader: ProjectLoader,
    fetcher: ArtifactFetcher,
    executor: BuildExecutor,
    assembler: ImageAssembler,
}

impl ProjectPipeline {
    pub fn new(ctx: PipelineContext, engine_override: Option<PathBuf>) -> Self {
        let settings = ctx.settings.clone();
        Self {
            loader: ProjectLoader::new().with_engine_override(engine_override),
            fetcher: ArtifactFetcher::new(
                ctx.http.clone(),
                settings.engine_repository.clone(),
                settings.game_versions.clone(),
            ),
            executor: BuildExecutor::new(
                ctx.runner.clone(),
                settings.build_task.clone(),
                settings.build_timeout,
            )
            .with_fallback_dirs(settings.artifact_fallback_dirs.clone()),
            assembler: ImageAssembler::new(DockerCli::new(ctx.runner.clone()), settings.image.clone())
                .with_timeout(settings.build_timeout),
            ctx,
        }
    }

    /// Names claimed by several projects; see [`ImageAssembler::with_shared_names`].
    pub fn with_shared_names(mut self, names: BTreeSet<String>) -> Self {
        self.assembler = self.assembler.with_shared_names(names);
        self
    }

    pub async fn run(&self, path: &Path) -> BuildResult {
        let name = name_from_path(path);
        tracing::info!(project = %name, path = ?path, "Pipeline started");

        let result = match self.stages(&name, path).await {
            Ok(built) => BuildResult::succeeded(built),
            Err(error) => {
                tracing::warn!(project = %name, %error, "Pipeline failed");
                BuildResult::failed(name, path, error)
            }
        };

        self.ctx.observer.finished(path, &result);
        result
    }

    async fn stages(&self, name: &str, path: &Path) -> Result<BuiltProject, PipelineError> {
        let observer = &self.ctx.observer;

        observer.stage(name, path, Stage::Loading);
        let spec = self.loader.load(path)?;
        check_properties(&spec)?;
        // Unknown keys fail before anything slow happens.
        let entries = self.ctx.catalog.resolve_all(&spec.libraries)?;

        let staging = tempfile::Builder::new()
            .prefix(&format!("shipyard-build-{}-", spec.name))
            .tempdir()
            .map_err(|e| PipelineError::Staging(e.to_string()))?;
        let plugins = staging.path().join(PLUGINS_DIR);

        observer.stage(name, path, Stage::FetchingEngine);
        self.fetcher
            .fetch_engine(&plugins.join(ENGINE_FILE_NAME), spec.engine_override.as_deref())
            .await?;

        observer.stage(name, path, Stage::Building);
        let artifact = self.executor.build(&spec).await?;

        if !entries.is_empty() {
            observer.stage(name, path, Stage::FetchingDependencies);
            for entry in entries {
                self.fetcher.fetch_dependency(entry, &plugins).await?;
            }
        }

        observer.stage(name, path, Stage::Staging);
        self.assembler.stage(&spec, &artifact, staging.path()).await?;

        observer.stage(name, path, Stage::BuildingImage);
        let image = self.assembler.build_image(&spec, staging.path()).await?;

        Ok(BuiltProject {
            spec,
            artifact,
            image,
        })
    }
}

/// Logs declaration warnings; a malformed library key or secret name fails
/// the project before anything is fetched.
fn check_properties(spec: &ProjectSpec) -> Result<(), PipelineError> {
    let result = PropertiesValidator::validate(&spec.properties);
    for issue in result.warnings() {
        tracing::warn!(project = %spec.name, field = %issue.field, "{}", issue.message);
    }
    let first_error = result.errors().next().cloned();
    match first_error {
        Some(issue) => Err(PipelineError::InvalidProject {
            path: spec.path.clone(),
            missing: format!("a valid {} ({}: {})", PROPERTIES_FILE, issue.field, issue.message),
        }),
        None => Ok(()),
    }
}
