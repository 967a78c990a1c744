use crate::observer::{NoopObserver, PipelineObserver};
use domain::catalog::DependencyCatalog;
use domain::image::ImageSettings;
use domain::ports::network::HttpClient;
use domain::ports::process::CommandRunner;
use std::sync::Arc;
use std::time::Duration;

/// Knobs shared by every pipeline of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub image: ImageSettings,
    /// Build tool task producing the plugin jar.
    pub build_task: String,
    pub build_timeout: Duration,
    /// Searched, in order, when `build/libs` holds no jar.
    pub artifact_fallback_dirs: Vec<String>,
    /// `owner/name` of the engine's GitHub repository.
    pub engine_repository: String,
    /// Game versions accepted when picking a Modrinth release.
    pub game_versions: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            image: ImageSettings::default(),
            build_task: "buildPluginJar".to_string(),
            build_timeout: Duration::from_secs(300),
            artifact_fallback_dirs: vec!["mineplex".to_string()],
            engine_repository: "Plexverse/local-engine".to_string(),
            game_versions: vec!["1.21".to_string(), "1.21.1".to_string()],
        }
    }
}

/// Read-only collaborators handed to every pipeline.
#[derive(Clone)]
pub struct PipelineContext {
    pub runner: Arc<dyn CommandRunner>,
    pub http: Arc<dyn HttpClient>,
    pub catalog: Arc<DependencyCatalog>,
    pub settings: Arc<PipelineSettings>,
    pub observer: Arc<dyn PipelineObserver>,
}

impl PipelineContext {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            runner,
            http,
            catalog: Arc::new(DependencyCatalog::builtin()),
            settings: Arc::new(settings),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_catalog(mut self, catalog: DependencyCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }
}
