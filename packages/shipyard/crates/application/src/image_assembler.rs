use domain::allocation::normalize_service_name;
use domain::image::{container_common_name, DockerfileTemplate, ImageRef, ImageSettings, StagedLayout};
use domain::ports::process::ProcessError;
use domain::{PipelineError, ProjectSpec};
use infrastructure::DockerCli;
use std::fs;
use std::io;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

pub const PLUGINS_DIR: &str = "plugins";
pub const COMMON_NAME_FILE: &str = ".common-name";

/// Turns a staging directory into an image.
pub struct ImageAssembler {
    docker: DockerCli,
    settings: ImageSettings,
    timeout: Option<Duration>,
    shared_names: BTreeSet<String>,
}

impl ImageAssembler {
    pub fn new(docker: DockerCli, settings: ImageSettings) -> Self {
        Self {
            docker,
            settings,
            timeout: None,
            shared_names: BTreeSet::new(),
        }
    }

    /// Names claimed by several projects; their images get no name-based tags.
    pub fn with_shared_names(mut self, names: BTreeSet<String>) -> Self {
        self.shared_names = names;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Copies the project artifact, external plugins, assets and config into
    /// `staging` and renders the Dockerfile. The engine and dependency jars
    /// are expected in `staging/plugins` already.
    pub async fn stage(
        &self,
        spec: &ProjectSpec,
        artifact: &Path,
        staging: &Path,
    ) -> Result<StagedLayout, PipelineError> {
        let spec = spec.clone();
        let artifact = artifact.to_path_buf();
        let staging = staging.to_path_buf();
        let settings = self.settings.clone();

        tokio::task::spawn_blocking(move || stage_blocking(&spec, &artifact, &staging, &settings))
            .await
            .map_err(|e| PipelineError::Staging(e.to_string()))?
            .map_err(|e| PipelineError::Staging(e.to_string()))
    }

    /// `docker build --no-cache` of the staged context.
    pub async fn build_image(
        &self,
        spec: &ProjectSpec,
        staging: &Path,
    ) -> Result<ImageRef, PipelineError> {
        let image = self.image_ref(spec);
        let references = image.all_references();

        let output = self
            .docker
            .build_image(staging, &references, self.timeout)
            .await
            .map_err(|e| PipelineError::ImageBuildFailed {
                status: None,
                output: match e {
                    ProcessError::Spawn { reason, .. } => reason,
                    other => other.to_string(),
                },
            })?;

        if !output.success() {
            return Err(PipelineError::ImageBuildFailed {
                status: output.status,
                output: output.output,
            });
        }

        tracing::info!(project = %spec.name, image = %image.reference(), tags = ?image.extra_tags, "Image built");
        Ok(image)
    }

    pub fn image_ref(&self, spec: &ProjectSpec) -> ImageRef {
        let image = ImageRef::for_project(
            &self.settings.repository_prefix,
            &spec.name,
            &spec.path,
            spec.game_name(),
            &spec.properties.game.display_name,
        );
        if self.shared_names.contains(&normalize_service_name(&spec.name)) {
            tracing::debug!(project = %spec.name, "Name shared with another project, skipping name tags");
            return image.without_extra_tags();
        }
        image
    }
}

fn stage_blocking(
    spec: &ProjectSpec,
    artifact: &Path,
    staging: &Path,
    settings: &ImageSettings,
) -> io::Result<StagedLayout> {
    let plugins = staging.join(PLUGINS_DIR);
    fs::create_dir_all(&plugins)?;

    if let Some(name) = artifact.file_name() {
        fs::copy(artifact, plugins.join(name))?;
    }

    if let Some(external) = &spec.external_plugins_dir {
        for jar in jars_in(external)? {
            if let Some(name) = jar.file_name() {
                fs::copy(&jar, plugins.join(name))?;
                tracing::debug!(project = %spec.name, plugin = ?name, "Staged external plugin");
            }
        }
    }

    let mut layout = StagedLayout::default();
    if let Some(assets) = &spec.assets_dir {
        copy_tree(assets, &staging.join("assets"))?;
        layout.assets = true;
    }
    if let Some(config) = &spec.config_dir {
        copy_tree(config, &staging.join("config"))?;
        layout.config = true;
    }

    let server = staging.join("server");
    fs::create_dir_all(&server)?;
    fs::write(
        server.join(COMMON_NAME_FILE),
        container_common_name(spec.game_name()),
    )?;
    layout.server = true;

    let dockerfile = DockerfileTemplate::new(settings).render(layout);
    fs::write(staging.join("Dockerfile"), dockerfile)?;

    Ok(layout)
}

fn jars_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut jars: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("jar"))
                    .unwrap_or(false)
        })
        .collect();
    jars.sort();
    Ok(jars)
}

/// Recursive copy; symlinks are followed.
fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
