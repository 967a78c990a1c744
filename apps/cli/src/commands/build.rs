use crate::core::config::ShipyardConfig;
use crate::core::error::CliError;
use crate::ui::components::prompt;
use crate::ui::components::table::build_summary;
use crate::ui::components::BuildProgress;
use crate::ui::Theme;
use clap::Args;
use shipyard::application::{
    BuildOrchestrator, DeployMode, PipelineContext, RunReport, SecretSource,
};
use shipyard::domain::OrchestratorError;
use shipyard::infrastructure::{ReqwestClient, RetryingHttpClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Project directories to build
    pub paths: Vec<PathBuf>,

    /// File listing one project directory per line
    #[arg(long, value_name = "FILE")]
    pub projects_file: Option<PathBuf>,

    /// Use a local engine jar instead of downloading the latest release
    #[arg(long, value_name = "JAR")]
    pub engine_jar: Option<PathBuf>,

    /// Deployment mode (compose or swarm)
    #[arg(long)]
    pub mode: Option<DeployMode>,

    /// Number of projects built at the same time
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Build images and update the descriptor without deploying
    #[arg(long)]
    pub no_deploy: bool,
}

impl BuildCommand {
    pub async fn execute(self, config: &ShipyardConfig) -> Result<(), CliError> {
        cliclack::intro(console::style(" shipyard build ").on_cyan().black())?;

        if self.workers == Some(0) {
            return Err(CliError::Config("--workers must be at least 1".to_string()));
        }

        let (engine_jar, paths) = self.projects()?;
        if paths.is_empty() {
            return Err(OrchestratorError::NoProjects.into());
        }
        cliclack::log::info(format!("Building {} project(s)", paths.len()))?;

        let runner = super::runner();
        let http = ReqwestClient::new(Duration::from_secs(config.fetch.timeout_secs))?;
        let http = Arc::new(RetryingHttpClient::new(http, config.retry_policy()));
        let ctx = PipelineContext::new(runner.clone(), http, config.pipeline_settings())
            .with_observer(Arc::new(BuildProgress::new()));
        let (descriptor, registry) = super::stores(config);

        let report = BuildOrchestrator::new(ctx, descriptor, registry)
            .with_port_policy(config.port_policy())
            .with_workers(self.workers.or(config.build.workers))
            .with_engine_override(engine_jar)
            .with_secrets(Arc::new(PromptSecretSource))
            .run(paths)
            .await?;

        render(&report)?;

        if !report.should_deploy() {
            cliclack::log::warning("No project built successfully, nothing to deploy")?;
            cliclack::outro(report.summary_line())?;
            return Ok(());
        }
        if self.no_deploy {
            cliclack::log::info("Skipping deployment (--no-deploy)")?;
            cliclack::outro(report.summary_line())?;
            return Ok(());
        }

        let deployer = super::deployer(config, self.mode, runner);
        let spinner = cliclack::spinner();
        spinner.start(format!("Deploying stack ({})", deployer.mode()));
        match deployer.deploy().await {
            Ok(_) => spinner.stop("Stack deployed"),
            Err(e) => {
                spinner.error("Deployment failed");
                return Err(e.into());
            }
        }

        cliclack::outro(format!("{}, deployed", report.summary_line()))?;
        Ok(())
    }

    /// Paths from arguments, then `--projects-file`, then the prompt.
    fn projects(&self) -> Result<(Option<PathBuf>, Vec<PathBuf>), CliError> {
        if !self.paths.is_empty() {
            return Ok((self.engine_jar.clone(), self.paths.clone()));
        }
        if let Some(file) = &self.projects_file {
            return Ok((self.engine_jar.clone(), read_projects_file(file)?));
        }

        let selection = prompt::select_projects()?;
        Ok((self.engine_jar.clone().or(selection.engine_jar), selection.paths))
    }
}

/// One path per line; blank lines and `#` comments are ignored.
fn read_projects_file(file: &Path) -> Result<Vec<PathBuf>, CliError> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| CliError::Config(format!("{}: {}", file.display(), e)))?;
    Ok(parse_projects(&content))
}

fn parse_projects(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

fn render(report: &RunReport) -> Result<(), CliError> {
    crate::ui::println(build_summary(report).to_string());

    for result in &report.results {
        let Some(error) = result.error() else {
            continue;
        };
        match error.output().filter(|o| !o.trim().is_empty()) {
            Some(output) => cliclack::log::error(format!(
                "{}: {}\n{}",
                Theme::bold(&result.name),
                error,
                Theme::muted(output.trim_end())
            ))?,
            None => cliclack::log::error(format!("{}: {}", Theme::bold(&result.name), error))?,
        }
    }

    if let Some(path) = &report.descriptor_path {
        cliclack::log::success(format!("Descriptor updated: {}", path.display()))?;
    }
    cliclack::log::info(report.summary_line())?;
    Ok(())
}

/// Secrets come from the environment first; anything missing is asked for
/// when a terminal is attached.
struct PromptSecretSource;

impl SecretSource for PromptSecretSource {
    fn resolve(&self, project: &str, keys: &[String]) -> Vec<(String, String)> {
        let interactive = prompt::is_interactive();
        keys.iter()
            .filter_map(|key| {
                if let Ok(value) = std::env::var(key) {
                    return Some((key.clone(), value));
                }
                if interactive {
                    if let Some(value) = prompt::secret(&format!("{} for {}", key, project)) {
                        return Some((key.clone(), value));
                    }
                }
                tracing::warn!(project, key = %key, "No value for secret, leaving it out");
                None
            })
            .collect()
    }
}
