//! `shipyard.toml` loading and validation.
//!
//! Every section is optional; missing keys fall back to the same defaults
//! the library uses. Command-line flags are applied on top by the commands.

use crate::core::error::CliError;
use serde::{Deserialize, Serialize};
use shipyard::application::{DeployMode, PipelineSettings};
use shipyard::domain::allocation::{PortPolicy, DEFAULT_BASE_PORT};
use shipyard::domain::image::ImageSettings;
use shipyard::infrastructure::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "shipyard.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipyardConfig {
    pub paths: PathSettings,
    pub build: BuildSettings,
    pub image: ImageSettings,
    pub ports: PortSettings,
    pub deploy: DeploySettings,
    pub fetch: FetchSettings,
    pub logging: LoggingSettings,
}

/// Where the descriptor and the registry live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub compose_file: PathBuf,
    pub registry_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            registry_file: PathBuf::from(".shipyard/registry.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Pool size; `None` means one per project, up to four.
    pub workers: Option<usize>,
    pub task: String,
    pub timeout_secs: u64,
    /// Project-relative directories searched when `build/libs` has no jar.
    pub artifact_fallback_dirs: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        let defaults = PipelineSettings::default();
        Self {
            workers: None,
            task: defaults.build_task,
            timeout_secs: defaults.build_timeout.as_secs(),
            artifact_fallback_dirs: defaults.artifact_fallback_dirs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    pub base: u16,
    /// Added to the infrastructure ports, which are always reserved.
    pub reserved: Vec<u16>,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_PORT,
            reserved: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub mode: DeployMode,
    pub stack_name: String,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            mode: DeployMode::default(),
            stack_name: "shipyard".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
    pub engine_repository: String,
    pub game_versions: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let pipeline = PipelineSettings::default();
        Self {
            max_attempts: retry.max_attempts,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
            max_backoff_ms: retry.max_backoff.as_millis() as u64,
            timeout_secs: 120,
            engine_repository: pipeline.engine_repository,
            game_versions: pipeline.game_versions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl ShipyardConfig {
    /// Reads `path`, or `shipyard.toml` in the working directory when no path
    /// is given. Only an explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(CliError::Config(format!("{} does not exist", path.display())));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.paths.compose_file.as_os_str().is_empty() {
            return Err("paths.compose_file cannot be empty".to_string());
        }
        if self.paths.registry_file.as_os_str().is_empty() {
            return Err("paths.registry_file cannot be empty".to_string());
        }

        if self.build.workers == Some(0) {
            return Err("build.workers must be at least 1".to_string());
        }
        if self.build.task.trim().is_empty() {
            return Err("build.task cannot be empty".to_string());
        }

        if self.port_policy().reserved.contains(&self.ports.base) {
            return Err(format!("ports.base {} is a reserved port", self.ports.base));
        }

        if self.deploy.stack_name.trim().is_empty() {
            return Err("deploy.stack_name cannot be empty".to_string());
        }

        validate_log_level(&self.logging.level)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            image: self.image.clone(),
            build_task: self.build.task.clone(),
            build_timeout: Duration::from_secs(self.build.timeout_secs),
            artifact_fallback_dirs: self.build.artifact_fallback_dirs.clone(),
            engine_repository: self.fetch.engine_repository.clone(),
            game_versions: self.fetch.game_versions.clone(),
        }
    }

    pub fn port_policy(&self) -> PortPolicy {
        let mut policy = PortPolicy {
            base: self.ports.base,
            ..PortPolicy::default()
        };
        policy.reserved.extend(self.ports.reserved.iter().copied());
        policy
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch.max_attempts,
            initial_backoff: Duration::from_millis(self.fetch.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.fetch.max_backoff_ms),
        }
    }
}

pub fn validate_log_level(level: &str) -> Result<(), String> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&level) {
        return Err(format!(
            "Invalid log level: {}. Must be one of: {valid_levels:?}",
            level
        ));
    }
    Ok(())
}
