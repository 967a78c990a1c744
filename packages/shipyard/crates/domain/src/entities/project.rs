use shipyard_manifest::GameProperties;
use std::path::{Path, PathBuf};

/// A project that passed loading. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSpec {
    /// Human-readable name, the last component of `path`.
    pub name: String,
    /// Canonical absolute project root.
    pub path: PathBuf,
    /// Dependency catalog keys, in declaration order.
    pub libraries: Vec<String>,
    /// Engine artifact supplied by the operator; skips the release download.
    pub engine_override: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub external_plugins_dir: Option<PathBuf>,
    /// The build tool wrapper (`gradlew` / `gradlew.bat`).
    pub build_entry: PathBuf,
    pub properties: GameProperties,
}

impl ProjectSpec {
    /// Registry key for this project.
    pub fn key(&self) -> String {
        path_key(&self.path)
    }

    /// Game name from the declaration file, or the directory name.
    pub fn game_name(&self) -> &str {
        self.properties.game_name_or(&self.name)
    }
}

/// Name shown for a project path before (or without) loading it.
pub fn name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Registry keys are the path's string form.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
