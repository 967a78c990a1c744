use crate::entities::project::{name_from_path, ProjectSpec};
use crate::error::PipelineError;
use shipyard_manifest::{GameProperties, PROPERTIES_FILE};
use std::path::{Path, PathBuf};

const BUILD_DESCRIPTORS: [&str; 2] = ["build.gradle", "build.gradle.kts"];

/// Reads a project root into a [`ProjectSpec`].
#[derive(Debug, Clone)]
pub struct ProjectLoader {
    engine_override: Option<PathBuf>,
    windows: bool,
}

impl Default for ProjectLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectLoader {
    pub fn new() -> Self {
        Self {
            engine_override: None,
            windows: cfg!(windows),
        }
    }

    /// Every loaded project uses this engine artifact instead of the release.
    pub fn with_engine_override(mut self, path: Option<PathBuf>) -> Self {
        self.engine_override = path;
        self
    }

    /// Overrides the host platform when picking the build entry point.
    pub fn for_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    pub fn load(&self, path: &Path) -> Result<ProjectSpec, PipelineError> {
        let invalid = |missing: &str| PipelineError::InvalidProject {
            path: path.to_path_buf(),
            missing: missing.to_string(),
        };

        if !path.is_dir() {
            return Err(invalid("project directory"));
        }
        let root = path
            .canonicalize()
            .map_err(|_| invalid("project directory"))?;

        let properties_path = root.join(PROPERTIES_FILE);
        if !properties_path.is_file() {
            return Err(invalid(PROPERTIES_FILE));
        }
        let properties = GameProperties::load(&properties_path)
            .map_err(|e| invalid(&format!("a readable {} ({:#})", PROPERTIES_FILE, e)))?;

        if !BUILD_DESCRIPTORS.iter().any(|f| root.join(f).is_file()) {
            return Err(invalid("build.gradle"));
        }

        let build_entry = self
            .build_entry(&root)
            .ok_or_else(|| invalid(if self.windows { "gradlew.bat" } else { "gradlew" }))?;

        let optional_dir = |name: &str| {
            let dir = root.join(name);
            dir.is_dir().then_some(dir)
        };

        Ok(ProjectSpec {
            name: name_from_path(&root),
            libraries: properties.libraries().to_vec(),
            engine_override: self.engine_override.clone(),
            assets_dir: optional_dir("assets"),
            config_dir: optional_dir("config"),
            external_plugins_dir: optional_dir("external-plugins"),
            build_entry,
            properties,
            path: root,
        })
    }

    /// `gradlew` on Unix, `gradlew.bat` on Windows, each falling back to the other.
    fn build_entry(&self, root: &Path) -> Option<PathBuf> {
        let order = if self.windows {
            ["gradlew.bat", "gradlew"]
        } else {
            ["gradlew", "gradlew.bat"]
        };
        order
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scaffold(root: &Path, properties: &str) {
        fs::create_dir_all(root.join("config")).unwrap();
        fs::write(root.join(PROPERTIES_FILE), properties).unwrap();
        fs::write(root.join("build.gradle.kts"), "").unwrap();
        fs::write(root.join("gradlew"), "#!/bin/sh\n").unwrap();
    }

    #[test]
    fn loads_complete_project() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("arena");
        scaffold(
            &root,
            "projectId: arena\ndependencies:\n  libraries: [PROTOCOLLIB]\n",
        );
        fs::create_dir(root.join("assets")).unwrap();

        let spec = ProjectLoader::new().for_windows(false).load(&root).unwrap();

        assert_eq!(spec.name, "arena");
        assert_eq!(spec.libraries, vec!["PROTOCOLLIB"]);
        assert!(spec.assets_dir.is_some());
        assert!(spec.config_dir.is_some());
        assert!(spec.external_plugins_dir.is_none());
        assert!(spec.build_entry.ends_with("gradlew"));
        assert!(spec.path.is_absolute());
    }

    #[test]
    fn missing_declaration_is_invalid() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("build.gradle"), "").unwrap();

        let err = ProjectLoader::new().load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidProject { ref missing, .. } if missing == PROPERTIES_FILE
        ));
    }

    #[test]
    fn missing_build_descriptor_is_invalid() {
        let dir = tempdir().unwrap();
        scaffold(dir.path(), "projectId: x\n");
        fs::remove_file(dir.path().join("build.gradle.kts")).unwrap();

        let err = ProjectLoader::new().load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("build.gradle"));
    }

    #[test]
    fn windows_falls_back_to_unix_wrapper() {
        let dir = tempdir().unwrap();
        scaffold(dir.path(), "projectId: x\n");

        let spec = ProjectLoader::new().for_windows(true).load(dir.path()).unwrap();
        assert!(spec.build_entry.ends_with("gradlew"));
    }

    #[test]
    fn nonexistent_path_is_invalid() {
        let err = ProjectLoader::new()
            .load(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidProject { .. }));
    }
}
