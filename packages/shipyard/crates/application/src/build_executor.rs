use domain::ports::process::{CommandRunner, Invocation, ProcessError};
use domain::{PipelineError, ProjectSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Runs a project's build tool and locates the jar it produced.
pub struct BuildExecutor {
    runner: Arc<dyn CommandRunner>,
    task: String,
    timeout: Duration,
    fallback_dirs: Vec<String>,
}

impl BuildExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, task: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            task: task.into(),
            timeout,
            fallback_dirs: Vec::new(),
        }
    }

    /// Project-relative directories searched when `build/libs` has no jar.
    pub fn with_fallback_dirs(mut self, dirs: Vec<String>) -> Self {
        self.fallback_dirs = dirs;
        self
    }

    /// Builds the project. Output is only kept when the build fails.
    pub async fn build(&self, spec: &ProjectSpec) -> Result<PathBuf, PipelineError> {
        let invocation = Invocation::new(spec.build_entry.to_string_lossy())
            .arg(self.task.as_str())
            .current_dir(&spec.path)
            .timeout(self.timeout);

        let output = self.runner.run(&invocation).await.map_err(|e| match e {
            ProcessError::TimedOut { seconds, output, .. } => PipelineError::BuildFailed {
                reason: format!("timed out after {}s", seconds),
                output,
            },
            ProcessError::Spawn { reason, .. } => PipelineError::BuildFailed {
                reason,
                output: String::new(),
            },
        })?;

        if !output.success() {
            return Err(PipelineError::BuildFailed {
                reason: match output.status {
                    Some(code) => format!("`{}` exited with status {}", self.task, code),
                    None => format!("`{}` was terminated by a signal", self.task),
                },
                output: output.output,
            });
        }

        let artifact = locate_artifact(&spec.path)
            .or_else(|| {
                self.fallback_dirs
                    .iter()
                    .find_map(|dir| newest_jar(&spec.path.join(dir)))
            })
            .ok_or_else(|| PipelineError::BuildFailed {
                reason: "no artifact".to_string(),
                output: output.output,
            })?;

        tracing::info!(project = %spec.name, artifact = ?artifact, "Build succeeded");
        Ok(artifact)
    }
}

/// Picks the plugin jar from `build/libs`.
///
/// Fat jars (`*-all.jar`) win; sources and javadoc jars never qualify.
/// Stale jars from earlier versions stay in `build/libs`, so the most
/// recently modified candidate is taken, then the greatest file name.
pub fn locate_artifact(project_root: &Path) -> Option<PathBuf> {
    let jars = jars_in(&project_root.join("build").join("libs"));

    let is_fat = |p: &PathBuf| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with("-all.jar"))
            .unwrap_or(false)
    };

    let fat: Vec<PathBuf> = jars.iter().filter(|p| is_fat(*p)).cloned().collect();
    newest(if fat.is_empty() { jars } else { fat })
}

/// Most recent plugin jar directly inside `dir`.
fn newest_jar(dir: &Path) -> Option<PathBuf> {
    newest(jars_in(dir))
}

fn jars_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|name| {
                    name.ends_with(".jar") && !name.contains("sources") && !name.contains("javadoc")
                })
                .unwrap_or(false)
        })
        .collect()
}

fn newest(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .map(|p| {
            let modified = std::fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .max()
        .map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ports::process::CommandOutput;
    use domain::project::ProjectLoader;
    use shipyard_manifest::PROPERTIES_FILE;
    use std::fs;

    fn libs_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("build/libs");
        fs::create_dir_all(&libs).unwrap();
        for f in files {
            fs::write(libs.join(f), b"jar").unwrap();
        }
        dir
    }

    /// Sets the modification time to `secs` after the epoch.
    fn touch(path: &Path, secs: u64) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn prefers_fat_jar() {
        let dir = libs_with(&["arena-1.0.jar", "arena-1.0-all.jar", "arena-1.0-sources.jar"]);
        let libs = dir.path().join("build/libs");
        touch(&libs.join("arena-1.0.jar"), 2_000);
        touch(&libs.join("arena-1.0-all.jar"), 1_000);

        let found = locate_artifact(dir.path()).unwrap();
        assert!(found.ends_with("arena-1.0-all.jar"));
    }

    #[test]
    fn freshly_built_version_beats_stale_one() {
        let dir = libs_with(&["arena-1.1-all.jar", "arena-1.0-all.jar"]);
        let libs = dir.path().join("build/libs");
        touch(&libs.join("arena-1.1-all.jar"), 1_000);
        touch(&libs.join("arena-1.0-all.jar"), 2_000);
        assert!(locate_artifact(dir.path()).unwrap().ends_with("arena-1.0-all.jar"));

        // A version bump rebuilds into a new file next to the old one.
        touch(&libs.join("arena-1.1-all.jar"), 3_000);
        assert!(locate_artifact(dir.path()).unwrap().ends_with("arena-1.1-all.jar"));
    }

    #[test]
    fn equal_timestamps_fall_back_to_name() {
        let dir = libs_with(&["b.jar", "a.jar", "a-javadoc.jar"]);
        let libs = dir.path().join("build/libs");
        touch(&libs.join("a.jar"), 1_000);
        touch(&libs.join("b.jar"), 1_000);
        assert!(locate_artifact(dir.path()).unwrap().ends_with("b.jar"));
    }

    #[test]
    fn nothing_built() {
        let dir = libs_with(&["a-sources.jar"]);
        assert_eq!(locate_artifact(dir.path()), None);
        assert_eq!(locate_artifact(Path::new("/no/such/project")), None);
    }

    struct SlowBuild;

    #[async_trait::async_trait]
    impl CommandRunner for SlowBuild {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
            Err(ProcessError::TimedOut {
                command: invocation.display(),
                seconds: 300,
                output: "> Task :compileJava\n".to_string(),
            })
        }
    }

    fn project() -> (tempfile::TempDir, ProjectSpec) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("arena");
        fs::create_dir_all(root.join("config")).unwrap();
        fs::write(root.join(PROPERTIES_FILE), "projectId: arena\n").unwrap();
        fs::write(root.join("build.gradle"), "").unwrap();
        fs::write(root.join("gradlew"), "").unwrap();
        let spec = ProjectLoader::new().for_windows(false).load(&root).unwrap();
        (dir, spec)
    }

    #[tokio::test]
    async fn timeout_reports_output_so_far() {
        let (_dir, spec) = project();
        let executor = BuildExecutor::new(Arc::new(SlowBuild), "buildPluginJar", Duration::from_secs(300));

        match executor.build(&spec).await.unwrap_err() {
            PipelineError::BuildFailed { reason, output } => {
                assert_eq!(reason, "timed out after 300s");
                assert!(output.contains(":compileJava"));
            }
            other => panic!("expected a build failure, got {}", other),
        }
    }

    #[test]
    fn fallback_directory_is_searched() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("mineplex");
        fs::create_dir_all(&fallback).unwrap();
        fs::write(fallback.join("arena.jar"), b"jar").unwrap();

        assert_eq!(locate_artifact(dir.path()), None);
        assert_eq!(newest_jar(&fallback), Some(fallback.join("arena.jar")));
        assert_eq!(newest_jar(&dir.path().join("missing")), None);
    }
}
