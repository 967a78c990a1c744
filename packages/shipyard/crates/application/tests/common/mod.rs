#![allow(dead_code)]

use application::{PipelineContext, PipelineSettings, SecretSource};
use async_trait::async_trait;
use domain::ports::network::{HttpClient, NetworkError};
use domain::ports::process::{CommandOutput, CommandRunner, Invocation, ProcessError};
use infrastructure::{DescriptorStore, RegistryStore};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Marker file that makes the fake build tool fail.
pub const FAIL_BUILD: &str = "FAIL_BUILD";

/// Scripted stand-in for gradle and docker.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<Invocation>>,
    pub fail_deploy: bool,
    pub swarm_inactive: bool,
}

impl FakeRunner {
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::display)
            .collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }
}

fn ok(output: &str) -> CommandOutput {
    CommandOutput {
        status: Some(0),
        output: output.to_string(),
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());

        if invocation.program.ends_with("gradlew") {
            let cwd = invocation.cwd.clone().unwrap_or_default();
            if cwd.join(FAIL_BUILD).exists() {
                return Ok(CommandOutput {
                    status: Some(1),
                    output: "FAILURE: compilation error".to_string(),
                });
            }
            let libs = cwd.join("build/libs");
            fs::create_dir_all(&libs).unwrap();
            let name = cwd.file_name().unwrap().to_string_lossy().to_string();
            fs::write(libs.join(format!("{}-all.jar", name)), b"plugin").unwrap();
            return Ok(ok("BUILD SUCCESSFUL"));
        }

        match invocation.args.first().map(String::as_str) {
            Some("info") if self.swarm_inactive => Ok(ok("inactive\n")),
            Some("info") => Ok(ok("active\n")),
            Some("stack") | Some("compose") if self.fail_deploy => Ok(CommandOutput {
                status: Some(1),
                output: "network shipyard-net not found".to_string(),
            }),
            _ => Ok(ok("")),
        }
    }
}

/// Serves a GitHub release and large-enough jars for every URL.
#[derive(Default)]
pub struct FakeHttp {
    pub requests: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(vec![0u8; 150_000])
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        if url.contains("modrinth") {
            return Ok(json!([
                {"version_number": "5.4.0", "game_versions": ["1.21.1"], "files": [{"url": "https://cdn.modrinth.com/pl.jar"}]}
            ]));
        }
        Ok(json!({
            "assets": [
                {"name": "local-engine-sources.jar", "browser_download_url": "https://github.com/e/s.jar"},
                {"name": "local-engine.jar", "browser_download_url": "https://github.com/e/local-engine.jar"}
            ]
        }))
    }
}

pub struct FixedSecrets;

impl SecretSource for FixedSecrets {
    fn resolve(&self, _project: &str, keys: &[String]) -> Vec<(String, String)> {
        keys.iter().map(|k| (k.clone(), format!("value-of-{}", k))).collect()
    }
}

/// A workspace holding projects plus the descriptor and registry files.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn project(&self, name: &str, properties: &str) -> PathBuf {
        let root = self.root().join(name);
        fs::create_dir_all(root.join("config")).unwrap();
        fs::write(root.join("config/game-properties.yaml"), properties).unwrap();
        fs::write(root.join("build.gradle.kts"), "").unwrap();
        fs::write(root.join("gradlew"), "#!/bin/sh\n").unwrap();
        root
    }

    pub fn descriptor(&self) -> DescriptorStore {
        DescriptorStore::new(self.root().join("docker-compose.yml"))
    }

    pub fn registry(&self) -> RegistryStore {
        RegistryStore::new(self.root().join(".shipyard/registry.json"))
    }

    pub fn engine_jar(&self) -> PathBuf {
        let jar = self.root().join("local-engine.jar");
        fs::write(&jar, b"engine").unwrap();
        jar
    }
}

pub fn context(runner: Arc<FakeRunner>, http: Arc<FakeHttp>) -> PipelineContext {
    PipelineContext::new(runner, http, PipelineSettings::default())
}
