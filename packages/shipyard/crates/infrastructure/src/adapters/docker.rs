use domain::ports::process::{CommandOutput, CommandRunner, Invocation, ProcessError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DOCKER: &str = "docker";

/// Swarm membership of the local engine, from `docker info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwarmState {
    Active,
    Inactive,
    /// Pending, locked, error, or anything newer than this code knows.
    Other(String),
}

impl SwarmState {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Thin wrapper over the `docker` CLI. Every call goes through the
/// [`CommandRunner`] port, so tests can script the engine's answers.
#[derive(Clone)]
pub struct DockerCli {
    runner: Arc<dyn CommandRunner>,
}

impl DockerCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `docker build --no-cache -t <ref>... .` inside `context`.
    pub async fn build_image(
        &self,
        context: &Path,
        references: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, ProcessError> {
        let mut invocation = Invocation::new(DOCKER)
            .args(["build", "--no-cache"])
            .current_dir(context);
        for reference in references {
            invocation = invocation.arg("-t").arg(reference.as_str());
        }
        invocation = invocation.arg(".");
        if let Some(limit) = timeout {
            invocation = invocation.timeout(limit);
        }

        self.runner.run(&invocation).await
    }

    pub async fn swarm_state(&self) -> Result<SwarmState, ProcessError> {
        let out = self
            .runner
            .run(&Invocation::new(DOCKER).args(["info", "--format", "{{.Swarm.LocalNodeState}}"]))
            .await?;
        if !out.success() {
            return Ok(SwarmState::Other(out.output.trim().to_string()));
        }
        Ok(SwarmState::parse(&out.output))
    }

    pub async fn swarm_init(&self) -> Result<CommandOutput, ProcessError> {
        self.runner
            .run(&Invocation::new(DOCKER).args(["swarm", "init"]))
            .await
    }

    /// `docker compose -f <file> -p <project> up -d`
    pub async fn compose_up(
        &self,
        compose_file: &Path,
        project: &str,
    ) -> Result<CommandOutput, ProcessError> {
        let invocation = Invocation::new(DOCKER)
            .args(["compose", "-f"])
            .arg(compose_file.to_string_lossy())
            .args(["-p", project, "up", "-d"]);
        self.runner.run(&invocation).await
    }

    /// `docker stack deploy -c <file> <stack>`
    pub async fn stack_deploy(
        &self,
        compose_file: &Path,
        stack: &str,
    ) -> Result<CommandOutput, ProcessError> {
        let invocation = Invocation::new(DOCKER)
            .args(["stack", "deploy", "-c"])
            .arg(compose_file.to_string_lossy())
            .arg(stack);
        self.runner.run(&invocation).await
    }

    /// First running container labelled with the given service name.
    pub async fn find_container(&self, service: &str) -> Result<Option<String>, ProcessError> {
        let out = self
            .runner
            .run(&Invocation::new(DOCKER).args([
                "ps".to_string(),
                "--filter".to_string(),
                format!("label=shipyard.service={}", service),
                "--format".to_string(),
                "{{.ID}}".to_string(),
            ]))
            .await?;

        if !out.success() {
            return Ok(None);
        }
        Ok(out
            .output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    /// `docker exec <container> <args>...`
    pub async fn exec(
        &self,
        container: &str,
        args: &[String],
    ) -> Result<CommandOutput, ProcessError> {
        let invocation = Invocation::new(DOCKER)
            .arg("exec")
            .arg(container)
            .args(args.iter().cloned());
        self.runner.run(&invocation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        calls: Mutex<Vec<Invocation>>,
        reply: CommandOutput,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(self.reply.clone())
        }
    }

    fn docker(reply: &str) -> (Arc<Recorder>, DockerCli) {
        let recorder = Arc::new(Recorder {
            calls: Mutex::new(Vec::new()),
            reply: CommandOutput {
                status: Some(0),
                output: reply.to_string(),
            },
        });
        (recorder.clone(), DockerCli::new(recorder))
    }

    #[tokio::test]
    async fn build_disables_cache_and_tags_every_reference() {
        let (recorder, docker) = docker("");
        docker
            .build_image(
                Path::new("/tmp/ctx"),
                &["s/a:1".to_string(), "s/a:arena".to_string()],
                None,
            )
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            calls[0].display(),
            "docker build --no-cache -t s/a:1 -t s/a:arena ."
        );
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/tmp/ctx")));
    }

    #[tokio::test]
    async fn parses_swarm_state() {
        let (_, docker) = docker("inactive\n");
        assert_eq!(docker.swarm_state().await.unwrap(), SwarmState::Inactive);
    }

    #[tokio::test]
    async fn finds_first_container() {
        let (recorder, docker) = docker("\nabc123\ndef456\n");
        assert_eq!(
            docker.find_container("arena").await.unwrap().as_deref(),
            Some("abc123")
        );
        assert!(recorder.calls.lock().unwrap()[0]
            .args
            .contains(&"label=shipyard.service=arena".to_string()));
    }
}
