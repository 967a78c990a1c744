use async_trait::async_trait;
use domain::ports::process::{CommandOutput, CommandRunner, Invocation, ProcessError};
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Runs commands with `tokio::process`, capturing stdout and stderr.
///
/// The child is killed if the invocation times out.
#[derive(Debug, Default, Clone)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let program = Path::new(&invocation.program);
        let is_batch = program
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("bat") || e.eq_ignore_ascii_case("cmd"))
            .unwrap_or(false);

        // Batch files need the command interpreter.
        let mut cmd = if is_batch {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&invocation.program);
            cmd
        } else {
            Command::new(&invocation.program)
        };

        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(invocation: &Invocation, err: std::io::Error) -> ProcessError {
        let bare_name = !invocation.program.contains(std::path::MAIN_SEPARATOR);
        let reason = if bare_name && which::which(&invocation.program).is_err() {
            format!("`{}` was not found on PATH", invocation.program)
        } else {
            err.to_string()
        };
        ProcessError::Spawn {
            program: invocation.program.clone(),
            reason,
        }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(command = %invocation.display(), cwd = ?invocation.cwd, "Running command");

        let mut cmd = Self::command(invocation);
        let mut child = cmd
            .spawn()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        // Read while the child runs so a timeout still has the output so far.
        let stdout = Capture::start(child.stdout.take());
        let stderr = Capture::start(child.stderr.take());

        let status = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!(command = %invocation.display(), error = %e, "Kill after timeout failed");
                    }
                    return Err(ProcessError::TimedOut {
                        command: invocation.display(),
                        seconds: limit.as_secs(),
                        output: combine(&stdout.abort(), &stderr.abort()),
                    });
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| Self::spawn_error(invocation, e))?;

        let combined = combine(&stdout.finish().await, &stderr.finish().await);

        tracing::debug!(
            command = %invocation.display(),
            status = ?status.code(),
            "Command finished"
        );

        Ok(CommandOutput {
            status: status.code(),
            output: combined,
        })
    }
}

/// A pipe drained into a shared buffer by a background task.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl Capture {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });
        Self { buffer, task }
    }

    fn snapshot(&self) -> Vec<u8> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Waits for the pipe to close.
    async fn finish(self) -> Vec<u8> {
        let Self { buffer, task } = self;
        if let Err(e) = task.await {
            tracing::debug!(error = %e, "Output reader stopped early");
        }
        let captured = buffer.lock().map(|b| b.clone()).unwrap_or_default();
        captured
    }

    /// Stops reading and returns what arrived so far.
    fn abort(self) -> Vec<u8> {
        self.task.abort();
        self.snapshot()
    }
}

/// stdout followed by stderr.
fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&String::from_utf8_lossy(stderr));
    }
    combined
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let runner = TokioCommandRunner::new();
        let out = runner
            .run(&Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(out.status, Some(3));
        assert!(!out.success());
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[tokio::test]
    async fn honours_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = TokioCommandRunner::new()
            .run(&Invocation::new("pwd").current_dir(dir.path()))
            .await
            .unwrap();

        assert!(out.success());
        let reported = std::path::PathBuf::from(out.output.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn times_out() {
        let err = TokioCommandRunner::new()
            .run(&Invocation::new("sleep").arg("5").timeout(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn timeout_keeps_output_printed_so_far() {
        let err = TokioCommandRunner::new()
            .run(
                &Invocation::new("sh")
                    .args(["-c", "echo compiling arena; sleep 5"])
                    .timeout(Duration::from_secs(1)),
            )
            .await
            .unwrap_err();

        match err {
            ProcessError::TimedOut { seconds, output, .. } => {
                assert_eq!(seconds, 1);
                assert!(output.contains("compiling arena"), "{:?}", output);
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = TokioCommandRunner::new()
            .run(&Invocation::new("shipyard-no-such-binary"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));
    }
}
