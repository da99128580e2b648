//! Child process execution with a wall-clock limit

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to keep draining pipes after the child has exited. Grandchildren
/// that inherited stdout can otherwise hold the read open indefinitely.
const OUTPUT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(ProcessOutput),
    /// The child outlived `limit` and was killed.
    TimedOut { limit: Duration },
    /// The child could not be started at all.
    LaunchFailed(std::io::Error),
    /// Waiting on a started child failed.
    Failed(std::io::Error),
}

/// Runs one program by argument vector. No shell is ever involved.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ProcessRunner {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub async fn run(&self, args: &[String], limit: Duration) -> RunOutcome {
        let spawned = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Could not launch {}: {}", self.program.display(), e);
                return RunOutcome::LaunchFailed(e);
            }
        };

        let stdout_task = child.stdout.take().map(|pipe| tokio::spawn(drain(pipe)));
        let stderr_task = child.stderr.take().map(|pipe| tokio::spawn(drain(pipe)));

        match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = collect_output(stdout_task).await;
                let stderr = collect_output(stderr_task).await;
                RunOutcome::Completed(ProcessOutput {
                    status,
                    stdout,
                    stderr,
                })
            }
            Ok(Err(e)) => {
                abort(stdout_task);
                abort(stderr_task);
                RunOutcome::Failed(e)
            }
            Err(_) => {
                tracing::warn!(
                    "{} exceeded {}s, killing pid {:?}",
                    self.program.display(),
                    limit.as_secs(),
                    child.id()
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out child: {}", e);
                }
                abort(stdout_task);
                abort(stderr_task);
                RunOutcome::TimedOut { limit }
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(mut pipe: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf).await {
        tracing::debug!("Pipe read ended early: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn collect_output(task: Option<JoinHandle<String>>) -> String {
    let Some(mut handle) = task else {
        return String::new();
    };
    match tokio::time::timeout(OUTPUT_GRACE, &mut handle).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!("Output reader task failed: {}", e);
            String::new()
        }
        Err(_) => {
            tracing::warn!("Output pipe still open {}s after exit, dropping it", OUTPUT_GRACE.as_secs());
            handle.abort();
            String::new()
        }
    }
}

fn abort(task: Option<JoinHandle<String>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}
