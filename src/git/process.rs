//! Subprocess execution with a bounded wait.
//!
//! Both output pipes are drained by their own task from the moment the child
//! starts, so a large `git diff` cannot fill the OS pipe buffer and stall the
//! child while we wait on it.

use std::env;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ProcessError;

/// Default bound for a single git invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How long to wait for a drain task after the child has exited.
///
/// A grandchild that inherited the pipe can keep it open indefinitely.
const DRAIN_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Stdout and stderr joined, skipping whichever is empty.
    ///
    /// Git reports progress for `commit` and `push` on stderr.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Runs commands to completion or fails with a typed error.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `args[0]` with the remaining arguments in `cwd`.
    ///
    /// `env` is layered on top of the inherited environment. On success both
    /// streams are returned trimmed. The child is killed if it is still alive
    /// when this returns, including when the returned future is dropped.
    pub async fn run(
        &self,
        args: &[&str],
        cwd: &Path,
        env: &[(&str, &str)],
    ) -> Result<CommandResult, ProcessError> {
        let Some((program, rest)) = args.split_first() else {
            return Err(ProcessError::NotFound {
                program: String::new(),
            });
        };
        let command_line = args.join(" ");

        let resolved = which::which_in(program, env::var_os("PATH"), cwd).map_err(|_| {
            ProcessError::NotFound {
                program: program.to_string(),
            }
        })?;

        debug!("Running '{}' in {}", command_line, cwd.display());

        let mut child = Command::new(&resolved)
            .args(rest)
            .current_dir(cwd)
            .envs(env.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: command_line.clone(),
                source,
            })?;

        let stdout_task = child.stdout.take().map(drain);
        let stderr_task = child.stderr.take().map(drain);

        let waited = timeout(self.timeout, child.wait()).await;

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                if let Err(e) = child.start_kill() {
                    debug!("Failed to kill '{}' after wait error: {}", command_line, e);
                }
                abort_drains(stdout_task, stderr_task);
                return Err(ProcessError::WaitFailed {
                    command: command_line,
                    source,
                });
            }
            Err(_) => {
                warn!(
                    "'{}' did not finish within {}s, killing it",
                    command_line,
                    self.timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    debug!("Failed to kill '{}': {}", command_line, e);
                }
                abort_drains(stdout_task, stderr_task);
                return Err(ProcessError::Timeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = join_drain(stdout_task).await;
        let stderr = join_drain(stderr_task).await;
        let exit_code = status.code().unwrap_or(-1);

        if !status.success() {
            return Err(ProcessError::NonZeroExit {
                command: command_line,
                code: exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandResult {
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code,
        })
    }
}

/// Read a pipe to EOF on its own task.
fn drain<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!("Output stream closed with error: {}", e);
        }
        buf
    })
}

/// Collect a drain task's output, giving up after `DRAIN_JOIN_TIMEOUT`.
async fn join_drain(task: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(mut task) = task else {
        return String::new();
    };

    match timeout(DRAIN_JOIN_TIMEOUT, &mut task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            warn!("Output drain task failed: {}", e);
            String::new()
        }
        Err(_) => {
            warn!(
                "Output stream still open {:?} after exit, continuing without it",
                DRAIN_JOIN_TIMEOUT
            );
            task.abort();
            String::new()
        }
    }
}

fn abort_drains(stdout: Option<JoinHandle<Vec<u8>>>, stderr: Option<JoinHandle<Vec<u8>>>) {
    for task in [stdout, stderr].into_iter().flatten() {
        task.abort();
    }
}
