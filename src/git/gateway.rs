//! The four git operations the commit workflow needs.
//!
//! Every call shells out to the system `git` binary through [`ProcessRunner`],
//! inheriting the user's git config, SSH agent and credential store.

use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProcessError;

use super::process::{CommandResult, ProcessRunner};

/// Environment overlay applied to every git call so nothing opens a pager.
const GIT_ENV: &[(&str, &str)] = &[("GIT_PAGER", "cat")];

/// Git operations used by the commit workflow.
///
/// This abstraction allows substituting the repository in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitOperations: Send + Sync {
    /// Whether anything is staged. Failures (e.g. not a repository) read as `false`.
    async fn has_staged_changes(&self) -> bool;

    /// Text of `git diff --staged`, empty when nothing is staged.
    async fn staged_diff(&self) -> Result<String, ProcessError>;

    /// Commit the index with `message`, returning git's output.
    async fn commit(&self, message: &str) -> Result<String, ProcessError>;

    /// Push the current branch to its configured upstream.
    async fn push(&self) -> Result<String, ProcessError>;
}

/// [`GitOperations`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitGateway {
    runner: ProcessRunner,
    workdir: PathBuf,
}

impl GitGateway {
    /// Create a gateway rooted at `workdir`, or at the invoking shell's directory.
    pub fn new(runner: ProcessRunner, workdir: Option<PathBuf>) -> Self {
        let workdir = resolve_workdir(workdir);
        debug!("Using working directory {}", workdir.display());
        Self { runner, workdir }
    }

    async fn git(&self, args: &[&str]) -> Result<CommandResult, ProcessError> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push("git");
        command.extend_from_slice(args);
        self.runner.run(&command, &self.workdir, GIT_ENV).await
    }
}

#[async_trait]
impl GitOperations for GitGateway {
    async fn has_staged_changes(&self) -> bool {
        debug!("Checking for staged changes");
        match self.staged_diff().await {
            Ok(diff) => !diff.is_empty(),
            Err(e) => {
                debug!("Failed to check for staged changes: {}", e);
                false
            }
        }
    }

    async fn staged_diff(&self) -> Result<String, ProcessError> {
        debug!("Retrieving staged changes");
        Ok(self.git(&["diff", "--staged"]).await?.stdout)
    }

    async fn commit(&self, message: &str) -> Result<String, ProcessError> {
        debug!("Committing staged changes");
        Ok(self
            .git(&["commit", "--message", message])
            .await?
            .combined_output())
    }

    async fn push(&self) -> Result<String, ProcessError> {
        debug!("Pushing to upstream");
        Ok(self.git(&["push"]).await?.combined_output())
    }
}

/// Pick the directory git runs in.
///
/// Order: explicit path, then `$PWD` when it names a directory, then the
/// process working directory. A relocated binary can report a different
/// working directory than the shell that launched it, so `$PWD` wins.
pub fn resolve_workdir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }

    if let Some(pwd) = env::var_os("PWD").map(PathBuf::from)
        && pwd.is_dir()
    {
        return pwd;
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
