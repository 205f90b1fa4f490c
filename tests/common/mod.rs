//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use git2::Repository;

/// A scratch git repository configured so the `git` CLI can commit in it.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");

        let mut config = repo.config().expect("Failed to open repo config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");
        config
            .set_bool("commit.gpgsign", false)
            .expect("Failed to disable signing");
        config
            .set_str("push.default", "current")
            .expect("Failed to set push.default");
        drop(config);

        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file in the working tree without staging it.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Write a file and add it to the index.
    pub fn stage_file(&self, name: &str, content: &str) {
        self.write_file(name, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_path(Path::new(name))
            .expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Message of the commit HEAD points at, if any.
    pub fn head_message(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim_end().to_string())
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> usize {
        let Ok(mut walk) = self.repo.revwalk() else {
            return 0;
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }

    /// Short name of the current branch.
    pub fn branch_name(&self) -> String {
        self.repo
            .head()
            .expect("HEAD not set")
            .shorthand()
            .expect("HEAD is not a branch")
            .to_string()
    }

    /// Create a bare repository and register it as `origin`.
    pub fn add_bare_remote(&self) -> BareRemote {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init_bare(dir.path()).expect("Failed to init bare repo");
        let url = dir.path().to_str().expect("Non UTF-8 temp path");
        self.repo
            .remote("origin", url)
            .expect("Failed to add remote");
        BareRemote { dir, repo }
    }
}

/// A bare repository used as a push target.
pub struct BareRemote {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl BareRemote {
    /// Message at the tip of `branch`, if the branch exists.
    pub fn branch_message(&self, branch: &str) -> Option<String> {
        let reference = self
            .repo
            .find_reference(&format!("refs/heads/{branch}"))
            .ok()?;
        let commit = reference.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim_end().to_string())
    }
}
