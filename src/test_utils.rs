//! Test utilities for creating temporary repositories

#![cfg(test)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::models::CommitInfo;
use crate::services::{GitGateway, VcsGateway};

/// A temporary repository driven through the gateway
pub struct TestRepo {
    pub dir: TempDir,
    pub path: PathBuf,
    pub gateway: GitGateway,
}

impl TestRepo {
    /// Create a new empty repository on the `default` branch
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();
        let gateway = GitGateway::new();

        gateway.init(&path).expect("Failed to init repo");

        // Configure user for commits
        let repo = git2::Repository::open(&path).expect("Failed to open repo");
        let mut config = repo.config().expect("Failed to get config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");

        Self { dir, path, gateway }
    }

    /// Create a repository with an initial commit
    pub fn with_initial_commit() -> Self {
        let test_repo = Self::new();
        test_repo.write_and_commit("README.md", "# Test Repo", "Initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the git2 repository
    pub fn repo(&self) -> git2::Repository {
        git2::Repository::open(&self.path).expect("Failed to open repo")
    }

    /// Create a file with content
    pub fn write_file(&self, name: &str, content: &str) {
        let file_path = self.path.join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path.join(name)).expect("Failed to read file")
    }

    /// Commit everything in the working copy, including new files
    pub fn commit(&self, message: &str) -> CommitInfo {
        self.gateway
            .commit(&self.path, message, true)
            .expect("Failed to commit")
    }

    pub fn write_and_commit(&self, name: &str, content: &str, message: &str) -> CommitInfo {
        self.write_file(name, content);
        self.commit(message)
    }

    /// Move the working copy to a branch or revision
    pub fn update(&self, rev: &str) {
        self.gateway
            .update(&self.path, rev)
            .expect("Failed to update");
    }

    /// Start a new branch at the working-copy parent
    pub fn branch(&self, name: &str) {
        self.gateway
            .branch(&self.path, name)
            .expect("Failed to create branch");
    }

    pub fn tip(&self) -> CommitInfo {
        self.gateway.tip(&self.path).expect("Failed to read tip")
    }

    /// Create a lightweight tag on a revision
    pub fn tag(&self, name: &str, rev: &str) {
        self.gateway
            .tag(&self.path, name, rev)
            .expect("Failed to create tag");
    }

    /// Create an annotated tag on HEAD
    pub fn annotated_tag(&self, name: &str) {
        let repo = self.repo();
        let head = repo.head().expect("Failed to get HEAD");
        let commit = head.peel_to_commit().expect("Failed to get commit");
        let sig = repo.signature().expect("Failed to get signature");
        repo.tag(name, commit.as_object(), &sig, &format!("Tag {}", name), false)
            .expect("Failed to create tag");
    }

    /// Point a remote-tracking branch at a commit, giving `branch` a second head
    pub fn remote_head(&self, remote: &str, branch: &str, hash: &str) {
        let repo = self.repo();
        let oid = git2::Oid::from_str(hash).expect("Invalid hash");
        repo.reference(
            &format!("refs/remotes/{}/{}", remote, branch),
            oid,
            true,
            "test remote head",
        )
        .expect("Failed to create remote ref");
    }

    /// Number of commits reachable from any branch
    pub fn commit_count(&self) -> usize {
        let repo = self.repo();
        let mut walk = repo.revwalk().expect("Failed to create revwalk");
        walk.push_glob("refs/heads/*").expect("Failed to push branches");
        walk.push_glob("refs/remotes/*").expect("Failed to push remotes");
        walk.count()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_repo() {
        let repo = TestRepo::new();
        assert!(repo.path.exists());
        assert!(repo.path.join(".git").exists());
    }

    #[test]
    fn test_initial_branch_is_default() {
        let repo = TestRepo::with_initial_commit();
        assert_eq!(repo.tip().branch.as_deref(), Some("default"));
        assert_eq!(repo.commit_count(), 1);
    }

    #[test]
    fn test_branch_and_update() {
        let repo = TestRepo::with_initial_commit();
        repo.branch("feature");
        repo.write_and_commit("feature.txt", "f", "feature work");
        assert_eq!(repo.tip().branch.as_deref(), Some("feature"));

        repo.update("default");
        assert_eq!(repo.tip().branch.as_deref(), Some("default"));
        assert!(!repo.path.join("feature.txt").exists());
    }
}
