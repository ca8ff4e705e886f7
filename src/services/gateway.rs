//! VCS command gateway
//!
//! The narrow set of primitives the merge and version logic needs from the
//! underlying version-control engine. Every call names the repository path
//! explicitly; implementations keep no notion of a "current" repository.

use std::path::Path;

use crate::error::Result;
use crate::models::{CommitInfo, MergeReport, RepositoryState, StatusEntry, TagRef};

/// Selects a set of commits for [`VcsGateway::log`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevSpec {
    /// A single revision
    Rev(String),
    /// Every commit reachable from any head of the named branch
    Branch(String),
    /// A revision and all of its ancestors
    Ancestors(String),
    /// Every commit reachable from any branch
    All,
}

impl RevSpec {
    pub fn rev(rev: impl Into<String>) -> Self {
        RevSpec::Rev(rev.into())
    }

    pub fn branch(name: impl Into<String>) -> Self {
        RevSpec::Branch(name.into())
    }

    pub fn ancestors(rev: impl Into<String>) -> Self {
        RevSpec::Ancestors(rev.into())
    }
}

/// Primitive operations against a repository on disk
pub trait VcsGateway {
    /// Create an empty repository at `path`
    fn init(&self, path: &Path) -> Result<()>;

    /// Commit pending changes. `add_remove` also records untracked and
    /// deleted files. A pending merge is concluded with a two-parent commit.
    fn commit(&self, path: &Path, message: &str, add_remove: bool) -> Result<CommitInfo>;

    /// Move the working copy to a branch (attached) or revision (detached)
    fn update(&self, path: &Path, rev: &str) -> Result<()>;

    /// Start a new named branch at the working-copy parent and switch to it
    fn branch(&self, path: &Path, name: &str) -> Result<()>;

    /// Branch the working copy is attached to, if any
    fn current_branch(&self, path: &Path) -> Result<Option<String>>;

    /// The working-copy parent
    fn tip(&self, path: &Path) -> Result<CommitInfo>;

    /// Commits selected by `spec`, newest first
    fn log(&self, path: &Path, spec: &RevSpec) -> Result<Vec<CommitInfo>>;

    /// Heads of a named branch, oldest first
    fn heads(&self, path: &Path, branch: &str) -> Result<Vec<CommitInfo>>;

    /// Working-copy status; `Clean` entries only when `include_clean` is set
    fn status(&self, path: &Path, include_clean: bool) -> Result<Vec<StatusEntry>>;

    /// Whether an operation (merge, rebase, ...) is in progress
    fn state(&self, path: &Path) -> Result<RepositoryState>;

    /// Merge `rev` into the working copy without committing
    fn merge(&self, path: &Path, rev: &str) -> Result<MergeReport>;

    /// Drop any pending merge and restore the working-copy parent
    fn abort_merge(&self, path: &Path) -> Result<()>;

    /// Point the checked-out branch back at `rev`, discarding tracked
    /// changes and any pending operation
    fn reset(&self, path: &Path, rev: &str) -> Result<()>;

    fn is_ancestor(&self, path: &Path, ancestor: &str, descendant: &str) -> Result<bool>;

    /// All tags, peeled to commits
    fn tags(&self, path: &Path) -> Result<Vec<TagRef>>;

    /// Create a tag named `name` on `rev`
    fn tag(&self, path: &Path, name: &str, rev: &str) -> Result<TagRef>;

    /// A repository config value, `None` when unset
    fn config_get(&self, path: &Path, key: &str) -> Result<Option<String>>;

    /// Write a value to the repository-local config
    fn config_set(&self, path: &Path, key: &str, value: &str) -> Result<()>;
}
