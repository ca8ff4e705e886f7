//! Repository and working-copy models

use serde::{Deserialize, Serialize};

/// Repository state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryState {
    Clean,
    Merge,
    Revert,
    Cherrypick,
    Bisect,
    Rebase,
    RebaseInteractive,
    RebaseMerge,
    ApplyMailbox,
    ApplyMailboxOrRebase,
}

impl From<git2::RepositoryState> for RepositoryState {
    fn from(state: git2::RepositoryState) -> Self {
        match state {
            git2::RepositoryState::Clean => RepositoryState::Clean,
            git2::RepositoryState::Merge => RepositoryState::Merge,
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                RepositoryState::Revert
            }
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                RepositoryState::Cherrypick
            }
            git2::RepositoryState::Bisect => RepositoryState::Bisect,
            git2::RepositoryState::Rebase => RepositoryState::Rebase,
            git2::RepositoryState::RebaseInteractive => RepositoryState::RebaseInteractive,
            git2::RepositoryState::RebaseMerge => RepositoryState::RebaseMerge,
            git2::RepositoryState::ApplyMailbox => RepositoryState::ApplyMailbox,
            git2::RepositoryState::ApplyMailboxOrRebase => RepositoryState::ApplyMailboxOrRebase,
        }
    }
}

/// Working-copy state of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Added,
    Modified,
    Removed,
    Unknown,
    Missing,
    Clean,
}

impl FileState {
    /// Whether this state counts as a pending change. Unknown (untracked)
    /// files do not block a merge.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            FileState::Added | FileState::Modified | FileState::Removed | FileState::Missing
        )
    }
}

impl From<git2::Status> for FileState {
    fn from(status: git2::Status) -> Self {
        if status.is_conflicted() {
            FileState::Modified
        } else if status.is_index_new() {
            FileState::Added
        } else if status.is_index_deleted() {
            FileState::Removed
        } else if status.is_index_modified()
            || status.is_wt_modified()
            || status.is_index_renamed()
            || status.is_index_typechange()
            || status.is_wt_typechange()
        {
            FileState::Modified
        } else if status.is_wt_deleted() {
            FileState::Missing
        } else if status.is_wt_new() {
            FileState::Unknown
        } else {
            FileState::Clean
        }
    }
}

/// Status entry for a file in the working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub file: String,
    pub state: FileState,
}
