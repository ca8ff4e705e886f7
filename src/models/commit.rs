//! Commit models

use serde::{Deserialize, Serialize};

/// Commit information as seen by the merge and version logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    /// Branch the commit is known under, when one can be determined
    pub branch: Option<String>,
    pub left_parent_hash: Option<String>,
    pub right_parent_hash: Option<String>,
    pub message: String,
    pub timestamp: i64,
}

impl CommitInfo {
    /// Build from a git2 commit, tagging it with the branch it was reached through
    pub fn from_git2(commit: &git2::Commit, branch: Option<String>) -> Self {
        let mut parents = commit.parent_ids().map(|id| id.to_string());

        CommitInfo {
            hash: commit.id().to_string(),
            branch,
            left_parent_hash: parents.next(),
            right_parent_hash: parents.next(),
            message: commit.message().unwrap_or("").to_string(),
            // Max of author/committer so rewritten commits order after their parents
            timestamp: commit
                .author()
                .when()
                .seconds()
                .max(commit.committer().when().seconds()),
        }
    }

    pub fn is_merge(&self) -> bool {
        self.left_parent_hash.is_some() && self.right_parent_hash.is_some()
    }

    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(12)]
    }
}

/// An identifier for a commit: a full or abbreviated hash, or a symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RevisionRef {
    Hash(String),
    Symbolic(String),
}

impl RevisionRef {
    /// Classify a user-supplied reference. Hex strings of 7 to 40 characters
    /// look like hashes, though a branch may still carry such a name; the
    /// text is kept exactly as given.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let is_hash = (7..=40).contains(&value.len()) && value.chars().all(|c| c.is_ascii_hexdigit());
        if is_hash {
            RevisionRef::Hash(value.to_string())
        } else {
            RevisionRef::Symbolic(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RevisionRef::Hash(h) => h,
            RevisionRef::Symbolic(s) => s,
        }
    }
}

impl std::fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
