//! Merge models

use serde::{Deserialize, Serialize};

use super::CommitInfo;

/// Classification of a merge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOutcome {
    Success,
    UnresolvedFiles,
    NoMergeNeeded,
    Aborted,
}

impl MergeOutcome {
    pub fn is_success(self) -> bool {
        self == MergeOutcome::Success
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MergeOutcome::Success => "success",
            MergeOutcome::UnresolvedFiles => "unresolved-files",
            MergeOutcome::NoMergeNeeded => "no-merge-needed",
            MergeOutcome::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Raw result of the gateway's merge primitive, before any commit.
/// Neither flag set means there was nothing to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub succeeded: bool,
    pub conflicted: bool,
    pub unresolved_files: Vec<String>,
}

/// Everything known about a finished merge attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub outcome: MergeOutcome,
    /// Branch the merge landed on (or would have)
    pub destination: Option<String>,
    /// Resolved head of the merge source
    pub source_head: String,
    /// Working-copy parent before the merge
    pub left_parent: String,
    /// The merge commit, on success
    pub commit: Option<CommitInfo>,
    pub unresolved_files: Vec<String>,
}
