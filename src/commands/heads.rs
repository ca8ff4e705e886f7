//! Branch head resolution
//!
//! A branch may carry several heads when diverging work has not been merged.
//! Callers that need a single commit go through [`BranchHeads::select`],
//! which always picks the most recent head.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, VcsError};
use crate::models::{CommitInfo, RevisionRef};
use crate::services::{RevSpec, VcsGateway};

/// The heads of one named branch, ordered oldest to newest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchHeads {
    pub branch: String,
    pub heads: Vec<CommitInfo>,
}

impl BranchHeads {
    /// Wrap an unordered head list, ordering by commit time then hash
    pub fn new(branch: impl Into<String>, mut heads: Vec<CommitInfo>) -> Self {
        heads.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.hash.cmp(&b.hash)));
        BranchHeads {
            branch: branch.into(),
            heads,
        }
    }

    /// Look up the heads of `branch` through the gateway
    pub fn load<G: VcsGateway + ?Sized>(gateway: &G, path: &Path, branch: &str) -> Result<Self> {
        let heads = gateway.heads(path, branch)?;
        Ok(BranchHeads::new(branch, heads))
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// The most recent head. A branch with no heads is an error, never a guess.
    pub fn select(&self) -> Result<&CommitInfo> {
        let head = self
            .heads
            .last()
            .ok_or_else(|| VcsError::AmbiguousReference(self.branch.clone()))?;

        if self.heads.len() > 1 {
            info!(
                branch = %self.branch,
                heads = self.heads.len(),
                selected = %head.short_hash(),
                "branch has multiple heads, selecting most recent"
            );
        }

        Ok(head)
    }
}

/// Resolve a branch name or revision to one concrete commit.
///
/// Every reference is tried as a branch first, hash-like names included, so
/// a branch called `cafe1234` still gets head selection. Anything that names
/// no branch (hashes, `tip`, other revision syntax) is looked up as a single
/// revision.
pub fn resolve_revision<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    reference: &RevisionRef,
) -> Result<CommitInfo> {
    let heads = BranchHeads::load(gateway, path, reference.as_str())?;
    if !heads.is_empty() {
        return heads.select().cloned();
    }

    let mut found = gateway
        .log(path, &RevSpec::rev(reference.as_str()))
        .map_err(|e| match e {
            VcsError::Git(_) => VcsError::AmbiguousReference(reference.to_string()),
            other => other,
        })?;

    debug!(reference = %reference, found = found.len(), "resolved revision");
    found
        .pop()
        .ok_or_else(|| VcsError::AmbiguousReference(reference.to_string()))
}
