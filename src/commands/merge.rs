//! Merge orchestration
//!
//! Merges a branch or revision into the checked-out branch (or an explicit
//! destination branch) and classifies the result. Only a clean merge leaves
//! anything behind: one two-parent commit whose left parent is the
//! pre-merge tip and whose right parent is the resolved source head. Every
//! other outcome rolls the working copy back to where it started.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::commands::heads::resolve_revision;
use crate::error::{Result, VcsError};
use crate::models::{
    CommitInfo, MergeOutcome, MergeSummary, RepositoryState, RevisionRef, StatusEntry,
};
use crate::services::VcsGateway;

/// Options for a merge
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Branch the merge should land on, when not the checked-out one
    pub destination: Option<String>,
    /// Commit message for the merge commit
    pub message: Option<String>,
}

impl MergeOptions {
    pub fn into_branch(destination: impl Into<String>) -> Self {
        MergeOptions {
            destination: Some(destination.into()),
            message: None,
        }
    }
}

/// Merge `target` and return only the outcome
pub fn merge_outcome<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    target: &str,
    destination: Option<&str>,
) -> Result<MergeOutcome> {
    let options = MergeOptions {
        destination: destination.map(str::to_string),
        message: None,
    };
    merge(gateway, path, target, &options).map(|summary| summary.outcome)
}

/// Merge `target` into the working copy's branch.
///
/// Conflicts and already-incorporated sources are reported in the summary.
/// A failing merge primitive is rolled back and surfaces as
/// [`VcsError::MergeAborted`]; precondition and lookup failures propagate
/// before anything is touched. When a destination branch is given, only a
/// successful merge leaves it checked out.
pub fn merge<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    target: &str,
    options: &MergeOptions,
) -> Result<MergeSummary> {
    ensure_clean(gateway, path)?;

    let source = resolve_revision(gateway, path, &RevisionRef::parse(target))?;
    let origin = switch_to_destination(gateway, path, options.destination.as_deref())?;

    let result = merge_checked_out(gateway, path, target, &source, options);

    match origin {
        Some(origin) if !matches!(&result, Ok(summary) if summary.outcome.is_success()) => {
            restore_origin(gateway, path, &origin, result)
        }
        _ => result,
    }
}

/// Merge an already resolved source into whatever is checked out now
fn merge_checked_out<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    target: &str,
    source: &CommitInfo,
    options: &MergeOptions,
) -> Result<MergeSummary> {
    let destination = gateway.current_branch(path)?;
    let tip = gateway.tip(path)?;

    let mut summary = MergeSummary {
        outcome: MergeOutcome::NoMergeNeeded,
        destination: destination.clone(),
        source_head: source.hash.clone(),
        left_parent: tip.hash.clone(),
        commit: None,
        unresolved_files: Vec::new(),
    };

    if gateway.is_ancestor(path, &source.hash, &tip.hash)? {
        info!(
            target,
            source = %source.short_hash(),
            tip = %tip.short_hash(),
            "source already incorporated, nothing to merge"
        );
        return Ok(summary);
    }

    let report = match gateway.merge(path, &source.hash) {
        Ok(report) => report,
        Err(cause) => return Err(roll_back(gateway, path, target, &tip.hash, cause)),
    };

    if report.conflicted {
        warn!(
            target,
            files = ?report.unresolved_files,
            "merge left unresolved files, rolling back"
        );
        gateway.abort_merge(path)?;
        ensure_rolled_back(gateway, path)?;

        summary.outcome = MergeOutcome::UnresolvedFiles;
        summary.unresolved_files = report.unresolved_files;
        return Ok(summary);
    }

    if !report.succeeded {
        info!(target, "merge primitive reported nothing to merge");
        return Ok(summary);
    }

    let message = options
        .message
        .clone()
        .unwrap_or_else(|| default_message(target, options.destination.as_deref()));

    let commit = match gateway.commit(path, &message, false) {
        Ok(commit) => commit,
        Err(cause) => return Err(roll_back(gateway, path, target, &tip.hash, cause)),
    };

    if commit.left_parent_hash.as_deref() != Some(tip.hash.as_str())
        || commit.right_parent_hash.as_deref() != Some(source.hash.as_str())
    {
        let cause = VcsError::GatewayFailure(format!(
            "merge commit {} has parents {:?}/{:?}, expected {}/{}",
            commit.hash, commit.left_parent_hash, commit.right_parent_hash, tip.hash, source.hash
        ));
        return Err(roll_back(gateway, path, target, &tip.hash, cause));
    }

    info!(
        target,
        destination = destination.as_deref().unwrap_or("(detached)"),
        commit = %commit.short_hash(),
        "merge committed"
    );

    summary.outcome = MergeOutcome::Success;
    summary.commit = Some(commit);
    Ok(summary)
}

/// Check out `destination` unless it already is. Returns what to return to:
/// the previous branch, or the previous revision when detached.
fn switch_to_destination<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    destination: Option<&str>,
) -> Result<Option<String>> {
    let Some(destination) = destination else {
        return Ok(None);
    };

    let current = gateway.current_branch(path)?;
    if current.as_deref() == Some(destination) {
        return Ok(None);
    }

    let origin = match current {
        Some(branch) => branch,
        None => gateway.tip(path)?.hash,
    };

    info!(destination, origin = %origin, "updating working copy to destination branch");
    gateway.update(path, destination)?;
    Ok(Some(origin))
}

/// Put the working copy back where it was before the destination switch
fn restore_origin<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    origin: &str,
    result: Result<MergeSummary>,
) -> Result<MergeSummary> {
    match gateway.update(path, origin) {
        Ok(()) => {
            debug!(origin, "restored working copy after unmerged attempt");
            result
        }
        Err(e) => {
            error!(origin, error = %e, "could not restore working copy");
            match result {
                Ok(_) => Err(VcsError::GatewayFailure(format!(
                    "could not return working copy to {}: {}",
                    origin, e
                ))),
                Err(original) => Err(original),
            }
        }
    }
}

fn default_message(target: &str, destination: Option<&str>) -> String {
    match destination {
        Some(branch) => format!("Merge {} into {}", target, branch),
        None => format!("Merge {}", target),
    }
}

fn pending_changes<G: VcsGateway + ?Sized>(gateway: &G, path: &Path) -> Result<Vec<StatusEntry>> {
    Ok(gateway
        .status(path, false)?
        .into_iter()
        .filter(|entry| entry.state.is_pending())
        .collect())
}

fn ensure_clean<G: VcsGateway + ?Sized>(gateway: &G, path: &Path) -> Result<()> {
    let state = gateway.state(path)?;
    if state != RepositoryState::Clean {
        return Err(VcsError::PreconditionViolated(format!(
            "repository has an operation in progress ({:?})",
            state
        )));
    }

    let pending = pending_changes(gateway, path)?;
    if !pending.is_empty() {
        let files: Vec<&str> = pending.iter().map(|entry| entry.file.as_str()).collect();
        return Err(VcsError::PreconditionViolated(format!(
            "working copy has uncommitted changes: {}",
            files.join(", ")
        )));
    }

    Ok(())
}

fn ensure_rolled_back<G: VcsGateway + ?Sized>(gateway: &G, path: &Path) -> Result<()> {
    let residual = pending_changes(gateway, path)?;
    if residual.is_empty() {
        Ok(())
    } else {
        Err(VcsError::GatewayFailure(format!(
            "rollback left {} modified file(s)",
            residual.len()
        )))
    }
}

/// Undo a half-applied merge, or a merge commit that should not stand, by
/// returning the branch to the pre-merge tip
fn roll_back<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    target: &str,
    tip: &str,
    cause: VcsError,
) -> VcsError {
    if let Err(rollback) = gateway.reset(path, tip) {
        error!(target, error = %rollback, "rollback after failed merge also failed");
    }

    match cause {
        VcsError::Git(_)
        | VcsError::Io(_)
        | VcsError::GatewayFailure(_)
        | VcsError::NothingToCommit => {
            warn!(target, error = %cause, "merge aborted");
            VcsError::MergeAborted {
                target: target.to_string(),
                reason: cause.to_string(),
            }
        }
        other => other,
    }
}
