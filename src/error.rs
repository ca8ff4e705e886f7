//! Error types for Branchcraft

use serde::Serialize;
use thiserror::Error;

use crate::models::MergeOutcome;

/// Application error types
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Dirty working copy, pending merge, missing or uninitialized repository
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// A reference that resolves to no head and no revision
    #[error("Ambiguous reference: {0}")]
    AmbiguousReference(String),

    #[error("Gateway failure: {0}")]
    GatewayFailure(String),

    #[error("Nothing to commit")]
    NothingToCommit,

    /// The merge primitive failed for a reason other than conflicts.
    /// The working copy has been rolled back to the pre-merge tip.
    #[error("Merge of '{target}' aborted: {reason}")]
    MergeAborted { target: String, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

impl VcsError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            VcsError::Git(_) => "GIT_ERROR",
            VcsError::Io(_) => "IO_ERROR",
            VcsError::Serialization(_) => "SERIALIZATION_ERROR",
            VcsError::PreconditionViolated(_) => "PRECONDITION_VIOLATED",
            VcsError::AmbiguousReference(_) => "AMBIGUOUS_REFERENCE",
            VcsError::GatewayFailure(_) => "GATEWAY_FAILURE",
            VcsError::NothingToCommit => "NOTHING_TO_COMMIT",
            VcsError::MergeAborted { .. } => "MERGE_ABORTED",
            VcsError::InvalidVersion(_) => "INVALID_VERSION",
        }
    }

    /// The merge outcome carried by this error, if it ended a merge attempt
    pub fn merge_outcome(&self) -> Option<MergeOutcome> {
        match self {
            VcsError::MergeAborted { .. } => Some(MergeOutcome::Aborted),
            _ => None,
        }
    }
}

/// Serializable error response for CLI output
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&VcsError> for ErrorResponse {
    fn from(error: &VcsError) -> Self {
        let details = match error {
            VcsError::MergeAborted { target, .. } => Some(format!("target: {}", target)),
            VcsError::Git(e) => Some(format!("{:?}/{:?}", e.class(), e.code())),
            _ => None,
        };

        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl serde::Serialize for VcsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for Branchcraft operations
pub type Result<T> = std::result::Result<T, VcsError>;
