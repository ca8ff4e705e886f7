//! Merge orchestration and version derivation
//!
//! Both read repository state through a [`crate::services::VcsGateway`] and
//! return plain values; neither depends on the other.

pub mod heads;
pub mod merge;
pub mod version;

pub use heads::{resolve_revision, BranchHeads};
pub use merge::{merge, merge_outcome, MergeOptions};
pub use version::{
    current_version, resolve_next_version, tag_next_version, version_tags, Bump,
    DefaultIncrement, IncrementStrategy, VersionSettings, VersioningConfig,
};
