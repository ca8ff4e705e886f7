//! Branchcraft - merge orchestration and version derivation for Git
//!
//! Two pieces of logic layered over a version-control engine:
//! a branch-aware merge that classifies its outcome and always leaves the
//! working copy either merged-and-committed or exactly as it was, and a
//! resolver that derives the next release version from reachable tags.

pub mod commands;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use commands::{
    merge, merge_outcome, resolve_next_version, BranchHeads, DefaultIncrement,
    IncrementStrategy, MergeOptions, VersionSettings,
};
pub use error::{Result, VcsError};
pub use models::{CommitInfo, MergeOutcome, MergeSummary, Version, VersionTag};
pub use services::{GitGateway, RevSpec, VcsGateway};

/// Install the stderr tracing subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
