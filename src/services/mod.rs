//! Service layer for Branchcraft
//!
//! The VCS command gateway: the trait the merge and version logic call
//! into, and its libgit2-backed implementation.

pub mod gateway;
pub mod git_service;

pub use gateway::{RevSpec, VcsGateway};
pub use git_service::{GitGateway, DEFAULT_BRANCH, TIP};
