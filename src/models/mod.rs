//! Data models for Branchcraft

pub mod commit;
pub mod merge;
pub mod repository;
pub mod tag;
pub mod version;

pub use commit::*;
pub use merge::*;
pub use repository::*;
pub use tag::*;
pub use version::*;
