//! Tag models

use serde::{Deserialize, Serialize};

use super::Version;

/// A tag as reported by the gateway, peeled to the commit it marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRef {
    pub name: String,
    pub rev: String,
}

/// A tag whose name parses as a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionTag {
    pub tag: String,
    pub rev: String,
    pub version: Version,
}

impl VersionTag {
    /// Interpret a tag as a version, stripping `prefix` when present.
    /// Returns `None` for labels that are not versions.
    pub fn from_tag(tag: &TagRef, prefix: &str) -> Option<Self> {
        let raw = if prefix.is_empty() {
            tag.name.as_str()
        } else {
            tag.name.strip_prefix(prefix).unwrap_or(&tag.name)
        };

        let version = Version::parse(raw).ok()?;
        Some(VersionTag {
            tag: tag.name.clone(),
            rev: tag.rev.clone(),
            version,
        })
    }
}
