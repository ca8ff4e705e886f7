//! Version derivation from release tags
//!
//! Finds the highest version tag reachable from a branch head and applies an
//! increment strategy to it. Resolution never writes to the repository;
//! [`tag_next_version`] is the separate, explicit step that records a version.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::heads::BranchHeads;
use crate::error::{Result, VcsError};
use crate::models::{TagRef, Version, VersionTag};
use crate::services::{RevSpec, VcsGateway, DEFAULT_BRANCH};

/// Default prefix stripped from tag names before parsing
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// Produces the next version from the current one
pub trait IncrementStrategy {
    fn increment(&self, version: &Version) -> Version;
}

impl<F> IncrementStrategy for F
where
    F: Fn(&Version) -> Version,
{
    fn increment(&self, version: &Version) -> Version {
        self(version)
    }
}

/// Bump the most specific component that is already set
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIncrement;

impl IncrementStrategy for DefaultIncrement {
    fn increment(&self, version: &Version) -> Version {
        Bump::MostSpecific.increment(version)
    }
}

/// Named increment strategies, selectable from config or the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bump {
    /// Same as [`DefaultIncrement`]
    #[default]
    MostSpecific,
    Major,
    Minor,
    Build,
    Revision,
}

impl IncrementStrategy for Bump {
    fn increment(&self, v: &Version) -> Version {
        let zero = |component: Option<u32>| component.map(|_| 0);
        // Stay within what `Version::parse` accepts back from a tag
        let next = |n: u32| n.saturating_add(1).min(Version::MAX_COMPONENT);

        match self {
            Bump::MostSpecific => match (v.build(), v.revision()) {
                (Some(build), Some(revision)) => {
                    Version::with_revision(v.major(), v.minor(), build, next(revision))
                }
                (Some(build), None) => Version::with_build(v.major(), v.minor(), next(build)),
                _ => Version::new(v.major(), next(v.minor())),
            },
            Bump::Major => rebuild(next(v.major()), 0, zero(v.build()), zero(v.revision())),
            Bump::Minor => rebuild(v.major(), next(v.minor()), zero(v.build()), zero(v.revision())),
            Bump::Build => rebuild(
                v.major(),
                v.minor(),
                Some(v.build().map_or(1, next)),
                zero(v.revision()),
            ),
            Bump::Revision => Version::with_revision(
                v.major(),
                v.minor(),
                v.build().unwrap_or(0),
                v.revision().map_or(1, next),
            ),
        }
    }
}

fn rebuild(major: u32, minor: u32, build: Option<u32>, revision: Option<u32>) -> Version {
    match (build, revision) {
        (Some(build), Some(revision)) => Version::with_revision(major, minor, build, revision),
        (Some(build), None) => Version::with_build(major, minor, build),
        _ => Version::new(major, minor),
    }
}

impl FromStr for Bump {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" | "most-specific" => Ok(Bump::MostSpecific),
            "major" => Ok(Bump::Major),
            "minor" => Ok(Bump::Minor),
            "build" | "patch" => Ok(Bump::Build),
            "revision" => Ok(Bump::Revision),
            other => Err(VcsError::InvalidVersion(format!(
                "unknown increment strategy '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Bump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Bump::MostSpecific => "default",
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Build => "build",
            Bump::Revision => "revision",
        };
        f.write_str(label)
    }
}

/// Inputs to version resolution
pub struct VersionSettings<'a> {
    /// Branch whose head scopes tag reachability
    pub branch: String,
    /// Prefix stripped from tag names, if present
    pub tag_prefix: String,
    pub increment: &'a dyn IncrementStrategy,
}

impl Default for VersionSettings<'_> {
    fn default() -> Self {
        VersionSettings {
            branch: DEFAULT_BRANCH.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            increment: &DefaultIncrement,
        }
    }
}

impl<'a> VersionSettings<'a> {
    pub fn for_branch(branch: impl Into<String>) -> Self {
        VersionSettings {
            branch: branch.into(),
            ..Default::default()
        }
    }

    pub fn with_increment(mut self, increment: &'a dyn IncrementStrategy) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }
}

/// Versioning defaults stored in the repository's git config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersioningConfig {
    pub branch: String,
    pub tag_prefix: String,
    pub increment: Bump,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            increment: Bump::MostSpecific,
        }
    }
}

const CONFIG_BRANCH: &str = "branchcraft.branch";
const CONFIG_TAG_PREFIX: &str = "branchcraft.tagprefix";
const CONFIG_INCREMENT: &str = "branchcraft.increment";

impl VersioningConfig {
    /// Read from git config, falling back to defaults for absent keys
    pub fn load<G: VcsGateway + ?Sized>(gateway: &G, path: &Path) -> Result<Self> {
        let defaults = Self::default();

        let increment = match gateway.config_get(path, CONFIG_INCREMENT)? {
            Some(raw) => raw.parse()?,
            None => defaults.increment,
        };

        Ok(VersioningConfig {
            branch: gateway
                .config_get(path, CONFIG_BRANCH)?
                .unwrap_or(defaults.branch),
            tag_prefix: gateway
                .config_get(path, CONFIG_TAG_PREFIX)?
                .unwrap_or(defaults.tag_prefix),
            increment,
        })
    }

    /// Write to the repository-local git config
    pub fn save<G: VcsGateway + ?Sized>(&self, gateway: &G, path: &Path) -> Result<()> {
        gateway.config_set(path, CONFIG_BRANCH, &self.branch)?;
        gateway.config_set(path, CONFIG_TAG_PREFIX, &self.tag_prefix)?;
        gateway.config_set(path, CONFIG_INCREMENT, &self.increment.to_string())?;
        Ok(())
    }

    pub fn settings(&self) -> VersionSettings<'_> {
        VersionSettings {
            branch: self.branch.clone(),
            tag_prefix: self.tag_prefix.clone(),
            increment: &self.increment,
        }
    }
}

/// Version tags reachable from the branch head, one per distinct version,
/// in ascending order. Tags that do not parse as versions are skipped.
pub fn version_tags<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    settings: &VersionSettings<'_>,
) -> Result<Vec<VersionTag>> {
    let heads = BranchHeads::load(gateway, path, &settings.branch)?;
    let head = heads.select()?;

    let reachable: HashSet<String> = gateway
        .log(path, &RevSpec::ancestors(head.hash.as_str()))?
        .into_iter()
        .map(|commit| commit.hash)
        .collect();

    let tags: Vec<TagRef> = gateway.tags(path)?;
    let mut by_version: BTreeMap<Version, VersionTag> = BTreeMap::new();

    for tag in &tags {
        if !reachable.contains(&tag.rev) {
            continue;
        }
        match VersionTag::from_tag(tag, &settings.tag_prefix) {
            Some(version_tag) => {
                by_version.entry(version_tag.version).or_insert(version_tag);
            }
            None => debug!(tag = %tag.name, "ignoring non-version tag"),
        }
    }

    Ok(by_version.into_values().collect())
}

/// The highest version tag reachable from the branch head
pub fn current_version<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    settings: &VersionSettings<'_>,
) -> Result<Option<VersionTag>> {
    Ok(version_tags(gateway, path, settings)?.pop())
}

/// Next version for the branch: the increment of the highest reachable
/// version tag. A branch with no version tags has had no release yet, so
/// its next version is the `0.1` baseline itself.
pub fn resolve_next_version<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    settings: &VersionSettings<'_>,
) -> Result<Version> {
    let Some(current) = current_version(gateway, path, settings)? else {
        let baseline = Version::baseline();
        info!(branch = %settings.branch, next = %baseline, "no version tags found, using baseline");
        return Ok(baseline);
    };

    let next = settings.increment.increment(&current.version);
    info!(
        branch = %settings.branch,
        current = %current.tag,
        next = %next,
        "resolved next version"
    );
    Ok(next)
}

/// Resolve the next version and record it as a tag on the branch head
pub fn tag_next_version<G: VcsGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    settings: &VersionSettings<'_>,
) -> Result<VersionTag> {
    let next = resolve_next_version(gateway, path, settings)?;
    let heads = BranchHeads::load(gateway, path, &settings.branch)?;
    let head = heads.select()?;

    let name = format!("{}{}", settings.tag_prefix, next);
    let tag = gateway.tag(path, &name, &head.hash)?;

    Ok(VersionTag {
        tag: tag.name,
        rev: tag.rev,
        version: next,
    })
}
