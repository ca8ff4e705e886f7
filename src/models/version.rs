//! Version models
//!
//! A `Version` has two mandatory components (major, minor) and two optional
//! trailing ones (build, revision). A revision can only be present when a
//! build is, so "1.2.-.4" is unrepresentable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VcsError;

/// A 2 to 4 component version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl Version {
    /// Largest value any component may hold
    pub const MAX_COMPONENT: u32 = i32::MAX as u32;

    pub const fn new(major: u32, minor: u32) -> Self {
        Version {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    pub const fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Version {
            major,
            minor,
            build: Some(build),
            revision: None,
        }
    }

    pub const fn with_revision(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Version {
            major,
            minor,
            build: Some(build),
            revision: Some(revision),
        }
    }

    /// Version assumed for a repository with no release tag
    pub const fn baseline() -> Self {
        Version::new(0, 1)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// Number of set components (2, 3 or 4)
    pub fn components(&self) -> usize {
        2 + usize::from(self.build.is_some()) + usize::from(self.revision.is_some())
    }

    /// Parse with `System.Version` rules: 2 to 4 dot-separated non-negative
    /// integers, each fitting a signed 32-bit value.
    pub fn parse(input: &str) -> Result<Self, VcsError> {
        let invalid = || VcsError::InvalidVersion(input.to_string());

        let parts: Vec<&str> = input.trim().split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(invalid());
        }

        let mut numbers = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let value: u32 = part.parse().map_err(|_| invalid())?;
            if value > Version::MAX_COMPONENT {
                return Err(invalid());
            }
            numbers.push(value);
        }

        Ok(match numbers.as_slice() {
            [major, minor] => Version::new(*major, *minor),
            [major, minor, build] => Version::with_build(*major, *minor, *build),
            [major, minor, build, revision] => {
                Version::with_revision(*major, *minor, *build, *revision)
            }
            _ => return Err(invalid()),
        })
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::baseline()
    }
}

// Unset components sort before any set value, so 1.2 < 1.2.0 < 1.2.0.0
impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.build.cmp(&other.build))
            .then(self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}
