//! Schema versioning utilities

use semver::Version;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

/// The semantic version stamped on a metadata or chart document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion(Version);

impl SchemaVersion {
    /// Create a release version
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Create from a version string
    pub fn parse(version_str: &str) -> Result<Self> {
        // Strip leading 'v' if present
        let trimmed = version_str.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        Version::parse(trimmed)
            .map(Self)
            .map_err(|e| SchemaError::InvalidVersion {
                version: version_str.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get the version string (e.g., "2.2.4")
    pub fn version_string(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Version> for SchemaVersion {
    fn from(version: Version) -> Self {
        Self(version)
    }
}

/// A half-open version interval `[min, max)` used to dispatch documents to
/// their schema generation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: SchemaVersion,
    max: SchemaVersion,
}

impl VersionRange {
    /// Create a range; `min` must be strictly below `max`
    pub fn new(min: SchemaVersion, max: SchemaVersion) -> Result<Self> {
        if min >= max {
            return Err(SchemaError::InvalidVersion {
                version: format!("[{},{})", min, max),
                reason: "range lower bound must be below its upper bound".to_string(),
            });
        }
        Ok(Self { min, max })
    }

    /// Bounds the caller already knows to be ordered
    pub(crate) fn from_ordered(min: SchemaVersion, max: SchemaVersion) -> Self {
        debug_assert!(min < max);
        Self { min, max }
    }

    /// Parse the interval notation `[2.0.0,2.1.0)`
    pub fn parse(range: &str) -> Result<Self> {
        let invalid = |reason: &str| SchemaError::InvalidVersion {
            version: range.to_string(),
            reason: reason.to_string(),
        };

        let inner = range
            .trim()
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| invalid("expected a half-open range like [1.0.0,2.0.0)"))?;
        let (min, max) = inner
            .split_once(',')
            .ok_or_else(|| invalid("missing ',' between bounds"))?;

        Self::new(SchemaVersion::parse(min)?, SchemaVersion::parse(max)?)
    }

    /// Inclusive lower bound
    pub fn min(&self) -> &SchemaVersion {
        &self.min
    }

    /// Exclusive upper bound
    pub fn max(&self) -> &SchemaVersion {
        &self.max
    }

    /// Check whether a version falls inside this range
    pub fn contains(&self, version: &SchemaVersion) -> bool {
        *version >= self.min && *version < self.max
    }

    /// Check whether two ranges share at least one version
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.min < other.max && other.min < self.max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.min, self.max)
    }
}

impl FromStr for VersionRange {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = SchemaVersion::parse("2.2.4").unwrap();
        assert_eq!(v.version_string(), "2.2.4");
        assert_eq!(v, SchemaVersion::new(2, 2, 4));
    }

    #[test]
    fn test_version_with_v_prefix() {
        let v = SchemaVersion::parse("v1.0.0").unwrap();
        assert_eq!(v.version_string(), "1.0.0");
    }

    #[test]
    fn test_prerelease_orders_before_release() {
        let pre = SchemaVersion::parse("2.1.0-rc.1").unwrap();
        let release = SchemaVersion::parse("2.1.0").unwrap();
        assert!(pre < release);
    }

    #[test]
    fn test_malformed_version() {
        let err = SchemaVersion::parse("two point oh").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidVersion { .. }));
    }

    #[test]
    fn test_range_is_half_open() {
        let range = VersionRange::parse("[2.0.0,2.1.0)").unwrap();
        assert!(range.contains(&SchemaVersion::new(2, 0, 0)));
        assert!(range.contains(&SchemaVersion::new(2, 0, 9)));
        assert!(!range.contains(&SchemaVersion::new(2, 1, 0)));
        assert!(!range.contains(&SchemaVersion::new(1, 9, 9)));
        assert_eq!(range.to_string(), "[2.0.0,2.1.0)");
    }

    #[test]
    fn test_range_rejects_bad_notation() {
        assert!(VersionRange::parse("2.0.0,2.1.0").is_err());
        assert!(VersionRange::parse("[2.1.0,2.0.0)").is_err());
        assert!(VersionRange::parse("[2.0.0;2.1.0)").is_err());
    }

    #[test]
    fn test_range_overlap() {
        let a = VersionRange::parse("[2.0.0,2.2.0)").unwrap();
        let b = VersionRange::parse("[2.1.0,2.3.0)").unwrap();
        let c = VersionRange::parse("[2.2.0,2.3.0)").unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
