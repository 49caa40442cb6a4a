//! Schema roles, generations and registry descriptors

use std::fmt;

use crate::version::{SchemaVersion, VersionRange};

/// Which half of a song a schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Song metadata (names, characters, time changes, offsets)
    Metadata,
    /// Chart data (notes, events, scroll speeds)
    ChartData,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Metadata => write!(f, "metadata"),
            Role::ChartData => write!(f, "chart"),
        }
    }
}

/// One historical generation of a schema
///
/// This is the closed set of concrete types the registry can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Metadata 2.0.x, characters keyed by player id
    MetadataV200,
    /// Metadata 2.1.x, single character record, `noteSkin`
    MetadataV210,
    /// Metadata 2.2.x, the canonical shape
    MetadataLatest,
    /// Combined legacy chart 1.x with embedded song info
    ChartV100,
    /// Chart 2.x, the canonical shape
    ChartLatest,
}

impl Generation {
    /// All generations, oldest first within each role
    pub const ALL: [Generation; 5] = [
        Generation::MetadataV200,
        Generation::MetadataV210,
        Generation::MetadataLatest,
        Generation::ChartV100,
        Generation::ChartLatest,
    ];

    /// The role this generation belongs to
    pub fn role(&self) -> Role {
        match self {
            Generation::MetadataV200 | Generation::MetadataV210 | Generation::MetadataLatest => {
                Role::Metadata
            }
            Generation::ChartV100 | Generation::ChartLatest => Role::ChartData,
        }
    }

    /// Version stamped on documents freshly produced in this generation
    pub fn default_version(&self) -> SchemaVersion {
        match self {
            Generation::MetadataV200 => SchemaVersion::new(2, 0, 0),
            Generation::MetadataV210 => SchemaVersion::new(2, 1, 0),
            Generation::MetadataLatest => SchemaVersion::new(2, 2, 4),
            Generation::ChartV100 => SchemaVersion::new(1, 0, 0),
            Generation::ChartLatest => SchemaVersion::new(2, 0, 0),
        }
    }

    /// The `[min, max)` bounds this generation is registered under by default
    pub fn default_range(&self) -> VersionRange {
        let (min, max) = match self {
            Generation::MetadataV200 => ((2, 0, 0), (2, 1, 0)),
            Generation::MetadataV210 => ((2, 1, 0), (2, 2, 0)),
            Generation::MetadataLatest => ((2, 2, 0), (2, 3, 0)),
            Generation::ChartV100 => ((1, 0, 0), (2, 0, 0)),
            Generation::ChartLatest => ((2, 0, 0), (2, 3, 0)),
        };
        VersionRange::from_ordered(
            SchemaVersion::new(min.0, min.1, min.2),
            SchemaVersion::new(max.0, max.1, max.2),
        )
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Generation::MetadataV200 => "metadata v2.0.x",
            Generation::MetadataV210 => "metadata v2.1.x",
            Generation::MetadataLatest => "metadata latest",
            Generation::ChartV100 => "legacy chart v1.x",
            Generation::ChartLatest => "chart latest",
        };
        f.write_str(name)
    }
}

/// A registry entry: which generation handles which version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Versions dispatched to this generation
    pub range: VersionRange,
    /// Role of the documents in this range
    pub role: Role,
    /// Concrete type used to decode them
    pub generation: Generation,
}

impl SchemaDescriptor {
    /// Create a new descriptor
    pub fn new(range: VersionRange, role: Role, generation: Generation) -> Self {
        Self {
            range,
            role,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_versions_fall_in_default_ranges() {
        for generation in Generation::ALL {
            assert!(
                generation.default_range().contains(&generation.default_version()),
                "{} default version outside its range",
                generation
            );
        }
    }

    #[test]
    fn test_roles() {
        assert_eq!(Generation::ChartV100.role(), Role::ChartData);
        assert_eq!(Generation::MetadataV210.role(), Role::Metadata);
    }
}
