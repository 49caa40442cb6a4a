//! Schema Registry
//!
//! Maps `(role, version)` to the generation that decodes it. Built once,
//! then shared read-only by the resolver and the converter.

use crate::error::{Result, SchemaError};
use crate::schema::{Generation, Role, SchemaDescriptor};
use crate::version::{SchemaVersion, VersionRange};

/// Version-range dispatch table for both document roles
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Entries in registration order; resolution takes the first match
    descriptors: Vec<SchemaDescriptor>,
}

impl SchemaRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in generation under its default range
    pub fn standard() -> Self {
        let descriptors = Generation::ALL
            .iter()
            .map(|g| SchemaDescriptor::new(g.default_range(), g.role(), *g))
            .collect();
        Self { descriptors }
    }

    /// Register `generation` for every version in `range`
    ///
    /// Registering the exact same range again replaces the earlier entry.
    /// Partially overlapping ranges are accepted; resolution then prefers
    /// whichever was registered first.
    pub fn register(&mut self, role: Role, range: VersionRange, generation: Generation) -> Result<()> {
        if generation.role() != role {
            return Err(SchemaError::RoleMismatch { role, generation });
        }

        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|d| d.role == role && d.range == range)
        {
            tracing::debug!(
                %role,
                %range,
                previous = %existing.generation,
                %generation,
                "replacing schema registration"
            );
            existing.generation = generation;
            return Ok(());
        }

        for other in self.descriptors.iter().filter(|d| d.role == role) {
            if other.range.overlaps(&range) {
                tracing::warn!(
                    %role,
                    %range,
                    existing = %other.range,
                    shadowed_by = %other.generation,
                    "overlapping schema ranges; earlier registration wins"
                );
            }
        }

        tracing::debug!(%role, %range, %generation, "registered schema");
        self.descriptors.push(SchemaDescriptor::new(range, role, generation));
        Ok(())
    }

    /// Find the generation registered for `version`
    pub fn resolve(&self, role: Role, version: &SchemaVersion) -> Option<Generation> {
        let found = self
            .descriptors
            .iter()
            .find(|d| d.role == role && d.range.contains(version))
            .map(|d| d.generation);
        tracing::trace!(%role, %version, generation = ?found, "resolved schema");
        found
    }

    /// The generation with the lowest range for `role`
    pub fn oldest(&self, role: Role) -> Option<Generation> {
        self.for_role(role)
            .min_by(|a, b| a.range.min().cmp(b.range.min()))
            .map(|d| d.generation)
    }

    /// The generation with the highest range for `role`; conversion target
    pub fn latest(&self, role: Role) -> Option<Generation> {
        self.for_role(role)
            .max_by(|a, b| a.range.min().cmp(b.range.min()))
            .map(|d| d.generation)
    }

    /// Number of registrations for `role`
    pub fn len(&self, role: Role) -> usize {
        self.for_role(role).count()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn for_role(&self, role: Role) -> impl Iterator<Item = &SchemaDescriptor> {
        self.descriptors.iter().filter(move |d| d.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> SchemaVersion {
        SchemaVersion::parse(raw).unwrap()
    }

    fn range(raw: &str) -> VersionRange {
        VersionRange::parse(raw).unwrap()
    }

    #[test]
    fn test_standard_resolution() {
        let registry = SchemaRegistry::standard();
        assert_eq!(registry.resolve(Role::Metadata, &v("2.0.0")), Some(Generation::MetadataV200));
        assert_eq!(registry.resolve(Role::Metadata, &v("2.1.9")), Some(Generation::MetadataV210));
        assert_eq!(registry.resolve(Role::Metadata, &v("2.2.4")), Some(Generation::MetadataLatest));
        assert_eq!(registry.resolve(Role::Metadata, &v("2.3.0")), None);
        assert_eq!(registry.resolve(Role::Metadata, &v("1.0.0")), None);
        assert_eq!(registry.resolve(Role::ChartData, &v("1.0.0")), Some(Generation::ChartV100));
        assert_eq!(registry.resolve(Role::ChartData, &v("2.0.0")), Some(Generation::ChartLatest));
    }

    #[test]
    fn test_oldest_and_latest() {
        let registry = SchemaRegistry::standard();
        assert_eq!(registry.oldest(Role::ChartData), Some(Generation::ChartV100));
        assert_eq!(registry.latest(Role::ChartData), Some(Generation::ChartLatest));
        assert_eq!(registry.oldest(Role::Metadata), Some(Generation::MetadataV200));
        assert_eq!(registry.latest(Role::Metadata), Some(Generation::MetadataLatest));
        assert_eq!(registry.len(Role::Metadata), 3);
    }

    #[test]
    fn test_identical_range_replaces() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(Role::Metadata, range("[2.0.0,2.1.0)"), Generation::MetadataV200)
            .unwrap();
        registry
            .register(Role::Metadata, range("[2.0.0,2.1.0)"), Generation::MetadataV210)
            .unwrap();
        assert_eq!(registry.len(Role::Metadata), 1);
        assert_eq!(registry.resolve(Role::Metadata, &v("2.0.5")), Some(Generation::MetadataV210));
    }

    #[test]
    fn test_overlap_prefers_first_registration() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(Role::Metadata, range("[2.0.0,2.2.0)"), Generation::MetadataV200)
            .unwrap();
        registry
            .register(Role::Metadata, range("[2.1.0,2.3.0)"), Generation::MetadataLatest)
            .unwrap();
        assert_eq!(registry.resolve(Role::Metadata, &v("2.1.5")), Some(Generation::MetadataV200));
        assert_eq!(registry.resolve(Role::Metadata, &v("2.2.0")), Some(Generation::MetadataLatest));
    }

    #[test]
    fn test_role_mismatch_is_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register(Role::Metadata, range("[1.0.0,2.0.0)"), Generation::ChartV100)
            .unwrap_err();
        assert!(matches!(err, SchemaError::RoleMismatch { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_roles_are_independent() {
        let registry = SchemaRegistry::standard();
        // 2.0.0 is both a metadata and a chart version
        assert_eq!(registry.resolve(Role::ChartData, &v("2.0.0")), Some(Generation::ChartLatest));
        assert_eq!(registry.resolve(Role::Metadata, &v("2.0.0")), Some(Generation::MetadataV200));
    }
}
