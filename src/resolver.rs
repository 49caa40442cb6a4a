//! Version Resolver
//!
//! Reads the `version` stamp of raw JSON, asks the registry which generation
//! owns it and decodes into that generation's types.

use serde_json::{Map, Value};

use crate::config::OutputFormat;
use crate::data::{ChartDocument, Document, MetadataDocument};
use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::{Generation, Role};
use crate::version::SchemaVersion;

/// Decodes raw documents against a registry
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Decode song metadata; a `version` string is mandatory
    pub fn decode_metadata(&self, bytes: &[u8]) -> Result<MetadataDocument> {
        let object = parse_object(bytes)?;
        let generation = self.metadata_generation(&object)?;
        MetadataDocument::decode(generation, object)
    }

    /// Decode a chart; without a `version` it is read as the oldest chart generation
    pub fn decode_chart(&self, bytes: &[u8]) -> Result<ChartDocument> {
        let object = parse_object(bytes)?;
        let generation = self.chart_generation(&object)?;
        ChartDocument::decode(generation, object)
    }

    /// Decode as the given role
    pub fn decode(&self, role: Role, bytes: &[u8]) -> Result<Document> {
        match role {
            Role::Metadata => self.decode_metadata(bytes).map(Document::Metadata),
            Role::ChartData => self.decode_chart(bytes).map(Document::Chart),
        }
    }

    /// Decode a document whose role is not known up front
    ///
    /// Charts are recognised by their `notes`, `scrollSpeed` or legacy `song`
    /// keys; anything else is read as metadata.
    pub fn decode_any(&self, bytes: &[u8]) -> Result<Document> {
        let object = parse_object(bytes)?;
        let role = detect_role(&object);
        tracing::trace!(%role, "detected document role");
        let generation = match role {
            Role::Metadata => self.metadata_generation(&object)?,
            Role::ChartData => self.chart_generation(&object)?,
        };
        Document::decode(generation, object)
    }

    fn metadata_generation(&self, object: &Map<String, Value>) -> Result<Generation> {
        match object.get("version") {
            Some(Value::String(raw)) => self.lookup(Role::Metadata, &SchemaVersion::parse(raw)?),
            _ => Err(SchemaError::MissingVersion),
        }
    }

    fn chart_generation(&self, object: &Map<String, Value>) -> Result<Generation> {
        match object.get("version") {
            None => {
                let oldest = self
                    .registry
                    .oldest(Role::ChartData)
                    .ok_or(SchemaError::EmptyRegistry(Role::ChartData))?;
                tracing::debug!(generation = %oldest, "chart has no version, assuming oldest");
                Ok(oldest)
            }
            Some(Value::String(raw)) => self.lookup(Role::ChartData, &SchemaVersion::parse(raw)?),
            Some(other) => Err(SchemaError::InvalidVersion {
                version: other.to_string(),
                reason: "version must be a string".to_string(),
            }),
        }
    }

    fn lookup(&self, role: Role, version: &SchemaVersion) -> Result<Generation> {
        self.registry
            .resolve(role, version)
            .ok_or_else(|| SchemaError::UnsupportedVersion {
                role,
                version: version.to_string(),
            })
    }
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice(bytes)? {
        Value::Object(object) => Ok(object),
        _ => Err(SchemaError::InvalidFormat(
            "top-level JSON value must be an object".to_string(),
        )),
    }
}

/// Guess whether a raw object is a chart or metadata
pub fn detect_role(object: &Map<String, Value>) -> Role {
    let is_chart = object.contains_key("notes")
        || object.contains_key("scrollSpeed")
        || object.get("song").map_or(false, Value::is_object);
    if is_chart {
        Role::ChartData
    } else {
        Role::Metadata
    }
}

/// Serialize a document back to JSON bytes
pub fn encode(document: &Document, format: OutputFormat) -> Result<Vec<u8>> {
    encode_value(&document.encode(), format)
}

pub fn encode_value(value: &Value, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Pretty => serde_json::to_vec_pretty(value)?,
        OutputFormat::Compact => serde_json::to_vec(value)?,
    };
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_without_version_is_rejected() {
        let registry = SchemaRegistry::standard();
        let err = Resolver::new(&registry)
            .decode_metadata(br#"{"songName": "Test"}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingVersion));

        let err = Resolver::new(&registry)
            .decode_metadata(br#"{"version": 2}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingVersion));
    }

    #[test]
    fn test_metadata_version_errors() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        assert!(matches!(
            resolver.decode_metadata(br#"{"version": "latest"}"#),
            Err(SchemaError::InvalidVersion { .. })
        ));
        match resolver.decode_metadata(br#"{"version": "3.0.0"}"#) {
            Err(SchemaError::UnsupportedVersion { role, version }) => {
                assert_eq!(role, Role::Metadata);
                assert_eq!(version, "3.0.0");
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_version_errors() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        assert!(matches!(
            resolver.decode_chart(br#"{"version": "abc"}"#),
            Err(SchemaError::InvalidVersion { .. })
        ));
        match resolver.decode_chart(br#"{"version": "3.0.0", "notes": {}}"#) {
            Err(SchemaError::UnsupportedVersion { role, version }) => {
                assert_eq!(role, Role::ChartData);
                assert_eq!(version, "3.0.0");
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_version_must_be_a_string() {
        let registry = SchemaRegistry::standard();
        match Resolver::new(&registry).decode_chart(br#"{"version": 2}"#) {
            Err(SchemaError::InvalidVersion { version, .. }) => assert_eq!(version, "2"),
            other => panic!("expected InvalidVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_versionless_chart_is_oldest() {
        let registry = SchemaRegistry::standard();
        let doc = Resolver::new(&registry)
            .decode_chart(br#"{"song": {"song": "Test", "notes": []}}"#)
            .unwrap();
        assert_eq!(doc.generation(), Generation::ChartV100);
    }

    #[test]
    fn test_versionless_chart_needs_registrations() {
        let registry = SchemaRegistry::new();
        let err = Resolver::new(&registry).decode_chart(b"{}").unwrap_err();
        assert!(matches!(err, SchemaError::EmptyRegistry(Role::ChartData)));
    }

    #[test]
    fn test_non_object_input() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        assert!(matches!(
            resolver.decode_chart(b"[1, 2, 3]"),
            Err(SchemaError::InvalidFormat(_))
        ));
        assert!(matches!(resolver.decode_chart(b"{not json"), Err(SchemaError::Json(_))));
    }

    #[test]
    fn test_role_detection() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        let chart = resolver
            .decode_any(br#"{"version": "2.0.0", "scrollSpeed": {}, "notes": {}}"#)
            .unwrap();
        assert_eq!(chart.role(), Role::ChartData);
        let metadata = resolver
            .decode_any(br#"{"version": "2.0.0", "songName": "Test"}"#)
            .unwrap();
        assert_eq!(metadata.generation(), Generation::MetadataV200);
    }

    #[test]
    fn test_decode_with_known_role() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        let doc = resolver
            .decode(Role::Metadata, br#"{"version": "2.1.0", "songName": "Test"}"#)
            .unwrap();
        assert_eq!(doc.generation(), Generation::MetadataV210);
        let doc = resolver.decode(Role::ChartData, br#"{"song": {"song": "Test"}}"#).unwrap();
        assert_eq!(doc.role(), Role::ChartData);
    }

    #[test]
    fn test_role_detection_keeps_version_rules() {
        let registry = SchemaRegistry::standard();
        let resolver = Resolver::new(&registry);
        let legacy = resolver
            .decode_any(br#"{"song": {"song": "Test", "notes": []}}"#)
            .unwrap();
        assert_eq!(legacy.generation(), Generation::ChartV100);
        assert!(matches!(
            resolver.decode_any(br#"{"songName": "Test"}"#),
            Err(SchemaError::MissingVersion)
        ));
    }

    #[test]
    fn test_compact_and_pretty_encoding() {
        let registry = SchemaRegistry::standard();
        let doc = Resolver::new(&registry)
            .decode_chart(br#"{"version": "2.0.0", "notes": {"normal": [{"t": 0, "d": 1, "l": 0}]}}"#)
            .unwrap();
        let doc = Document::Chart(doc);
        let compact = String::from_utf8(encode(&doc, OutputFormat::Compact).unwrap()).unwrap();
        assert!(compact.starts_with(r#"{"version":"2.0.0","scrollSpeed":{}"#));
        assert!(compact.contains(r#""notes":{"normal":[{"time":0,"data":1,"length":0}]}"#));
        let pretty = String::from_utf8(encode(&doc, OutputFormat::Pretty).unwrap()).unwrap();
        assert!(pretty.contains('\n'));
    }
}
