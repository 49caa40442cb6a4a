//! Conversion Chain Engine
//!
//! Walks a decoded document forward one generation at a time until it
//! reaches the registry's latest generation for its role.
//!
//! ```text
//! metadata 2.0.x ──► metadata 2.1.x ──► metadata latest
//!                                            ▲
//! legacy chart 1.x ──┬───────────────────────┘
//!                    └──► chart latest
//! ```

use serde::{Deserialize, Serialize};

use crate::data::chart::ChartData;
use crate::data::metadata::latest::GENERATED_BY;
use crate::data::metadata::Metadata;
use crate::data::{Advanced, ChartDocument, Document, MetadataDocument};
use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;

/// Knobs for conversions that have to invent data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Difficulty id given to the notes of a legacy chart
    pub legacy_difficulty: String,
    /// Variation id of metadata synthesized from a legacy chart
    pub legacy_variation: String,
    /// `generatedBy` stamp of synthesized documents
    pub generated_by: String,
    /// Note style of metadata synthesized from a legacy chart
    pub note_style: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            legacy_difficulty: "normal".to_string(),
            legacy_variation: "default".to_string(),
            generated_by: GENERATED_BY.to_string(),
            note_style: "funkin".to_string(),
        }
    }
}

/// The two halves of a song, either of which may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongPack {
    pub metadata: Option<MetadataDocument>,
    pub chart: Option<ChartDocument>,
}

impl SongPack {
    pub fn new(metadata: Option<MetadataDocument>, chart: Option<ChartDocument>) -> Self {
        Self { metadata, chart }
    }

    /// Canonical metadata, if present and fully converted
    pub fn latest_metadata(&self) -> Option<&Metadata> {
        match &self.metadata {
            Some(MetadataDocument::Latest(metadata)) => Some(metadata),
            _ => None,
        }
    }

    /// Canonical chart, if present and fully converted
    pub fn latest_chart(&self) -> Option<&ChartData> {
        match &self.chart {
            Some(ChartDocument::Latest(chart)) => Some(chart),
            _ => None,
        }
    }

    /// Song name from whichever half knows it
    pub fn song_name(&self) -> Option<&str> {
        match (&self.metadata, &self.chart) {
            (Some(metadata), _) => Some(metadata.song_name()),
            (None, Some(ChartDocument::V100(chart))) => Some(chart.song.song.as_str()),
            _ => None,
        }
    }

    fn put(&mut self, document: Document) {
        match document {
            Document::Metadata(metadata) => self.metadata = Some(metadata),
            Document::Chart(chart) => self.chart = Some(chart),
        }
    }
}

/// Drives documents to the latest registered generation
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    registry: &'a SchemaRegistry,
    options: ConversionOptions,
}

impl<'a> Converter<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self::with_options(registry, ConversionOptions::default())
    }

    pub fn with_options(registry: &'a SchemaRegistry, options: ConversionOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Advance `document` until it is the latest generation of its role
    ///
    /// A legacy chart yields both halves; every other document fills only
    /// the half matching its role. The input is never modified.
    pub fn advance_to_latest(&self, document: Document) -> Result<SongPack> {
        let role = document.role();
        let latest = self
            .registry
            .latest(role)
            .ok_or(SchemaError::EmptyRegistry(role))?;
        let limit = self.registry.len(role);

        let mut pack = SongPack::default();
        let mut current = document;
        let mut hops = 0;

        loop {
            let generation = current.generation();
            if generation == latest {
                tracing::debug!(%role, %generation, hops, "reached latest schema");
                pack.put(current);
                return Ok(pack);
            }
            if hops >= limit {
                return Err(SchemaError::ConversionLoop { generation, limit });
            }

            let next = current
                .advance(&self.options)
                .ok_or(SchemaError::MissingAdvanceRule {
                    role,
                    generation,
                    latest,
                })?;
            hops += 1;

            current = match next {
                Advanced::Single(next) => {
                    tracing::debug!(from = %generation, to = %next.generation(), "advanced document");
                    next
                }
                Advanced::Split(metadata, chart) => {
                    tracing::debug!(
                        from = %generation,
                        metadata = %metadata.generation(),
                        chart = %chart.generation(),
                        "split combined chart"
                    );
                    pack.metadata = self.advance_to_latest(metadata.into())?.metadata;
                    chart.into()
                }
            };
        }
    }

    /// Advance both halves of a song
    ///
    /// Metadata split out of a legacy chart is only used when the pack did
    /// not already carry metadata of its own.
    pub fn convert_pack(&self, pack: SongPack) -> Result<SongPack> {
        let mut out = SongPack::default();

        if let Some(metadata) = pack.metadata {
            out.metadata = self.advance_to_latest(metadata.into())?.metadata;
        }
        if let Some(chart) = pack.chart {
            let converted = self.advance_to_latest(chart.into())?;
            out.chart = converted.chart;
            match converted.metadata {
                Some(synthesized) if out.metadata.is_none() => out.metadata = Some(synthesized),
                Some(_) => {
                    tracing::debug!("discarding metadata synthesized from chart; metadata was supplied")
                }
                None => {}
            }
        }

        tracing::info!(
            song = out.song_name().unwrap_or("<unnamed>"),
            metadata = out.metadata.is_some(),
            chart = out.chart.is_some(),
            "converted song"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::data::chart::v100;
    use crate::data::metadata::v200;
    use crate::schema::{Generation, Role};
    use crate::version::VersionRange;
    use serde_json::json;

    fn legacy_chart() -> ChartDocument {
        let chart: v100::Chart = codec::decode(json!({
            "song": {
                "song": "Test",
                "bpm": 150,
                "speed": 1.5,
                "player1": "bf",
                "player2": "dad",
                "gfVersion": "gf",
                "notes": [{"sectionNotes": [[1000, 0, 0]]}]
            }
        }))
        .unwrap();
        ChartDocument::V100(chart)
    }

    fn metadata_v200() -> MetadataDocument {
        let metadata: v200::Metadata = codec::decode(json!({
            "version": "2.0.0",
            "songName": "Test (Remix)",
            "playData": {"playableChars": {"pico": {"g": "nene", "o": "darnell"}}}
        }))
        .unwrap();
        MetadataDocument::V200(metadata)
    }

    #[test]
    fn test_metadata_walks_every_hop() {
        let registry = SchemaRegistry::standard();
        let pack = Converter::new(&registry)
            .advance_to_latest(metadata_v200().into())
            .unwrap();
        assert!(pack.chart.is_none());
        let metadata = pack.latest_metadata().unwrap();
        assert_eq!(metadata.play_data.characters.player, "pico");
        assert_eq!(metadata.play_data.characters.opponent, "darnell");
        assert_eq!(metadata.play_data.preview_end, 15_000);
    }

    #[test]
    fn test_legacy_chart_splits() {
        let registry = SchemaRegistry::standard();
        let pack = Converter::new(&registry)
            .advance_to_latest(legacy_chart().into())
            .unwrap();
        let chart = pack.latest_chart().unwrap();
        assert_eq!(chart.notes.len(), 1);
        assert_eq!(chart.notes_for("normal").len(), 1);
        let metadata = pack.latest_metadata().unwrap();
        assert_eq!(metadata.time_changes[0].bpm, 150.0);
    }

    #[test]
    fn test_latest_input_is_returned_unchanged() {
        let registry = SchemaRegistry::standard();
        let doc = MetadataDocument::Latest(Metadata::new("Test", "Kawai Sprite", "default"));
        let pack = Converter::new(&registry).advance_to_latest(doc.clone().into()).unwrap();
        assert_eq!(pack.metadata, Some(doc));
    }

    #[test]
    fn test_supplied_metadata_wins() {
        let registry = SchemaRegistry::standard();
        let pack = SongPack::new(Some(metadata_v200()), Some(legacy_chart()));
        let out = Converter::new(&registry).convert_pack(pack).unwrap();
        assert_eq!(out.latest_metadata().unwrap().song_name, "Test (Remix)");
        assert!(out.latest_chart().is_some());
        assert_eq!(out.song_name(), Some("Test (Remix)"));
    }

    #[test]
    fn test_missing_advance_rule() {
        // A registry whose newest metadata generation is 2.1.x cannot take a
        // canonical document anywhere.
        let mut registry = SchemaRegistry::new();
        registry
            .register(Role::Metadata, VersionRange::parse("[2.1.0,2.2.0)").unwrap(), Generation::MetadataV210)
            .unwrap();
        let doc = MetadataDocument::Latest(Metadata::default());
        match Converter::new(&registry).advance_to_latest(doc.into()) {
            Err(SchemaError::MissingAdvanceRule { generation, latest, .. }) => {
                assert_eq!(generation, Generation::MetadataLatest);
                assert_eq!(latest, Generation::MetadataV210);
            }
            other => panic!("expected MissingAdvanceRule, got {:?}", other),
        }
    }

    #[test]
    fn test_hop_limit() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(Role::Metadata, VersionRange::parse("[2.2.0,2.3.0)").unwrap(), Generation::MetadataLatest)
            .unwrap();
        // Two hops are needed but only one generation is registered
        match Converter::new(&registry).advance_to_latest(metadata_v200().into()) {
            Err(SchemaError::ConversionLoop { generation, limit }) => {
                assert_eq!(generation, Generation::MetadataV210);
                assert_eq!(limit, 1);
            }
            other => panic!("expected ConversionLoop, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = SchemaRegistry::new();
        let err = Converter::new(&registry)
            .advance_to_latest(legacy_chart().into())
            .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyRegistry(Role::ChartData)));
    }
}
