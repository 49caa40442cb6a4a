//! Legacy combined chart (1.x)
//!
//! One file per difficulty, with the song's metadata embedded in the `song`
//! record and notes stored as positional arrays grouped into sections.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

use super::latest::{ChartData, NoteData, NoteParam};
use crate::codec::legacy::{self, LegacyNote};
use crate::codec::{self, Extension, Field, Omit, Record};
use crate::convert::ConversionOptions;
use crate::data::metadata::latest::{CharacterData, Metadata, TimeChange, SONG_START};
use crate::error::Result;
use crate::schema::Generation;
use crate::version::SchemaVersion;

/// Divisions stamped on metadata synthesized from a legacy chart
pub const LEGACY_DIVISIONS: i64 = 96;

/// Rating given to the single converted difficulty
pub const LEGACY_RATING: i64 = 1;

/// Name of the note parameter that carries a legacy note's custom slot
pub const LEGACY_PARAM: &str = "parameter";

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    version: SchemaVersion,
    /// Whether the input carried a `version` key; the implicit 1.0.0 is not written
    explicit_version: bool,
    pub song: LegacySong,
    pub extension: Extension,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            version: Generation::ChartV100.default_version(),
            explicit_version: false,
            song: LegacySong::default(),
            extension: Extension::new(),
        }
    }
}

impl Record for Chart {
    const FIELDS: &'static [Field] = &[
        Field::new("version").immutable().omit(Omit::IfNull),
        Field::new("song"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "version" => {
                self.version = codec::version(name, value)?;
                self.explicit_version = true;
            }
            "song" => self.song = codec::record(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "version" if self.explicit_version => Value::from(self.version.version_string()),
            "song" => codec::encode(&self.song),
            _ => Value::Null,
        }
    }

    fn extension(&self) -> &Extension {
        &self.extension
    }

    fn extension_mut(&mut self) -> &mut Extension {
        &mut self.extension
    }
}

impl Chart {
    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Split into canonical metadata and chart
    ///
    /// Every note lands in a single difficulty bucket
    /// (`options.legacy_difficulty`), ordered by time. `needsVoices` and the
    /// per-section flags have no canonical counterpart and are dropped. The
    /// legacy `offset` becomes the instrumental offset, and the synthesized
    /// time change carries no `beatTime`.
    pub fn advance(&self, options: &ConversionOptions) -> (Metadata, ChartData) {
        let song = &self.song;
        let difficulty = options.legacy_difficulty.clone();

        tracing::debug!(
            song = %song.song,
            sections = song.sections.len(),
            needs_voices = song.needs_voices,
            "dropping legacy section layout"
        );

        let mut metadata = Metadata::default();
        metadata.song_name = song.song.clone();
        metadata.divisions = Some(LEGACY_DIVISIONS);
        metadata.variation = options.legacy_variation.clone();
        metadata.generated_by = options.generated_by.clone();
        metadata.offsets.instrumental = song.offset;
        metadata.time_changes = vec![TimeChange::new(SONG_START, song.bpm)];
        metadata.play_data.song_variations = vec![options.legacy_variation.clone()];
        metadata.play_data.difficulties = vec![difficulty.clone()];
        metadata.play_data.characters =
            CharacterData::new(song.player1.clone(), song.gf_version.clone(), song.player2.clone());
        metadata.play_data.stage = song.stage.clone();
        metadata.play_data.note_style = options.note_style.clone();
        metadata.play_data.ratings = IndexMap::from([(difficulty.clone(), LEGACY_RATING)]);
        metadata.extension = codec::forward_extension::<Metadata>(&song.extension);

        let mut notes: Vec<NoteData> = song
            .sections
            .iter()
            .flat_map(|section| section.notes.iter())
            .map(convert_note)
            .collect();
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut chart = ChartData::default();
        chart.scroll_speed = IndexMap::from([(difficulty.clone(), song.speed)]);
        chart.notes = IndexMap::from([(difficulty, notes)]);
        chart.generated_by = options.generated_by.clone();
        chart.variation = options.legacy_variation.clone();
        chart.extension = codec::forward_extension::<ChartData>(&self.extension);

        (metadata, chart)
    }
}

fn convert_note(note: &LegacyNote) -> NoteData {
    NoteData {
        params: note
            .custom
            .iter()
            .map(|custom| NoteParam::new(LEGACY_PARAM, custom.clone()))
            .collect(),
        ..NoteData::new(note.time, note.code, note.length)
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.song.fmt(f)
    }
}

/// The `song` record of a legacy chart
#[derive(Debug, Clone, PartialEq)]
pub struct LegacySong {
    pub song: String,
    pub bpm: f64,
    pub speed: f64,
    /// Instrumental offset in milliseconds
    pub offset: f64,
    pub needs_voices: bool,
    pub stage: String,
    pub player1: String,
    pub player2: String,
    pub gf_version: String,
    pub sections: Vec<Section>,
    pub extension: Extension,
}

impl Default for LegacySong {
    fn default() -> Self {
        Self {
            song: String::new(),
            bpm: 120.0,
            speed: 2.0,
            offset: 0.0,
            needs_voices: true,
            stage: "stage".to_string(),
            player1: "bf".to_string(),
            player2: "dad".to_string(),
            gf_version: "gf".to_string(),
            sections: Vec::new(),
            extension: Extension::new(),
        }
    }
}

impl Record for LegacySong {
    const FIELDS: &'static [Field] = &[
        Field::new("song"),
        Field::new("bpm"),
        Field::new("speed"),
        Field::new("offset"),
        Field::new("needsVoices"),
        Field::new("stage"),
        Field::new("player1"),
        Field::new("player2"),
        Field::new("gfVersion").alias(&["player3"]),
        Field::new("notes"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "song" => self.song = codec::string(name, value)?,
            "bpm" => self.bpm = codec::float(name, value)?,
            "speed" => self.speed = codec::float(name, value)?,
            "offset" => self.offset = codec::float(name, value)?,
            "needsVoices" => self.needs_voices = codec::boolean(name, value)?,
            // A null character or stage slot keeps the default
            "stage" => keep_default(&mut self.stage, name, value)?,
            "player1" => keep_default(&mut self.player1, name, value)?,
            "player2" => keep_default(&mut self.player2, name, value)?,
            "gfVersion" => keep_default(&mut self.gf_version, name, value)?,
            "notes" => self.sections = codec::records(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "song" => Value::from(self.song.clone()),
            "bpm" => codec::number(self.bpm),
            "speed" => codec::number(self.speed),
            "offset" => codec::number(self.offset),
            "needsVoices" => Value::from(self.needs_voices),
            "stage" => Value::from(self.stage.clone()),
            "player1" => Value::from(self.player1.clone()),
            "player2" => Value::from(self.player2.clone()),
            "gfVersion" => Value::from(self.gf_version.clone()),
            "notes" => codec::records_value(&self.sections),
            _ => Value::Null,
        }
    }

    fn extension(&self) -> &Extension {
        &self.extension
    }

    fn extension_mut(&mut self) -> &mut Extension {
        &mut self.extension
    }
}

fn keep_default(slot: &mut String, name: &str, value: Value) -> Result<()> {
    if let Some(value) = codec::optional(name, value, codec::string)? {
        *slot = value;
    }
    Ok(())
}

impl fmt::Display for LegacySong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SongChart[LEGACY:1.0.0](\"{}\", {}bpm, {} speed, \"{}\", {} sections)",
            self.song,
            self.bpm,
            self.speed,
            self.stage,
            self.sections.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub notes: Vec<LegacyNote>,
    pub section_beats: f64,
    pub must_hit_section: bool,
    pub extension: Extension,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            section_beats: 4.0,
            must_hit_section: true,
            extension: Extension::new(),
        }
    }
}

impl Record for Section {
    const FIELDS: &'static [Field] = &[
        Field::new("sectionNotes"),
        Field::new("sectionBeats"),
        Field::new("mustHitSection"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "sectionNotes" => self.notes = legacy::decode_notes(name, value)?,
            "sectionBeats" => self.section_beats = codec::float(name, value)?,
            "mustHitSection" => self.must_hit_section = codec::boolean(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "sectionNotes" => legacy::encode_notes(&self.notes),
            "sectionBeats" => codec::number(self.section_beats),
            "mustHitSection" => Value::from(self.must_hit_section),
            _ => Value::Null,
        }
    }

    fn extension(&self) -> &Extension {
        &self.extension
    }

    fn extension_mut(&mut self) -> &mut Extension {
        &mut self.extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Chart {
        codec::decode(json!({
            "song": {
                "song": "Test",
                "bpm": 150,
                "speed": 1.5,
                "player1": "bf",
                "player2": "dad",
                "player3": "gf",
                "stage": "mainStage",
                "needsVoices": true,
                "offset": -12.5,
                "validScore": true,
                "notes": [
                    {"sectionNotes": [[1500, 4, 0], [1000, 1, 250, "Hurt Note"]], "mustHitSection": false},
                    {"sectionNotes": [[500, 0, 0]], "lengthInSteps": 16}
                ]
            },
            "bpmChanges": []
        }))
        .unwrap()
    }

    #[test]
    fn test_player3_is_girlfriend_alias() {
        let chart = sample();
        assert_eq!(chart.song.gf_version, "gf");
        assert!(chart.song.extension.get("player3").is_none());
        assert_eq!(chart.version(), &SchemaVersion::new(1, 0, 0));
    }

    #[test]
    fn test_encode_omits_implicit_version() {
        let out = codec::encode(&sample());
        assert!(out.get("version").is_none());
        assert_eq!(out["song"]["gfVersion"], json!("gf"));
        assert_eq!(out["song"]["notes"][1]["lengthInSteps"], json!(16));
        assert_eq!(out["bpmChanges"], json!([]));
    }

    #[test]
    fn test_explicit_version_is_written_back() {
        let chart: Chart = codec::decode(json!({"version": "1.0.0", "song": {"song": "Test"}})).unwrap();
        let out = codec::encode(&chart);
        assert_eq!(out["version"], json!("1.0.0"));
        assert_eq!(out.as_object().unwrap().keys().next().map(String::as_str), Some("version"));
    }

    #[test]
    fn test_null_character_slots_keep_defaults() {
        let chart: Chart = codec::decode(json!({
            "song": {
                "song": "Old",
                "bpm": 100,
                "player1": null,
                "player2": "pico",
                "player3": null,
                "stage": null,
                "notes": []
            }
        }))
        .unwrap();
        assert_eq!(chart.song.gf_version, "gf");
        assert_eq!(chart.song.player1, "bf");
        assert_eq!(chart.song.player2, "pico");
        assert_eq!(chart.song.stage, "stage");

        let (metadata, _) = chart.advance(&ConversionOptions::default());
        assert_eq!(metadata.play_data.characters.girlfriend, "gf");
    }

    #[test]
    fn test_advance_flattens_and_sorts_notes() {
        let (metadata, chart) = sample().advance(&ConversionOptions::default());

        let notes = chart.notes_for("normal");
        let times: Vec<f64> = notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![500.0, 1000.0, 1500.0]);
        assert_eq!(notes[1].params, vec![NoteParam::new(LEGACY_PARAM, json!("Hurt Note"))]);
        assert_eq!(notes[1].length, 250.0);
        assert_eq!(chart.scroll_speed_for("normal"), 1.5);
        assert!(chart.events.is_empty());
        assert_eq!(chart.extension.get("bpmChanges"), Some(&json!([])));

        assert_eq!(metadata.song_name, "Test");
        assert_eq!(metadata.offsets.instrumental, -12.5);
        assert_eq!(metadata.time_changes, vec![TimeChange::new(SONG_START, 150.0)]);
        assert_eq!(metadata.play_data.ratings.get("normal"), Some(&1));
        assert_eq!(metadata.play_data.difficulties, vec!["normal".to_string()]);
        assert_eq!(metadata.extension.get("validScore"), Some(&json!(true)));
    }

    #[test]
    fn test_advance_uses_configured_difficulty() {
        let options = ConversionOptions {
            legacy_difficulty: "hard".to_string(),
            ..ConversionOptions::default()
        };
        let (metadata, chart) = sample().advance(&options);
        assert_eq!(chart.difficulties().collect::<Vec<_>>(), vec!["hard"]);
        assert_eq!(metadata.play_data.ratings.get("hard"), Some(&1));
    }
}
