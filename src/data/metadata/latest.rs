//! Canonical song metadata (2.2.x)
//!
//! Everything needed to list a song and load its assets lives here; data that
//! is only needed in-game belongs to the chart.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

use crate::codec::{self, Extension, Field, Omit, Record};
use crate::error::{Result, SchemaError};
use crate::schema::Generation;
use crate::version::SchemaVersion;

/// Stamp written into `generatedBy` for documents this crate creates
pub const GENERATED_BY: &str = concat!("funkin-schemas v", env!("CARGO_PKG_VERSION"));

/// Unit of `timeChanges[].timeStamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    Milliseconds,
    Float,
    Ticks,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::Milliseconds => "ms",
            TimeFormat::Float => "float",
            TimeFormat::Ticks => "ticks",
        }
    }

    /// Parse a time format, ignoring case
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "ms" => Some(TimeFormat::Milliseconds),
            "float" => Some(TimeFormat::Float),
            "ticks" => Some(TimeFormat::Ticks),
            _ => None,
        }
    }

    pub(crate) fn read(field: &str, value: Value) -> Result<Self> {
        let raw = codec::string(field, value)?;
        Self::parse(&raw)
            .ok_or_else(|| SchemaError::invalid_field(field, format!("unknown time format '{}'", raw)))
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Song metadata, canonical generation
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    version: SchemaVersion,
    pub song_name: String,
    pub artist: String,
    pub charter: Option<String>,
    pub divisions: Option<i64>,
    pub looped: bool,
    pub offsets: Offsets,
    pub play_data: PlayData,
    pub generated_by: String,
    pub time_format: TimeFormat,
    pub time_changes: Vec<TimeChange>,
    /// Variation id; read from input but never written
    pub variation: String,
    pub extension: Extension,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: Generation::MetadataLatest.default_version(),
            song_name: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            charter: None,
            divisions: None,
            looped: false,
            offsets: Offsets::default(),
            play_data: PlayData::default(),
            generated_by: GENERATED_BY.to_string(),
            time_format: TimeFormat::Milliseconds,
            time_changes: Vec::new(),
            variation: "default".to_string(),
            extension: Extension::new(),
        }
    }
}

impl Metadata {
    /// A fresh song with one 100 BPM time change and the default cast
    pub fn new(song_name: impl Into<String>, artist: impl Into<String>, variation: impl Into<String>) -> Self {
        Self {
            song_name: song_name.into(),
            artist: artist.into(),
            variation: variation.into(),
            time_changes: vec![TimeChange::new(0.0, 100.0)],
            play_data: PlayData {
                characters: CharacterData::new("bf", "gf", "dad"),
                ..PlayData::default()
            },
            ..Self::default()
        }
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }
}

impl Record for Metadata {
    const FIELDS: &'static [Field] = &[
        Field::new("version").immutable(),
        Field::new("songName"),
        Field::new("artist"),
        Field::new("charter").omit(Omit::IfNull),
        Field::new("divisions").omit(Omit::IfNull),
        Field::new("looped"),
        Field::new("offsets"),
        Field::new("playData"),
        Field::new("generatedBy"),
        Field::new("timeFormat"),
        Field::new("timeChanges"),
        Field::new("variation").omit(Omit::Always),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "version" => self.version = codec::version(name, value)?,
            "songName" => self.song_name = codec::string(name, value)?,
            "artist" => self.artist = codec::string(name, value)?,
            "charter" => self.charter = codec::optional(name, value, codec::string)?,
            "divisions" => self.divisions = codec::optional(name, value, codec::int)?,
            "looped" => self.looped = codec::boolean(name, value)?,
            "offsets" => self.offsets = codec::record(name, value)?,
            "playData" => self.play_data = codec::record(name, value)?,
            "generatedBy" => self.generated_by = codec::string(name, value)?,
            "timeFormat" => self.time_format = TimeFormat::read(name, value)?,
            "timeChanges" => self.time_changes = codec::records(name, value)?,
            "variation" => self.variation = codec::string(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "version" => Value::from(self.version.version_string()),
            "songName" => Value::from(self.song_name.clone()),
            "artist" => Value::from(self.artist.clone()),
            "charter" => Value::from(self.charter.clone()),
            "divisions" => Value::from(self.divisions),
            "looped" => Value::from(self.looped),
            "offsets" => codec::encode(&self.offsets),
            "playData" => codec::encode(&self.play_data),
            "generatedBy" => Value::from(self.generated_by.clone()),
            "timeFormat" => Value::from(self.time_format.as_str()),
            "timeChanges" => codec::records_value(&self.time_changes),
            "variation" => Value::from(self.variation.clone()),
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

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SongMetadata({} by {}, variation {})",
            self.song_name, self.artist, self.variation
        )
    }
}

/// Gameplay-facing song data
#[derive(Debug, Clone, PartialEq)]
pub struct PlayData {
    pub song_variations: Vec<String>,
    pub difficulties: Vec<String>,
    pub characters: CharacterData,
    pub stage: String,
    pub note_style: String,
    /// Difficulty rating per difficulty id
    pub ratings: IndexMap<String, i64>,
    pub album: Option<String>,
    pub sticker_pack: Option<String>,
    /// Freeplay preview window, in milliseconds
    pub preview_start: i64,
    pub preview_end: i64,
    pub extension: Extension,
}

/// Default end of the freeplay preview window, in milliseconds
pub const DEFAULT_PREVIEW_END: i64 = 15_000;

impl Default for PlayData {
    fn default() -> Self {
        Self {
            song_variations: Vec::new(),
            difficulties: Vec::new(),
            characters: CharacterData::default(),
            stage: "mainStage".to_string(),
            note_style: "funkin".to_string(),
            ratings: IndexMap::new(),
            album: None,
            sticker_pack: None,
            preview_start: 0,
            preview_end: DEFAULT_PREVIEW_END,
            extension: Extension::new(),
        }
    }
}

impl Record for PlayData {
    const FIELDS: &'static [Field] = &[
        Field::new("songVariations"),
        Field::new("difficulties"),
        Field::new("characters"),
        Field::new("stage"),
        Field::new("noteStyle"),
        Field::new("ratings"),
        Field::new("album").omit(Omit::IfNull),
        Field::new("stickerPack").omit(Omit::IfNull),
        Field::new("previewStart"),
        Field::new("previewEnd"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "songVariations" => {
                self.song_variations = codec::optional(name, value, codec::typed)?.unwrap_or_default()
            }
            "difficulties" => self.difficulties = codec::typed(name, value)?,
            "characters" => self.characters = codec::record(name, value)?,
            "stage" => self.stage = codec::string(name, value)?,
            "noteStyle" => self.note_style = codec::string(name, value)?,
            "ratings" => self.ratings = codec::typed(name, value)?,
            "album" => self.album = codec::optional(name, value, codec::string)?,
            "stickerPack" => self.sticker_pack = codec::optional(name, value, codec::string)?,
            "previewStart" => self.preview_start = codec::int(name, value)?,
            "previewEnd" => self.preview_end = codec::int(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "songVariations" => codec::strings(&self.song_variations),
            "difficulties" => codec::strings(&self.difficulties),
            "characters" => codec::encode(&self.characters),
            "stage" => Value::from(self.stage.clone()),
            "noteStyle" => Value::from(self.note_style.clone()),
            "ratings" => codec::int_map(&self.ratings),
            "album" => Value::from(self.album.clone()),
            "stickerPack" => Value::from(self.sticker_pack.clone()),
            "previewStart" => Value::from(self.preview_start),
            "previewEnd" => Value::from(self.preview_end),
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

/// The cast and audio tracks of a song
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterData {
    pub player: String,
    pub girlfriend: String,
    pub opponent: String,
    pub instrumental: String,
    pub alt_instrumentals: Option<Vec<String>>,
    pub opponent_vocals: Option<Vec<String>>,
    pub player_vocals: Option<Vec<String>>,
    pub extension: Extension,
}

impl CharacterData {
    pub fn new(player: impl Into<String>, girlfriend: impl Into<String>, opponent: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            girlfriend: girlfriend.into(),
            opponent: opponent.into(),
            ..Self::default()
        }
    }

    /// Vocal tracks for the player; the player's own id when unset
    pub fn player_vocals(&self) -> Vec<String> {
        self.player_vocals
            .clone()
            .unwrap_or_else(|| vec![self.player.clone()])
    }

    /// Vocal tracks for the opponent; the opponent's own id when unset
    pub fn opponent_vocals(&self) -> Vec<String> {
        self.opponent_vocals
            .clone()
            .unwrap_or_else(|| vec![self.opponent.clone()])
    }
}

impl Record for CharacterData {
    const FIELDS: &'static [Field] = &[
        Field::new("player"),
        Field::new("girlfriend"),
        Field::new("opponent"),
        Field::new("instrumental").omit(Omit::IfEmpty),
        Field::new("altInstrumentals").omit(Omit::IfNull),
        Field::new("opponentVocals").omit(Omit::IfNull),
        Field::new("playerVocals").omit(Omit::IfNull),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "player" => self.player = codec::string(name, value)?,
            "girlfriend" => self.girlfriend = codec::string(name, value)?,
            "opponent" => self.opponent = codec::string(name, value)?,
            "instrumental" => self.instrumental = codec::string(name, value)?,
            "altInstrumentals" => self.alt_instrumentals = codec::optional(name, value, codec::typed)?,
            "opponentVocals" => self.opponent_vocals = codec::optional(name, value, codec::typed)?,
            "playerVocals" => self.player_vocals = codec::optional(name, value, codec::typed)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "player" => Value::from(self.player.clone()),
            "girlfriend" => Value::from(self.girlfriend.clone()),
            "opponent" => Value::from(self.opponent.clone()),
            "instrumental" => Value::from(self.instrumental.clone()),
            "altInstrumentals" => Value::from(self.alt_instrumentals.clone()),
            "opponentVocals" => Value::from(self.opponent_vocals.clone()),
            "playerVocals" => Value::from(self.player_vocals.clone()),
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

/// Audio offsets relative to the chart, in milliseconds
///
/// Vocal offsets are applied on top of the instrumental offset. These correct
/// the song's assets, not the player's hardware latency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Offsets {
    /// Negative starts the instrumental earlier than the chart
    pub instrumental: f64,
    /// Per alternate instrumental, replacing `instrumental`
    pub alt_instrumentals: IndexMap<String, f64>,
    /// Per character id
    pub vocals: IndexMap<String, f64>,
    /// Per character id, then per alternate instrumental
    pub alt_vocals: IndexMap<String, IndexMap<String, f64>>,
    pub extension: Extension,
}

impl Offsets {
    /// Offset of the base instrumental, or of an alternate one when named
    pub fn instrumental_offset(&self, instrumental: Option<&str>) -> f64 {
        match instrumental {
            Some(id) if !id.is_empty() => self
                .alt_instrumentals
                .get(id)
                .copied()
                .unwrap_or(self.instrumental),
            _ => self.instrumental,
        }
    }

    pub fn set_instrumental_offset(&mut self, offset: f64, instrumental: Option<&str>) {
        match instrumental {
            Some(id) if !id.is_empty() => {
                self.alt_instrumentals.insert(id.to_string(), offset);
            }
            _ => self.instrumental = offset,
        }
    }

    /// Vocal offset of a character, optionally against an alternate instrumental
    pub fn vocal_offset(&self, character: &str, instrumental: Option<&str>) -> f64 {
        match instrumental {
            Some(id) if !id.is_empty() => self
                .alt_vocals
                .get(character)
                .and_then(|per_inst| per_inst.get(id))
                .copied()
                .unwrap_or(0.0),
            _ => self.vocals.get(character).copied().unwrap_or(0.0),
        }
    }

    pub fn set_vocal_offset(&mut self, character: impl Into<String>, offset: f64) {
        self.vocals.insert(character.into(), offset);
    }
}

impl Record for Offsets {
    const FIELDS: &'static [Field] = &[
        Field::new("instrumental"),
        Field::new("altInstrumentals").omit(Omit::IfEmpty),
        Field::new("vocals").omit(Omit::IfEmpty),
        Field::new("altVocals").omit(Omit::IfEmpty),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "instrumental" => self.instrumental = codec::float(name, value)?,
            "altInstrumentals" => self.alt_instrumentals = codec::typed(name, value)?,
            "vocals" => self.vocals = codec::typed(name, value)?,
            "altVocals" => self.alt_vocals = codec::typed(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "instrumental" => codec::number(self.instrumental),
            "altInstrumentals" => codec::number_map(&self.alt_instrumentals),
            "vocals" => codec::number_map(&self.vocals),
            "altVocals" => Value::Object(
                self.alt_vocals
                    .iter()
                    .map(|(character, per_inst)| (character.clone(), codec::number_map(per_inst)))
                    .collect(),
            ),
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

/// Beat subdivisions used when a time change does not specify any
pub const DEFAULT_BEAT_TUPLETS: [i64; 4] = [4, 4, 4, 4];

/// Timestamp meaning "from the start of the song"
pub const SONG_START: f64 = -1.0;

/// A tempo / time-signature change
///
/// Shared by every metadata generation; the shape never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeChange {
    /// Position in the song's `timeFormat`
    pub time_stamp: f64,
    /// Position in beats
    pub beat_time: Option<f64>,
    /// Quarter notes per minute
    pub bpm: f64,
    pub time_signature_num: i64,
    /// Should be a power of two
    pub time_signature_den: i64,
    /// Steps each beat is divided into
    pub beat_tuplets: Vec<i64>,
    pub extension: Extension,
}

impl Default for TimeChange {
    fn default() -> Self {
        Self {
            time_stamp: 0.0,
            beat_time: None,
            bpm: 0.0,
            time_signature_num: 4,
            time_signature_den: 4,
            beat_tuplets: DEFAULT_BEAT_TUPLETS.to_vec(),
            extension: Extension::new(),
        }
    }
}

impl TimeChange {
    /// A 4/4 time change at `time_stamp`
    pub fn new(time_stamp: f64, bpm: f64) -> Self {
        Self {
            time_stamp,
            bpm,
            ..Self::default()
        }
    }
}

impl Record for TimeChange {
    const FIELDS: &'static [Field] = &[
        Field::new("timeStamp").alias(&["t"]),
        Field::new("beatTime").alias(&["b"]).omit(Omit::IfNull),
        Field::new("bpm"),
        Field::new("timeSignatureNum").alias(&["n"]).omit(Omit::IfDefault),
        Field::new("timeSignatureDen").alias(&["d"]).omit(Omit::IfDefault),
        Field::new("beatTuplets").alias(&["bt"]).omit(Omit::IfDefault),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "timeStamp" => self.time_stamp = codec::float(name, value)?,
            "beatTime" => self.beat_time = codec::optional(name, value, codec::float)?,
            "bpm" => self.bpm = codec::float(name, value)?,
            "timeSignatureNum" => self.time_signature_num = codec::int(name, value)?,
            "timeSignatureDen" => self.time_signature_den = codec::int(name, value)?,
            "beatTuplets" => self.beat_tuplets = codec::ints(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "timeStamp" => codec::number(self.time_stamp),
            "beatTime" => codec::optional_number(self.beat_time),
            "bpm" => codec::number(self.bpm),
            "timeSignatureNum" => Value::from(self.time_signature_num),
            "timeSignatureDen" => Value::from(self.time_signature_den),
            "beatTuplets" => Value::from(self.beat_tuplets.clone()),
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

impl fmt::Display for TimeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SongTimeChange({}ms, {}bpm)", self.time_stamp, self.bpm)
    }
}
