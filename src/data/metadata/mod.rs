//! Song metadata generations
//!
//! | Generation | Versions          | Character shape                 |
//! |------------|-------------------|---------------------------------|
//! | 2.0.x      | `[2.0.0, 2.1.0)`  | `playableChars` keyed by player |
//! | 2.1.x      | `[2.1.0, 2.2.0)`  | single `characters` record      |
//! | latest     | `[2.2.0, 2.3.0)`  | single `characters` record      |

pub mod latest;
pub mod v200;
pub mod v210;

use serde_json::{Map, Value};
use std::fmt;

use crate::codec::{self, Extension, Field, Omit, Record};
use crate::error::{Result, SchemaError};
use crate::schema::Generation;
use crate::version::SchemaVersion;

pub use latest::{CharacterData, Metadata, Offsets, PlayData, TimeChange, TimeFormat};

/// Play data of a pre-2.2 metadata generation
pub trait LegacyPlayData: Record + fmt::Debug + PartialEq {
    /// Generation whose metadata carries this play data
    const GENERATION: Generation;
}

/// Metadata shape shared by 2.0.x and 2.1.x
///
/// Both predate offsets, ratings, albums and the preview window; they only
/// differ in their play data.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMetadata<P> {
    version: SchemaVersion,
    pub song_name: String,
    pub artist: String,
    pub charter: Option<String>,
    pub divisions: Option<i64>,
    pub looped: bool,
    pub play_data: P,
    pub generated_by: String,
    pub time_format: TimeFormat,
    pub time_changes: Vec<TimeChange>,
    pub variation: String,
    pub extension: Extension,
}

impl<P: LegacyPlayData> Default for LegacyMetadata<P> {
    fn default() -> Self {
        Self {
            version: P::GENERATION.default_version(),
            song_name: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            charter: None,
            divisions: None,
            looped: false,
            play_data: P::default(),
            generated_by: latest::GENERATED_BY.to_string(),
            time_format: TimeFormat::Milliseconds,
            time_changes: Vec::new(),
            variation: "default".to_string(),
            extension: Extension::new(),
        }
    }
}

impl<P: LegacyPlayData> LegacyMetadata<P> {
    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Move the shared fields into the next generation, stamping its default version
    pub(crate) fn carry<Q: LegacyPlayData>(&self, play_data: Q) -> LegacyMetadata<Q> {
        LegacyMetadata {
            version: Q::GENERATION.default_version(),
            song_name: self.song_name.clone(),
            artist: self.artist.clone(),
            charter: self.charter.clone(),
            divisions: self.divisions,
            looped: self.looped,
            play_data,
            generated_by: self.generated_by.clone(),
            time_format: self.time_format,
            time_changes: self.time_changes.clone(),
            variation: self.variation.clone(),
            extension: codec::forward_extension::<LegacyMetadata<Q>>(&self.extension),
        }
    }
}

impl<P: LegacyPlayData> Record for LegacyMetadata<P> {
    const FIELDS: &'static [Field] = &[
        Field::new("version").immutable(),
        Field::new("songName"),
        Field::new("artist"),
        Field::new("charter").omit(Omit::IfNull),
        Field::new("divisions").omit(Omit::IfNull),
        Field::new("looped"),
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

impl<P: LegacyPlayData> fmt::Display for LegacyMetadata<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SongMetadata[LEGACY:v{}]({} by {}, variation {})",
            P::GENERATION.default_version(),
            self.song_name,
            self.artist,
            self.variation
        )
    }
}

/// A decoded metadata document of any registered generation
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataDocument {
    V200(v200::Metadata),
    V210(v210::Metadata),
    Latest(Metadata),
}

impl MetadataDocument {
    /// Decode `object` as the given generation
    pub fn decode(generation: Generation, object: Map<String, Value>) -> Result<Self> {
        match generation {
            Generation::MetadataV200 => codec::decode_object(object).map(Self::V200),
            Generation::MetadataV210 => codec::decode_object(object).map(Self::V210),
            Generation::MetadataLatest => codec::decode_object(object).map(Self::Latest),
            other => Err(SchemaError::RoleMismatch {
                role: crate::schema::Role::Metadata,
                generation: other,
            }),
        }
    }

    pub fn encode(&self) -> Value {
        match self {
            Self::V200(metadata) => codec::encode(metadata),
            Self::V210(metadata) => codec::encode(metadata),
            Self::Latest(metadata) => codec::encode(metadata),
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::V200(_) => Generation::MetadataV200,
            Self::V210(_) => Generation::MetadataV210,
            Self::Latest(_) => Generation::MetadataLatest,
        }
    }

    pub fn version(&self) -> &SchemaVersion {
        match self {
            Self::V200(metadata) => metadata.version(),
            Self::V210(metadata) => metadata.version(),
            Self::Latest(metadata) => metadata.version(),
        }
    }

    pub fn song_name(&self) -> &str {
        match self {
            Self::V200(metadata) => &metadata.song_name,
            Self::V210(metadata) => &metadata.song_name,
            Self::Latest(metadata) => &metadata.song_name,
        }
    }

    /// Convert one generation forward; `None` once canonical
    pub fn advance(&self) -> Option<MetadataDocument> {
        match self {
            Self::V200(metadata) => Some(Self::V210(metadata.advance())),
            Self::V210(metadata) => Some(Self::Latest(metadata.advance())),
            Self::Latest(_) => None,
        }
    }

    pub fn into_latest(self) -> Option<Metadata> {
        match self {
            Self::Latest(metadata) => Some(metadata),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V200(metadata) => metadata.fmt(f),
            Self::V210(metadata) => metadata.fmt(f),
            Self::Latest(metadata) => metadata.fmt(f),
        }
    }
}
