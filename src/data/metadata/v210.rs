//! Metadata 2.1.x

use serde_json::Value;

use super::latest::{self, CharacterData};
use super::{LegacyMetadata, LegacyPlayData};
use crate::codec::{self, Extension, Field, Record};
use crate::error::Result;
use crate::schema::Generation;

pub type Metadata = LegacyMetadata<PlayData>;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayData {
    pub song_variations: Vec<String>,
    pub difficulties: Vec<String>,
    pub characters: CharacterData,
    pub stage: String,
    /// Renamed to `noteStyle` in 2.2.0
    pub note_skin: String,
    pub extension: Extension,
}

impl Default for PlayData {
    fn default() -> Self {
        Self {
            song_variations: Vec::new(),
            difficulties: Vec::new(),
            characters: CharacterData::default(),
            stage: "mainStage".to_string(),
            note_skin: "funkin".to_string(),
            extension: Extension::new(),
        }
    }
}

impl LegacyPlayData for PlayData {
    const GENERATION: Generation = Generation::MetadataV210;
}

impl Record for PlayData {
    const FIELDS: &'static [Field] = &[
        Field::new("songVariations"),
        Field::new("difficulties"),
        Field::new("characters"),
        Field::new("stage"),
        Field::new("noteSkin"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "songVariations" => {
                self.song_variations = codec::optional(name, value, codec::typed)?.unwrap_or_default()
            }
            "difficulties" => self.difficulties = codec::typed(name, value)?,
            "characters" => self.characters = codec::record(name, value)?,
            "stage" => self.stage = codec::string(name, value)?,
            "noteSkin" => self.note_skin = codec::string(name, value)?,
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
            "noteSkin" => Value::from(self.note_skin.clone()),
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

impl PlayData {
    /// `noteSkin` becomes `noteStyle`; ratings, album and preview window take their defaults
    pub fn advance(&self) -> latest::PlayData {
        latest::PlayData {
            song_variations: self.song_variations.clone(),
            difficulties: self.difficulties.clone(),
            characters: self.characters.clone(),
            stage: self.stage.clone(),
            note_style: self.note_skin.clone(),
            extension: codec::forward_extension::<latest::PlayData>(&self.extension),
            ..latest::PlayData::default()
        }
    }
}

impl Metadata {
    /// Convert to the canonical generation; offsets start at zero
    pub fn advance(&self) -> latest::Metadata {
        let mut next = latest::Metadata::default();
        next.song_name = self.song_name.clone();
        next.artist = self.artist.clone();
        next.charter = self.charter.clone();
        next.divisions = self.divisions;
        next.looped = self.looped;
        next.play_data = self.play_data.advance();
        next.generated_by = self.generated_by.clone();
        next.time_format = self.time_format;
        next.time_changes = self.time_changes.clone();
        next.variation = self.variation.clone();
        next.extension = codec::forward_extension::<latest::Metadata>(&self.extension);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SchemaVersion;
    use serde_json::json;

    #[test]
    fn test_advance_renames_note_skin_and_fills_defaults() {
        let metadata: Metadata = codec::decode(json!({
            "version": "2.1.0",
            "songName": "Bopeebo",
            "artist": "Kawai Sprite",
            "playData": {
                "difficulties": ["easy", "normal", "hard"],
                "characters": {"player": "bf", "girlfriend": "gf", "opponent": "dad"},
                "stage": "mainStage",
                "noteSkin": "pixel"
            },
            "timeChanges": [{"t": 0, "bpm": 100}]
        }))
        .unwrap();

        let latest = metadata.advance();
        assert_eq!(latest.version(), &SchemaVersion::new(2, 2, 4));
        assert_eq!(latest.play_data.note_style, "pixel");
        assert!(latest.play_data.ratings.is_empty());
        assert_eq!(latest.play_data.album, None);
        assert_eq!(latest.play_data.preview_start, 0);
        assert_eq!(latest.play_data.preview_end, 15_000);
        assert_eq!(latest.offsets.instrumental, 0.0);
        assert_eq!(latest.time_changes[0].bpm, 100.0);

        let out = codec::encode(&latest);
        assert_eq!(out["playData"]["noteStyle"], json!("pixel"));
        assert!(out["playData"].get("noteSkin").is_none());
    }

    #[test]
    fn test_extension_data_is_forwarded() {
        let metadata: Metadata = codec::decode(json!({
            "version": "2.1.0",
            "playData": {"noteSkin": "funkin", "editorColor": "#ff0000"},
            "editorSettings": {"snap": 16}
        }))
        .unwrap();

        let latest = metadata.advance();
        assert_eq!(latest.extension.get("editorSettings"), Some(&json!({"snap": 16})));
        assert_eq!(latest.play_data.extension.get("editorColor"), Some(&json!("#ff0000")));
    }
}
