//! Metadata 2.0.x
//!
//! The only structural difference from 2.1.x is `playableChars`: the cast is
//! keyed by player id, one entry per playable character.

use indexmap::IndexMap;
use serde_json::Value;

use super::latest::CharacterData;
use super::{v210, LegacyMetadata, LegacyPlayData};
use crate::codec::{self, Extension, Field, Omit, Record};
use crate::error::Result;
use crate::schema::Generation;

pub type Metadata = LegacyMetadata<PlayData>;

/// Supporting cast of one playable character
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableChar {
    pub girlfriend: String,
    pub opponent: String,
    pub instrumental: String,
    pub extension: Extension,
}

impl Default for PlayableChar {
    fn default() -> Self {
        Self {
            girlfriend: "gf".to_string(),
            opponent: "dad".to_string(),
            instrumental: String::new(),
            extension: Extension::new(),
        }
    }
}

impl PlayableChar {
    fn characters(&self, player: &str) -> CharacterData {
        CharacterData {
            instrumental: self.instrumental.clone(),
            extension: codec::forward_extension::<CharacterData>(&self.extension),
            ..CharacterData::new(player, self.girlfriend.clone(), self.opponent.clone())
        }
    }
}

impl Record for PlayableChar {
    const FIELDS: &'static [Field] = &[
        Field::new("girlfriend").alias(&["g"]),
        Field::new("opponent").alias(&["o"]),
        Field::new("inst").alias(&["i"]).omit(Omit::IfEmpty),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "girlfriend" => self.girlfriend = codec::string(name, value)?,
            "opponent" => self.opponent = codec::string(name, value)?,
            "inst" => self.instrumental = codec::string(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "girlfriend" => Value::from(self.girlfriend.clone()),
            "opponent" => Value::from(self.opponent.clone()),
            "inst" => Value::from(self.instrumental.clone()),
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

#[derive(Debug, Clone, PartialEq)]
pub struct PlayData {
    pub song_variations: Vec<String>,
    pub difficulties: Vec<String>,
    pub playable_chars: IndexMap<String, PlayableChar>,
    pub stage: String,
    pub note_skin: String,
    pub extension: Extension,
}

impl Default for PlayData {
    fn default() -> Self {
        Self {
            song_variations: Vec::new(),
            difficulties: Vec::new(),
            playable_chars: IndexMap::new(),
            stage: "mainStage".to_string(),
            note_skin: "funkin".to_string(),
            extension: Extension::new(),
        }
    }
}

impl LegacyPlayData for PlayData {
    const GENERATION: Generation = Generation::MetadataV200;
}

impl Record for PlayData {
    const FIELDS: &'static [Field] = &[
        Field::new("songVariations"),
        Field::new("difficulties"),
        Field::new("playableChars"),
        Field::new("stage"),
        Field::new("noteSkin"),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "songVariations" => {
                self.song_variations = codec::optional(name, value, codec::typed)?.unwrap_or_default()
            }
            "difficulties" => self.difficulties = codec::typed(name, value)?,
            "playableChars" => self.playable_chars = codec::record_map(name, value)?,
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
            "playableChars" => codec::record_map_value(&self.playable_chars),
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
    /// Collapse `playableChars` into one character record
    ///
    /// The first entry in document order supplies the player id; later
    /// entries are discarded. No entries yields `bf` / `gf` / `dad`.
    pub fn advance(&self) -> v210::PlayData {
        let mut entries = self.playable_chars.iter();
        let characters = match entries.next() {
            Some((player, cast)) => cast.characters(player),
            None => CharacterData::new("bf", "gf", "dad"),
        };
        let dropped: Vec<&str> = entries.map(|(player, _)| player.as_str()).collect();
        if !dropped.is_empty() {
            tracing::debug!(
                player = %characters.player,
                ?dropped,
                "discarding additional playable characters"
            );
        }

        v210::PlayData {
            song_variations: self.song_variations.clone(),
            difficulties: self.difficulties.clone(),
            characters,
            stage: self.stage.clone(),
            note_skin: self.note_skin.clone(),
            extension: codec::forward_extension::<v210::PlayData>(&self.extension),
        }
    }
}

impl Metadata {
    pub fn advance(&self) -> v210::Metadata {
        self.carry(self.play_data.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SchemaVersion;
    use serde_json::json;

    fn sample() -> Metadata {
        codec::decode(json!({
            "version": "2.0.0",
            "songName": "Spookeez",
            "artist": "Kawai Sprite",
            "playData": {
                "difficulties": ["easy", "normal", "hard"],
                "playableChars": {
                    "pico": {"g": "gf", "o": "spooky", "i": "pico"},
                    "bf": {"g": "gf", "o": "spooky"}
                },
                "stage": "spookyMansion",
                "noteSkin": "funkin"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_short_keys_are_aliases() {
        let metadata = sample();
        let pico = &metadata.play_data.playable_chars["pico"];
        assert_eq!(pico.opponent, "spooky");
        assert_eq!(pico.instrumental, "pico");
        assert!(pico.extension.is_empty());
    }

    #[test]
    fn test_first_playable_char_becomes_player() {
        let next = sample().advance();
        assert_eq!(next.version(), &SchemaVersion::new(2, 1, 0));
        let characters = &next.play_data.characters;
        assert_eq!(characters.player, "pico");
        assert_eq!(characters.girlfriend, "gf");
        assert_eq!(characters.opponent, "spooky");
        assert_eq!(characters.instrumental, "pico");
        assert_eq!(next.play_data.stage, "spookyMansion");
    }

    #[test]
    fn test_empty_playable_chars_uses_default_cast() {
        let metadata: Metadata = codec::decode(json!({"version": "2.0.0"})).unwrap();
        let characters = metadata.advance().play_data.characters;
        assert_eq!(characters, CharacterData::new("bf", "gf", "dad"));
    }

    #[test]
    fn test_encode_writes_canonical_keys() {
        let out = codec::encode(&sample());
        assert_eq!(
            out["playData"]["playableChars"]["bf"],
            json!({"girlfriend": "gf", "opponent": "spooky"})
        );
    }
}
