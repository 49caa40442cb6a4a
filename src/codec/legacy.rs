//! Positional note arrays used by 1.x charts
//!
//! A legacy note is `[time, code, length]` with an optional fourth
//! "custom data" slot. Anything past the fourth element is ignored.

use serde_json::Value;

use super::{as_int, number};
use crate::error::{Result, SchemaError};

/// A single note of a 1.x chart section
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyNote {
    /// Position in milliseconds
    pub time: f64,
    /// Lane/strum code
    pub code: i64,
    /// Sustain length in milliseconds
    pub length: f64,
    /// Opaque fourth slot (note type, alt-animation flag, ...)
    pub custom: Option<Value>,
}

impl LegacyNote {
    pub fn new(time: f64, code: i64, length: f64) -> Self {
        Self {
            time,
            code,
            length,
            custom: None,
        }
    }

    /// Decode one positional note; `index` is only used in errors
    pub fn decode(index: usize, value: Value) -> Result<Self> {
        let malformed = |reason: String| SchemaError::MalformedNote { index, reason };

        let mut items = match value {
            Value::Array(items) => items,
            other => return Err(malformed(format!("expected an array, found {}", other))),
        };
        if items.len() < 3 {
            return Err(malformed(format!(
                "expected at least 3 elements, found {}",
                items.len()
            )));
        }
        if items.len() > 4 {
            tracing::debug!(index, extra = items.len() - 4, "dropping trailing note elements");
            items.truncate(4);
        }

        let time = items[0]
            .as_f64()
            .ok_or_else(|| malformed(format!("time must be a number, found {}", items[0])))?;
        let code = as_int(&items[1])
            .ok_or_else(|| malformed(format!("code must be an integer, found {}", items[1])))?;
        let length = items[2]
            .as_f64()
            .ok_or_else(|| malformed(format!("length must be a number, found {}", items[2])))?;
        let custom = if items.len() == 4 {
            items.pop().filter(|v| !v.is_null())
        } else {
            None
        };

        Ok(Self {
            time,
            code,
            length,
            custom,
        })
    }

    /// Encode as `[time, code, length]` plus the custom slot when present
    pub fn encode(&self) -> Value {
        let mut items = vec![number(self.time), Value::from(self.code), number(self.length)];
        if let Some(custom) = &self.custom {
            items.push(custom.clone());
        }
        Value::Array(items)
    }
}

/// Decode an array of positional notes
pub fn decode_notes(field: &str, value: Value) -> Result<Vec<LegacyNote>> {
    match value {
        Value::Array(notes) => notes
            .into_iter()
            .enumerate()
            .map(|(index, note)| LegacyNote::decode(index, note))
            .collect(),
        other => Err(SchemaError::invalid_field(
            field,
            format!("expected an array of notes, found {}", other),
        )),
    }
}

/// Encode notes back into their positional form
pub fn encode_notes(notes: &[LegacyNote]) -> Value {
    Value::Array(notes.iter().map(LegacyNote::encode).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_elements_round_trip() {
        let notes = decode_notes("sectionNotes", json!([[1000, 0, 0]])).unwrap();
        assert_eq!(notes, vec![LegacyNote::new(1000.0, 0, 0.0)]);
        assert_eq!(encode_notes(&notes), json!([[1000, 0, 0]]));
    }

    #[test]
    fn test_fourth_element_is_custom_data() {
        let notes = decode_notes("sectionNotes", json!([[250.5, 3, 120, "Hurt Note"]])).unwrap();
        assert_eq!(notes[0].custom, Some(json!("Hurt Note")));
        assert_eq!(encode_notes(&notes), json!([[250.5, 3, 120, "Hurt Note"]]));
    }

    #[test]
    fn test_extra_elements_are_dropped() {
        let notes = decode_notes("sectionNotes", json!([[10, 1, 0, {"alt": true}, 9, 9]])).unwrap();
        assert_eq!(notes[0].custom, Some(json!({"alt": true})));
        assert_eq!(encode_notes(&notes), json!([[10, 1, 0, {"alt": true}]]));
    }

    #[test]
    fn test_null_custom_slot_is_absent() {
        let notes = decode_notes("sectionNotes", json!([[10, 1, 0, null]])).unwrap();
        assert_eq!(notes[0].custom, None);
        assert_eq!(encode_notes(&notes), json!([[10, 1, 0]]));
    }

    #[test]
    fn test_short_note_is_malformed() {
        let err = decode_notes("sectionNotes", json!([[10, 1, 0], [20, 1]])).unwrap_err();
        match err {
            SchemaError::MalformedNote { index, .. } => assert_eq!(index, 1),
            other => panic!("expected MalformedNote, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_code_is_rejected() {
        assert!(decode_notes("sectionNotes", json!([[10, 1.5, 0]])).is_err());
        let notes = decode_notes("sectionNotes", json!([[10, 2.0, 0]])).unwrap();
        assert_eq!(notes[0].code, 2);
    }
}
