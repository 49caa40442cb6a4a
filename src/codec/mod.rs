//! Field codec
//!
//! Every schema record describes its JSON shape with a static field table
//! ([`Record::FIELDS`]). The table drives decoding (canonical name first, then
//! aliases in declared order), encoding (canonical name only, subject to the
//! field's [`Omit`] rule) and extension-data capture for keys no field claims.
//!
//! ```text
//! {"t": 10, "bpm": 120, "x-editor": {...}}
//!   │         │            └── no field claims it -> extension data
//!   │         └── "bpm"       -> TimeChange::bpm
//!   └── alias of "timeStamp"  -> TimeChange::time_stamp
//! ```

pub mod legacy;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::version::SchemaVersion;

/// Unrecognized keys of a record, kept verbatim and in insertion order
pub type Extension = Map<String, Value>;

/// When a declared field is left out of encoded output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Omit {
    /// Always written
    Never,
    /// Accepted on input, never written
    Always,
    /// Skipped when the value is `null`
    IfNull,
    /// Skipped when the value is `null`, `""`, `[]` or `{}`
    IfEmpty,
    /// Skipped when the value equals the record's default
    IfDefault,
}

/// One declared field of a record
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Canonical key, the only one ever written
    pub name: &'static str,
    /// Alternate keys accepted on input, tried in order after `name`
    pub aliases: &'static [&'static str],
    /// Omission rule applied at encode time
    pub omit: Omit,
    /// Fixed once decoded; `Record::set` refuses to change it
    pub immutable: bool,
}

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            omit: Omit::Never,
            immutable: false,
        }
    }

    pub const fn alias(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn omit(mut self, omit: Omit) -> Self {
        self.omit = omit;
        self
    }

    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Whether `key` is this field's canonical name or one of its aliases
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }

    /// Canonical name followed by aliases, in lookup order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    fn skips(&self, value: &Value, default: impl FnOnce() -> Value) -> bool {
        match self.omit {
            Omit::Never => false,
            Omit::Always => true,
            Omit::IfNull => value.is_null(),
            Omit::IfEmpty => is_empty(value),
            Omit::IfDefault => *value == default(),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// A JSON object with a declared field table
///
/// Implementors map canonical field names to their struct members in
/// `read_field`/`write_field`; everything else (alias lookup, omission,
/// extension data) is handled uniformly by [`decode`] and [`encode`].
pub trait Record: Default + Clone {
    /// Declared fields in emission order
    const FIELDS: &'static [Field];

    /// Store `value` into the member behind the canonical field `name`
    fn read_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Produce the JSON value of the member behind the canonical field `name`
    fn write_field(&self, name: &str) -> Value;

    fn extension(&self) -> &Extension;

    fn extension_mut(&mut self) -> &mut Extension;

    /// Look up the declared field for a canonical name or alias
    fn field(key: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.matches(key))
    }

    /// Read a value by canonical name, alias, or extension key
    fn get(&self, key: &str) -> Option<Value> {
        match Self::field(key) {
            Some(field) => Some(self.write_field(field.name)),
            None => self.extension().get(key).cloned(),
        }
    }

    /// Write a value by canonical name, alias, or extension key
    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        match Self::field(key) {
            Some(field) if field.immutable => Err(SchemaError::invalid_field(
                field.name,
                "cannot be changed once decoded",
            )),
            Some(field) => self.read_field(field.name, value),
            None => {
                self.extension_mut().insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// Whether `key` resolves to a declared field or holds extension data
    fn has(&self, key: &str) -> bool {
        Self::field(key).is_some() || self.extension().contains_key(key)
    }
}

/// Decode a JSON object into a record
pub fn decode<T: Record>(value: Value) -> Result<T> {
    match value {
        Value::Object(object) => decode_object(object),
        other => Err(SchemaError::InvalidFormat(format!(
            "expected an object, found {}",
            kind(&other)
        ))),
    }
}

/// Decode an already-parsed JSON object into a record
pub fn decode_object<T: Record>(mut object: Map<String, Value>) -> Result<T> {
    let mut record = T::default();

    for field in T::FIELDS {
        // First hit wins; every other spelling of the same field is dropped
        // so it cannot resurface as extension data.
        let mut found = None;
        for key in field.keys() {
            if let Some(value) = object.shift_remove(key) {
                if found.is_none() {
                    found = Some(value);
                } else {
                    tracing::trace!(field = field.name, key, "ignoring redundant alias");
                }
            }
        }
        if let Some(value) = found {
            record.read_field(field.name, value)?;
        }
    }

    if !object.is_empty() {
        tracing::trace!(keys = object.len(), "captured extension data");
    }
    *record.extension_mut() = object;

    Ok(record)
}

/// Encode a record as a JSON object
pub fn encode<T: Record>(record: &T) -> Value {
    Value::Object(encode_object(record))
}

/// Encode a record, returning the bare object map
pub fn encode_object<T: Record>(record: &T) -> Map<String, Value> {
    let mut defaults: Option<T> = None;
    let mut out = Map::new();

    for field in T::FIELDS {
        let value = record.write_field(field.name);
        let skip = field.skips(&value, || {
            defaults
                .get_or_insert_with(T::default)
                .write_field(field.name)
        });
        if !skip {
            out.insert(field.name.to_string(), value);
        }
    }

    for (key, value) in record.extension() {
        // Declared fields win over extension entries with the same spelling
        if T::field(key).is_none() && !out.contains_key(key) {
            out.insert(key.clone(), value.clone());
        }
    }

    out
}

/// Extension entries of a prior generation that `T` does not declare
pub fn forward_extension<T: Record>(extension: &Extension) -> Extension {
    extension
        .iter()
        .filter(|(key, _)| T::field(key).is_none())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// -----------------------------------------------------------------------------
// Value readers used by `Record::read_field`
// -----------------------------------------------------------------------------

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(field: &str, expected: &str, found: &Value) -> SchemaError {
    SchemaError::invalid_field(field, format!("expected {}, found {}", expected, kind(found)))
}

/// Float field; accepts integer and floating-point tokens
pub fn float(field: &str, value: Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| mismatch(field, "a number", &value))
}

/// Integer field; accepts floating-point tokens with no fractional part
pub fn int(field: &str, value: Value) -> Result<i64> {
    as_int(&value).ok_or_else(|| mismatch(field, "an integer", &value))
}

pub(crate) fn as_int(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Integer list field; a lone integer is read as a one-element list
pub fn ints(field: &str, value: Value) -> Result<Vec<i64>> {
    match value {
        Value::Array(items) => items.into_iter().map(|item| int(field, item)).collect(),
        other => int(field, other).map(|single| vec![single]),
    }
}

pub fn string(field: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(mismatch(field, "a string", &other)),
    }
}

pub fn boolean(field: &str, value: Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| mismatch(field, "a boolean", &value))
}

/// `null` reads as `None`; anything else goes through `read`
pub fn optional<T>(
    field: &str,
    value: Value,
    read: impl FnOnce(&str, Value) -> Result<T>,
) -> Result<Option<T>> {
    match value {
        Value::Null => Ok(None),
        other => read(field, other).map(Some),
    }
}

/// Any serde-deserializable value (string lists, numeric maps, ...)
pub fn typed<T: DeserializeOwned>(field: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| SchemaError::invalid_field(field, e))
}

/// Version stamp; must be a string holding a semantic version
pub fn version(field: &str, value: Value) -> Result<SchemaVersion> {
    SchemaVersion::parse(&string(field, value)?)
}

/// Nested record
pub fn record<T: Record>(field: &str, value: Value) -> Result<T> {
    decode(value).map_err(|e| nest(field, e))
}

/// Array of nested records
pub fn records<T: Record>(field: &str, value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| record(&format!("{}[{}]", field, i), item))
            .collect(),
        other => Err(mismatch(field, "an array", &other)),
    }
}

/// Object of nested records keyed by id
pub fn record_map<T: Record>(field: &str, value: Value) -> Result<IndexMap<String, T>> {
    keyed(field, value, |path, item| record(path, item))
}

/// Object of record arrays keyed by id (e.g. notes per difficulty)
pub fn record_table<T: Record>(field: &str, value: Value) -> Result<IndexMap<String, Vec<T>>> {
    keyed(field, value, |path, item| records(path, item))
}

fn keyed<T>(
    field: &str,
    value: Value,
    read: impl Fn(&str, Value) -> Result<T>,
) -> Result<IndexMap<String, T>> {
    match value {
        Value::Object(object) => object
            .into_iter()
            .map(|(key, item)| {
                let path = format!("{}.{}", field, key);
                read(&path, item).map(|decoded| (key, decoded))
            })
            .collect(),
        other => Err(mismatch(field, "an object", &other)),
    }
}

fn nest(field: &str, error: SchemaError) -> SchemaError {
    match error {
        SchemaError::InvalidField { field: inner, reason } => SchemaError::InvalidField {
            field: format!("{}.{}", field, inner),
            reason,
        },
        SchemaError::InvalidFormat(reason) => SchemaError::invalid_field(field, reason),
        other => other,
    }
}

// -----------------------------------------------------------------------------
// Value writers used by `Record::write_field`
// -----------------------------------------------------------------------------

/// Float as JSON; integral values are written without a fractional part
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < (1u64 << 53) as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

pub fn optional_number(value: Option<f64>) -> Value {
    value.map(number).unwrap_or(Value::Null)
}

/// Map of floats keyed by id
pub fn number_map(map: &IndexMap<String, f64>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), number(*v))).collect())
}

pub fn int_map(map: &IndexMap<String, i64>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect())
}

pub fn strings(items: &[String]) -> Value {
    Value::from(items.to_vec())
}

pub fn records_value<T: Record>(items: &[T]) -> Value {
    Value::Array(items.iter().map(encode).collect())
}

pub fn record_map_value<T: Record>(map: &IndexMap<String, T>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), encode(v))).collect())
}

pub fn record_table_value<T: Record>(table: &IndexMap<String, Vec<T>>) -> Value {
    Value::Object(
        table
            .iter()
            .map(|(k, v)| (k.clone(), records_value(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        time: f64,
        label: Option<String>,
        steps: i64,
        legacy: String,
        extension: Extension,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                time: 0.0,
                label: None,
                steps: 4,
                legacy: String::new(),
                extension: Extension::new(),
            }
        }
    }

    impl Record for Sample {
        const FIELDS: &'static [Field] = &[
            Field::new("time").alias(&["t", "tm"]),
            Field::new("label").omit(Omit::IfNull),
            Field::new("steps").alias(&["s"]).omit(Omit::IfDefault),
            Field::new("legacy").omit(Omit::Always),
        ];

        fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "time" => self.time = float(name, value)?,
                "label" => self.label = optional(name, value, string)?,
                "steps" => self.steps = int(name, value)?,
                "legacy" => self.legacy = string(name, value)?,
                _ => {}
            }
            Ok(())
        }

        fn write_field(&self, name: &str) -> Value {
            match name {
                "time" => number(self.time),
                "label" => self.label.clone().map(Value::from).unwrap_or(Value::Null),
                "steps" => Value::from(self.steps),
                "legacy" => Value::from(self.legacy.clone()),
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

    #[test]
    fn test_canonical_name_beats_alias() {
        let sample: Sample = decode(json!({"t": 1, "time": 2, "tm": 3})).unwrap();
        assert_eq!(sample.time, 2.0);
        assert!(sample.extension.is_empty());
    }

    #[test]
    fn test_aliases_tried_in_declared_order() {
        let sample: Sample = decode(json!({"tm": 3, "t": 1})).unwrap();
        assert_eq!(sample.time, 1.0);
        assert!(sample.extension.is_empty());
    }

    #[test]
    fn test_unknown_keys_become_extension_data() {
        let sample: Sample = decode(json!({"time": 1, "editor": {"zoom": [1, 2]}})).unwrap();
        assert_eq!(sample.extension.get("editor"), Some(&json!({"zoom": [1, 2]})));
        let out = encode(&sample);
        assert_eq!(out, json!({"time": 1, "editor": {"zoom": [1, 2]}}));
    }

    #[test]
    fn test_omission_rules() {
        let sample: Sample = decode(json!({"time": 1.5, "legacy": "x", "s": 4})).unwrap();
        assert_eq!(sample.legacy, "x");
        assert_eq!(encode(&sample), json!({"time": 1.5}));

        let sample: Sample = decode(json!({"time": 1.5, "label": "a", "steps": 3})).unwrap();
        assert_eq!(encode(&sample), json!({"time": 1.5, "label": "a", "steps": 3}));
    }

    #[test]
    fn test_numeric_coercion() {
        let sample: Sample = decode(json!({"time": 7, "steps": 8.0})).unwrap();
        assert_eq!(sample.time, 7.0);
        assert_eq!(sample.steps, 8);
        assert!(decode::<Sample>(json!({"steps": 8.5})).is_err());
    }

    #[test]
    fn test_type_mismatch_names_the_field() {
        match decode::<Sample>(json!({"time": "soon"})) {
            Err(SchemaError::InvalidField { field, .. }) => assert_eq!(field, "time"),
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_get_and_set_resolve_aliases() {
        let mut sample = Sample::default();
        sample.set("t", json!(12)).unwrap();
        assert_eq!(sample.get("time"), Some(json!(12)));
        sample.set("custom", json!(true)).unwrap();
        assert_eq!(sample.get("custom"), Some(json!(true)));
        assert!(sample.has("tm"));
        assert!(!sample.has("missing"));
    }

    #[test]
    fn test_extension_never_shadows_declared_fields() {
        let mut sample = Sample::default();
        sample.extension.insert("t".into(), json!(99));
        sample.extension.insert("time".into(), json!(99));
        assert_eq!(encode(&sample), json!({"time": 0}));
    }

    #[test]
    fn test_forward_extension_drops_superseded_keys() {
        let mut extension = Extension::new();
        extension.insert("label".into(), json!("now declared"));
        extension.insert("tm".into(), json!(1));
        extension.insert("keep".into(), json!(1));
        let forwarded = forward_extension::<Sample>(&extension);
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded.contains_key("keep"));
    }

    #[test]
    fn test_number_writes_integral_floats_as_integers() {
        assert_eq!(number(1000.0), json!(1000));
        assert_eq!(number(-1.0), json!(-1));
        assert_eq!(number(1.5), json!(1.5));
    }
}
