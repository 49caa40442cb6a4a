//! Canonical chart data (2.x)

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

use crate::codec::{self, Extension, Field, Omit, Record};
use crate::data::metadata::latest::GENERATED_BY;
use crate::error::Result;
use crate::schema::Generation;
use crate::version::SchemaVersion;

/// Notes, events and scroll speeds of every difficulty of one variation
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    version: SchemaVersion,
    /// Scroll speed per difficulty id
    pub scroll_speed: IndexMap<String, f64>,
    pub events: Vec<EventData>,
    /// Notes per difficulty id
    pub notes: IndexMap<String, Vec<NoteData>>,
    pub generated_by: String,
    pub variation: String,
    pub extension: Extension,
}

impl Default for ChartData {
    fn default() -> Self {
        Self {
            version: Generation::ChartLatest.default_version(),
            scroll_speed: IndexMap::new(),
            events: Vec::new(),
            notes: IndexMap::new(),
            generated_by: GENERATED_BY.to_string(),
            variation: "default".to_string(),
            extension: Extension::new(),
        }
    }
}

impl ChartData {
    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Difficulty ids in document order
    pub fn difficulties(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    pub fn notes_for(&self, difficulty: &str) -> &[NoteData] {
        self.notes.get(difficulty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Scroll speed of a difficulty, falling back to the `default` entry, then 1.0
    pub fn scroll_speed_for(&self, difficulty: &str) -> f64 {
        self.scroll_speed
            .get(difficulty)
            .or_else(|| self.scroll_speed.get("default"))
            .copied()
            .unwrap_or(1.0)
    }
}

impl Record for ChartData {
    const FIELDS: &'static [Field] = &[
        Field::new("version").immutable(),
        Field::new("scrollSpeed"),
        Field::new("events"),
        Field::new("notes"),
        Field::new("generatedBy"),
        Field::new("variation").omit(Omit::Always),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "version" => self.version = codec::version(name, value)?,
            "scrollSpeed" => self.scroll_speed = codec::typed(name, value)?,
            "events" => self.events = codec::records(name, value)?,
            "notes" => self.notes = codec::record_table(name, value)?,
            "generatedBy" => self.generated_by = codec::string(name, value)?,
            "variation" => self.variation = codec::string(name, value)?,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "version" => Value::from(self.version.version_string()),
            "scrollSpeed" => codec::number_map(&self.scroll_speed),
            "events" => codec::records_value(&self.events),
            "notes" => codec::record_table_value(&self.notes),
            "generatedBy" => Value::from(self.generated_by.clone()),
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

impl fmt::Display for ChartData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let notes: usize = self.notes.values().map(Vec::len).sum();
        write!(
            f,
            "SongChartData({} difficulties, {} notes, {} events)",
            self.notes.len(),
            notes,
            self.events.len()
        )
    }
}

/// A timed song event (camera focus, animation, ...)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventData {
    /// Position in milliseconds
    pub time: f64,
    pub event_kind: String,
    /// Event-specific payload, left opaque
    pub value: Option<Value>,
    pub extension: Extension,
}

impl EventData {
    pub fn new(time: f64, event_kind: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            time,
            event_kind: event_kind.into(),
            value,
            extension: Extension::new(),
        }
    }
}

impl Record for EventData {
    const FIELDS: &'static [Field] = &[
        Field::new("time").alias(&["t"]),
        Field::new("eventKind").alias(&["e"]),
        Field::new("value").alias(&["v"]).omit(Omit::IfNull),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "time" => self.time = codec::float(name, value)?,
            "eventKind" => self.event_kind = codec::string(name, value)?,
            "value" => self.value = Some(value).filter(|v| !v.is_null()),
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "time" => codec::number(self.time),
            "eventKind" => Value::from(self.event_kind.clone()),
            "value" => self.value.clone().unwrap_or(Value::Null),
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

/// A single playable note
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteData {
    /// Position in milliseconds
    pub time: f64,
    /// Lane code; `data % 4` is the direction, `data / 4` the strumline
    pub data: i64,
    /// Sustain length in milliseconds, zero for taps
    pub length: f64,
    pub kind: Option<String>,
    pub params: Vec<NoteParam>,
    pub extension: Extension,
}

impl NoteData {
    pub fn new(time: f64, data: i64, length: f64) -> Self {
        Self {
            time,
            data,
            length,
            ..Self::default()
        }
    }

    pub fn direction(&self) -> i64 {
        self.data.rem_euclid(4)
    }

    pub fn strumline(&self) -> i64 {
        self.data.div_euclid(4)
    }
}

impl Record for NoteData {
    const FIELDS: &'static [Field] = &[
        Field::new("time").alias(&["t"]),
        Field::new("data").alias(&["d"]),
        Field::new("length").alias(&["l"]),
        Field::new("kind").alias(&["k"]).omit(Omit::IfNull),
        Field::new("params").alias(&["p"]).omit(Omit::IfEmpty),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "time" => self.time = codec::float(name, value)?,
            "data" => self.data = codec::int(name, value)?,
            "length" => self.length = codec::float(name, value)?,
            "kind" => self.kind = codec::optional(name, value, codec::string)?,
            "params" => self.params = codec::optional(name, value, codec::records)?.unwrap_or_default(),
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "time" => codec::number(self.time),
            "data" => Value::from(self.data),
            "length" => codec::number(self.length),
            "kind" => Value::from(self.kind.clone()),
            "params" => codec::records_value(&self.params),
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

impl fmt::Display for NoteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SongNoteData({}ms, {}, {}ms)", self.time, self.data, self.length)
    }
}

/// A named note parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteParam {
    pub name: String,
    pub value: Value,
    pub extension: Extension,
}

impl NoteParam {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            extension: Extension::new(),
        }
    }
}

impl Record for NoteParam {
    const FIELDS: &'static [Field] = &[
        Field::new("name").alias(&["n"]),
        Field::new("value").alias(&["v"]),
    ];

    fn read_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "name" => self.name = codec::string(name, value)?,
            "value" => self.value = value,
            _ => {}
        }
        Ok(())
    }

    fn write_field(&self, name: &str) -> Value {
        match name {
            "name" => Value::from(self.name.clone()),
            "value" => self.value.clone(),
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
