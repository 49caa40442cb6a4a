//! Concrete schema types for every registered generation

pub mod chart;
pub mod metadata;

use serde_json::{Map, Value};
use std::fmt;

use crate::convert::ConversionOptions;
use crate::error::Result;
use crate::schema::{Generation, Role};
use crate::version::SchemaVersion;

pub use chart::ChartDocument;
pub use metadata::MetadataDocument;

/// A decoded document of either role
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Metadata(MetadataDocument),
    Chart(ChartDocument),
}

/// Result of a single conversion hop
#[derive(Debug, Clone, PartialEq)]
pub enum Advanced {
    /// The successor generation of the same role
    Single(Document),
    /// A combined legacy chart split into its two halves
    Split(MetadataDocument, ChartDocument),
}

impl Document {
    /// Decode `object` as `generation`, dispatching on its role
    pub fn decode(generation: Generation, object: Map<String, Value>) -> Result<Self> {
        match generation.role() {
            Role::Metadata => MetadataDocument::decode(generation, object).map(Self::Metadata),
            Role::ChartData => ChartDocument::decode(generation, object).map(Self::Chart),
        }
    }

    pub fn encode(&self) -> Value {
        match self {
            Self::Metadata(doc) => doc.encode(),
            Self::Chart(doc) => doc.encode(),
        }
    }

    pub fn role(&self) -> Role {
        self.generation().role()
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::Metadata(doc) => doc.generation(),
            Self::Chart(doc) => doc.generation(),
        }
    }

    pub fn version(&self) -> &SchemaVersion {
        match self {
            Self::Metadata(doc) => doc.version(),
            Self::Chart(doc) => doc.version(),
        }
    }

    /// One conversion hop; `None` when this generation has no successor
    pub fn advance(&self, options: &ConversionOptions) -> Option<Advanced> {
        match self {
            Self::Metadata(doc) => doc.advance().map(|next| Advanced::Single(next.into())),
            Self::Chart(doc) => doc.advance(options),
        }
    }
}

impl From<MetadataDocument> for Document {
    fn from(metadata: MetadataDocument) -> Self {
        Document::Metadata(metadata)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata(doc) => doc.fmt(f),
            Self::Chart(doc) => doc.fmt(f),
        }
    }
}
