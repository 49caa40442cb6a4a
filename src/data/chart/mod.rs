//! Chart generations

pub mod latest;
pub mod v100;

use serde_json::{Map, Value};
use std::fmt;

use super::metadata::MetadataDocument;
use super::{Advanced, Document};
use crate::codec;
use crate::convert::ConversionOptions;
use crate::error::{Result, SchemaError};
use crate::schema::{Generation, Role};
use crate::version::SchemaVersion;

pub use latest::{ChartData, EventData, NoteData, NoteParam};

/// A decoded chart document of any registered generation
#[derive(Debug, Clone, PartialEq)]
pub enum ChartDocument {
    V100(v100::Chart),
    Latest(ChartData),
}

impl ChartDocument {
    pub fn decode(generation: Generation, object: Map<String, Value>) -> Result<Self> {
        match generation {
            Generation::ChartV100 => codec::decode_object(object).map(Self::V100),
            Generation::ChartLatest => codec::decode_object(object).map(Self::Latest),
            other => Err(SchemaError::RoleMismatch {
                role: Role::ChartData,
                generation: other,
            }),
        }
    }

    pub fn encode(&self) -> Value {
        match self {
            Self::V100(chart) => codec::encode(chart),
            Self::Latest(chart) => codec::encode(chart),
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::V100(_) => Generation::ChartV100,
            Self::Latest(_) => Generation::ChartLatest,
        }
    }

    pub fn version(&self) -> &SchemaVersion {
        match self {
            Self::V100(chart) => chart.version(),
            Self::Latest(chart) => chart.version(),
        }
    }

    /// Convert one generation forward; a legacy chart splits into a metadata/chart pair
    pub fn advance(&self, options: &ConversionOptions) -> Option<Advanced> {
        match self {
            Self::V100(chart) => {
                let (metadata, chart) = chart.advance(options);
                Some(Advanced::Split(
                    MetadataDocument::Latest(metadata),
                    ChartDocument::Latest(chart),
                ))
            }
            Self::Latest(_) => None,
        }
    }

    pub fn into_latest(self) -> Option<ChartData> {
        match self {
            Self::Latest(chart) => Some(chart),
            _ => None,
        }
    }
}

impl From<ChartDocument> for Document {
    fn from(chart: ChartDocument) -> Self {
        Document::Chart(chart)
    }
}

impl fmt::Display for ChartDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V100(chart) => chart.fmt(f),
            Self::Latest(chart) => chart.fmt(f),
        }
    }
}
