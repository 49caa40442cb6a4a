//! Error types for schema resolution, decoding and conversion

use thiserror::Error;

use crate::schema::{Generation, Role};

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema errors
///
/// Every variant is fatal to the operation that produced it. Decoding and
/// conversion never hand back a partially built document.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Metadata doesn't contain a 'version' string")]
    MissingVersion,

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("No {role} schema registered for version '{version}'")]
    UnsupportedVersion { role: Role, version: String },

    #[error("Malformed legacy note at index {index}: {reason}")]
    MalformedNote { index: usize, reason: String },

    #[error("Conversion of {generation} did not reach the latest schema within {limit} hops")]
    ConversionLoop { generation: Generation, limit: usize },

    #[error("No advance rule for {generation}, but the latest registered {role} schema is {latest}")]
    MissingAdvanceRule {
        role: Role,
        generation: Generation,
        latest: Generation,
    },

    #[error("Cannot register {generation} as a {role} schema")]
    RoleMismatch { role: Role, generation: Generation },

    #[error("No {0} schemas registered")]
    EmptyRegistry(Role),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}
