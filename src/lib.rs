//! Funkin Schemas
//!
//! Reads, writes and upgrades rhythm-game song metadata and chart files
//! across every historical schema generation.
//!
//! ## Features
//!
//! - **Version Dispatch**: documents are routed to their generation by the
//!   semantic version they carry
//! - **Multi-Hop Conversion**: any registered generation is advanced to the
//!   canonical schema, including the combined 1.x chart split
//! - **Lossless Round-Trips**: unknown keys survive decode, conversion and encode
//! - **Declarative Fields**: aliases and omission rules live in static field tables
//!
//! ## Architecture
//!
//! ```text
//! bytes ──► Resolver ──(SchemaRegistry)──► MetadataDocument / ChartDocument
//!                                                   │
//!                                               Converter
//!                                                   │
//!                                                   ▼
//!                                  SongPack { Metadata, ChartData } ──► codec ──► bytes
//! ```

pub mod codec;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod version;

pub use codec::{Extension, Field, Omit, Record};
pub use config::{FunkinConfig, OutputFormat};
pub use convert::{ConversionOptions, Converter, SongPack};
pub use data::chart::{ChartData, ChartDocument, EventData, NoteData, NoteParam};
pub use data::metadata::{
    CharacterData, Metadata, MetadataDocument, Offsets, PlayData, TimeChange, TimeFormat,
};
pub use data::{Advanced, Document};
pub use error::{Result, SchemaError};
pub use registry::SchemaRegistry;
pub use resolver::Resolver;
pub use schema::{Generation, Role, SchemaDescriptor};
pub use version::{SchemaVersion, VersionRange};
