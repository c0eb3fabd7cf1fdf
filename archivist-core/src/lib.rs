//! Archivist core library: record model, canonical hashing, configuration.
//!
//! - [`types`]: [`Record`], [`RecordHash`], dataset metadata
//! - [`config`]: [`PipelineConfig`] load / save / resolve
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ArchiverConfig, DatasetConfig, PipelineConfig, PublishConfig, SourceConfig,
    DEFAULT_CONFIG_FILE, DEFAULT_SIZE_THRESHOLD_BYTES, DEFAULT_TRIGGER_THRESHOLD,
};
pub use error::ConfigError;
pub use types::{canonical_form, AccessLevel, DatasetMetadata, License, Record, RecordHash};
