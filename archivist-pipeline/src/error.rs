//! Error types for archivist-pipeline.

use std::path::PathBuf;

use thiserror::Error;

use archivist_core::ConfigError;
use archivist_merge::MergeError;
use archivist_publish::UploadError;

/// Errors that abort a run. Fetch and archival failures never show up here:
/// the first is recovered, the second is reported in the run report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Size policy or merge failure, including malformed input lines.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Nothing was pruned; inputs and merged output are left in place.
    #[error("upload failed, inputs kept for the next run: {0}")]
    Upload(#[from] UploadError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.into(),
        source,
    }
}
