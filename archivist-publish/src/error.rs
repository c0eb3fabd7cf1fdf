//! Error types for the external collaborators.
//!
//! Each collaborator has its own error so the pipeline can decide on the type
//! alone: a [`FetchError`] is recovered, an [`UploadError`] stops the run before
//! anything is pruned, an [`ArchivalError`] is reported after the data is safe.

use std::path::PathBuf;

use thiserror::Error;

/// The prior archive could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no archive at {location}")]
    Missing { location: String },

    #[error("archive request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Publishing the merged output failed.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload of {url} rejected with HTTP {status}")]
    Rejected { url: String, status: u16 },

    #[error("upload request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("environment variable {0} holding the upload token is not set")]
    MissingToken(String),

    #[error("nothing to upload in {0}")]
    EmptyOutput(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Removing processed inputs after a successful upload failed.
#[derive(Debug, Error)]
pub enum ArchivalError {
    #[error("`git {step}` failed: {stderr}")]
    Git { step: String, stderr: String },

    #[error("could not run git in {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn fetch_io(path: impl Into<PathBuf>, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn upload_io(path: impl Into<PathBuf>, source: std::io::Error) -> UploadError {
    UploadError::Io {
        path: path.into(),
        source,
    }
}
