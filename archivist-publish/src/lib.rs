//! # archivist-publish
//!
//! The pipeline's external collaborators, each behind a trait:
//!
//! - [`ArchiveSource`]: fetch the previously published archive
//! - [`Uploader`]: publish the merged output as a new version
//! - [`Archiver`]: prune processed inputs after a successful publish
//!
//! [`collaborators`] builds the configured implementation of each.

pub mod archiver;
pub mod collaborators;
pub mod error;
pub mod fetch;
pub mod upload;

pub use archiver::{Archiver, GitArchiver, RemoveArchiver};
pub use collaborators::{archiver_for, source_for, uploader_for};
pub use error::{ArchivalError, FetchError, UploadError};
pub use fetch::{ArchiveSource, DirectorySource, HttpSource, NoArchiveSource};
pub use upload::{version_notes, write_metadata, DirectoryUploader, HttpUploader, Uploader};
