//! Size-based branching for the prior archive.
//!
//! | archive                     | decision            | effect                          |
//! |-----------------------------|---------------------|---------------------------------|
//! | absent                      | `NoArchive`         | output starts empty             |
//! | size <= threshold           | `StreamAndDedup`    | archive is the output's prefix  |
//! | size >  threshold           | `PreserveAsChunk`   | archive renamed to the chunk    |
//!
//! A preserved chunk contributes nothing to the seen set, so new records are
//! not deduplicated against it.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, MergeError};

/// What [`SizePolicy::assess`] concluded about the prior archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SizeDecision {
    NoArchive,
    StreamAndDedup { path: PathBuf, size: u64 },
    PreserveAsChunk { path: PathBuf, size: u64 },
}

/// What the [`Merger`](crate::Merger) gets to see once a decision is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum ArchivePlan {
    /// Nothing to stream; output starts empty.
    Empty,
    /// Stream `path` first and seed the seen set from it.
    Stream { path: PathBuf },
    /// The archive now lives at `chunk` and must not be read.
    Chunked { chunk: PathBuf, size: u64 },
}

impl ArchivePlan {
    /// The archive to stream, if any.
    pub fn stream_path(&self) -> Option<&Path> {
        match self {
            ArchivePlan::Stream { path } => Some(path),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArchivePlan::Empty => "no-archive",
            ArchivePlan::Stream { .. } => "stream-and-dedup",
            ArchivePlan::Chunked { .. } => "preserve-as-chunk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    threshold_bytes: u64,
}

impl SizePolicy {
    pub fn new(threshold_bytes: u64) -> Self {
        Self { threshold_bytes }
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Inspect the archive's size. Reads metadata only; never mutates.
    pub fn assess(&self, archive: Option<&Path>) -> Result<SizeDecision, MergeError> {
        let Some(path) = archive else {
            return Ok(SizeDecision::NoArchive);
        };
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(SizeDecision::NoArchive)
            }
            Err(err) => return Err(io_err(path, err)),
        };
        if !meta.is_file() {
            return Err(io_err(
                path,
                io::Error::other("archive path is not a regular file"),
            ));
        }

        let size = meta.len();
        let path = path.to_path_buf();
        if size > self.threshold_bytes {
            Ok(SizeDecision::PreserveAsChunk { path, size })
        } else {
            Ok(SizeDecision::StreamAndDedup { path, size })
        }
    }

    /// Carry out `decision`. For `PreserveAsChunk` this is a single rename to
    /// `chunk_path`; if it fails the archive stays where it was.
    pub fn apply(
        &self,
        decision: SizeDecision,
        chunk_path: &Path,
    ) -> Result<ArchivePlan, MergeError> {
        match decision {
            SizeDecision::NoArchive => Ok(ArchivePlan::Empty),
            SizeDecision::StreamAndDedup { path, .. } => Ok(ArchivePlan::Stream { path }),
            SizeDecision::PreserveAsChunk { path, size } => {
                if let Some(parent) = chunk_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
                }
                std::fs::rename(&path, chunk_path).map_err(|source| MergeError::ChunkRename {
                    from: path.clone(),
                    to: chunk_path.to_path_buf(),
                    source,
                })?;
                tracing::info!(
                    "archive {} ({size} bytes) over threshold; preserved as {}",
                    path.display(),
                    chunk_path.display()
                );
                Ok(ArchivePlan::Chunked {
                    chunk: chunk_path.to_path_buf(),
                    size,
                })
            }
        }
    }

    /// [`assess`](Self::assess) then [`apply`](Self::apply).
    pub fn decide(
        &self,
        archive: Option<&Path>,
        chunk_path: &Path,
    ) -> Result<ArchivePlan, MergeError> {
        let decision = self.assess(archive)?;
        self.apply(decision, chunk_path)
    }
}
