//! Error types for archivist-merge.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while sizing, chunking or merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line failed JSON decoding. Fatal for the whole run.
    #[error("malformed JSON at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The output path names a file the merge reads or preserves.
    #[error("output {output} is also a merge source ({input}); refusing to truncate it")]
    OutputIsSource { output: PathBuf, input: PathBuf },

    /// Moving an oversized archive aside failed; the archive is untouched.
    #[error("could not preserve {from} as chunk {to}: {source}")]
    ChunkRename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`MergeError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MergeError {
    MergeError::Io {
        path: path.into(),
        source,
    }
}
