//! Streaming merge of an archive plus new inputs into one deduplicated file.
//!
//! ## Per-record protocol
//!
//! 1. Parse; malformed JSON, including an empty line, aborts the merge with
//!    [`MergeError::Parse`].
//! 2. New inputs only: drop sentinel records (`id == sentinel_id`).
//! 3. Hash the canonical form; drop the record if the hash was already seen.
//! 4. Otherwise write the original line, unchanged, followed by `\n`.
//!
//! Sources are consumed strictly in order: the streamed archive, then each
//! input in the order given. The first occurrence of a record wins.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use archivist_core::{Record, RecordHash};
use serde::Serialize;

use crate::error::{io_err, MergeError};
use crate::seen::SeenSet;
use crate::size_policy::ArchivePlan;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Archive,
    Input,
}

/// Counters for one consumed source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Lines parsed.
    pub read: usize,
    pub written: usize,
    pub duplicates: usize,
    pub sentinels: usize,
}

impl SourceStats {
    fn new(path: &Path, kind: SourceKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            read: 0,
            written: 0,
            duplicates: 0,
            sentinels: 0,
        }
    }
}

/// Outcome of a merge, one entry per source in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub sources: Vec<SourceStats>,
}

impl MergeStats {
    pub fn read(&self) -> usize {
        self.sources.iter().map(|s| s.read).sum()
    }

    pub fn written(&self) -> usize {
        self.sources.iter().map(|s| s.written).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.sources.iter().map(|s| s.duplicates).sum()
    }

    pub fn sentinels(&self) -> usize {
        self.sources.iter().map(|s| s.sentinels).sum()
    }
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// Deduplicating merger. One instance is one run: its seen set only grows.
#[derive(Debug)]
pub struct Merger<S: SeenSet = HashSet<RecordHash>> {
    seen: S,
    sentinel_id: i64,
}

impl Merger<HashSet<RecordHash>> {
    pub fn new(sentinel_id: i64) -> Self {
        Self::with_seen_set(HashSet::new(), sentinel_id)
    }
}

impl<S: SeenSet> Merger<S> {
    /// Use a caller-provided seen set (e.g. disk-backed).
    pub fn with_seen_set(seen: S, sentinel_id: i64) -> Self {
        Self { seen, sentinel_id }
    }

    pub fn seen(&self) -> &S {
        &self.seen
    }

    pub fn into_seen(self) -> S {
        self.seen
    }

    /// Create (or truncate) `output` and fill it from `plan` and `inputs`.
    ///
    /// `output` must not be any file the plan refers to or any input.
    /// The file is written incrementally; on error it holds a partial merge
    /// and must not be published.
    pub fn merge(
        &mut self,
        plan: &ArchivePlan,
        inputs: &[PathBuf],
        output: &Path,
    ) -> Result<MergeStats, MergeError> {
        ensure_output_is_not_a_source(plan, inputs, output)?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let file = File::create(output).map_err(|e| io_err(output, e))?;
        let mut writer = BufWriter::new(file);

        let stats = self.merge_stream(plan, inputs, &mut writer, output)?;

        writer.flush().map_err(|e| io_err(output, e))?;
        tracing::info!(
            "merged {} records into {} ({} duplicates, {} sentinels dropped)",
            stats.written(),
            output.display(),
            stats.duplicates(),
            stats.sentinels()
        );
        Ok(stats)
    }

    /// Same as [`merge`](Self::merge) but into any writer.
    pub fn merge_into<W: Write>(
        &mut self,
        plan: &ArchivePlan,
        inputs: &[PathBuf],
        writer: &mut W,
    ) -> Result<MergeStats, MergeError> {
        self.merge_stream(plan, inputs, writer, Path::new("<writer>"))
    }

    fn merge_stream<W: Write>(
        &mut self,
        plan: &ArchivePlan,
        inputs: &[PathBuf],
        writer: &mut W,
        output: &Path,
    ) -> Result<MergeStats, MergeError> {
        let mut stats = MergeStats::default();

        if let ArchivePlan::Chunked { chunk, .. } = plan {
            tracing::debug!("archive preserved as {}; not streamed", chunk.display());
        }
        if let Some(archive) = plan.stream_path() {
            let s = self.consume(archive, SourceKind::Archive, writer, output)?;
            stats.sources.push(s);
        }
        for input in inputs {
            let s = self.consume(input, SourceKind::Input, writer, output)?;
            stats.sources.push(s);
        }
        Ok(stats)
    }

    fn consume<W: Write>(
        &mut self,
        path: &Path,
        kind: SourceKind,
        writer: &mut W,
        output: &Path,
    ) -> Result<SourceStats, MergeError> {
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let mut reader = BufReader::new(file);
        let mut stats = SourceStats::new(path, kind);
        let mut line = String::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let n = reader.read_line(&mut line).map_err(|e| io_err(path, e))?;
            if n == 0 {
                break;
            }
            line_no += 1;
            stats.read += 1;

            let record = Record::parse(&line).map_err(|source| MergeError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                source,
            })?;

            if kind == SourceKind::Input && record.is_sentinel(self.sentinel_id) {
                stats.sentinels += 1;
                continue;
            }
            if !self.seen.insert(record.hash()) {
                stats.duplicates += 1;
                continue;
            }

            writer
                .write_all(record.raw().as_bytes())
                .and_then(|()| writer.write_all(b"\n"))
                .map_err(|e| io_err(output, e))?;
            stats.written += 1;
        }

        tracing::debug!(
            "{}: {} read, {} written, {} duplicates, {} sentinels",
            path.display(),
            stats.read,
            stats.written,
            stats.duplicates,
            stats.sentinels
        );
        Ok(stats)
    }
}

/// Truncating `output` must never destroy something the merge reads or keeps.
/// Paths are compared after canonicalization; a missing output cannot alias
/// an existing file.
fn ensure_output_is_not_a_source(
    plan: &ArchivePlan,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<(), MergeError> {
    let Ok(target) = output.canonicalize() else {
        return Ok(());
    };
    let planned = match plan {
        ArchivePlan::Empty => None,
        ArchivePlan::Stream { path } => Some(path),
        ArchivePlan::Chunked { chunk, .. } => Some(chunk),
    };
    for source in planned.into_iter().chain(inputs) {
        if source.canonicalize().is_ok_and(|s| s == target) {
            return Err(MergeError::OutputIsSource {
                output: output.to_path_buf(),
                input: source.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
