//! The run orchestration.
//!
//! ## Sequence
//!
//! 1. Discover pending inputs; stop unless the trigger threshold is exceeded.
//! 2. Fetch the prior archive into `fetch_dir` (failure → start empty).
//! 3. Size policy: stream the archive, preserve it as a chunk, or nothing.
//! 4. Merge archive + inputs into `<output_dir>/<output_file_name>`.
//! 5. Write the dataset metadata file next to it.
//! 6. Upload `output_dir`. Failure aborts here; nothing is pruned.
//! 7. Remove `output_dir` and `fetch_dir`.
//! 8. Archive (prune) the inputs. Failure is reported, not returned.

use std::path::Path;

use archivist_core::PipelineConfig;
use archivist_merge::{Merger, SizePolicy};
use archivist_publish::{version_notes, write_metadata, ArchiveSource, Archiver, Uploader};
use chrono::Local;

use crate::error::{io_err, PipelineError};
use crate::inputs::{discover, should_run};
use crate::report::{ArchivalOutcome, CompletedRun, RunReport};

/// The external collaborators for one run.
pub struct Collaborators<'a> {
    pub source: &'a dyn ArchiveSource,
    pub uploader: &'a dyn Uploader,
    pub archiver: &'a dyn Archiver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Ignore the trigger threshold.
    pub force: bool,
    /// Report decisions without fetching, writing, uploading or pruning.
    pub dry_run: bool,
}

/// Run the pipeline once. `config` must already be resolved.
pub fn run(
    config: &PipelineConfig,
    collaborators: &Collaborators<'_>,
    options: RunOptions,
) -> Result<RunReport, PipelineError> {
    config.validate()?;

    let inputs = discover(&config.input_dir, &config.input_extension)?;
    if !options.force && !should_run(inputs.len(), config.trigger_threshold) {
        tracing::info!(
            "{} pending inputs (threshold {}); nothing to do",
            inputs.len(),
            config.trigger_threshold
        );
        return Ok(RunReport::Skipped {
            pending: inputs.len(),
            threshold: config.trigger_threshold,
        });
    }

    let policy = SizePolicy::new(config.size_threshold_bytes);

    if options.dry_run {
        let local = config.fetched_archive();
        let decision = policy.assess(Some(local.as_path()))?;
        return Ok(RunReport::DryRun {
            pending: inputs,
            threshold: config.trigger_threshold,
            source: collaborators.source.describe(),
            decision,
        });
    }

    tracing::info!("merging {} pending inputs", inputs.len());

    // 2. Fetch.
    remove_dir_if_exists(&config.fetch_dir)?;
    let (archive, fetch_error) = match collaborators.source.fetch(&config.fetch_dir) {
        Ok(path) => (path, None),
        Err(err) => {
            tracing::warn!(
                "could not fetch archive from {}: {err}; starting without one",
                collaborators.source.describe()
            );
            (None, Some(err.to_string()))
        }
    };

    // 3. Size policy. Stale intermediates from a failed run go first so the
    // chunk rename never lands on top of an old file.
    clear_intermediates(config)?;
    let plan = policy.decide(archive.as_deref(), &config.chunk_file())?;

    // 4. Merge.
    let stats = Merger::new(config.sentinel_id).merge(&plan, &inputs, &config.output_file())?;

    // 5–6. Describe and publish.
    let metadata = config.dataset.metadata();
    write_metadata(&config.metadata_file(), &metadata)?;
    collaborators
        .uploader
        .upload(&config.output_dir, &metadata, &version_notes(Local::now()))?;

    // 7. Cleanup. The data is published; failures here are only reported.
    let mut cleanup_warnings = Vec::new();
    for dir in [&config.output_dir, &config.fetch_dir] {
        if let Err(err) = remove_dir_if_exists(dir) {
            tracing::warn!("cleanup: {err}");
            cleanup_warnings.push(err.to_string());
        }
    }

    // 8. Prune inputs.
    let archival = match collaborators.archiver.archive(&inputs) {
        Ok(()) => ArchivalOutcome::Archived {
            files: inputs.len(),
            via: collaborators.archiver.describe(),
        },
        Err(err) => {
            tracing::warn!("archival failed after successful upload: {err}");
            ArchivalOutcome::Failed {
                error: err.to_string(),
            }
        }
    };

    Ok(RunReport::Completed(CompletedRun {
        inputs,
        fetch_error,
        plan,
        stats,
        published_to: collaborators.uploader.describe(),
        archival,
        cleanup_warnings,
    }))
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), PipelineError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(dir, e)),
    }
}

fn clear_intermediates(config: &PipelineConfig) -> Result<(), PipelineError> {
    for path in [
        config.output_file(),
        config.chunk_file(),
        config.metadata_file(),
    ] {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&path, e)),
        }
    }
    Ok(())
}
