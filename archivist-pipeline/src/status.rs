//! Read-only view of what the next run would do.

use std::path::PathBuf;

use archivist_core::PipelineConfig;
use archivist_merge::{SizeDecision, SizePolicy};
use serde::Serialize;

use crate::error::{io_err, PipelineError};
use crate::inputs::{discover, should_run};

#[derive(Debug, Clone, Serialize)]
pub struct PendingFile {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub input_dir: PathBuf,
    pub pending: Vec<PendingFile>,
    pub trigger_threshold: usize,
    pub would_run: bool,
    pub source: String,
    pub size_threshold_bytes: u64,
    /// Decision for an archive already sitting in `fetch_dir`, if any.
    pub local_archive: SizeDecision,
}

/// Gather the status for a resolved `config`. Touches nothing.
pub fn status(config: &PipelineConfig, source: String) -> Result<StatusReport, PipelineError> {
    let mut pending = Vec::new();
    for path in discover(&config.input_dir, &config.input_extension)? {
        let bytes = std::fs::metadata(&path)
            .map_err(|e| io_err(&path, e))?
            .len();
        pending.push(PendingFile { path, bytes });
    }

    let local = config.fetched_archive();
    let local_archive = SizePolicy::new(config.size_threshold_bytes).assess(Some(local.as_path()))?;

    Ok(StatusReport {
        input_dir: config.input_dir.clone(),
        would_run: should_run(pending.len(), config.trigger_threshold),
        pending,
        trigger_threshold: config.trigger_threshold,
        source,
        size_threshold_bytes: config.size_threshold_bytes,
        local_archive,
    })
}
