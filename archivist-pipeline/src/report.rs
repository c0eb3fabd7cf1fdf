//! What a run did, in a form the CLI can print or serialize.

use std::path::PathBuf;

use archivist_merge::{ArchivePlan, MergeStats, SizeDecision};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunReport {
    /// Not enough pending inputs; nothing was touched.
    Skipped { pending: usize, threshold: usize },
    /// `--dry-run`: what a real run would start from.
    DryRun {
        pending: Vec<PathBuf>,
        threshold: usize,
        source: String,
        decision: SizeDecision,
    },
    Completed(CompletedRun),
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedRun {
    pub inputs: Vec<PathBuf>,
    /// Set when the prior archive could not be fetched and the run started empty.
    pub fetch_error: Option<String>,
    pub plan: ArchivePlan,
    pub stats: MergeStats,
    pub published_to: String,
    pub archival: ArchivalOutcome,
    pub cleanup_warnings: Vec<String>,
}

/// Archival happens after the data is published, so its failure is reported
/// rather than returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchivalOutcome {
    Archived { files: usize, via: String },
    Failed { error: String },
}

impl RunReport {
    pub fn completed(&self) -> Option<&CompletedRun> {
        match self {
            RunReport::Completed(run) => Some(run),
            _ => None,
        }
    }
}
