//! # archivist-merge
//!
//! Streaming merge-and-deduplicate of line-delimited JSON.
//!
//! [`SizePolicy`] decides what happens to a prior archive, then [`Merger`]
//! streams that archive (when allowed) followed by every new input file into
//! one deduplicated output file.

pub mod error;
pub mod merger;
pub mod seen;
pub mod size_policy;

pub use error::MergeError;
pub use merger::{MergeStats, Merger, SourceKind, SourceStats};
pub use seen::SeenSet;
pub use size_policy::{ArchivePlan, SizeDecision, SizePolicy};
