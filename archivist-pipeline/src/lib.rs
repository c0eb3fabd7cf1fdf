//! # archivist-pipeline
//!
//! One run: discover pending inputs, fetch the prior archive, apply the size
//! policy, merge, publish, clean up, prune. [`run`] is the entrypoint used by
//! the CLI; [`status`] reports the same decisions without acting on them.

pub mod error;
pub mod inputs;
pub mod pipeline;
pub mod report;
pub mod status;

pub use error::PipelineError;
pub use pipeline::{run, Collaborators, RunOptions};
pub use report::{ArchivalOutcome, CompletedRun, RunReport};
pub use status::{status, StatusReport};
