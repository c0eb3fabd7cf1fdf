//! `archivist run`: one pass of fetch, merge, publish, prune.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use archivist_merge::SizeDecision;
use archivist_pipeline::{run, ArchivalOutcome, Collaborators, CompletedRun, RunOptions, RunReport};
use archivist_publish::{archiver_for, source_for, uploader_for};

use super::ConfigArgs;

/// Arguments for `archivist run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Report the trigger and size decisions without touching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Run even when the trigger threshold is not exceeded.
    #[arg(long)]
    pub force: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let cfg = self.config.load()?;

        let source = source_for(&cfg);
        let uploader = uploader_for(&cfg).context("cannot set up the publisher")?;
        let archiver = archiver_for(&cfg);
        let collaborators = Collaborators {
            source: source.as_ref(),
            uploader: uploader.as_ref(),
            archiver: archiver.as_ref(),
        };
        let options = RunOptions {
            force: self.force,
            dry_run: self.dry_run,
        };

        let report = run(&cfg, &collaborators, options).context("run failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    match report {
        RunReport::Skipped { pending, threshold } => {
            println!(
                "{} {pending} pending input(s), threshold {threshold}; nothing to do",
                "•".bright_black()
            );
        }
        RunReport::DryRun {
            pending,
            threshold,
            source,
            decision,
        } => {
            println!(
                "[dry-run] {} pending input(s) (threshold {threshold})",
                pending.len()
            );
            for path in pending {
                println!("  {}", path.display());
            }
            println!("[dry-run] archive source: {source}");
            println!("[dry-run] local archive: {}", describe_decision(decision));
        }
        RunReport::Completed(run) => print_completed(run),
    }
}

fn print_completed(run: &CompletedRun) {
    if let Some(err) = &run.fetch_error {
        println!("{} prior archive unavailable ({err}); started empty", "!".yellow().bold());
    }
    println!(
        "{} merged {} input(s) [{}]: {} written, {} duplicate(s), {} sentinel(s) dropped",
        "✓".green().bold(),
        run.inputs.len(),
        run.plan.label(),
        run.stats.written(),
        run.stats.duplicates(),
        run.stats.sentinels()
    );
    println!("{} published to {}", "✓".green().bold(), run.published_to);
    for warning in &run.cleanup_warnings {
        println!("{} cleanup: {warning}", "!".yellow().bold());
    }
    match &run.archival {
        ArchivalOutcome::Archived { files, via } => {
            println!("{} pruned {files} input(s) via {via}", "✓".green().bold());
        }
        ArchivalOutcome::Failed { error } => {
            println!(
                "{} published, but pruning inputs failed: {error}",
                "!".yellow().bold()
            );
        }
    }
}

pub(crate) fn describe_decision(decision: &SizeDecision) -> String {
    match decision {
        SizeDecision::NoArchive => "none".to_string(),
        SizeDecision::StreamAndDedup { path, size } => {
            format!("{} ({size} bytes), stream and dedup", path.display())
        }
        SizeDecision::PreserveAsChunk { path, size } => {
            format!("{} ({size} bytes), preserve as chunk", path.display())
        }
    }
}
