//! `archivist status`: pending inputs and the decisions the next run would make.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use archivist_pipeline::{status, StatusReport};
use archivist_publish::source_for;

use super::{run::describe_decision, ConfigArgs};

/// Arguments for `archivist status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "bytes")]
    bytes: u64,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let cfg = self.config.load()?;
        let source = source_for(&cfg).describe();
        let report = status(&cfg, source).context("failed to gather status")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        print_table(&report);
        Ok(())
    }
}

fn print_table(report: &StatusReport) {
    let indicator = if report.would_run {
        "■".green().bold()
    } else {
        "■".bright_black().bold()
    };
    println!(
        "{indicator} {} pending in {} (runs when > {})",
        report.pending.len(),
        report.input_dir.display(),
        report.trigger_threshold
    );

    if !report.pending.is_empty() {
        let rows: Vec<PendingRow> = report
            .pending
            .iter()
            .enumerate()
            .map(|(i, p)| PendingRow {
                index: i + 1,
                file: p
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.path.display().to_string()),
                bytes: p.bytes,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    println!("archive source: {}", report.source);
    println!(
        "local archive:  {} (chunk above {} bytes)",
        describe_decision(&report.local_archive),
        report.size_threshold_bytes
    );
    if report.would_run {
        println!("Run 'archivist run' to merge and publish.");
    }
}
