//! `archivist merge --output <file> [--archive <file>] <inputs>...`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use archivist_core::config::DEFAULT_SENTINEL_ID;
use archivist_merge::{ArchivePlan, MergeStats, Merger, SourceKind};

/// Arguments for `archivist merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// File to write the merged records to (created or truncated).
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Prior archive, streamed first and exempt from the sentinel filter.
    #[arg(long, short = 'a')]
    pub archive: Option<PathBuf>,

    /// `id` value of records to drop from the inputs.
    #[arg(long, default_value_t = DEFAULT_SENTINEL_ID)]
    pub sentinel_id: i64,

    /// Emit the merge stats as JSON.
    #[arg(long)]
    pub json: bool,

    /// JSONL input files, in processing order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "kind")]
    kind: &'static str,
    #[tabled(rename = "read")]
    read: usize,
    #[tabled(rename = "written")]
    written: usize,
    #[tabled(rename = "duplicates")]
    duplicates: usize,
    #[tabled(rename = "sentinels")]
    sentinels: usize,
}

impl MergeArgs {
    pub fn run(self) -> Result<()> {
        let plan = match &self.archive {
            Some(path) => ArchivePlan::Stream { path: path.clone() },
            None => ArchivePlan::Empty,
        };

        let stats = Merger::new(self.sentinel_id)
            .merge(&plan, &self.inputs, &self.output)
            .with_context(|| format!("failed to merge into '{}'", self.output.display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }
        print_stats(&stats);
        println!(
            "{} wrote {} record(s) to {}",
            "✓".green().bold(),
            stats.written(),
            self.output.display()
        );
        Ok(())
    }
}

fn print_stats(stats: &MergeStats) {
    let rows: Vec<SourceRow> = stats
        .sources
        .iter()
        .map(|s| SourceRow {
            source: s.path.display().to_string(),
            kind: match s.kind {
                SourceKind::Archive => "archive",
                SourceKind::Input => "input",
            },
            read: s.read,
            written: s.written,
            duplicates: s.duplicates,
            sentinels: s.sentinels,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
