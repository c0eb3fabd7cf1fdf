//! `archivist init [--root <dir>] [--force]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use archivist_core::{config, PipelineConfig, DEFAULT_CONFIG_FILE};

/// Write a default config into the working root.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write archivist.yaml into. Defaults to the current directory.
    #[arg(long, short = 'r')]
    pub root: Option<PathBuf>,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        let path = root.join(DEFAULT_CONFIG_FILE);
        if path.exists() && !self.force {
            bail!(
                "'{}' already exists; pass --force to overwrite",
                path.display()
            );
        }

        config::save_at(&path, &PipelineConfig::default())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("✓ Wrote {}", path.display());
        Ok(())
    }
}
