pub mod init;
pub mod merge;
pub mod run;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use archivist_core::{config, PipelineConfig, SourceConfig, DEFAULT_CONFIG_FILE};

/// Where to find the config and which directory relative paths hang off.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the config file. Defaults to `<root>/archivist.yaml`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Working root for relative paths. Defaults to the current directory.
    #[arg(long, short = 'r')]
    pub root: Option<PathBuf>,

    /// Override `input_dir`.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Override `output_dir`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Read the prior archive from this directory instead of the configured source.
    #[arg(long, value_name = "DIR")]
    pub archive: Option<PathBuf>,

    /// Override the trigger threshold (runs only when pending > N).
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,
}

impl ConfigArgs {
    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("cannot determine current directory"),
        }
    }

    /// Load, apply flag overrides, and resolve against the root.
    pub fn load(&self) -> Result<PipelineConfig> {
        let root = self.root()?;
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));
        let mut cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?;

        if let Some(dir) = &self.input_dir {
            cfg.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(dir) = &self.archive {
            cfg.source = SourceConfig::Directory { path: dir.clone() };
        }
        if let Some(n) = self.threshold {
            cfg.trigger_threshold = n;
        }

        let cfg = cfg.resolve(&root);
        cfg.validate().context("invalid configuration")?;
        tracing::debug!("config loaded from {} (root {})", path.display(), root.display());
        Ok(cfg)
    }
}
