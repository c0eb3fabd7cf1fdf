//! Pipeline configuration.
//!
//! # File layout
//!
//! ```text
//! <root>/archivist.yaml   (optional; defaults apply when absent)
//! ```
//!
//! # API pattern
//!
//! - [`load_at`] / [`save_at`] take an explicit path; a missing file loads as
//!   [`PipelineConfig::default`].
//! - [`PipelineConfig::resolve`] turns every relative path into one rooted at
//!   the given directory. Components only ever see resolved configs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{AccessLevel, DatasetMetadata, License};

/// Default config file name, looked up in the working root.
pub const DEFAULT_CONFIG_FILE: &str = "archivist.yaml";

/// Archives above this size are preserved as a chunk instead of streamed (1.5 GiB).
pub const DEFAULT_SIZE_THRESHOLD_BYTES: u64 = 1_610_612_736;

/// A run only happens when strictly more inputs than this are pending.
pub const DEFAULT_TRIGGER_THRESHOLD: usize = 10;

/// `id` value marking a subscription-confirmation record.
pub const DEFAULT_SENTINEL_ID: i64 = 1;

// ---------------------------------------------------------------------------
// Collaborator selection
// ---------------------------------------------------------------------------

/// Where the previously published archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// No prior archive; every run starts empty.
    #[default]
    None,
    /// Copy `<path>/<output_file_name>` from a local directory.
    Directory { path: PathBuf },
    /// Download the archive from a URL.
    Http { url: String },
}

/// Where the merged output gets published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PublishConfig {
    /// Copy the output directory into `<path>/<owner>/<title>/v<NNNN>/`.
    Directory { path: PathBuf },
    /// `PUT` every output file to `<endpoint>/<dataset id>/<file name>`.
    Http {
        endpoint: String,
        /// Environment variable holding a bearer token.
        #[serde(default)]
        token_env: Option<String>,
    },
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig::Directory {
            path: PathBuf::from("published"),
        }
    }
}

/// How processed inputs are pruned after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArchiverConfig {
    /// `git rm` the inputs, commit, optionally push.
    Git {
        /// Repository root; defaults to the config root.
        #[serde(default)]
        repo_dir: Option<PathBuf>,
        #[serde(default = "default_commit_message")]
        message: String,
        #[serde(default)]
        push: bool,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        user_email: Option<String>,
    },
    /// Plain file removal, no history.
    Remove,
}

fn default_commit_message() -> String {
    "Remove processed files [skip ci]".to_string()
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        ArchiverConfig::Git {
            repo_dir: None,
            message: default_commit_message(),
            push: false,
            user_name: None,
            user_email: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub title: String,
    pub owner: String,
    pub license: String,
    pub access: AccessLevel,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            title: "records".to_string(),
            owner: "archivist".to_string(),
            license: "CC0-1.0".to_string(),
            access: AccessLevel::Private,
        }
    }
}

impl DatasetConfig {
    /// `<owner>/<title>`
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.owner, self.title)
    }

    pub fn metadata(&self) -> DatasetMetadata {
        DatasetMetadata {
            title: self.title.clone(),
            id: self.identifier(),
            licenses: vec![License {
                name: self.license.clone(),
            }],
            is_private: self.access == AccessLevel::Private,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Everything a run needs to know. No component reads a path from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned for pending line-delimited JSON files.
    pub input_dir: PathBuf,
    /// Extension (without the dot) a pending file must carry.
    pub input_extension: String,
    /// Working directory holding the merged output until it is published.
    pub output_dir: PathBuf,
    /// Temporary location the prior archive is fetched into.
    pub fetch_dir: PathBuf,
    pub output_file_name: String,
    pub chunk_file_name: String,
    pub metadata_file_name: String,
    pub size_threshold_bytes: u64,
    pub trigger_threshold: usize,
    pub sentinel_id: i64,
    pub dataset: DatasetConfig,
    pub source: SourceConfig,
    pub publish: PublishConfig,
    pub archiver: ArchiverConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            input_extension: "json".to_string(),
            output_dir: PathBuf::from("data").join("kaggle_data"),
            fetch_dir: PathBuf::from("data").join("existing"),
            output_file_name: "processed_data.json".to_string(),
            chunk_file_name: "chunked_data.json".to_string(),
            metadata_file_name: "dataset-metadata.json".to_string(),
            size_threshold_bytes: DEFAULT_SIZE_THRESHOLD_BYTES,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
            sentinel_id: DEFAULT_SENTINEL_ID,
            dataset: DatasetConfig::default(),
            source: SourceConfig::default(),
            publish: PublishConfig::default(),
            archiver: ArchiverConfig::default(),
        }
    }
}

fn rooted(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

impl PipelineConfig {
    /// Return a copy with every relative path joined onto `root`.
    pub fn resolve(&self, root: &Path) -> PipelineConfig {
        let mut cfg = self.clone();
        cfg.input_dir = rooted(root, &self.input_dir);
        cfg.output_dir = rooted(root, &self.output_dir);
        cfg.fetch_dir = rooted(root, &self.fetch_dir);

        if let SourceConfig::Directory { path } = &mut cfg.source {
            *path = rooted(root, path);
        }
        if let PublishConfig::Directory { path } = &mut cfg.publish {
            *path = rooted(root, path);
        }
        if let ArchiverConfig::Git { repo_dir, .. } = &mut cfg.archiver {
            let dir = repo_dir
                .as_deref()
                .map(|d| rooted(root, d))
                .unwrap_or_else(|| root.to_path_buf());
            *repo_dir = Some(dir);
        }
        cfg
    }

    /// Reject configurations that would make components step on each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, name) in [
            ("output_file_name", &self.output_file_name),
            ("chunk_file_name", &self.chunk_file_name),
            ("metadata_file_name", &self.metadata_file_name),
        ] {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be a bare file name, got '{name}'"
                )));
            }
        }
        if self.output_file_name == self.chunk_file_name
            || self.output_file_name == self.metadata_file_name
            || self.chunk_file_name == self.metadata_file_name
        {
            return Err(ConfigError::Invalid(
                "output, chunk and metadata file names must differ".to_string(),
            ));
        }
        if self.input_extension.trim().is_empty() {
            return Err(ConfigError::Invalid("input_extension is empty".to_string()));
        }
        self.validate_dirs()
    }

    /// `output_dir` and `fetch_dir` get wiped during a run, so neither may
    /// contain the input files or each other. Both may sit inside
    /// `input_dir`: discovery never descends into subdirectories.
    fn validate_dirs(&self) -> Result<(), ConfigError> {
        for (field, dir) in [
            ("output_dir", &self.output_dir),
            ("fetch_dir", &self.fetch_dir),
        ] {
            if self.input_dir.starts_with(dir) {
                return Err(ConfigError::Invalid(format!(
                    "{field} '{}' must not be or contain input_dir '{}'",
                    dir.display(),
                    self.input_dir.display()
                )));
            }
        }
        if self.output_dir.starts_with(&self.fetch_dir)
            || self.fetch_dir.starts_with(&self.output_dir)
        {
            return Err(ConfigError::Invalid(format!(
                "output_dir '{}' and fetch_dir '{}' must not overlap",
                self.output_dir.display(),
                self.fetch_dir.display()
            )));
        }
        Ok(())
    }

    /// `<output_dir>/<output_file_name>`
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    /// `<output_dir>/<chunk_file_name>`
    pub fn chunk_file(&self) -> PathBuf {
        self.output_dir.join(&self.chunk_file_name)
    }

    /// `<output_dir>/<metadata_file_name>`
    pub fn metadata_file(&self) -> PathBuf {
        self.output_dir.join(&self.metadata_file_name)
    }

    /// Where a fetched prior archive lands: `<fetch_dir>/<output_file_name>`.
    pub fn fetched_archive(&self) -> PathBuf {
        self.fetch_dir.join(&self.output_file_name)
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the config at `path`, falling back to defaults when it does not exist.
pub fn load_at(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomically write `config` to `path` (`.tmp` sibling, then rename).
pub fn save_at(path: &Path, config: &PipelineConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}
