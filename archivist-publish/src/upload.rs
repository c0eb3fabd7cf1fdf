//! Publishing the merged output directory as a new dataset version.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use archivist_core::DatasetMetadata;
use chrono::{DateTime, Local};

use crate::error::{upload_io, UploadError};

/// Sink for a finished output directory. Called once per run.
pub trait Uploader {
    /// Durably publish every regular file in `dir` as one new version.
    fn upload(
        &self,
        dir: &Path,
        metadata: &DatasetMetadata,
        version_notes: &str,
    ) -> Result<(), UploadError>;

    fn describe(&self) -> String;
}

/// `Auto update <YYYY-mm-dd HH:MM:SS>`
pub fn version_notes(at: DateTime<Local>) -> String {
    format!("Auto update {}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Write the dataset descriptor as JSON to `path`.
pub fn write_metadata(path: &Path, metadata: &DatasetMetadata) -> Result<(), UploadError> {
    let json = serde_json::to_string(metadata)?;
    std::fs::write(path, json).map_err(|e| upload_io(path, e))
}

/// Regular files directly inside `dir`, sorted by name.
fn output_files(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| upload_io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(UploadError::EmptyOutput(dir.to_path_buf()));
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// Directory publisher
// ---------------------------------------------------------------------------

/// Versioned copies under a local root:
///
/// ```text
/// <root>/<owner>/<title>/
///   v0001/   processed_data.json, dataset-metadata.json, VERSION_NOTES
///   v0002/   …
/// ```
///
/// Each version is staged in `.v000N.tmp` and renamed into place, so a
/// version directory either exists complete or not at all.
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<owner>/<title>`
    pub fn dataset_dir(&self, metadata: &DatasetMetadata) -> PathBuf {
        self.root.join(&metadata.id)
    }

    /// Highest published version directory, if any.
    pub fn latest_version(&self, metadata: &DatasetMetadata) -> Option<PathBuf> {
        let dir = self.dataset_dir(metadata);
        let mut versions: Vec<(u32, PathBuf)> = std::fs::read_dir(&dir)
            .ok()?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                let n = name.strip_prefix('v')?.parse::<u32>().ok()?;
                Some((n, e.path()))
            })
            .collect();
        versions.sort_by_key(|(n, _)| *n);
        versions.pop().map(|(_, path)| path)
    }

    fn next_version(&self, metadata: &DatasetMetadata) -> u32 {
        self.latest_version(metadata)
            .and_then(|p| {
                p.file_name()?
                    .to_string_lossy()
                    .strip_prefix('v')?
                    .parse::<u32>()
                    .ok()
            })
            .map_or(1, |n| n + 1)
    }
}

impl Uploader for DirectoryUploader {
    fn upload(
        &self,
        dir: &Path,
        metadata: &DatasetMetadata,
        version_notes: &str,
    ) -> Result<(), UploadError> {
        let files = output_files(dir)?;
        let dataset_dir = self.dataset_dir(metadata);
        std::fs::create_dir_all(&dataset_dir).map_err(|e| upload_io(&dataset_dir, e))?;

        let version = format!("v{:04}", self.next_version(metadata));
        let staging = dataset_dir.join(format!(".{version}.tmp"));
        let target = dataset_dir.join(&version);

        let staged = stage_version(&files, &staging, version_notes);
        if let Err(e) = staged.and_then(|()| {
            std::fs::rename(&staging, &target).map_err(|e| upload_io(&target, e))
        }) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        tracing::info!(
            "published {} files as {} ({})",
            files.len(),
            target.display(),
            metadata.access()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn stage_version(files: &[PathBuf], staging: &Path, notes: &str) -> Result<(), UploadError> {
    if staging.exists() {
        std::fs::remove_dir_all(staging).map_err(|e| upload_io(staging, e))?;
    }
    std::fs::create_dir_all(staging).map_err(|e| upload_io(staging, e))?;
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let dest = staging.join(name);
        std::fs::copy(file, &dest).map_err(|e| upload_io(&dest, e))?;
    }
    let notes_path = staging.join("VERSION_NOTES");
    std::fs::write(&notes_path, notes).map_err(|e| upload_io(&notes_path, e))
}

// ---------------------------------------------------------------------------
// HTTP publisher
// ---------------------------------------------------------------------------

/// `PUT <endpoint>/<owner>/<title>/<file name>` for every output file.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    endpoint: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .build();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
            agent,
        }
    }

    fn file_url(&self, metadata: &DatasetMetadata, file: &Path) -> String {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}/{}", self.endpoint, metadata.id, name)
    }
}

impl Uploader for HttpUploader {
    fn upload(
        &self,
        dir: &Path,
        metadata: &DatasetMetadata,
        version_notes: &str,
    ) -> Result<(), UploadError> {
        let files = output_files(dir)?;
        for file in &files {
            let url = self.file_url(metadata, file);
            let body = File::open(file).map_err(|e| upload_io(file, e))?;

            let mut request = self
                .agent
                .put(&url)
                .set("Content-Type", "application/x-ndjson")
                .set("X-Version-Notes", version_notes);
            if let Some(token) = &self.token {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }

            match request.send(body) {
                Ok(_) => tracing::debug!("uploaded {}", url),
                Err(ureq::Error::Status(status, _)) => {
                    return Err(UploadError::Rejected { url, status })
                }
                Err(err) => {
                    return Err(UploadError::Http {
                        url,
                        message: err.to_string(),
                    })
                }
            }
        }
        tracing::info!("published {} files to {}/{}", files.len(), self.endpoint, metadata.id);
        Ok(())
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
