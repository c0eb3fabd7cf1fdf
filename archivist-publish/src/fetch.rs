//! Retrieval of the previously published archive.
//!
//! A fetched archive always lands at `<dest_dir>/<file_name>`, written to a
//! `.tmp` sibling first and renamed into place, so a failed download never
//! leaves a truncated archive behind for the size policy to pick up.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{fetch_io, FetchError};

/// Source of the prior archive.
pub trait ArchiveSource {
    /// Place the archive in `dest_dir` and return its path.
    ///
    /// `Ok(None)` means the source is configured to never provide one.
    fn fetch(&self, dest_dir: &Path) -> Result<Option<PathBuf>, FetchError>;

    /// Human-readable location for logs and status output.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// No source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NoArchiveSource;

impl ArchiveSource for NoArchiveSource {
    fn fetch(&self, _dest_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

// ---------------------------------------------------------------------------
// Local directory
// ---------------------------------------------------------------------------

/// Copies `<dir>/<file_name>` (e.g. a `v<NNNN>/` of a directory publisher).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    file_name: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }
}

impl ArchiveSource for DirectorySource {
    fn fetch(&self, dest_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
        let src = self.dir.join(&self.file_name);
        if !src.is_file() {
            return Err(FetchError::Missing {
                location: src.display().to_string(),
            });
        }
        let mut reader = File::open(&src).map_err(|e| fetch_io(&src, e))?;
        let dest = store(&mut reader, dest_dir, &self.file_name)?;
        Ok(Some(dest))
    }

    fn describe(&self) -> String {
        self.dir.join(&self.file_name).display().to_string()
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Downloads the archive with a plain `GET`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    file_name: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .build();
        Self {
            url: url.into(),
            file_name: file_name.into(),
            agent,
        }
    }
}

impl ArchiveSource for HttpSource {
    fn fetch(&self, dest_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                return Err(FetchError::Missing {
                    location: self.url.clone(),
                })
            }
            Err(err) => {
                return Err(FetchError::Http {
                    url: self.url.clone(),
                    message: err.to_string(),
                })
            }
        };
        let mut reader = response.into_reader();
        let dest = store(&mut reader, dest_dir, &self.file_name)?;
        Ok(Some(dest))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Stream `reader` to `<dest_dir>/<file_name>` via a `.tmp` sibling.
fn store(reader: &mut impl io::Read, dest_dir: &Path, file_name: &str) -> Result<PathBuf, FetchError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| fetch_io(dest_dir, e))?;
    let dest = dest_dir.join(file_name);
    let tmp = dest_dir.join(format!("{file_name}.tmp"));

    let copied = File::create(&tmp)
        .and_then(|mut file| io::copy(reader, &mut file).and_then(|_| file.sync_all()));
    if let Err(e) = copied {
        let _ = std::fs::remove_file(&tmp);
        return Err(fetch_io(&tmp, e));
    }
    if let Err(e) = std::fs::rename(&tmp, &dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(fetch_io(&dest, e));
    }
    tracing::debug!("fetched archive to {}", dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn no_source_yields_none() {
        let tmp = TempDir::new().unwrap();
        assert!(NoArchiveSource.fetch(tmp.path()).unwrap().is_none());
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn directory_source_copies_archive() {
        let published = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fs::write(published.path().join("processed_data.json"), "{\"id\":2}\n").unwrap();

        let source = DirectorySource::new(published.path(), "processed_data.json");
        let dest_dir = work.path().join("existing");
        let fetched = source.fetch(&dest_dir).unwrap().unwrap();

        assert_eq!(fetched, dest_dir.join("processed_data.json"));
        assert_eq!(fs::read_to_string(&fetched).unwrap(), "{\"id\":2}\n");
        assert!(published.path().join("processed_data.json").exists());
        assert!(!dest_dir.join("processed_data.json.tmp").exists());
    }

    #[test]
    fn directory_source_missing_file_is_fetch_error() {
        let published = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = DirectorySource::new(published.path(), "processed_data.json");
        let err = source.fetch(work.path()).unwrap_err();
        assert!(matches!(err, FetchError::Missing { .. }), "got: {err}");
    }

    #[test]
    fn http_source_unreachable_is_fetch_error() {
        let work = TempDir::new().unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let source = HttpSource::new("http://127.0.0.1:9/processed_data.json", "processed_data.json");
        let err = source.fetch(work.path()).unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }), "got: {err}");
        assert!(!work.path().join("processed_data.json").exists());
    }
}
