//! Pending input discovery and the run trigger.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{io_err, PipelineError};

/// Regular files directly inside `input_dir` with the given extension,
/// oldest first (creation time, else modification time, then name).
///
/// A missing `input_dir` has nothing pending.
pub fn discover(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    if !input_dir.exists() {
        return Ok(vec![]);
    }

    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(|e| io_err(input_dir, e))? {
        let entry = entry.map_err(|e| io_err(input_dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let stamp = meta
            .created()
            .or_else(|_| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((stamp, path));
    }

    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// A run happens only when strictly more than `threshold` inputs are pending.
pub fn should_run(pending: usize, threshold: usize) -> bool {
    pending > threshold
}
