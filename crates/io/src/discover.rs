use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Find session CSV files under `dir`.
///
/// Patterns are tried in priority order and the first one with any
/// matches wins, so a specific device-export pattern (e.g.
/// `"Points Data Sep*.csv"`) can shadow the `*.csv` catch-all. Names in
/// `exclude` (previous combined outputs and the like) are skipped.
/// Results are sorted so ingestion order is deterministic across runs.
pub fn discover_session_files(
    dir: &Path,
    patterns: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, LoadError> {
    for pattern in patterns {
        let full = dir.join(pattern).to_string_lossy().into_owned();
        let mut matches: Vec<PathBuf> = glob::glob(&full)
            .map_err(|e| LoadError::Io(e.to_string()))?
            .filter_map(Result::ok)
            .filter(|path| !is_excluded(path, exclude))
            .collect();
        if !matches.is_empty() {
            matches.sort();
            return Ok(matches);
        }
    }
    Err(LoadError::NoFiles {
        dir: dir.display().to_string(),
    })
}

fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    match path.file_name() {
        Some(name) => exclude.iter().any(|x| name.to_string_lossy() == x.as_str()),
        None => true,
    }
}

/// List session folders directly under `base` (the per-day capture
/// directories the device writes), sorted by name.
pub fn discover_session_dirs(base: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(base).map_err(|e| LoadError::Io(e.to_string()))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
