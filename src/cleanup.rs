//! Removal of fill files left behind by an interrupted run.

use crate::config::{TEMP_FILE_EXTENSION, TEMP_FILE_PREFIX};
use crate::error::Result;
use crate::pattern::Pattern;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of a cleanup sweep.
#[derive(Debug, Default, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Parse `shred_temp_<pass>_<pattern>.dat` into its pass and pattern.
pub fn parse_temp_file_name(name: &str) -> Option<(u32, Pattern)> {
    let stem = name
        .strip_prefix(TEMP_FILE_PREFIX)?
        .strip_suffix(TEMP_FILE_EXTENSION)?
        .strip_suffix('.')?;
    let (pass, pattern) = stem.split_once('_')?;

    if !pass.bytes().all(|b| b.is_ascii_digit()) || !pattern.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let pass = pass.parse().ok()?;
    let pattern = Pattern::from_index(pattern.parse().ok()?)?;
    Some((pass, pattern))
}

/// List fill files directly inside `dir`.
pub fn find_stale(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .and_then(parse_temp_file_name)
            .is_some();
        if matches {
            stale.push(entry.into_path());
        }
    }

    stale.sort();
    Ok(stale)
}

/// Delete every fill file directly inside `dir`.
///
/// Individual removal failures are collected rather than returned.
pub fn remove_stale(dir: &Path) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    for path in find_stale(dir)? {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Removed stale {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                log::error!("Failed to remove {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}
