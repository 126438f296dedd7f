//! Recover extraction records left by a previous run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use super::layout::{find_file_named, read_sentinel, SENTINEL_SUFFIX};
use crate::error::{Result, SlicerError};
use crate::types::ContainerKind;

/// An extracted file and the internal path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    pub internal_path: String,
    pub disk_path: PathBuf,
    pub kind: ContainerKind,
}

/// Walk `output` for sentinels and pair each with the file it names.
///
/// Sub-directories hold texture and catalog extractions; sentinels directly
/// in `output` belong to banks. Records come back sorted by location.
pub fn rescan(output: &Path) -> Result<Vec<ExtractionRecord>> {
    if !output.is_dir() {
        return Err(SlicerError::Missing {
            path: output.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    let walker = WalkDir::new(output)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        if entry.file_type().is_dir() {
            let found = records_in(path)?;
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), "no readable sentinel, skipping");
            }
            records.extend(found);
        } else if let Some(record) = record_for(path) {
            records.push(record);
        }
    }

    tracing::info!(count = records.len(), output = %output.display(), "rescanned previous extraction");
    Ok(records)
}

fn records_in(dir: &Path) -> Result<Vec<ExtractionRecord>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SlicerError::io(dir, format!("Failed to list directory: {}", e)))?;

    let mut sentinels: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    sentinels.sort();

    Ok(sentinels.iter().filter_map(|path| record_for(path)).collect())
}

/// Build a record from a sentinel path, or `None` if it is not one.
fn record_for(sentinel: &Path) -> Option<ExtractionRecord> {
    let file_name = sentinel.file_name()?.to_str()?;
    let leaf = file_name.strip_suffix(SENTINEL_SUFFIX)?;
    let dir = sentinel.parent()?;

    let Some(internal_path) = read_sentinel(sentinel) else {
        tracing::warn!(path = %sentinel.display(), "empty or unreadable sentinel");
        return None;
    };

    let Some(kind) = ContainerKind::of(&internal_path) else {
        tracing::warn!(path = %sentinel.display(), internal_path, "sentinel names an unsupported file");
        return None;
    };

    match find_file_named(dir, leaf) {
        Ok(Some(disk_path)) => Some(ExtractionRecord {
            internal_path,
            disk_path,
            kind,
        }),
        Ok(None) => {
            tracing::warn!(path = %sentinel.display(), leaf, "sentinel without its extracted file");
            None
        }
        Err(e) => {
            tracing::warn!(path = %sentinel.display(), error = %e, "could not inspect extraction directory");
            None
        }
    }
}
