//! On-disk naming of extraction records.
//!
//! Every texture or catalog extraction gets its own directory named after
//! the internal path (`art/x/4k/1.dds` -> `art_x_4k_1`). Banks are placed
//! flat in the output directory. Next to each extracted file sits a sentinel
//! `<file>_path.txt` holding the internal path that produced it.

use std::path::{Path, PathBuf};

use crate::error::{Result, SlicerError};
use crate::types::{leaf_segment, ContainerKind};

/// Suffix of sentinel files.
pub const SENTINEL_SUFFIX: &str = "_path.txt";

/// Where one internal path lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub kind: ContainerKind,
    /// Directory the tool writes into.
    pub dir: PathBuf,
    /// File name the tool is expected to produce (matched case-insensitively).
    pub leaf: String,
}

impl Layout {
    pub fn new(output: &Path, internal_path: &str, kind: ContainerKind) -> Self {
        let dir = match kind {
            ContainerKind::Bank => output.to_path_buf(),
            ContainerKind::Texture | ContainerKind::Text => {
                let name = directory_name(internal_path);
                find_dir_named(output, &name).unwrap_or_else(|| output.join(name))
            }
        };

        Self {
            kind,
            dir,
            leaf: leaf_segment(internal_path).to_string(),
        }
    }

    /// Path the extracted file is expected at (exact case).
    pub fn expected_file(&self) -> PathBuf {
        self.dir.join(&self.leaf)
    }

    pub fn sentinel(&self) -> PathBuf {
        self.dir.join(sentinel_name(&self.leaf))
    }

    /// Locate the extracted file, ignoring case.
    pub fn find_file(&self) -> Result<Option<PathBuf>> {
        find_file_named(&self.dir, &self.leaf)
    }
}

/// Directory name for an internal path: `/` becomes `_`, the extension is dropped.
pub fn directory_name(internal_path: &str) -> String {
    let flattened = internal_path.trim_start_matches('/').replace('/', "_");
    match flattened.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => flattened,
    }
}

pub fn sentinel_name(leaf: &str) -> String {
    format!("{}{}", leaf, SENTINEL_SUFFIX)
}

/// Read a sentinel, returning the internal path it records.
pub fn read_sentinel(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn write_sentinel(path: &Path, internal_path: &str) -> Result<()> {
    std::fs::write(path, internal_path)
        .map_err(|e| SlicerError::io(path, format!("Failed to write sentinel: {}", e)))
}

/// Find an existing sub-directory of `parent` named `name` ignoring ASCII case.
///
/// Internal paths are case-insensitive, so `Art/X/1.dds` must land in the
/// record directory an earlier `art/x/1.dds` request created.
fn find_dir_named(parent: &Path, name: &str) -> Option<PathBuf> {
    let exact = parent.join(name);
    if exact.is_dir() {
        return Some(exact);
    }

    std::fs::read_dir(parent)
        .ok()?
        .flatten()
        .find(|entry| {
            entry.path().is_dir() && entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
        })
        .map(|entry| entry.path())
}

/// Find a regular file in `dir` whose name equals `name` ignoring ASCII case.
pub fn find_file_named(dir: &Path, name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| SlicerError::io(dir, format!("Failed to list directory: {}", e)))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}
