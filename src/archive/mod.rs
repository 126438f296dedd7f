//! Extraction of containers from the game archive.
//!
//! Each request walks a small state machine:
//!
//! ```text
//! NotExtracted --(dir absent, or overwrite)--> Extracting --(exit 0 + file found)--> Extracted
//!      |                                            \--(busy / nonzero / no file)--> Failed
//!      \--(dir present, no overwrite, file found)--> Cached   (sentinel repaired if needed)
//! ```
//!
//! `Failed` is an `Err`; the caller decides whether the batch continues.
//! Nothing here is safe to run against the same archive from more than one
//! thread: the extraction tool is not reentrant.

mod layout;
mod lock;
mod rescan;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, SlicerError};
use crate::tool::{self, Tool};
use crate::types::ContainerKind;

pub use layout::{
    directory_name, find_file_named, read_sentinel, sentinel_name, write_sentinel, Layout,
    SENTINEL_SUFFIX,
};
pub use lock::is_busy;
pub use rescan::{rescan, ExtractionRecord};

/// How the game's content is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A single `Content.ggpk`; everything goes through the extraction tool.
    Monolithic,
    /// A bundle index (`_.index.bin`) with banks stored loose beside it.
    LooseIndex,
}

impl ArchiveKind {
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        if ext.eq_ignore_ascii_case("ggpk") {
            Ok(ArchiveKind::Monolithic)
        } else if ext.eq_ignore_ascii_case("bin") {
            Ok(ArchiveKind::LooseIndex)
        } else {
            Err(SlicerError::Config {
                message: format!("Unrecognised archive {}", path.display()),
                help: Some("Expected a Content.ggpk or _.index.bin file".to_string()),
            })
        }
    }
}

/// Terminal success states of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    /// The tool ran (or the bank was moved) during this call.
    Extracted,
    /// A previous run's output was reused.
    Cached,
}

/// A file that now exists on disk for a requested internal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub kind: ContainerKind,
    pub internal_path: String,
    pub disk_path: PathBuf,
    pub state: ExtractionState,
}

/// Runs the extraction tool against one archive with an overwrite policy.
#[derive(Debug)]
pub struct ArchiveExtractor<T> {
    tool: T,
    archive: PathBuf,
    kind: ArchiveKind,
    overwrite: bool,
}

impl<T: Tool> ArchiveExtractor<T> {
    pub fn new(tool: T, archive: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        let archive = archive.into();
        if !archive.is_file() {
            return Err(SlicerError::Config {
                message: format!("Archive not found: {}", archive.display()),
                help: Some("Set `archive` in slicer.yaml to Content.ggpk or _.index.bin".to_string()),
            });
        }
        let kind = ArchiveKind::detect(&archive)?;

        Ok(Self {
            tool,
            archive,
            kind,
            overwrite,
        })
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Extract one internal path into `output`.
    pub fn extract(&self, output: &Path, internal_path: &str) -> Result<Extracted> {
        let kind = ContainerKind::of(internal_path).ok_or_else(|| SlicerError::Parse {
            message: format!("Cannot extract {}: unsupported extension", internal_path),
            help: Some("Only .dds, .bank and .txt paths are extracted".to_string()),
        })?;

        let layout = Layout::new(output, internal_path, kind);

        if kind == ContainerKind::Bank && self.kind == ArchiveKind::LooseIndex {
            return self.move_loose_bank(&layout, internal_path);
        }

        if let Some(cached) = self.cached(&layout, internal_path)? {
            return Ok(cached);
        }

        self.ensure_idle()?;
        self.prepare(&layout)?;

        let args: Vec<OsString> = vec![
            self.archive.clone().into_os_string(),
            internal_path.into(),
            layout.dir.clone().into_os_string(),
        ];

        tracing::info!(internal_path, kind = kind.name(), "extracting");
        let run = self.tool.run(&args)?;
        if !run.output.trim().is_empty() {
            tracing::info!(tool = self.tool.name(), output = %run.output.trim(), "extraction tool output");
        }
        tool::check(&self.tool, run)?;

        let disk_path = layout.find_file()?.ok_or_else(|| SlicerError::Missing {
            path: layout.expected_file(),
        })?;

        write_sentinel(&layout.sentinel(), internal_path)?;
        tracing::info!(internal_path, path = %disk_path.display(), "extracted");

        Ok(Extracted {
            kind,
            internal_path: internal_path.to_string(),
            disk_path,
            state: ExtractionState::Extracted,
        })
    }

    /// Reuse a previous extraction when overwrite is off.
    ///
    /// A hit always leaves a valid sentinel behind, even if an older run
    /// never wrote one.
    fn cached(&self, layout: &Layout, internal_path: &str) -> Result<Option<Extracted>> {
        if self.overwrite {
            return Ok(None);
        }

        let present = match layout.kind {
            ContainerKind::Bank => layout.find_file()?.is_some(),
            ContainerKind::Texture | ContainerKind::Text => layout.dir.is_dir(),
        };
        if !present {
            return Ok(None);
        }

        let Some(disk_path) = layout.find_file()? else {
            tracing::debug!(dir = %layout.dir.display(), "directory has no extracted file, extracting again");
            return Ok(None);
        };

        heal_sentinel(layout, internal_path)?;
        tracing::debug!(internal_path, path = %disk_path.display(), "using previous extraction");

        Ok(Some(Extracted {
            kind: layout.kind,
            internal_path: internal_path.to_string(),
            disk_path,
            state: ExtractionState::Cached,
        }))
    }

    fn ensure_idle(&self) -> Result<()> {
        if is_busy(&self.archive)? {
            tracing::warn!(archive = %self.archive.display(), "archive is busy");
            return Err(SlicerError::ArchiveBusy {
                path: self.archive.clone(),
            });
        }
        Ok(())
    }

    /// Create the target directory and clear any stale output when overwriting.
    fn prepare(&self, layout: &Layout) -> Result<()> {
        std::fs::create_dir_all(&layout.dir).map_err(|e| {
            SlicerError::io(&layout.dir, format!("Failed to create output directory: {}", e))
        })?;

        if self.overwrite {
            if let Some(stale) = layout.find_file()? {
                remove_file(&stale)?;
            }
            let sentinel = layout.sentinel();
            if sentinel.exists() {
                remove_file(&sentinel)?;
            }
        }

        Ok(())
    }

    /// Banks next to a bundle index are moved, not extracted.
    fn move_loose_bank(&self, layout: &Layout, internal_path: &str) -> Result<Extracted> {
        let destination = layout.expected_file();

        if !self.overwrite {
            if let Some(existing) = layout.find_file()? {
                heal_sentinel(layout, internal_path)?;
                return Ok(Extracted {
                    kind: layout.kind,
                    internal_path: internal_path.to_string(),
                    disk_path: existing,
                    state: ExtractionState::Cached,
                });
            }
        }

        let root = self.archive.parent().unwrap_or_else(|| Path::new("."));
        let source = internal_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |path, part| path.join(part));

        if !source.is_file() {
            return Err(SlicerError::Missing { path: source });
        }

        self.ensure_idle()?;
        std::fs::create_dir_all(&layout.dir).map_err(|e| {
            SlicerError::io(&layout.dir, format!("Failed to create output directory: {}", e))
        })?;

        if destination.exists() {
            remove_file(&destination)?;
        }
        move_file(&source, &destination)?;
        write_sentinel(&layout.sentinel(), internal_path)?;
        tracing::info!(internal_path, path = %destination.display(), "moved bank");

        Ok(Extracted {
            kind: layout.kind,
            internal_path: internal_path.to_string(),
            disk_path: destination,
            state: ExtractionState::Extracted,
        })
    }
}

fn heal_sentinel(layout: &Layout, internal_path: &str) -> Result<()> {
    let sentinel = layout.sentinel();
    let valid = read_sentinel(&sentinel)
        .map(|recorded| recorded.eq_ignore_ascii_case(internal_path))
        .unwrap_or(false);

    if !valid {
        tracing::warn!(path = %sentinel.display(), internal_path, "sentinel missing or stale, rewriting");
        write_sentinel(&sentinel, internal_path)?;
    }
    Ok(())
}

fn remove_file(path: &Path) -> Result<()> {
    std::fs::remove_file(path)
        .map_err(|e| SlicerError::io(path, format!("Failed to remove stale file: {}", e)))
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    std::fs::copy(from, to)
        .map_err(|e| SlicerError::io(from, format!("Failed to move to {}: {}", to.display(), e)))?;
    std::fs::remove_file(from)
        .map_err(|e| SlicerError::io(from, format!("Copied but could not remove source: {}", e)))
}
