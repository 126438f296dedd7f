//! Texture catalogs (`uiimages1.txt`, `uidivinationimages.txt`).
//!
//! A catalog maps texture names to the container they live in and the
//! pixel rectangle they occupy. Catalogs are large, externally generated
//! UTF-16LE text files that occasionally carry stray rows, so parsing is
//! best-effort: a bad row is recorded and skipped, never fatal.
//!
//! # Example
//!
//! ```ignore
//! use ggpk_slicer::catalog::Catalog;
//!
//! let catalog = Catalog::load("out/art_uiimages1/uiimages1.txt");
//! for texture in catalog.textures_for("art/textures/interface/2d/2dart/uiimages/common/4k/1.dds") {
//!     println!("{} {}", texture.name, texture.rect);
//! }
//! ```

mod line;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SlicerError};
use crate::types::Texture;

pub use line::{parse_line, CatalogLine};

/// A catalog row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
struct Row {
    name: String,
    container: String,
    container_key: String,
    rect: crate::types::Rect,
}

/// An in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    source: Option<PathBuf>,
    rows: Vec<Row>,
    skipped: Vec<SkippedLine>,
}

impl Catalog {
    /// Read and parse a catalog file, failing on IO or decoding errors.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| SlicerError::io(path, format!("Failed to read catalog: {}", e)))?;

        let text = decode(&bytes).map_err(|e| match e {
            SlicerError::Parse { message, help } => SlicerError::Parse {
                message: format!("{}: {}", path.display(), message),
                help,
            },
            other => other,
        })?;

        let mut catalog = Self::parse(&text);
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Read a catalog, reporting failures and falling back to an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "catalog unreadable, using empty catalog");
                Self {
                    source: Some(path.to_path_buf()),
                    ..Self::default()
                }
            }
        }
    }

    /// Parse already decoded catalog text.
    pub fn parse(text: &str) -> Self {
        let mut catalog = Self::default();

        for (index, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }

            match parse_line(raw) {
                Ok(line) => catalog.rows.push(Row {
                    name: line.name.to_string(),
                    container: line.container.to_string(),
                    container_key: line.container.to_lowercase(),
                    rect: line.rect,
                }),
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "skipping malformed catalog row");
                    catalog.skipped.push(SkippedLine {
                        line: index + 1,
                        message: e.to_string(),
                    });
                }
            }
        }

        catalog
    }

    /// File the catalog was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of well-formed rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that were skipped while parsing.
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Every distinct texture stored in `container`, in catalog order.
    ///
    /// The container path matches case-insensitively as a substring of the
    /// row's container token. The first row for a name wins.
    pub fn textures_for(&self, container: &str) -> Vec<Texture> {
        self.collect(container, |_| true)
    }

    /// Like [`Catalog::textures_for`], keeping only names on the allow-list
    /// (case-insensitive exact match).
    pub fn textures_for_wanted<S: AsRef<str>>(&self, container: &str, wanted: &[S]) -> Vec<Texture> {
        self.collect(container, |name| {
            wanted.iter().any(|w| w.as_ref().eq_ignore_ascii_case(name))
        })
    }

    /// Distinct container paths in first-seen order (case-insensitive).
    pub fn containers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.container_key.as_str()))
            .map(|row| row.container.as_str())
            .collect()
    }

    fn collect(&self, container: &str, keep: impl Fn(&str) -> bool) -> Vec<Texture> {
        let key = container.to_lowercase();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut textures = Vec::new();

        for row in &self.rows {
            if !row.container_key.contains(&key) {
                continue;
            }
            if !seen.insert(row.name.as_str()) {
                continue;
            }
            if keep(&row.name) {
                textures.push(Texture::new(&row.name, &row.container, row.rect));
            }
        }

        textures
    }
}

/// Decode UTF-16LE catalog bytes, dropping a leading byte order mark.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let (text, had_errors) = encoding_rs::UTF_16LE.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(SlicerError::Parse {
            message: "catalog is not valid UTF-16LE".to_string(),
            help: Some("Catalogs are extracted as UTF-16LE; re-extract with overwrite".to_string()),
        });
    }
    Ok(text.into_owned())
}

#[cfg(test)]
pub(crate) fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}
