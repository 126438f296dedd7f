//! Project manifest (slicer.yaml) parsing.
//!
//! The manifest names the archive, the external tools, the output
//! directory and which containers to slice.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::convert::DEFAULT_FLAGS;
use crate::error::{Result, SlicerError};

/// Manifest file name looked up by the CLI.
pub const MANIFEST_FILENAME: &str = "slicer.yaml";

pub const DEFAULT_EXTRACTOR: &str = "ExtractGGPK.exe";
pub const DEFAULT_CONVERTER: &str = "texconv.exe";
pub const IMAGES_CATALOG: &str = "art/uiimages1.txt";
pub const DIVINATION_CATALOG: &str = "art/uidivinationimages.txt";

/// Project manifest loaded from slicer.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// `Content.ggpk` or `_.index.bin`.
    pub archive: Option<PathBuf>,

    pub tools: ToolsConfig,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Re-extract, re-convert and re-crop even when outputs exist.
    pub overwrite: bool,

    pub catalogs: CatalogPaths,

    /// Texture containers to slice.
    pub textures: Vec<TextureRequest>,

    /// Internal `.bank` paths to extract.
    pub banks: Vec<String>,
}

/// Where the external tools live and how they are run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Executable, or a directory holding `ExtractGGPK.exe`.
    pub extractor: PathBuf,
    /// Executable, or a directory holding `texconv.exe`.
    pub converter: PathBuf,
    /// Kill a tool that runs longer than this.
    pub timeout_secs: Option<u64>,
    pub convert_flags: Vec<String>,
}

/// Internal paths of the two texture catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPaths {
    pub images: String,
    pub divination: String,
}

/// One container and, optionally, the textures wanted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRequest {
    pub path: String,
    /// Empty means every texture the catalog lists for the container.
    #[serde(default)]
    pub textures: Vec<String>,
}

fn default_output() -> PathBuf {
    PathBuf::from("out")
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            archive: None,
            tools: ToolsConfig::default(),
            output: default_output(),
            overwrite: false,
            catalogs: CatalogPaths::default(),
            textures: vec![],
            banks: vec![],
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            extractor: PathBuf::from(DEFAULT_EXTRACTOR),
            converter: PathBuf::from(DEFAULT_CONVERTER),
            timeout_secs: None,
            convert_flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            images: IMAGES_CATALOG.to_string(),
            divination: DIVINATION_CATALOG.to_string(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl TextureRequest {
    pub fn all(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            textures: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from a slicer.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SlicerError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        let mut manifest = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            manifest.resolve_relative_to(base);
        }
        Ok(manifest)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| SlicerError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check slicer.yaml syntax".to_string()),
        })
    }

    /// The archive path, or a configuration error if none is set.
    pub fn archive(&self) -> Result<&Path> {
        self.archive.as_deref().ok_or_else(|| SlicerError::Config {
            message: "No archive configured".to_string(),
            help: Some("Set `archive:` in slicer.yaml or pass --archive".to_string()),
        })
    }

    /// Make relative filesystem paths relative to the manifest's directory.
    fn resolve_relative_to(&mut self, base: &Path) {
        if base.as_os_str().is_empty() {
            return;
        }
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        if let Some(archive) = self.archive.as_mut() {
            resolve(archive);
        }
        resolve(&mut self.output);
        // Bare tool names are left alone; they are looked up as given.
        if self.tools.extractor.components().count() > 1 {
            resolve(&mut self.tools.extractor);
        }
        if self.tools.converter.components().count() > 1 {
            resolve(&mut self.tools.converter);
        }
    }
}
