//! Resources moved between pipeline stages.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{SlicedTexture, Texture};

/// What an internal archive path refers to, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    Texture,
    Bank,
    Text,
}

impl ContainerKind {
    /// Classify an internal path. Unknown extensions are not extractable.
    pub fn of(internal_path: &str) -> Option<Self> {
        let ext = internal_path.rsplit_once('.')?.1;
        if ext.eq_ignore_ascii_case("dds") {
            Some(ContainerKind::Texture)
        } else if ext.eq_ignore_ascii_case("bank") {
            Some(ContainerKind::Bank)
        } else if ext.eq_ignore_ascii_case("txt") {
            Some(ContainerKind::Text)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Texture => "texture",
            ContainerKind::Bank => "bank",
            ContainerKind::Text => "catalog",
        }
    }
}

/// A texture container as it moves through extract, convert and slice.
///
/// Fields fill in monotonically: `textures` after extraction, `converted`
/// after conversion, `sliced` after cropping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureContainer {
    pub internal_path: String,
    pub disk_path: PathBuf,
    pub textures: Vec<Texture>,
    pub converted: Option<PathBuf>,
    pub sliced: Vec<SlicedTexture>,
}

impl TextureContainer {
    pub fn new(internal_path: impl Into<String>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            internal_path: internal_path.into(),
            disk_path: disk_path.into(),
            textures: Vec::new(),
            converted: None,
            sliced: Vec::new(),
        }
    }

    pub fn with_textures(mut self, textures: Vec<Texture>) -> Self {
        self.textures = textures;
        self
    }

    /// Directory holding the extracted container.
    pub fn directory(&self) -> &Path {
        self.disk_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// An audio bank placed in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankFile {
    pub internal_path: String,
    pub disk_path: PathBuf,
}

/// Outcome of extracting one internal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Texture(TextureContainer),
    Bank(BankFile),
    CatalogFile(PathBuf),
}

impl ExtractionResult {
    pub fn disk_path(&self) -> &Path {
        match self {
            ExtractionResult::Texture(container) => &container.disk_path,
            ExtractionResult::Bank(bank) => &bank.disk_path,
            ExtractionResult::CatalogFile(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_extension() {
        assert_eq!(
            ContainerKind::of("art/x/4k/1.dds"),
            Some(ContainerKind::Texture)
        );
        assert_eq!(ContainerKind::of("Audio/Music.BANK"), Some(ContainerKind::Bank));
        assert_eq!(ContainerKind::of("art/uiimages1.txt"), Some(ContainerKind::Text));
        assert_eq!(ContainerKind::of("art/models/a.sm"), None);
        assert_eq!(ContainerKind::of("no_extension"), None);
    }

    #[test]
    fn test_result_disk_path() {
        let result = ExtractionResult::Bank(BankFile {
            internal_path: "Audio/a.bank".to_string(),
            disk_path: PathBuf::from("out/a.bank"),
        });
        assert_eq!(result.disk_path(), Path::new("out/a.bank"));
    }

    #[test]
    fn test_container_directory() {
        let container = TextureContainer::new("art/x/4k/1.dds", "out/art_x_4k_1/1.dds");
        assert_eq!(container.directory(), Path::new("out/art_x_4k_1"));
    }
}
