//! Named sub-textures listed by a catalog.

use serde::Serialize;

use super::Rect;

/// One catalog row: a named region of a container image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Texture {
    /// Slash-delimited virtual name, e.g. `Art/2DArt/UIImages/Common/4K/ButtonCloseNormal`.
    pub name: String,
    /// Internal path of the container the texture lives in.
    pub container: String,
    pub rect: Rect,
}

impl Texture {
    pub fn new(name: impl Into<String>, container: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            container: container.into(),
            rect,
        }
    }

    /// Final `/` segment of the name, used for the output file.
    pub fn leaf_name(&self) -> &str {
        leaf_segment(&self.name)
    }
}

/// Final `/` segment of a virtual path.
pub fn leaf_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A sub-texture that was written (or already present) on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlicedTexture {
    pub name: String,
    pub path: std::path::PathBuf,
    pub rect: Rect,
    /// False when an existing file was kept because overwrite is off.
    pub written: bool,
}
