//! ggpk-slicer - Game UI texture extraction pipeline
//!
//! Pulls texture containers and audio banks out of a game content archive
//! with an external extraction tool, converts the containers to PNG with an
//! external converter and crops the named sub-textures listed in the game's
//! UTF-16LE texture catalogs.

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod slice;
pub mod tool;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{rescan, ArchiveExtractor, ArchiveKind, Extracted, ExtractionRecord, ExtractionState};
pub use catalog::Catalog;
pub use convert::Converter;
pub use error::{Result, SlicerError};
pub use manifest::{Manifest, TextureRequest};
pub use pipeline::{Catalogs, RunReport, Session, TextureSelection};
pub use progress::{NoProgress, Progress};
pub use slice::slice_image;
pub use tool::{ExternalTool, Tool, ToolOutput};
pub use types::{
    BankFile, ContainerKind, ExtractionResult, Rect, SlicedTexture, Texture, TextureContainer,
};
