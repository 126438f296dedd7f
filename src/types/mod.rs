//! Core domain types for the slicer.
//!
//! - `Rect` - normalized crop rectangles
//! - `Texture` - catalog rows naming a region of a container
//! - `TextureContainer` / `BankFile` - resources passed between stages
//! - `ExtractionResult` - tagged outcome of one archive extraction

mod container;
mod rect;
mod texture;

pub use container::{BankFile, ContainerKind, ExtractionResult, TextureContainer};
pub use rect::Rect;
pub use texture::{leaf_segment, SlicedTexture, Texture};
