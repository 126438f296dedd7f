//! Cropping named sub-textures out of a converted image.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{imageops, ImageFormat, RgbaImage};

use crate::error::{Result, SlicerError};
use crate::types::{SlicedTexture, Texture};

/// Output file for a texture: its final name segment as a PNG.
pub fn output_path(out_dir: &Path, texture: &Texture) -> PathBuf {
    out_dir.join(format!("{}.png", texture.leaf_name()))
}

/// Crop every texture out of `image_path` into `out_dir`.
///
/// The image is decoded once. A texture whose rectangle does not fit the
/// image, or whose crop cannot be written, is logged and left out of the
/// result; the remaining textures are still processed. Only failing to
/// read the image itself is an error.
///
/// Output names are compared case-insensitively. A texture whose file would
/// replace the source image, or one already claimed by an earlier texture in
/// the batch, is skipped.
pub fn slice_image(
    image_path: &Path,
    textures: &[Texture],
    out_dir: &Path,
    overwrite: bool,
) -> Result<Vec<SlicedTexture>> {
    if textures.is_empty() {
        return Ok(Vec::new());
    }

    let image = image::open(image_path)
        .map_err(|e| SlicerError::Image {
            path: image_path.to_path_buf(),
            message: format!("Failed to decode: {}", e),
        })?
        .to_rgba8();

    std::fs::create_dir_all(out_dir)
        .map_err(|e| SlicerError::io(out_dir, format!("Failed to create output directory: {}", e)))?;

    let mut sliced = Vec::with_capacity(textures.len());
    let mut claimed = HashSet::with_capacity(textures.len());
    for texture in textures {
        let path = output_path(out_dir, texture);
        if is_same_file_name(&path, image_path) {
            tracing::warn!(texture = %texture.name, image = %image_path.display(), "skipping sub-texture that would replace its source image");
            continue;
        }
        if !claimed.insert(texture.leaf_name().to_lowercase()) {
            tracing::warn!(texture = %texture.name, path = %path.display(), "skipping sub-texture with an output name already used in this image");
            continue;
        }

        match slice_one(&image, texture, out_dir, overwrite) {
            Ok(done) => sliced.push(done),
            Err(e) => {
                tracing::warn!(texture = %texture.name, image = %image_path.display(), error = %e, "skipping sub-texture");
            }
        }
    }

    tracing::info!(
        image = %image_path.display(),
        sliced = sliced.len(),
        requested = textures.len(),
        "sliced image"
    );
    Ok(sliced)
}

fn is_same_file_name(a: &Path, b: &Path) -> bool {
    let name = |p: &Path| p.file_name().map(|n| n.to_string_lossy().to_lowercase());
    let parent = |p: &Path| p.parent().map(|d| d.to_string_lossy().to_lowercase());
    name(a) == name(b) && parent(a) == parent(b)
}

fn slice_one(image: &RgbaImage, texture: &Texture, out_dir: &Path, overwrite: bool) -> Result<SlicedTexture> {
    let path = output_path(out_dir, texture);
    let rect = texture.rect;

    if path.exists() && !overwrite {
        return Ok(SlicedTexture {
            name: texture.name.clone(),
            path,
            rect,
            written: false,
        });
    }

    if !rect.fits_within(image.width(), image.height()) {
        return Err(SlicerError::Image {
            path,
            message: format!(
                "rectangle {} is outside the {}x{} image",
                rect,
                image.width(),
                image.height()
            ),
        });
    }

    // Zero-size marker rows still get a file so every entry resolves.
    let crop = if rect.is_degenerate() {
        RgbaImage::new(1, 1)
    } else {
        imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
    };

    crop.save_with_format(&path, ImageFormat::Png)
        .map_err(|e| SlicerError::Image {
            path: path.clone(),
            message: format!("Failed to write PNG: {}", e),
        })?;

    Ok(SlicedTexture {
        name: texture.name.clone(),
        path,
        rect,
        written: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;
    use crate::types::Rect;
    use tempfile::tempdir;

    fn fixture(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("1.png");
        std::fs::write(&path, png_bytes(width, height)).unwrap();
        path
    }

    #[test]
    fn test_crops_each_texture() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 16, 16);
        let textures = vec![
            Texture::new("Art/UI/A", "art/x/4k/1.dds", Rect::new(0, 0, 10, 10)),
            Texture::new("Art/UI/Small", "art/x/4k/1.dds", Rect::new(4, 6, 3, 2)),
        ];

        let sliced = slice_image(&image, &textures, dir.path(), true).unwrap();

        assert_eq!(sliced.len(), 2);
        assert!(sliced.iter().all(|s| s.written));

        let a = image::open(dir.path().join("A.png")).unwrap().to_rgba8();
        assert_eq!(a.dimensions(), (10, 10));

        let small = image::open(dir.path().join("Small.png")).unwrap().to_rgba8();
        assert_eq!(small.dimensions(), (3, 2));
        // Gradient encodes source coordinates in red and green.
        assert_eq!(small.get_pixel(0, 0).0, [4, 6, 128, 255]);
    }

    #[test]
    fn test_out_of_bounds_is_isolated() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 8, 8);
        let textures = vec![
            Texture::new("Stale", "c.dds", Rect::new(6, 6, 4, 4)),
            Texture::new("Good", "c.dds", Rect::new(0, 0, 8, 8)),
        ];

        let sliced = slice_image(&image, &textures, dir.path(), true).unwrap();

        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced[0].name, "Good");
        assert!(!dir.path().join("Stale.png").exists());
    }

    #[test]
    fn test_degenerate_rect_writes_placeholder() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 8, 8);
        let textures = vec![Texture::new("Marker", "c.dds", Rect::new(5, 5, 0, 0))];

        let sliced = slice_image(&image, &textures, dir.path(), true).unwrap();

        assert_eq!(sliced.len(), 1);
        let marker = image::open(dir.path().join("Marker.png")).unwrap().to_rgba8();
        assert_eq!(marker.dimensions(), (1, 1));
        assert_eq!(marker.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_existing_output_kept_without_overwrite() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 8, 8);
        std::fs::write(dir.path().join("A.png"), b"keep me").unwrap();
        let textures = vec![Texture::new("A", "c.dds", Rect::new(0, 0, 2, 2))];

        let sliced = slice_image(&image, &textures, dir.path(), false).unwrap();

        assert_eq!(sliced.len(), 1);
        assert!(!sliced[0].written);
        assert_eq!(sliced[0].path, dir.path().join("A.png"));
        assert_eq!(std::fs::read(dir.path().join("A.png")).unwrap(), b"keep me");
    }

    #[test]
    fn test_crop_named_like_source_image_is_skipped() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 16, 16);
        let textures = vec![
            Texture::new("Art/UI/1", "art/ui/1.dds", Rect::new(0, 0, 2, 2)),
            Texture::new("Art/UI/Big", "art/ui/1.dds", Rect::new(2, 2, 12, 12)),
        ];

        let sliced = slice_image(&image, &textures, dir.path(), true).unwrap();

        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced[0].name, "Art/UI/Big");
        assert!(dir.path().join("Big.png").exists());
        let source = image::open(&image).unwrap().to_rgba8();
        assert_eq!(source.dimensions(), (16, 16));
    }

    #[test]
    fn test_duplicate_leaf_names_keep_first() {
        let dir = tempdir().unwrap();
        let image = fixture(dir.path(), 16, 16);
        let textures = vec![
            Texture::new("Foo/Icon", "c.dds", Rect::new(0, 0, 4, 4)),
            Texture::new("Bar/ICON", "c.dds", Rect::new(0, 0, 8, 8)),
        ];

        let sliced = slice_image(&image, &textures, dir.path(), true).unwrap();

        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced[0].name, "Foo/Icon");
        let icon = image::open(dir.path().join("Icon.png")).unwrap().to_rgba8();
        assert_eq!(icon.dimensions(), (4, 4));
    }

    #[test]
    fn test_unreadable_image_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        let textures = vec![Texture::new("A", "c.dds", Rect::new(0, 0, 1, 1))];

        let err = slice_image(&path, &textures, dir.path(), true).unwrap_err();
        assert!(matches!(err, SlicerError::Image { .. }));
    }
}
