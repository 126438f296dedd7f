//! Shared test fixtures: an in-process stand-in for the external tools.

use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::tool::{Tool, ToolOutput};

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// `(archive, internal, dir)`: writes `dir/<leaf>`.
    Extract,
    /// `(source, flags.., -o, dir)`: copies source to `dir/<stem>.png`.
    Convert,
    /// Exits 0 without writing anything.
    Silent,
}

/// Fake extraction / conversion tool that counts its invocations.
#[derive(Debug)]
pub(crate) struct FakeTool {
    mode: Mode,
    calls: Rc<Cell<usize>>,
    files: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
}

impl FakeTool {
    pub const CONTENT: &'static [u8] = b"extracted";

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: Rc::new(Cell::new(0)),
            files: HashMap::new(),
            failing: Vec::new(),
        }
    }

    pub fn extractor() -> Self {
        Self::with_mode(Mode::Extract)
    }

    pub fn converter() -> Self {
        Self::with_mode(Mode::Convert)
    }

    pub fn silent() -> Self {
        Self::with_mode(Mode::Silent)
    }

    pub fn failing_on(internal_path: &str) -> Self {
        Self::extractor().fail_on(internal_path)
    }

    /// Exit 1 when the request (internal path or source file name) contains `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_lowercase());
        self
    }

    /// Bytes written for `internal_path` instead of [`FakeTool::CONTENT`].
    pub fn with_file(mut self, internal_path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(internal_path.to_lowercase(), bytes);
        self
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }

    fn fails(&self, request: &str) -> bool {
        let request = request.to_lowercase();
        self.failing.iter().any(|needle| request.contains(needle))
    }
}

impl Tool for FakeTool {
    fn name(&self) -> &str {
        match self.mode {
            Mode::Extract | Mode::Silent => "fake-extract",
            Mode::Convert => "fake-convert",
        }
    }

    fn run(&self, args: &[OsString]) -> Result<ToolOutput> {
        self.calls.set(self.calls.get() + 1);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        match self.mode {
            Mode::Silent => Ok(ToolOutput::new(0, "")),
            Mode::Extract => {
                let internal = &args[1];
                if self.fails(internal) {
                    return Ok(ToolOutput::new(1, format!("cannot extract {}", internal)));
                }
                let leaf = internal.rsplit('/').next().unwrap_or(internal);
                let bytes = self
                    .files
                    .get(&internal.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| Self::CONTENT.to_vec());
                std::fs::write(Path::new(&args[2]).join(leaf), bytes)?;
                Ok(ToolOutput::new(0, format!("extracted {}", internal)))
            }
            Mode::Convert => {
                let source = PathBuf::from(&args[0]);
                if self.fails(&args[0]) {
                    return Ok(ToolOutput::new(1, "conversion failed"));
                }
                let out_index = args.iter().position(|a| a == "-o").map(|i| i + 1);
                let out_dir = out_index.map(|i| PathBuf::from(&args[i])).unwrap_or_default();
                let stem = source.file_stem().unwrap_or_default();
                std::fs::copy(&source, out_dir.join(stem).with_extension("png"))?;
                Ok(ToolOutput::new(0, ""))
            }
        }
    }
}

/// Encode a `width` x `height` PNG with a horizontal gradient.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 128, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
