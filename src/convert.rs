//! Container to PNG conversion through the external texture converter.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, SlicerError};
use crate::tool::{self, Tool};

/// Colour-accurate conversion profile: keep sRGB, 8 bits per channel.
pub const DEFAULT_FLAGS: &[&str] = &["-srgb", "-ft", "png", "-f", "R8G8B8A8_UNORM_SRGB", "-y"];

/// Runs the converter with a fixed flag set and overwrite policy.
#[derive(Debug)]
pub struct Converter<T> {
    tool: T,
    flags: Vec<String>,
    overwrite: bool,
}

impl<T: Tool> Converter<T> {
    pub fn new(tool: T, overwrite: bool) -> Self {
        Self {
            tool,
            flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
            overwrite,
        }
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.overwrite = overwrite;
    }

    /// Convert `source` to a PNG beside it and return the PNG's path.
    pub fn convert(&self, source: &Path) -> Result<PathBuf> {
        let target = target_for(source);

        if target.is_file() && !self.overwrite {
            tracing::debug!(path = %target.display(), "using previous conversion");
            return Ok(target);
        }

        if !source.is_file() {
            return Err(SlicerError::Missing {
                path: source.to_path_buf(),
            });
        }

        let out_dir = source.parent().unwrap_or_else(|| Path::new("."));
        let mut args: Vec<OsString> = Vec::with_capacity(self.flags.len() + 3);
        args.push(source.as_os_str().to_owned());
        args.extend(self.flags.iter().map(OsString::from));
        args.push("-o".into());
        args.push(out_dir.as_os_str().to_owned());

        tracing::info!(source = %source.display(), "converting");
        let run = tool::check(&self.tool, self.tool.run(&args)?)?;
        if !run.output.trim().is_empty() {
            tracing::debug!(tool = self.tool.name(), output = %run.output.trim(), "converter output");
        }

        if !target.is_file() {
            return Err(SlicerError::Missing { path: target });
        }
        Ok(target)
    }
}

/// Where the converter writes the PNG for `source`.
pub fn target_for(source: &Path) -> PathBuf {
    source.with_extension("png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTool;
    use tempfile::tempdir;

    #[test]
    fn test_convert_writes_png_beside_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("1.dds");
        std::fs::write(&source, b"pixels").unwrap();

        let converter = Converter::new(FakeTool::converter(), false);
        let png = converter.convert(&source).unwrap();

        assert_eq!(png, dir.path().join("1.png"));
        assert_eq!(std::fs::read(&png).unwrap(), b"pixels");
    }

    #[test]
    fn test_existing_png_is_reused() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("1.dds");
        std::fs::write(&source, b"pixels").unwrap();
        std::fs::write(dir.path().join("1.png"), b"old").unwrap();

        let tool = FakeTool::converter();
        let calls = tool.calls();
        let png = Converter::new(tool, false).convert(&source).unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(std::fs::read(&png).unwrap(), b"old");
    }

    #[test]
    fn test_overwrite_converts_again() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("1.dds");
        std::fs::write(&source, b"pixels").unwrap();
        std::fs::write(dir.path().join("1.png"), b"old").unwrap();

        let tool = FakeTool::converter();
        let calls = tool.calls();
        let png = Converter::new(tool, true).convert(&source).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(std::fs::read(&png).unwrap(), b"pixels");
    }

    #[test]
    fn test_failed_conversion_reports_tool_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.dds");
        std::fs::write(&source, b"pixels").unwrap();

        let converter = Converter::new(FakeTool::converter().fail_on("broken"), false);
        let err = converter.convert(&source).unwrap_err();

        assert!(matches!(err, SlicerError::Tool { .. }));
        assert!(!dir.path().join("broken.png").exists());
    }

    #[test]
    fn test_success_without_output_is_missing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("1.dds");
        std::fs::write(&source, b"pixels").unwrap();

        let err = Converter::new(FakeTool::silent(), false).convert(&source).unwrap_err();
        assert!(matches!(err, SlicerError::Missing { .. }));
    }

    #[test]
    fn test_default_flags_keep_srgb() {
        let converter = Converter::new(FakeTool::converter(), false);
        assert!(converter.flags().iter().any(|f| f == "R8G8B8A8_UNORM_SRGB"));
        assert_eq!(converter.flags()[0], "-srgb");
    }
}
