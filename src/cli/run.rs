//! Run command implementation.
//!
//! Opens a session from slicer.yaml and pushes the requested containers
//! through extraction, conversion and slicing.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::manifest::{Manifest, MANIFEST_FILENAME};
use crate::output::{display_path, plural, Printer, PrinterProgress};
use crate::pipeline::{Session, TextureSelection};

/// Extract, convert and slice the textures named in slicer.yaml
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Manifest to read
    #[arg(long, short, default_value = MANIFEST_FILENAME)]
    pub manifest: PathBuf,

    /// Process every container in the image catalog instead of the manifest list
    #[arg(long)]
    pub all: bool,

    /// Redo every step even when its output exists
    #[arg(long)]
    pub overwrite: bool,

    /// Output directory (overrides the manifest)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Archive path (overrides the manifest)
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

impl RunArgs {
    /// Load the manifest and apply command line overrides.
    pub fn manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::load(&self.manifest)?;

        if self.overwrite {
            manifest.overwrite = true;
        }
        if let Some(output) = &self.output {
            manifest.output = output.clone();
        }
        if let Some(archive) = &self.archive {
            manifest.archive = Some(archive.clone());
        }

        Ok(manifest)
    }
}

pub fn run(args: RunArgs, printer: &Printer) -> Result<()> {
    let manifest = args.manifest()?;

    printer.status("Opening", &display_path(manifest.archive()?));
    let session = Session::from_manifest(&manifest)?;
    printer.info(
        "Loaded",
        &format!(
            "{} and {}",
            plural(session.catalogs().images.len(), "image entry", "image entries"),
            plural(session.catalogs().divination.len(), "card entry", "card entries"),
        ),
    );

    let selection = if args.all {
        TextureSelection::All
    } else {
        TextureSelection::Only(&manifest.textures)
    };

    let mut progress = PrinterProgress::new(printer);
    let report = session.run(selection, &manifest.banks, &mut progress);

    for container in &report.textures {
        let written = container.sliced.iter().filter(|s| s.written).count();
        printer.info(
            "Sliced",
            &format!(
                "{} {}",
                container.internal_path,
                printer.dim(&format!("({} written, {} kept)", written, container.sliced.len() - written))
            ),
        );
    }

    if report.failed > 0 {
        printer.warning(
            "Skipped",
            &format!("{} (see log for details)", plural(report.failed, "failed item", "failed items")),
        );
    }

    printer.success(
        "Finished",
        &format!(
            "{}, {}, {} into {}",
            plural(report.textures.len(), "container", "containers"),
            plural(report.sliced(), "texture", "textures"),
            plural(report.banks.len(), "bank", "banks"),
            printer.cyan(&display_path(session.output())),
        ),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(manifest: PathBuf) -> RunArgs {
        RunArgs {
            manifest,
            all: false,
            overwrite: false,
            output: None,
            archive: None,
        }
    }

    #[test]
    fn test_overrides_replace_manifest_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        std::fs::write(&path, "archive: Content.ggpk\noutput: out\n").unwrap();

        let mut args = args(path);
        args.overwrite = true;
        args.output = Some(PathBuf::from("/tmp/elsewhere"));
        args.archive = Some(PathBuf::from("/games/_.index.bin"));
        let manifest = args.manifest().unwrap();

        assert!(manifest.overwrite);
        assert_eq!(manifest.output, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(manifest.archive, Some(PathBuf::from("/games/_.index.bin")));
    }

    #[test]
    fn test_missing_tools_fail_before_extraction() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Content.ggpk"), b"archive").unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        std::fs::write(&path, "archive: Content.ggpk\ntools:\n  extractor: tools/\n").unwrap();

        let err = run(args(path), &Printer::new()).unwrap_err();

        assert!(matches!(err, crate::error::SlicerError::Config { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
