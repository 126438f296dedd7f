//! Init command implementation.
//!
//! Generates a `slicer.yaml` manifest, filling in an archive and tool
//! paths found under the project directory.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::WalkDir;

use crate::error::{Result, SlicerError};
use crate::manifest::{Manifest, TextureRequest, DEFAULT_CONVERTER, DEFAULT_EXTRACTOR, MANIFEST_FILENAME};
use crate::output::{display_path, Printer};

/// How deep to look for archives and tools.
const SEARCH_DEPTH: usize = 4;

/// Initialize a project by generating a slicer.yaml manifest
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing slicer.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(SlicerError::Config {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    let found = scan(&args.path);

    let mut manifest = Manifest {
        archive: found.archive.clone(),
        textures: vec![TextureRequest::all(
            "art/textures/interface/2d/2dart/uiimages/common/4k/1.dds",
        )],
        ..Manifest::default()
    };
    if let Some(extractor) = &found.extractor {
        manifest.tools.extractor = extractor.clone();
    }
    if let Some(converter) = &found.converter {
        manifest.tools.converter = converter.clone();
    }

    let yaml = serde_yaml::to_string(&manifest).map_err(|e| SlicerError::Parse {
        message: format!("Failed to encode manifest: {}", e),
        help: None,
    })?;

    fs::write(&manifest_path, &yaml).map_err(|e| SlicerError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    match &found.archive {
        Some(archive) => printer.info("Archive", &display_path(archive)),
        None => printer.warning("Archive", "none found, set `archive:` by hand"),
    }
    for (label, tool) in [("Extractor", &found.extractor), ("Converter", &found.converter)] {
        if let Some(tool) = tool {
            printer.info(label, &display_path(tool));
        }
    }

    printer.success("Created", MANIFEST_FILENAME);
    Ok(())
}

/// Paths discovered under a project directory.
#[derive(Debug, Default, PartialEq, Eq)]
struct Found {
    archive: Option<PathBuf>,
    extractor: Option<PathBuf>,
    converter: Option<PathBuf>,
}

fn scan(root: &Path) -> Found {
    let mut found = Found::default();

    let walker = WalkDir::new(root)
        .max_depth(SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in walker {
        let name = entry.file_name().to_string_lossy().into_owned();
        let slot = if name.eq_ignore_ascii_case("Content.ggpk") || name.eq_ignore_ascii_case("_.index.bin") {
            &mut found.archive
        } else if name.eq_ignore_ascii_case(DEFAULT_EXTRACTOR) {
            &mut found.extractor
        } else if name.eq_ignore_ascii_case(DEFAULT_CONVERTER) {
            &mut found.converter
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(entry.into_path());
        }
    }

    found
}
