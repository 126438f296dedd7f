//! Catalog command implementation.
//!
//! Lists the textures an extracted catalog records for one container.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::catalog::Catalog;
use crate::error::{Result, SlicerError};
use crate::output::{display_path, plural, Printer};
use crate::types::Texture;

/// List the textures a catalog records for a container
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Extracted catalog file (UTF-16LE)
    pub file: PathBuf,

    /// Container path, matched case-insensitively as a substring
    pub container: String,

    /// Only these texture names
    #[arg(long = "texture", short)]
    pub textures: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CatalogArgs, printer: &Printer) -> Result<()> {
    let catalog = Catalog::read(&args.file)?;

    for skipped in catalog.skipped() {
        printer.warning(
            "Skipped",
            &format!("line {}: {}", skipped.line, printer.dim(&skipped.message)),
        );
    }

    let textures = if args.textures.is_empty() {
        catalog.textures_for(&args.container)
    } else {
        catalog.textures_for_wanted(&args.container, &args.textures)
    };

    let rendered = if args.json {
        serde_json::to_string_pretty(&textures).map_err(|e| SlicerError::Parse {
            message: format!("Failed to encode JSON: {}", e),
            help: None,
        })?
    } else {
        format_listing(&textures)
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;

    printer.info(
        "Found",
        &format!(
            "{} in {}",
            plural(textures.len(), "texture", "textures"),
            printer.bold(&display_path(catalog.source().unwrap_or(args.file.as_path())))
        ),
    );

    Ok(())
}

/// One texture per line: name, then `WxH+X+Y`.
fn format_listing(textures: &[Texture]) -> String {
    let width = textures.iter().map(|t| t.name.len()).max().unwrap_or(0);
    textures
        .iter()
        .map(|t| format!("{:<width$}  {}", t.name, t.rect, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
