//! Rescan command implementation.
//!
//! Reads the sentinels a previous run left behind and, optionally, slices
//! the recovered containers again without touching the archive.

use std::path::PathBuf;

use clap::Args;

use crate::archive::rescan;
use crate::convert::Converter;
use crate::error::Result;
use crate::manifest::{Manifest, DEFAULT_CONVERTER, MANIFEST_FILENAME};
use crate::output::{display_path, plural, Printer, PrinterProgress};
use crate::pipeline::{convert_all, slice_all, Catalogs};
use crate::tool::ExternalTool;

/// List extraction records left in an output directory
#[derive(Args, Debug)]
pub struct RescanArgs {
    /// Output directory of a previous run
    pub output: PathBuf,

    /// Convert and slice the recovered textures again
    #[arg(long)]
    pub slice: bool,

    /// Manifest supplying converter and catalog settings for --slice
    #[arg(long, short, default_value = MANIFEST_FILENAME)]
    pub manifest: PathBuf,
}

pub fn run(args: RescanArgs, printer: &Printer) -> Result<()> {
    printer.status("Scanning", &display_path(&args.output));
    let records = rescan(&args.output)?;

    for record in &records {
        printer.info(
            record.kind.name(),
            &format!("{} {}", record.internal_path, printer.dim(&display_path(&record.disk_path))),
        );
    }
    printer.success("Found", &plural(records.len(), "extraction", "extractions"));

    if !args.slice {
        return Ok(());
    }

    let manifest = if args.manifest.exists() {
        Manifest::load(&args.manifest)?
    } else {
        Manifest::default()
    };

    let catalogs = Catalogs::from_output(&args.output, &manifest.catalogs);
    let tool = ExternalTool::locate(&manifest.tools.converter, DEFAULT_CONVERTER)?
        .with_timeout(manifest.tools.timeout());
    let converter =
        Converter::new(tool, manifest.overwrite).with_flags(manifest.tools.convert_flags.clone());

    let mut progress = PrinterProgress::new(printer);
    let containers = catalogs.containers_from(records);
    let converted = convert_all(&converter, containers, &mut progress);
    let sliced = slice_all(converted, manifest.overwrite, &mut progress);

    let textures: usize = sliced.iter().map(|c| c.sliced.len()).sum();
    printer.success(
        "Sliced",
        &format!(
            "{} from {}",
            plural(textures, "texture", "textures"),
            plural(sliced.len(), "container", "containers")
        ),
    );

    Ok(())
}
