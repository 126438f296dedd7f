use clap::Parser;
use ggpk_slicer::cli::{Cli, Commands};
use ggpk_slicer::output::Printer;
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let printer = Printer::new();

    match cli.command {
        Commands::Run(args) => ggpk_slicer::cli::run::run(args, &printer)?,
        Commands::Catalog(args) => ggpk_slicer::cli::catalog::run(args, &printer)?,
        Commands::Rescan(args) => ggpk_slicer::cli::rescan::run(args, &printer)?,
        Commands::Init(args) => ggpk_slicer::cli::init::run(args, &printer)?,
        Commands::Completions(args) => ggpk_slicer::cli::completions::run(args)?,
    }

    Ok(())
}
