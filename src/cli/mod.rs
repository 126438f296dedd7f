pub mod catalog;
pub mod completions;
pub mod init;
pub mod rescan;
pub mod run;

use clap::{Parser, Subcommand};
use tracing::Level;

/// ggpk-slicer - Extract, convert and slice game UI textures
#[derive(Parser, Debug)]
#[command(name = "ggpk-slicer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Maximum level for the log subscriber.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, convert and slice the textures named in slicer.yaml
    Run(run::RunArgs),

    /// List the textures a catalog records for a container
    Catalog(catalog::CatalogArgs),

    /// List extraction records left in an output directory
    Rescan(rescan::RescanArgs),

    /// Initialize a project (generates slicer.yaml)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
