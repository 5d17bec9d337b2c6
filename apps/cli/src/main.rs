//! docmerge CLI — consolidate a documentation tree by theme.
//!
//! Classifies the documents under a directory into themes, merges every
//! theme into one document around its most important member, and leaves a
//! backup and a summary report behind.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli)?;
    commands::run(cli)
}
