//! csvw-annotator CLI - CSVW metadata for messy CSV exports.

mod cli;
mod commands;
mod server;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use csvw_annotator::UnitIndex;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let result = load_units(cli.units.as_deref()).and_then(|units| match cli.command {
        Commands::Annotate {
            source,
            output,
            encoding,
            separator,
            header_separator,
            stdout,
        } => commands::annotate::run(
            units,
            commands::annotate::AnnotateArgs {
                source,
                output,
                encoding,
                separator,
                header_separator,
                stdout,
            },
        ),

        Commands::Segments { source, encoding } => {
            commands::segments::run(units, source, encoding, cli.verbose)
        }

        Commands::Serve { settings } => commands::serve::run(units, settings),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build the unit index once and share it process-wide.
fn load_units(extra: Option<&std::path::Path>) -> commands::CommandResult<Arc<UnitIndex>> {
    let mut index = UnitIndex::new();
    if let Some(path) = extra {
        index.load_file(path)?;
    }
    Ok(UnitIndex::install_global(index))
}
