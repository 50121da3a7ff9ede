//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// csvw-annotator: describe messy CSV exports as CSVW JSON-LD
#[derive(Parser)]
#[command(name = "csvw-annotator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Extra unit vocabulary (JSON export or QUDT .ttl)
    #[arg(long, global = true, env = "UNITS_FILE")]
    pub units: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate a file and write its CSVW metadata
    Annotate {
        /// Path or URL of the file (file://, http://, https://)
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Output path (default: <stem>-metadata.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Byte encoding, e.g. "utf-8", "latin-1"
        #[arg(short, long, default_value = "auto")]
        encoding: String,

        /// Table separator, e.g. ";", "\t", "\s+"
        #[arg(short, long, default_value = "auto")]
        separator: String,

        /// Separator of metadata lines
        #[arg(long, default_value = "auto")]
        header_separator: String,

        /// Print the document instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Show how a file splits into regions
    Segments {
        /// Path or URL of the file
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Byte encoding
        #[arg(short, long, default_value = "auto")]
        encoding: String,
    },

    /// Run the HTTP annotation service
    Serve {
        #[command(flatten)]
        settings: Settings,
    },
}

/// Service settings, read from flags or the environment.
#[derive(clap::Args, Debug, Clone)]
pub struct Settings {
    /// Port for web server
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    #[arg(long, env = "APP_NAME", default_value = "CSVToCSVW")]
    pub app_name: String,

    #[arg(long, env = "APP_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub app_version: String,

    #[arg(long, env = "ADMIN_MAIL", default_value = "")]
    pub admin_mail: String,

    /// Deployment mode, e.g. "development" or "production"
    #[arg(long, env = "APP_MODE", default_value = "production")]
    pub app_mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_defaults() {
        let cli = Cli::try_parse_from(["csvw-annotator", "annotate", "run.csv"]).unwrap();
        match cli.command {
            Commands::Annotate {
                source,
                output,
                encoding,
                separator,
                stdout,
                ..
            } => {
                assert_eq!(source, "run.csv");
                assert!(output.is_none());
                assert_eq!(encoding, "auto");
                assert_eq!(separator, "auto");
                assert!(!stdout);
            }
            _ => panic!("expected annotate"),
        }
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let result = Cli::try_parse_from([
            "csvw-annotator",
            "annotate",
            "run.csv",
            "--stdout",
            "-o",
            "out.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_port_flag() {
        let cli = Cli::try_parse_from(["csvw-annotator", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { settings } => assert_eq!(settings.port, 9000),
            _ => panic!("expected serve"),
        }
    }
}
