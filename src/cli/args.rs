//! CLI argument definitions using clap
//!
//! Commands:
//! - dictgate validate --config <path> --project <key>...
//! - dictgate plan --config <path> --project <key>
//! - dictgate check-dictionary --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dictgate - dictionary-driven validation of tabular submissions
#[derive(Parser, Debug)]
#[command(name = "dictgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one or more project submissions
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./dictgate.json")]
        config: PathBuf,

        /// Project key; its files are read from <submission_dir>/<key>
        #[arg(long = "project", required = true)]
        projects: Vec<String>,
    },

    /// Print the compiled validation plan of a project as JSON
    Plan {
        /// Path to configuration file
        #[arg(long, default_value = "./dictgate.json")]
        config: PathBuf,

        #[arg(long)]
        project: String,
    },

    /// Load and validate the dictionary and code lists only
    CheckDictionary {
        /// Path to configuration file
        #[arg(long, default_value = "./dictgate.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
