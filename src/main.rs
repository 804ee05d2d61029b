//! dictgate CLI entry point
//!
//! Parsing, configuration, logging setup and dispatch all live in the CLI
//! module. This file only maps failures to a non-zero exit status.

use dictgate::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
