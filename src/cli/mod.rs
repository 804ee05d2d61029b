//! Command-line front end
//!
//! - validate: validate project submissions and write their reports
//! - plan: print the compiled plan of a project
//! - check-dictionary: load and validate the dictionary only

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{
    check_dictionary, plan, run_command, run_validations, validate, ProjectStatus, ProjectSummary,
};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
