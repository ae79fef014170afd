//! Harbor template command line
//!
//! `harbor-template validate` checks a template and prints a report;
//! `harbor-template migrate` applies a versioned migration set.
//!
//! Exit codes: 0 success, 1 invalid template / strict-mode skip / gated
//! write, 2 hard failure.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;

use std::process::ExitCode;

pub use cli::{Cli, CliCommand};
pub use commands::Status;
pub use config::ToolConfig;

/// Exit code for hard failures
pub const EXIT_HARD_FAILURE: u8 = 2;

/// Run a parsed invocation
///
/// # Errors
/// Returns error on hard failures
pub fn run(cli: &Cli) -> anyhow::Result<Status> {
    let config = ToolConfig::load(cli.config.as_deref())?;
    logging::init(cli.verbose, cli.log_json, &config.logging)?;

    match &cli.command {
        CliCommand::Validate(args) => commands::run_validate(args),
        CliCommand::Migrate(args) => commands::run_migrate(args, &config),
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}
