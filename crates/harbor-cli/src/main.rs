use std::process::ExitCode;

use harbor_cli::{Cli, EXIT_HARD_FAILURE};

fn main() -> ExitCode {
    let result = Cli::parse().and_then(|cli| harbor_cli::run(&cli));

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_HARD_FAILURE)
        }
    }
}
