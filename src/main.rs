//! Storefront Cart CLI

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

mod cli;

#[tokio::main]
pub async fn main() -> ExitCode {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = cli::logging::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("failed to initialise logging: {error}");
        }

        return ExitCode::FAILURE;
    }

    if let Err(error) = cli.run().await {
        #[expect(clippy::print_stderr, reason = "final error report for the CLI user")]
        {
            eprintln!("{error}");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
