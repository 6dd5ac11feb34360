//! Slipway CLI entry point.
//!
//! Parses arguments, runs one update-and-launch cycle, and maps the outcome
//! to the exit-code contract the parent launcher depends on: `0` launched,
//! `1` failure, `3010` self-update applied (re-invoke).

use clap::Parser;
use slipway::cli::Cli;
use slipway::core::FAILURE_EXIT_CODE;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.execute().await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            // The subscriber may not be installed yet if layout discovery
            // failed, so the error also goes straight to stderr.
            tracing::error!("update run failed: {err:#}");
            eprintln!("slipway: {err:#}");
            FAILURE_EXIT_CODE
        }
    };
    std::process::exit(code);
}
