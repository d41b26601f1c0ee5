// crates/backendify-cli/src/main.rs
// ============================================================================
// Module: Backendify CLI Entry Point
// Description: Binary entry for the backendify command.
// Purpose: Load configuration, open a session, and run one command.
// Dependencies: clap, tokio, backendify-cli, backendify-config
// ============================================================================

//! ## Overview
//! Errors are written to stderr and turn into a failure exit code.

use std::io::Write;
use std::process::ExitCode;

use backendify_cli::Cli;
use backendify_cli::CliResult;
use backendify_cli::Terminal;
use backendify_cli::execute;
use backendify_cli::open_session;
use backendify_config::BackendifyConfig;
use clap::Parser;

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration and executes the selected command.
async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = BackendifyConfig::load(cli.config.as_deref())?;
    let session = open_session(&config, cli.project.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut terminal = Terminal::new(&mut out, &mut input);
    execute(cli.command, &session, &mut terminal).await
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "error: {message}");
    ExitCode::FAILURE
}
