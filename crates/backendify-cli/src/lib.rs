// crates/backendify-cli/src/lib.rs
// ============================================================================
// Module: Backendify CLI Library
// Description: Command tree, parsers, and executors behind the binary.
// Purpose: Keep command behavior testable without spawning the binary.
// Dependencies: clap, backendify-console, backendify-client, backendify-config
// ============================================================================

//! ## Overview
//! The `backendify` binary parses a [`Cli`], opens a session with
//! [`open_session`], and hands the command to [`execute`] with stdout and
//! stdin wrapped in a [`Terminal`].

pub mod args;
/// clap command tree for the backendify binary.
pub mod cli;
pub mod commands;
/// Error wrapper carrying the message shown to the user.
pub mod error;
pub mod setup;

pub use cli::Cli;
pub use cli::Command;
pub use commands::Terminal;
pub use commands::execute;
pub use error::CliError;
pub use error::CliResult;
pub use setup::build_sink;
pub use setup::open_session;
pub use setup::resolve_project;
