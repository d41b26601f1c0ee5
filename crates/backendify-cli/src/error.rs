// crates/backendify-cli/src/error.rs
// ============================================================================
// Module: CLI Errors
// Description: Error wrapper carrying the message shown to the user.
// Purpose: Give every command one error type with a printable message.
// Dependencies: thiserror, backendify-core, backendify-config
// ============================================================================

use backendify_config::ConfigError;
use backendify_core::ApiError;
use backendify_core::ModelError;
use thiserror::Error;

/// CLI error with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::new(format!("request failed: {err}"))
    }
}

impl From<ModelError> for CliError {
    fn from(err: ModelError) -> Self {
        Self::new(format!("invalid input: {err}"))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.to_string())
    }
}

/// Formats an output stream failure.
#[must_use]
pub fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("failed to write to {stream}: {error}"))
}

/// CLI result alias for fallible operations.
pub type CliResult<T> = Result<T, CliError>;
