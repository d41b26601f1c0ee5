// crates/backendify-cli/src/setup.rs
// ============================================================================
// Module: CLI Session Setup
// Description: Builds a console session from loaded configuration.
// Purpose: Resolve the project, the event sink, and the HTTP backend.
// Dependencies: backendify-client, backendify-config, backendify-console
// ============================================================================

//! ## Overview
//! The `--project` flag wins over `project.default_id`; with neither, commands
//! refuse to run. The event sink follows `logging.sink`.

use std::path::Path;
use std::sync::Arc;

use backendify_client::HttpApiClient;
use backendify_config::BackendifyConfig;
use backendify_config::LogSinkKind;
use backendify_config::LoggingConfig;
use backendify_console::ClientEventSink;
use backendify_console::ConsoleSession;
use backendify_console::FileEventSink;
use backendify_console::NoopEventSink;
use backendify_console::StderrEventSink;
use backendify_core::ProjectId;

use crate::error::CliError;
use crate::error::CliResult;

/// Resolves the project scope from the flag or the configured default.
///
/// # Errors
///
/// Returns [`CliError`] when no project is given or the flag is malformed.
pub fn resolve_project(flag: Option<&str>, config: &BackendifyConfig) -> CliResult<ProjectId> {
    if let Some(raw) = flag {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '?', '#']) {
            return Err(CliError::new(format!("invalid project id '{raw}'")));
        }
        return Ok(ProjectId::new(trimmed));
    }
    config
        .project
        .default_id
        .as_deref()
        .map(|id| ProjectId::new(id.trim()))
        .ok_or_else(|| {
            CliError::new("no project selected; pass --project or set project.default_id")
        })
}

/// Builds the event sink selected by the logging config.
///
/// # Errors
///
/// Returns [`CliError`] when the file sink cannot be opened.
pub fn build_sink(config: &LoggingConfig) -> CliResult<Arc<dyn ClientEventSink>> {
    match (config.sink, config.path.as_deref()) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (LogSinkKind::File, Some(path)) => {
            let sink = FileEventSink::new(Path::new(path))
                .map_err(|err| CliError::new(format!("failed to open event log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        (LogSinkKind::File, None) => {
            Err(CliError::new("logging.path is required for the file sink"))
        }
        (LogSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
    }
}

/// Opens a session against the configured HTTP API.
///
/// # Errors
///
/// Returns [`CliError`] when the project, sink, or HTTP client cannot be set up.
pub fn open_session(
    config: &BackendifyConfig,
    project_flag: Option<&str>,
) -> CliResult<ConsoleSession> {
    let project = resolve_project(project_flag, config)?;
    let sink = build_sink(&config.logging)?;
    let api = HttpApiClient::from_config(&config.api)?;
    Ok(ConsoleSession::new(Arc::new(api), project, config.console.clone(), sink))
}
