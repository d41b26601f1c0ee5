//! Config file loading tests for backendify-config.
// crates/backendify-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Tests
// Description: Validate file loading, size limits, and path handling.
// Purpose: Ensure config files fail closed on malformed or oversized input.
// =============================================================================

use std::fs;

use backendify_config::BackendifyConfig;
use backendify_config::ConfigError;
use backendify_config::LogSinkKind;
use tempfile::TempDir;

type TestResult = Result<(), String>;

#[test]
fn load_reads_explicit_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("backendify.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "https://api.example.com/backend"
timeout_ms = 10000

[project]
default_id = "proj_1"

[console]
page_size = 25

[logging]
sink = "stderr"
"#,
    )
    .map_err(|err| err.to_string())?;
    let config = BackendifyConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.api.timeout_ms != 10_000 || config.console.page_size != 25 {
        return Err("loaded values did not apply".to_string());
    }
    if config.project.default_id.as_deref() != Some("proj_1") {
        return Err("project.default_id did not load".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging.sink did not load".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    match BackendifyConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    match BackendifyConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("size limit") => Ok(()),
        other => Err(format!("expected size limit error, got {other:?}")),
    }
}

#[test]
fn load_rejects_invalid_toml() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[api\nbase_url = ").map_err(|err| err.to_string())?;
    match BackendifyConfig::load(Some(&path)) {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn load_validates_after_parse() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("invalid.toml");
    fs::write(&path, "[console]\npreview_values = 0\n").map_err(|err| err.to_string())?;
    match BackendifyConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("console.preview_values") => Ok(()),
        other => Err(format!("expected validation error, got {other:?}")),
    }
}

#[test]
fn load_rejects_overlong_path_component() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("x".repeat(300));
    match BackendifyConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("component too long") => Ok(()),
        other => Err(format!("expected path error, got {other:?}")),
    }
}
