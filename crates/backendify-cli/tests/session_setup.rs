// crates/backendify-cli/tests/session_setup.rs
// ============================================================================
// Module: CLI Session Setup Tests
// Description: Loads config files from disk and opens sessions from them.
// Purpose: Validate project resolution and event log wiring end to end.
// Dependencies: backendify-cli, backendify-config, tempfile
// ============================================================================

//! ## Overview
//! Loads config files from disk and opens sessions from them to validate
//! project resolution and event log wiring end to end.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use backendify_cli::open_session;
use backendify_config::BackendifyConfig;

#[test]
fn config_file_supplies_project_and_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("events.jsonl");
    let config_path = dir.path().join("backendify.toml");
    let contents = format!(
        concat!(
            "[api]\nbase_url = \"https://api.example.com\"\n\n",
            "[project]\ndefault_id = \"p_blog\"\n\n",
            "[logging]\nsink = \"file\"\npath = '{}'\n",
        ),
        log_path.display()
    );
    fs::write(&config_path, contents).unwrap();

    let config = BackendifyConfig::load(Some(&config_path)).unwrap();
    let session = open_session(&config, None).unwrap();

    assert_eq!(session.project().as_str(), "p_blog");
    assert!(log_path.exists());
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(BackendifyConfig::load(Some(&missing)).is_err());
}

#[test]
fn session_without_any_project_is_refused() {
    let config = BackendifyConfig::from_toml_str("").unwrap();
    let error = open_session(&config, None).err().unwrap();
    assert!(error.message().contains("--project"));
    assert!(open_session(&config, Some("p_flag")).is_ok());
}
