// crates/backendify-config/src/config.rs
// ============================================================================
// Module: Backendify Configuration
// Description: Configuration loading and validation for the Backendify client.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `BACKENDIFY_CONFIG`, then
//! `backendify.toml` in the working directory. Only the implicit default file
//! may be absent; an explicitly named file that cannot be read is an error.
//! Invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "backendify.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BACKENDIFY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a bearer token or API key.
pub(crate) const MAX_CREDENTIAL_LENGTH: usize = 4096;
/// Maximum length of a project identifier.
pub(crate) const MAX_PROJECT_ID_LENGTH: usize = 128;
/// Default remote API base URL.
pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 300_000;
/// Default connect timeout in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Maximum connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Default maximum response body size in bytes.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Minimum allowed response body limit in bytes.
pub(crate) const MIN_MAX_RESPONSE_BYTES: usize = 1024;
/// Maximum allowed response body limit in bytes.
pub(crate) const MAX_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Upper bound for page and candidate sizes; matches the service page cap.
pub(crate) const MAX_PAGE_SIZE: u32 = 1000;
/// Default record table page size.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 50;
/// Default number of relation candidates fetched per field.
pub(crate) const DEFAULT_RELATION_CANDIDATE_LIMIT: u32 = 100;
/// Default number of preview values per relation candidate.
pub(crate) const DEFAULT_PREVIEW_VALUES: usize = 3;
/// Maximum number of preview values per relation candidate.
pub(crate) const MAX_PREVIEW_VALUES: usize = 10;
/// Default preview separator.
pub(crate) const DEFAULT_PREVIEW_SEPARATOR: &str = " | ";
/// Maximum preview separator length in characters.
pub(crate) const MAX_PREVIEW_SEPARATOR_LENGTH: usize = 16;
/// Default maximum rendered cell width in characters.
pub(crate) const DEFAULT_MAX_CELL_CHARS: usize = 40;
/// Minimum rendered cell width in characters.
pub(crate) const MIN_MAX_CELL_CHARS: usize = 4;
/// Maximum rendered cell width in characters.
pub(crate) const MAX_MAX_CELL_CHARS: usize = 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Backendify client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendifyConfig {
    /// Remote API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Project scope configuration.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Console rendering configuration.
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Client event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BackendifyConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, implicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if implicit && err.kind() == ErrorKind::NotFound => {
                let mut config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.project.validate()?;
        self.console.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Remote API connection settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the remote service (scheme, host, optional path prefix).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Pre-issued bearer token sent as `Authorization: Bearer`.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Pre-issued API key sent as `X-API-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            bearer_token: None,
            api_key: None,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiConfig {
    /// Returns the total request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validates API settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("api.base_url is invalid: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("api.base_url must use http or https".to_string()));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid("api.base_url must include a host".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "api.base_url must not include a query or fragment".to_string(),
            ));
        }
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "api.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(MIN_TIMEOUT_MS ..= MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "api.connect_timeout_ms must be between {MIN_TIMEOUT_MS} and \
                 {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if self.connect_timeout_ms > self.timeout_ms {
            return Err(ConfigError::Invalid(
                "api.connect_timeout_ms must not exceed api.timeout_ms".to_string(),
            ));
        }
        if !(MIN_MAX_RESPONSE_BYTES ..= MAX_MAX_RESPONSE_BYTES).contains(&self.max_response_bytes)
        {
            return Err(ConfigError::Invalid(format!(
                "api.max_response_bytes must be between {MIN_MAX_RESPONSE_BYTES} and \
                 {MAX_MAX_RESPONSE_BYTES}"
            )));
        }
        if let Some(token) = &self.bearer_token {
            validate_credential("api.bearer_token", token)?;
        }
        if let Some(key) = &self.api_key {
            validate_credential("api.api_key", key)?;
        }
        Ok(())
    }
}

/// Project scope settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project used when a command does not name one.
    #[serde(default)]
    pub default_id: Option<String>,
}

impl ProjectConfig {
    /// Validates project settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(id) = &self.default_id else {
            return Ok(());
        };
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("project.default_id must be non-empty".to_string()));
        }
        if trimmed.len() > MAX_PROJECT_ID_LENGTH {
            return Err(ConfigError::Invalid("project.default_id exceeds max length".to_string()));
        }
        if trimmed.contains(['/', '?', '#']) {
            return Err(ConfigError::Invalid(
                "project.default_id must not contain '/', '?', or '#'".to_string(),
            ));
        }
        Ok(())
    }
}

/// Console rendering and lookup settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Record table page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Number of target records fetched per relation field.
    #[serde(default = "default_relation_candidate_limit")]
    pub relation_candidate_limit: u32,
    /// Number of field values shown in a relation candidate preview.
    #[serde(default = "default_preview_values")]
    pub preview_values: usize,
    /// Separator between preview values.
    #[serde(default = "default_preview_separator")]
    pub preview_separator: String,
    /// Maximum rendered cell width before truncation.
    #[serde(default = "default_max_cell_chars")]
    pub max_cell_chars: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            relation_candidate_limit: DEFAULT_RELATION_CANDIDATE_LIMIT,
            preview_values: DEFAULT_PREVIEW_VALUES,
            preview_separator: default_preview_separator(),
            max_cell_chars: DEFAULT_MAX_CELL_CHARS,
        }
    }
}

impl ConsoleConfig {
    /// Validates console settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid(format!(
                "console.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if !(1 ..= MAX_PAGE_SIZE).contains(&self.relation_candidate_limit) {
            return Err(ConfigError::Invalid(format!(
                "console.relation_candidate_limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if !(1 ..= MAX_PREVIEW_VALUES).contains(&self.preview_values) {
            return Err(ConfigError::Invalid(format!(
                "console.preview_values must be between 1 and {MAX_PREVIEW_VALUES}"
            )));
        }
        if self.preview_separator.is_empty()
            || self.preview_separator.chars().count() > MAX_PREVIEW_SEPARATOR_LENGTH
        {
            return Err(ConfigError::Invalid(format!(
                "console.preview_separator must be 1 to {MAX_PREVIEW_SEPARATOR_LENGTH} characters"
            )));
        }
        if self.preview_separator.chars().any(char::is_control) {
            return Err(ConfigError::Invalid(
                "console.preview_separator must not contain control characters".to_string(),
            ));
        }
        if !(MIN_MAX_CELL_CHARS ..= MAX_MAX_CELL_CHARS).contains(&self.max_cell_chars) {
            return Err(ConfigError::Invalid(format!(
                "console.max_cell_chars must be between {MIN_MAX_CELL_CHARS} and \
                 {MAX_MAX_CELL_CHARS}"
            )));
        }
        Ok(())
    }
}

/// Client event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Events are dropped.
    #[default]
    None,
}

/// Client event logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path for the `file` sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => Err(ConfigError::Invalid(
                "logging.path is required when logging.sink = \"file\"".to_string(),
            )),
            (LogSinkKind::File, Some(path)) => validate_path_string("logging.path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid when logging.sink = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from caller or environment defaults.
///
/// The boolean is true when the path is the implicit default file.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), false));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), false));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), true))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a credential string. The value itself never enters the message.
fn validate_credential(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_CREDENTIAL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(ConfigError::Invalid(format!(
            "{field} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default API base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default total request timeout in milliseconds.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default connect timeout in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default response body cap in bytes.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default record page size.
const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Default relation candidate page size.
const fn default_relation_candidate_limit() -> u32 {
    DEFAULT_RELATION_CANDIDATE_LIMIT
}

/// Default number of preview values per candidate.
const fn default_preview_values() -> usize {
    DEFAULT_PREVIEW_VALUES
}

/// Default preview separator.
fn default_preview_separator() -> String {
    DEFAULT_PREVIEW_SEPARATOR.to_string()
}

/// Default table cell width before truncation.
const fn default_max_cell_chars() -> usize {
    DEFAULT_MAX_CELL_CHARS
}
