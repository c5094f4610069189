// crates/appflag-config/src/config.rs
// ============================================================================
// Module: appflag Configuration
// Description: Provider configuration loading and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: appflag-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every field except the target identifiers has a default, and unknown keys
//! are rejected. Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use appflag_core::ConfigurationTarget;
use appflag_core::SourceType;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "appflag.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "APPFLAG_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a target identifier.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Default region of the remote configuration store.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Default polling interval in seconds.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;
/// Default retry budget for remote fetches.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default sidecar host.
pub const DEFAULT_AGENT_HOST: &str = "localhost";
/// Default sidecar port.
pub const DEFAULT_AGENT_PORT: u16 = 2772;
/// Default agent installation root.
pub const DEFAULT_AGENT_PATH: &str = "/opt/appconfig-agent";
/// Default remote request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Provider configuration.
///
/// # Invariants
/// - `application`, `environment`, and `profile` are required.
/// - After [`ProviderConfig::validate`] succeeds, identifiers are non-empty and
///   free of path separators, `cache_ttl_secs > 0`, and `agent_port > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Application identifier.
    pub application: String,
    /// Environment identifier.
    pub environment: String,
    /// Configuration profile identifier.
    pub profile: String,
    /// Region of the remote configuration store.
    #[serde(default = "default_region")]
    pub region: String,
    /// Source used to fetch configuration.
    #[serde(default)]
    pub source_type: SourceType,
    /// Cache TTL in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Polling interval in seconds; informational only.
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,
    /// Retry budget for remote fetches.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Sidecar host.
    #[serde(default = "default_agent_host")]
    pub agent_host: String,
    /// Sidecar port.
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,
    /// Agent installation root.
    #[serde(default = "default_agent_path")]
    pub agent_path: PathBuf,
    /// Explicit document path overriding the agent layout.
    #[serde(default)]
    pub local_config_path: Option<PathBuf>,
    /// Refresh stale configuration on access.
    #[serde(default)]
    pub enable_polling: bool,
    /// Accept change notifications; requires `webhook_endpoint`.
    #[serde(default)]
    pub enable_webhooks: bool,
    /// Webhook endpoint; accepted and validated but not served.
    #[serde(default)]
    pub webhook_endpoint: Option<String>,
    /// Remote configuration store endpoint override.
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    /// Remote request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ProviderConfig {
    /// Creates a configuration for the target with every other field defaulted.
    #[must_use]
    pub fn new(
        application: impl Into<String>,
        environment: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
            profile: profile.into(),
            region: default_region(),
            source_type: SourceType::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            agent_host: default_agent_host(),
            agent_port: DEFAULT_AGENT_PORT,
            agent_path: default_agent_path(),
            local_config_path: None,
            enable_polling: false,
            enable_webhooks: false,
            webhook_endpoint: None,
            remote_endpoint: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
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
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("application", &self.application)?;
        validate_identifier("environment", &self.environment)?;
        validate_identifier("profile", &self.profile)?;
        validate_region(&self.region)?;
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.agent_host.trim().is_empty() {
            return Err(ConfigError::Invalid("agent_host must be non-empty".to_string()));
        }
        if self.agent_port == 0 {
            return Err(ConfigError::Invalid("agent_port must be greater than zero".to_string()));
        }
        validate_path_field("agent_path", &self.agent_path)?;
        if let Some(path) = &self.local_config_path {
            validate_path_field("local_config_path", path)?;
        }
        if self.enable_webhooks {
            let Some(endpoint) = &self.webhook_endpoint else {
                return Err(ConfigError::Invalid(
                    "webhook_endpoint is required when enable_webhooks is true".to_string(),
                ));
            };
            validate_http_url("webhook_endpoint", endpoint)?;
        }
        if let Some(endpoint) = &self.remote_endpoint {
            validate_http_url("remote_endpoint", endpoint)?;
        }
        Ok(())
    }

    /// Returns the configuration target.
    #[must_use]
    pub fn target(&self) -> ConfigurationTarget {
        ConfigurationTarget::new(
            self.application.clone(),
            self.environment.clone(),
            self.profile.clone(),
        )
    }

    /// Returns the cache TTL.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the effective remote endpoint.
    #[must_use]
    pub fn effective_remote_endpoint(&self) -> String {
        self.remote_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://appconfig.{}.amazonaws.com", self.region))
    }

    /// Returns the sidecar base URL.
    #[must_use]
    pub fn sidecar_url(&self) -> String {
        format!("http://{}:{}", self.agent_host, self.agent_port)
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default region.
fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Default cache TTL in seconds.
const fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

/// Default polling interval in seconds.
const fn default_polling_interval_secs() -> u64 {
    DEFAULT_POLLING_INTERVAL_SECS
}

/// Default retry budget.
const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Default sidecar host.
fn default_agent_host() -> String {
    DEFAULT_AGENT_HOST.to_string()
}

/// Default sidecar port.
const fn default_agent_port() -> u16 {
    DEFAULT_AGENT_PORT
}

/// Default agent root.
fn default_agent_path() -> PathBuf {
    PathBuf::from(DEFAULT_AGENT_PATH)
}

/// Default request timeout in milliseconds.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
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

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path field against length limits.
fn validate_path_field(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(ConfigError::Invalid(format!("{field} path component too long")));
    }
    Ok(())
}

/// Validates a target identifier used as a path and key segment.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.contains(['/', '\\', ':']) || value == "." || value == ".." {
        return Err(ConfigError::Invalid(format!(
            "{field} must not contain path or key separators"
        )));
    }
    Ok(())
}

/// Validates the region label.
fn validate_region(value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
        return Err(ConfigError::Invalid(
            "region must be non-empty ascii alphanumerics or '-'".to_string(),
        ));
    }
    Ok(())
}

/// Validates that a URL field is an absolute http(s) URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::Invalid(format!("{field}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    Ok(())
}
