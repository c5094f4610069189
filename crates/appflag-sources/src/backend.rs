// crates/appflag-sources/src/backend.rs
// ============================================================================
// Module: appflag Configuration Backend
// Description: Remote configuration store client contract and HTTP client.
// Purpose: Fetch raw configuration payloads with bounded retries and limits.
// Dependencies: appflag-core, reqwest, thiserror
// ============================================================================

//! ## Overview
//! A [`ConfigurationBackend`] fetches the raw payload of one configuration
//! target from a remote store. [`HttpConfigurationBackend`] speaks a plain
//! REST layout:
//! `GET {endpoint}/applications/{app}/environments/{env}/configurations/{profile}`.
//! Invariants:
//! - HTTP 404 maps to [`BackendError::NotFound`].
//! - Transport failures and 5xx responses are retried up to `max_retries`
//!   additional attempts with a fixed backoff; other statuses are not retried.
//! - Response bodies larger than `max_response_bytes` are rejected.
//! - Liveness probes are a single `HEAD` bounded by `probe_timeout_ms`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;

use appflag_core::ConfigurationTarget;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::http::DEFAULT_MAX_RESPONSE_BYTES;
use crate::http::build_client;
use crate::http::header_string;
use crate::http::read_response_limited;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Header carrying the configuration version.
pub const CONFIGURATION_VERSION_HEADER: &str = "Configuration-Version";

/// Header carrying the last-modified marker.
pub const LAST_MODIFIED_HEADER: &str = "Last-Modified";

/// Raw configuration payload returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfiguration {
    /// Raw JSON document bytes.
    pub content: Vec<u8>,
    /// Version reported by the backend.
    pub version: Option<String>,
    /// Last-modified marker reported by the backend.
    pub last_modified: Option<String>,
}

/// Backend client errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend reported that the configuration does not exist.
    #[error("configuration not found: {0}")]
    NotFound(String),
    /// Request could not be completed.
    #[error("backend transport error: {0}")]
    Transport(String),
    /// Backend answered with an unexpected status.
    #[error("backend returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Target the request was issued for.
        message: String,
    },
    /// Backend response or client configuration was invalid.
    #[error("invalid backend response: {0}")]
    Invalid(String),
}

impl BackendError {
    /// Returns true when another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status {
                status, ..
            } => *status >= 500,
            Self::NotFound(_) | Self::Invalid(_) => false,
        }
    }
}

/// Remote configuration store client.
pub trait ConfigurationBackend: Send + Sync {
    /// Fetches the raw configuration payload for the target.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when the target does not exist and
    /// other variants for transport or protocol failures.
    fn fetch_configuration(
        &self,
        target: &ConfigurationTarget,
    ) -> Result<BackendConfiguration, BackendError>;

    /// Returns true when the backend answers for the target.
    ///
    /// Makes one bounded attempt without retries and never fails.
    fn probe(&self, target: &ConfigurationTarget) -> bool;
}

// ============================================================================
// SECTION: HTTP Backend
// ============================================================================

/// Configuration for [`HttpConfigurationBackend`].
///
/// # Invariants
/// - `endpoint` is an absolute `http` or `https` URL.
/// - `timeout_ms` bounds each attempt, not the whole retry sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    /// Base URL of the configuration store.
    pub endpoint: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Liveness probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds.
    pub retry_backoff_ms: u64,
    /// Maximum accepted payload size in bytes.
    pub max_response_bytes: usize,
}

impl HttpBackendConfig {
    /// Creates a configuration for the endpoint with default limits.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: 5_000,
            probe_timeout_ms: 1_000,
            max_retries: 3,
            retry_backoff_ms: 200,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Blocking HTTP configuration backend.
pub struct HttpConfigurationBackend {
    /// Backend configuration.
    config: HttpBackendConfig,
    /// Parsed endpoint.
    endpoint: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpConfigurationBackend {
    /// Creates a backend for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Invalid`] when the endpoint is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| BackendError::Invalid(format!("invalid endpoint: {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(BackendError::Invalid(format!(
                "endpoint must be an http(s) base url: {}",
                config.endpoint
            )));
        }
        let client = build_client(Duration::from_millis(config.timeout_ms))
            .map_err(BackendError::Invalid)?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Returns the request URL for the target.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Invalid`] when the endpoint cannot carry path segments.
    pub fn configuration_url(&self, target: &ConfigurationTarget) -> Result<Url, BackendError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Invalid("endpoint cannot be a base url".to_string()))?
            .pop_if_empty()
            .extend([
                "applications",
                target.application.as_str(),
                "environments",
                target.environment.as_str(),
                "configurations",
                target.profile.as_str(),
            ]);
        Ok(url)
    }

    /// Issues a single fetch attempt.
    fn fetch_once(
        &self,
        url: &Url,
        target: &ConfigurationTarget,
    ) -> Result<BackendConfiguration, BackendError> {
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(target.to_string()));
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: target.to_string(),
            });
        }
        let version = header_string(&response, CONFIGURATION_VERSION_HEADER);
        let last_modified = header_string(&response, LAST_MODIFIED_HEADER);
        let content = read_response_limited(&mut response, self.config.max_response_bytes)
            .map_err(BackendError::Invalid)?;
        Ok(BackendConfiguration {
            content,
            version,
            last_modified,
        })
    }
}

impl ConfigurationBackend for HttpConfigurationBackend {
    fn fetch_configuration(
        &self,
        target: &ConfigurationTarget,
    ) -> Result<BackendConfiguration, BackendError> {
        let url = self.configuration_url(target)?;
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut attempt = 0_u32;
        loop {
            match self.fetch_once(&url, target) {
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    thread::sleep(backoff);
                }
                result => return result,
            }
        }
    }

    fn probe(&self, target: &ConfigurationTarget) -> bool {
        let Ok(url) = self.configuration_url(target) else {
            return false;
        };
        self.client
            .head(url.as_str())
            .timeout(Duration::from_millis(self.config.probe_timeout_ms))
            .send()
            .is_ok_and(|response| response.status().is_success())
    }
}
