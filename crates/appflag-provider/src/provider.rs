// crates/appflag-provider/src/provider.rs
// ============================================================================
// Module: appflag Provider Facade
// Description: Typed flag resolution entry points over the manager and source.
// Purpose: Turn every evaluation outcome into a value and a reason, never a panic.
// Dependencies: appflag-config, appflag-core, appflag-sources, thiserror
// ============================================================================

//! ## Overview
//! [`FeatureFlagProvider`] exposes one resolve entry point per value kind.
//! When the active source can evaluate flags itself, every kind is delegated
//! to it; otherwise the managed document is evaluated locally.
//! Invariants:
//! - Failures are logged with the flag key and error text, then returned as
//!   the caller default with reason `ERROR`.
//! - Successful resolutions report `TARGETING_MATCH`; the evaluator's precise
//!   reason is kept in `source_reason`.
//! - The source is selected once, at construction, from the source type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use appflag_config::ProviderConfig;
use appflag_core::CacheStore;
use appflag_core::Clock;
use appflag_core::ConfigurationSource;
use appflag_core::EvaluationContext;
use appflag_core::FlagEvaluationRequest;
use appflag_core::FlagLogger;
use appflag_core::InMemoryCacheStore;
use appflag_core::Resolution;
use appflag_core::ResolutionDetails;
use appflag_core::ResolutionReason;
use appflag_core::SourceType;
use appflag_core::SystemClock;
use appflag_core::evaluate_document;
use appflag_sources::AgentSource;
use appflag_sources::AgentSourceConfig;
use appflag_sources::HttpBackendConfig;
use appflag_sources::HttpConfigurationBackend;
use appflag_sources::RemoteApiSource;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::logging::TracingLogger;
use crate::manager::ConfigurationManager;
use crate::manager::ManagerConfig;
use crate::manager::RefreshError;
use crate::value::FlagValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Provider name reported in metadata.
pub const PROVIDER_NAME: &str = "appflag";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Configuration failed validation.
    #[error("invalid provider config: {0}")]
    Config(String),
    /// Configuration source could not be constructed.
    #[error("source construction failed: {0}")]
    Source(String),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`FeatureFlagProvider`] with pluggable collaborators.
pub struct ProviderBuilder {
    /// Provider configuration.
    config: ProviderConfig,
    /// Source override; selected from `config.source_type` when absent.
    source: Option<Arc<dyn ConfigurationSource>>,
    /// Cache store override; an in-memory store when absent.
    cache: Option<Arc<dyn CacheStore>>,
    /// Clock override; the system clock when absent.
    clock: Option<Arc<dyn Clock>>,
    /// Logger override; [`TracingLogger`] when absent.
    logger: Option<Arc<dyn FlagLogger>>,
}

impl ProviderBuilder {
    /// Starts a builder for the configuration.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            source: None,
            cache: None,
            clock: None,
            logger: None,
        }
    }

    /// Uses the given source instead of selecting one from the configuration.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ConfigurationSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Uses the given cache store.
    #[must_use]
    pub fn with_cache_store(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Uses the given clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Uses the given logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn FlagLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validates the configuration and assembles the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the configuration is invalid or the
    /// source cannot be constructed.
    pub fn build(self) -> Result<FeatureFlagProvider, ProviderError> {
        self.config.validate().map_err(|err| ProviderError::Config(err.to_string()))?;
        let logger = self.logger.unwrap_or_else(|| Arc::new(TracingLogger));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCacheStore::with_clock(Arc::clone(&clock))));
        let source = match self.source {
            Some(source) => source,
            None => select_source(&self.config, logger.as_ref())?,
        };
        let manager = ConfigurationManager::new(
            Arc::clone(&source),
            cache,
            clock,
            Arc::clone(&logger),
            self.config.target(),
            ManagerConfig {
                cache_ttl: self.config.cache_ttl(),
                enable_polling: self.config.enable_polling,
            },
        );
        Ok(FeatureFlagProvider {
            manager,
            source,
            logger,
        })
    }
}

/// Builds the source named by the configured source type.
///
/// # Errors
///
/// Returns [`ProviderError::Source`] when the source cannot be constructed.
pub fn select_source(
    config: &ProviderConfig,
    logger: &dyn FlagLogger,
) -> Result<Arc<dyn ConfigurationSource>, ProviderError> {
    match config.source_type {
        SourceType::RemoteApi | SourceType::Hybrid => {
            if config.source_type == SourceType::Hybrid {
                logger.info("hybrid source type uses the remote api source", &[]);
            }
            let backend = HttpConfigurationBackend::new(HttpBackendConfig {
                timeout_ms: config.request_timeout_ms,
                max_retries: config.max_retries,
                ..HttpBackendConfig::new(config.effective_remote_endpoint())
            })
            .map_err(|err| ProviderError::Source(err.to_string()))?;
            Ok(Arc::new(RemoteApiSource::new(Box::new(backend))))
        }
        SourceType::Agent => {
            let source = AgentSource::new(AgentSourceConfig {
                agent_root: config.agent_path.clone(),
                config_path: config.local_config_path.clone(),
                sidecar_url: Some(config.sidecar_url()),
                ..AgentSourceConfig::default()
            })
            .map_err(|err| ProviderError::Source(err.to_string()))?;
            Ok(Arc::new(source))
        }
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Feature-flag provider facade.
pub struct FeatureFlagProvider {
    /// Configuration manager for the configured target.
    manager: ConfigurationManager,
    /// Active source, shared with the manager.
    source: Arc<dyn ConfigurationSource>,
    /// Log sink.
    logger: Arc<dyn FlagLogger>,
}

impl FeatureFlagProvider {
    /// Builds a provider from configuration with default collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the configuration is invalid or the
    /// source cannot be constructed.
    pub fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        ProviderBuilder::new(config).build()
    }

    /// Starts a builder for the configuration.
    #[must_use]
    pub fn builder(config: ProviderConfig) -> ProviderBuilder {
        ProviderBuilder::new(config)
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Loads the configuration eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] when the initial load fails.
    pub fn initialize(&self) -> Result<(), RefreshError> {
        self.manager.get_configuration().map(|_| ())
    }

    /// Returns the configuration manager.
    #[must_use]
    pub const fn manager(&self) -> &ConfigurationManager {
        &self.manager
    }

    /// Returns the active source.
    #[must_use]
    pub fn source(&self) -> &dyn ConfigurationSource {
        self.source.as_ref()
    }

    /// Resolves a boolean flag.
    #[must_use]
    pub fn resolve_boolean(
        &self,
        flag_key: &str,
        default_value: bool,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<bool> {
        self.resolve(flag_key, default_value, context)
    }

    /// Resolves a string flag.
    #[must_use]
    pub fn resolve_string(
        &self,
        flag_key: &str,
        default_value: impl Into<String>,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<String> {
        self.resolve(flag_key, default_value.into(), context)
    }

    /// Resolves an integer flag.
    #[must_use]
    pub fn resolve_integer(
        &self,
        flag_key: &str,
        default_value: i64,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<i64> {
        self.resolve(flag_key, default_value, context)
    }

    /// Resolves a float flag.
    #[must_use]
    pub fn resolve_float(
        &self,
        flag_key: &str,
        default_value: f64,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<f64> {
        self.resolve(flag_key, default_value, context)
    }

    /// Resolves an object flag.
    #[must_use]
    pub fn resolve_object(
        &self,
        flag_key: &str,
        default_value: Map<String, Value>,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<Map<String, Value>> {
        self.resolve(flag_key, default_value, context)
    }

    /// Resolves any flag kind, converting every failure into the caller default.
    #[must_use]
    pub fn resolve<T: FlagValue>(
        &self,
        flag_key: &str,
        default_value: T,
        context: Option<&EvaluationContext>,
    ) -> ResolutionDetails<T> {
        let empty = EvaluationContext::new();
        let context = context.unwrap_or(&empty);
        let outcome = self.evaluate(flag_key, default_value.to_json(), context).and_then(
            |resolution| {
                T::from_json(&resolution.value)
                    .map(|value| (value, resolution.reason))
                    .ok_or_else(|| format!("flag {flag_key} did not resolve to type {}", T::KIND))
            },
        );
        match outcome {
            Ok((value, reason)) => ResolutionDetails::success(value, Some(reason)),
            Err(message) => {
                self.logger.error(
                    "flag evaluation failed",
                    &[("flag_key", flag_key), ("error", message.as_str())],
                );
                ResolutionDetails::error(default_value, message)
            }
        }
    }

    /// Produces an untyped resolution by delegation or local evaluation.
    fn evaluate(
        &self,
        flag_key: &str,
        default_value: Value,
        context: &EvaluationContext,
    ) -> Result<Resolution, String> {
        if self.source.supports_source_evaluation() {
            let request = FlagEvaluationRequest::new(
                self.manager.target(),
                flag_key,
                context.clone(),
                default_value,
            );
            let resolution =
                self.source.evaluate_flag(&request).map_err(|err| err.to_string())?;
            if resolution.reason == ResolutionReason::Error {
                return Err(format!("source reported an evaluation error for flag {flag_key}"));
            }
            return Ok(resolution);
        }
        let document = self.manager.get_configuration().map_err(|err| err.to_string())?;
        Ok(evaluate_document(&document, flag_key, context, &default_value))
    }
}
