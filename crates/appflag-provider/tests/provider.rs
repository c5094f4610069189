// crates/appflag-provider/tests/provider.rs
// ============================================================================
// Module: Provider Facade Tests
// Description: End-to-end flag resolution through the provider facade.
// Purpose: Validate typed resolution, delegation, and error fallbacks.
// ============================================================================

//! ## Overview
//! Exercises [`FeatureFlagProvider`] with scripted sources, agent file
//! layouts, and a local sidecar server.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;
use std::sync::Arc;

use appflag_config::ProviderConfig;
use appflag_core::EvaluationContext;
use appflag_core::LogLevel;
use appflag_core::Resolution;
use appflag_core::ResolutionReason;
use appflag_core::SourceError;
use appflag_core::SourceType;
use appflag_provider::FeatureFlagProvider;
use appflag_provider::PROVIDER_NAME;
use appflag_provider::ProviderError;
use appflag_sources::agent::layout_path;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use crate::common::FakeSource;
use crate::common::RecordingLogger;
use crate::common::ROLE_DOCUMENT;
use crate::common::SIMPLE_DOCUMENT;
use crate::common::SidecarServer;
use crate::common::document;
use crate::common::target;
use crate::common::unused_port;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a provider over the source with a recording logger.
fn provider_with(
    source: FakeSource,
) -> (FeatureFlagProvider, Arc<FakeSource>, Arc<RecordingLogger>) {
    let source = Arc::new(source);
    let logger = Arc::new(RecordingLogger::default());
    let provider = FeatureFlagProvider::builder(ProviderConfig::new("shop", "prod", "flags"))
        .with_source(source.clone())
        .with_logger(logger.clone())
        .build()
        .unwrap();
    (provider, source, logger)
}

/// Returns a context with `user.role` set.
fn role_context(role: &str) -> EvaluationContext {
    EvaluationContext::new().with_attribute("user", json!({ "role": role }))
}

/// Writes a document into the agent layout under `root`.
fn write_agent_document(root: &TempDir, contents: &str) {
    let path = layout_path(root.path(), &target());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Builds an agent-type configuration rooted at `root` with the sidecar port.
fn agent_config(root: &TempDir, port: u16) -> ProviderConfig {
    let mut config = ProviderConfig::new("shop", "prod", "flags");
    config.source_type = SourceType::Agent;
    config.agent_host = "127.0.0.1".to_string();
    config.agent_port = port;
    config.agent_path = root.path().to_path_buf();
    config
}

// ============================================================================
// SECTION: End-to-End Scenarios
// ============================================================================

/// Tests that a rich flag without rules resolves its default variant.
#[test]
fn rich_default_variant_resolves_with_targeting_match() {
    let raw = r#"{
      "flags": { "simple-flag": { "state": "ENABLED", "defaultVariants": { "boolean": false } } }
    }"#;
    let (provider, _, _) = provider_with(FakeSource::serving(document(raw)));

    let details = provider.resolve_boolean("simple-flag", true, None);

    assert!(!details.value);
    assert_eq!(details.reason, ResolutionReason::TargetingMatch);
    assert_eq!(details.source_reason, Some(ResolutionReason::Default));
    assert!(details.error_message.is_none());
}

/// Tests that role rules select the matching variant in order.
#[test]
fn role_rules_select_variants() {
    let raw = r#"{
      "flags": {
        "user-role-flag": {
          "state": "ENABLED",
          "defaultVariants": { "boolean": false },
          "targeting": { "rules": [
            { "condition": "user.role == \"admin\"", "variants": { "boolean": true } },
            { "condition": "user.role == \"moderator\"", "variants": { "boolean": true } }
          ] }
        }
      }
    }"#;
    let (provider, source, _) = provider_with(FakeSource::serving(document(raw)));

    let user = provider.resolve_boolean("user-role-flag", true, Some(&role_context("user")));
    let admin = provider.resolve_boolean("user-role-flag", false, Some(&role_context("admin")));
    let moderator =
        provider.resolve_boolean("user-role-flag", false, Some(&role_context("moderator")));

    assert!(!user.value);
    assert!(admin.value);
    assert!(moderator.value);
    assert_eq!(admin.source_reason, Some(ResolutionReason::TargetingMatch));
    assert_eq!(source.loads(), 1);
}

/// Tests that a missing flag returns the caller default on the local path.
#[test]
fn missing_flag_returns_default_locally() {
    let (provider, _, logger) = provider_with(FakeSource::serving(document(SIMPLE_DOCUMENT)));

    let details = provider.resolve_string("absent", "fallback", None);

    assert_eq!(details.value, "fallback");
    assert_eq!(details.reason, ResolutionReason::TargetingMatch);
    assert_eq!(details.source_reason, Some(ResolutionReason::FlagNotFound));
    assert!(logger.at(LogLevel::Error).is_empty());
}

/// Tests that a missing flag reports FLAG_NOT_FOUND through a sidecar.
#[test]
fn missing_flag_through_sidecar_reports_not_found() {
    let root = TempDir::new().unwrap();
    write_agent_document(&root, SIMPLE_DOCUMENT);
    let sidecar = SidecarServer::start(vec![
        (200, "ok".to_string()),
        (200, r#"{"value":true,"reason":"FLAG_NOT_FOUND"}"#.to_string()),
    ]);
    let port = sidecar.url.rsplit(':').next().unwrap().parse().unwrap();
    let provider = FeatureFlagProvider::from_config(agent_config(&root, port)).unwrap();

    let details = provider.resolve_boolean("absent", true, None);

    assert!(details.value);
    assert_eq!(details.source_reason, Some(ResolutionReason::FlagNotFound));
    let bodies = sidecar.finish();
    assert_eq!(bodies.len(), 2);
    let body: Value = serde_json::from_str(&bodies[1]).unwrap();
    assert_eq!(body["flagKey"], "absent");
    assert_eq!(body["configurationProfile"], "flags");
    assert_eq!(body["defaultValue"], true);
}

// ============================================================================
// SECTION: Typed Resolution
// ============================================================================

/// Tests that each typed entry point resolves its own kind.
#[test]
fn typed_entry_points_resolve_their_kind() {
    let (provider, _, _) = provider_with(FakeSource::serving(document(SIMPLE_DOCUMENT)));

    assert_eq!(provider.resolve_string("banner-text", "x", None).value, "hello");
    assert_eq!(provider.resolve_integer("max-items", 0, None).value, 25);
    assert!((provider.resolve_float("ratio", 0.0, None).value - 0.5).abs() < f64::EPSILON);
    assert!((provider.resolve_float("max-items", 0.0, None).value - 25.0).abs() < f64::EPSILON);
    let theme = provider.resolve_object("theme", Map::new(), None);
    assert_eq!(theme.value.get("color"), Some(&json!("blue")));
}

/// Tests that a kind mismatch falls back to the default with an error.
#[test]
fn kind_mismatch_is_an_error() {
    let (provider, _, logger) = provider_with(FakeSource::serving(document(SIMPLE_DOCUMENT)));

    let details = provider.resolve_integer("banner-text", 7, None);

    assert_eq!(details.value, 7);
    assert_eq!(details.reason, ResolutionReason::Error);
    assert!(details.error_message.unwrap().contains("integer"));
    let errors = logger.at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("flag_key"), Some("banner-text"));
}

/// Tests that source failures become the caller default with reason ERROR.
#[test]
fn source_failure_returns_default() {
    let failure = SourceError::Backend("unavailable".to_string());
    let (provider, _, logger) = provider_with(FakeSource::scripted(vec![Err(failure)]));

    let details = provider.resolve_boolean("new-feature-flag", true, None);

    assert!(details.value);
    assert!(details.is_error());
    assert!(details.source_reason.is_none());
    assert!(details.error_message.unwrap().contains("unavailable"));
    let errors = logger.at(LogLevel::Error);
    let facade = errors.iter().find(|record| record.message == "flag evaluation failed").unwrap();
    assert!(facade.field("error").unwrap().contains("unavailable"));
}

// ============================================================================
// SECTION: Delegation
// ============================================================================

/// Tests that every kind is delegated when the source evaluates flags.
#[test]
fn delegation_applies_to_every_kind() {
    let source = FakeSource::serving(document(SIMPLE_DOCUMENT))
        .with_evaluation(Ok(Resolution::new(json!("remote"), ResolutionReason::TargetingMatch)));
    let (provider, source, _) = provider_with(source);

    let details = provider.resolve_string("banner-text", "x", Some(&role_context("admin")));

    assert_eq!(details.value, "remote");
    assert_eq!(source.loads(), 0);
    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].flag_key, "banner-text");
    assert_eq!(requests[0].application, "shop");
    assert_eq!(requests[0].default_value, json!("x"));
    assert_eq!(requests[0].context, role_context("admin"));
}

/// Tests that an ERROR reason from the source becomes an error resolution.
#[test]
fn delegated_error_reason_returns_default() {
    let source = FakeSource::serving(document(SIMPLE_DOCUMENT))
        .with_evaluation(Ok(Resolution::new(json!(false), ResolutionReason::Error)));
    let (provider, _, _) = provider_with(source);

    let details = provider.resolve_boolean("new-feature-flag", true, None);

    assert!(details.value);
    assert!(details.is_error());
}

/// Tests that delegated evaluation failures become error resolutions.
#[test]
fn delegated_failure_returns_default() {
    let source = FakeSource::serving(document(SIMPLE_DOCUMENT))
        .with_evaluation(Err(SourceError::Sidecar("flag store offline".to_string())));
    let (provider, _, logger) = provider_with(source);

    let details = provider.resolve_float("ratio", 1.5, None);

    assert!((details.value - 1.5).abs() < f64::EPSILON);
    assert!(details.is_error());
    assert_eq!(logger.at(LogLevel::Error).len(), 1);
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Tests that an agent configuration falls back to the local file layout.
#[test]
fn agent_config_without_sidecar_reads_files() {
    let root = TempDir::new().unwrap();
    write_agent_document(&root, ROLE_DOCUMENT);
    let provider = FeatureFlagProvider::from_config(agent_config(&root, unused_port())).unwrap();

    assert_eq!(provider.name(), PROVIDER_NAME);
    assert_eq!(provider.source().source_type(), SourceType::Agent);
    let admin = provider.resolve_boolean("user-role-flag", false, Some(&role_context("admin")));
    assert!(admin.value);
    assert_eq!(admin.reason, ResolutionReason::TargetingMatch);
}

/// Tests that a sidecar failing its probe leaves evaluation to the cached file.
#[test]
fn unhealthy_sidecar_uses_cached_document() {
    let root = TempDir::new().unwrap();
    write_agent_document(&root, ROLE_DOCUMENT);
    let sidecar = SidecarServer::start(vec![(503, r#"{"error":"starting"}"#.to_string())]);
    let port = sidecar.url.rsplit(':').next().unwrap().parse().unwrap();
    let provider = FeatureFlagProvider::from_config(agent_config(&root, port)).unwrap();

    let first = provider.resolve_boolean("user-role-flag", false, Some(&role_context("admin")));
    write_agent_document(&root, SIMPLE_DOCUMENT);
    let second = provider.resolve_boolean("user-role-flag", false, Some(&role_context("admin")));

    assert!(first.value);
    assert_eq!(first.error_message, None);
    assert!(second.value);
    assert_eq!(provider.source().configuration_version().as_deref(), Some("3"));
    assert_eq!(sidecar.finish().len(), 1);
}

/// Tests that initialization loads the configuration eagerly.
#[test]
fn initialize_loads_configuration() {
    let (provider, source, _) = provider_with(FakeSource::serving(document(SIMPLE_DOCUMENT)));

    provider.initialize().unwrap();

    assert_eq!(source.loads(), 1);
    assert_eq!(provider.manager().configuration_version().as_deref(), Some("v1"));
}

/// Tests that remote and hybrid configurations select the remote source.
#[test]
fn remote_and_hybrid_select_remote_source() {
    for source_type in [SourceType::RemoteApi, SourceType::Hybrid] {
        let mut config = ProviderConfig::new("shop", "prod", "flags");
        config.source_type = source_type;
        config.remote_endpoint = Some("http://127.0.0.1:9".to_string());

        let provider = FeatureFlagProvider::from_config(config).unwrap();

        assert_eq!(provider.source().source_type(), SourceType::RemoteApi);
        assert_eq!(provider.manager().cache_key(), "appflag:remote-api:shop:prod:flags");
    }
}

/// Tests that invalid configuration is rejected at construction.
#[test]
fn invalid_config_is_rejected() {
    let mut config = ProviderConfig::new("shop", "prod", "flags");
    config.cache_ttl_secs = 0;

    let result = FeatureFlagProvider::from_config(config);

    assert!(matches!(result, Err(ProviderError::Config(_))));
}
