// crates/appflag-agent/src/server.rs
// ============================================================================
// Module: appflag Agent Server
// Description: HTTP routing and flag evaluation for the sidecar agent.
// Purpose: Answer health probes and evaluation requests from local clients.
// Dependencies: appflag-core, appflag-sources, serde_json, thiserror, tiny_http
// ============================================================================

//! ## Overview
//! [`AgentServer::handle`] maps a method, URL and body to an
//! [`AgentResponse`] without touching the network, and
//! [`AgentServer::serve`] drives it from a blocking `tiny_http` loop.
//! Invariants:
//! - Every error response body is `{"error": message}`.
//! - A missing configuration file is a 404; any other evaluation failure is
//!   answered with the caller default and reason `ERROR`.
//! - Target identifiers containing path separators or dot segments are
//!   rejected before any file is opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use appflag_core::ConfigurationSource;
use appflag_core::ConfigurationTarget;
use appflag_core::EvaluationContext;
use appflag_core::FlagEvaluationRequest;
use appflag_core::SourceError;
use appflag_sources::AgentSource;
use appflag_sources::AgentSourceConfig;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tiny_http::Header;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "appconfig-agent";

/// Maximum accepted request body size in bytes.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Agent startup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The evaluation source could not be constructed.
    #[error("agent source error: {0}")]
    Source(String),
    /// The listener could not be bound.
    #[error("agent bind error: {0}")]
    Bind(String),
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// JSON response produced by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl AgentResponse {
    /// Creates a JSON response.
    #[must_use]
    pub const fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
        }
    }

    /// Creates an error response with the `{"error": message}` body.
    #[must_use]
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    /// Converts the response into a `tiny_http` response.
    fn into_http(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let response =
            Response::from_data(self.body.to_string().into_bytes()).with_status_code(self.status);
        match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Sidecar agent evaluating flags from a local file layout.
pub struct AgentServer {
    /// Root of the agent file layout.
    agent_root: PathBuf,
    /// File-backed evaluation source.
    source: AgentSource,
}

impl AgentServer {
    /// Creates an agent rooted at `agent_root`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Source`] when the evaluation source cannot be built.
    pub fn new(agent_root: impl Into<PathBuf>) -> Result<Self, AgentError> {
        let agent_root = agent_root.into();
        let source = AgentSource::new(AgentSourceConfig {
            agent_root: agent_root.clone(),
            ..AgentSourceConfig::default()
        })
        .map_err(|err| AgentError::Source(err.to_string()))?;
        Ok(Self {
            agent_root,
            source,
        })
    }

    /// Returns the agent root.
    #[must_use]
    pub fn agent_root(&self) -> &Path {
        &self.agent_root
    }

    /// Binds a listener on `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Bind`] when the address cannot be bound.
    pub fn bind(host: &str, port: u16) -> Result<Server, AgentError> {
        Server::http(format!("{host}:{port}")).map_err(|err| AgentError::Bind(err.to_string()))
    }

    /// Serves requests from the listener until it shuts down.
    pub fn serve(&self, server: &Server) {
        for mut request in server.incoming_requests() {
            let method = request.method().to_string();
            let url = request.url().to_string();
            let response = match read_body(&mut request) {
                Ok(body) => self.handle(&method, &url, &body),
                Err(response) => response,
            };
            tracing::info!(
                target: "appflag_agent",
                method = %method,
                url = %url,
                status = response.status,
                "request handled"
            );
            if let Err(err) = request.respond(response.into_http()) {
                tracing::warn!(target: "appflag_agent", error = %err, "response write failed");
            }
        }
    }

    /// Routes one request.
    #[must_use]
    pub fn handle(&self, method: &str, url: &str, body: &[u8]) -> AgentResponse {
        let path = url.split('?').next().unwrap_or(url);
        match (method, path) {
            ("GET", "/health" | "/") => {
                AgentResponse::json(200, json!({ "status": "healthy", "service": SERVICE_NAME }))
            }
            ("POST", "/evaluate") => self.evaluate(body),
            _ => AgentResponse::error(404, format!("no route for {method} {path}")),
        }
    }

    /// Handles `POST /evaluate`.
    fn evaluate(&self, body: &[u8]) -> AgentResponse {
        let Ok(payload) = serde_json::from_slice::<Value>(body) else {
            return AgentResponse::error(400, "invalid JSON in request body");
        };
        let (Some(flag_key), Some(application), Some(environment), Some(profile)) = (
            required(&payload, "flagKey"),
            required(&payload, "application"),
            required(&payload, "environment"),
            required(&payload, "configurationProfile"),
        ) else {
            return AgentResponse::error(400, "missing required parameters");
        };
        if let Some(bad) =
            [application, environment, profile].into_iter().find(|id| !is_safe_segment(id))
        {
            return AgentResponse::error(400, format!("invalid target identifier: {bad}"));
        }
        let context = match payload.get("context") {
            None | Some(Value::Null) => EvaluationContext::new(),
            Some(value) => match EvaluationContext::from_value(value.clone()) {
                Some(context) => context,
                None => return AgentResponse::error(400, "context must be a JSON object"),
            },
        };
        let default_value = payload.get("defaultValue").cloned().unwrap_or(Value::Null);
        let target = ConfigurationTarget::new(application, environment, profile);
        let request =
            FlagEvaluationRequest::new(&target, flag_key, context, default_value.clone());

        match self.source.evaluate_flag(&request) {
            Ok(resolution) => AgentResponse::json(
                200,
                json!({ "value": resolution.value, "reason": resolution.reason.as_str() }),
            ),
            Err(err @ SourceError::ConfigurationNotFound(_)) => {
                AgentResponse::error(404, err.to_string())
            }
            Err(err) => {
                tracing::error!(
                    target: "appflag_agent",
                    flag_key = %flag_key,
                    error = %err,
                    "flag evaluation failed"
                );
                AgentResponse::json(200, json!({ "value": default_value, "reason": "ERROR" }))
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a non-empty string field of the payload.
fn required<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str).filter(|value| !value.is_empty())
}

/// Returns true when `id` is usable as a single path segment.
fn is_safe_segment(id: &str) -> bool {
    id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

/// Reads the request body within [`MAX_REQUEST_BYTES`].
fn read_body(request: &mut Request) -> Result<Vec<u8>, AgentResponse> {
    let limit = u64::try_from(MAX_REQUEST_BYTES).unwrap_or(u64::MAX);
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| AgentResponse::error(400, format!("request body unreadable: {err}")))?;
    if body.len() > MAX_REQUEST_BYTES {
        return Err(AgentResponse::error(413, "request body exceeds size limit"));
    }
    Ok(body)
}
