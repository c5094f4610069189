// crates/appflag-provider/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fakes for appflag-provider tests.
// Purpose: Provide scripted sources, recording loggers, and sidecar servers.
// Dependencies: appflag-core, tiny_http
// ============================================================================

//! ## Overview
//! [`FakeSource`] serves a scripted sequence of load outcomes and counts every
//! call. [`RecordingLogger`] captures log records for assertions.

#![allow(
    dead_code,
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

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use appflag_core::ConfigurationDocument;
use appflag_core::ConfigurationSource;
use appflag_core::ConfigurationTarget;
use appflag_core::FlagEvaluationRequest;
use appflag_core::FlagLogger;
use appflag_core::LogLevel;
use appflag_core::Resolution;
use appflag_core::SourceCapabilities;
use appflag_core::SourceError;
use appflag_core::SourceType;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Simple-schema document with a default-off flag.
pub const SIMPLE_DOCUMENT: &str = r#"{
  "version": "1",
  "flags": {
    "new-feature-flag": { "default": false },
    "banner-text": { "default": "hello" },
    "max-items": { "default": 25 },
    "ratio": { "default": 0.5 },
    "theme": { "default": { "color": "blue" } }
  }
}"#;

/// Rich-schema document keyed on the user role.
pub const ROLE_DOCUMENT: &str = r#"{
  "version": "3",
  "flags": {
    "user-role-flag": {
      "state": "ENABLED",
      "defaultVariants": { "boolean": false },
      "targeting": {
        "rules": [
          { "condition": "user.role == \"admin\"", "variants": { "boolean": true } }
        ]
      }
    }
  }
}"#;

/// Parses a document fixture.
pub fn document(raw: &str) -> ConfigurationDocument {
    ConfigurationDocument::from_slice(raw.as_bytes()).unwrap()
}

/// Returns the target used across provider tests.
pub fn target() -> ConfigurationTarget {
    ConfigurationTarget::new("shop", "prod", "flags")
}

// ============================================================================
// SECTION: Fake Source
// ============================================================================

/// Source serving scripted load outcomes.
pub struct FakeSource {
    /// Outcomes served in order; the last one repeats.
    script: Mutex<VecDeque<Result<ConfigurationDocument, SourceError>>>,
    /// Number of load calls observed.
    loads: AtomicUsize,
    /// Version reported after loads.
    version: Option<String>,
    /// Source-side evaluation result, when delegation is enabled.
    evaluation: Option<Result<Resolution, SourceError>>,
    /// Evaluation requests observed.
    requests: Mutex<Vec<FlagEvaluationRequest>>,
}

impl FakeSource {
    /// Creates a source that always serves the document.
    pub fn serving(document: ConfigurationDocument) -> Self {
        Self::scripted(vec![Ok(document)])
    }

    /// Creates a source serving the outcomes in order.
    pub fn scripted(outcomes: Vec<Result<ConfigurationDocument, SourceError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            loads: AtomicUsize::new(0),
            version: Some("v1".to_string()),
            evaluation: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Enables source-side evaluation with a fixed outcome.
    pub fn with_evaluation(mut self, outcome: Result<Resolution, SourceError>) -> Self {
        self.evaluation = Some(outcome);
        self
    }

    /// Returns the number of load calls.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Returns the evaluation requests seen so far.
    pub fn requests(&self) -> Vec<FlagEvaluationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ConfigurationSource for FakeSource {
    fn source_type(&self) -> SourceType {
        SourceType::RemoteApi
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities {
            supports_polling: true,
            supports_webhooks: false,
        }
    }

    fn load_configuration(
        &self,
        _target: &ConfigurationTarget,
    ) -> Result<ConfigurationDocument, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }

    fn is_available(&self, _target: &ConfigurationTarget) -> bool {
        true
    }

    fn configuration_version(&self) -> Option<String> {
        self.version.clone()
    }

    fn last_modified(&self) -> Option<String> {
        None
    }

    fn supports_source_evaluation(&self) -> bool {
        self.evaluation.is_some()
    }

    fn evaluate_flag(&self, request: &FlagEvaluationRequest) -> Result<Resolution, SourceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.evaluation.clone().unwrap()
    }
}

// ============================================================================
// SECTION: Recording Logger
// ============================================================================

/// Captured log record.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// Structured fields.
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Returns the value of a field, if present.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }
}

/// Logger capturing every record.
#[derive(Default)]
pub struct RecordingLogger {
    /// Captured records.
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    /// Returns the records at the given level.
    pub fn at(&self, level: LogLevel) -> Vec<LogRecord> {
        let records = self.records.lock().unwrap();
        records.iter().filter(|record| record.level == level).cloned().collect()
    }
}

impl FlagLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, &str)]) {
        self.records.lock().unwrap().push(LogRecord {
            level,
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        });
    }
}

// ============================================================================
// SECTION: Sidecar
// ============================================================================

/// Local sidecar answering a fixed sequence of JSON responses.
pub struct SidecarServer {
    /// Base URL of the server.
    pub url: String,
    /// Handle returning the recorded request bodies.
    handle: JoinHandle<Vec<String>>,
}

impl SidecarServer {
    /// Starts a sidecar answering each `(status, body)` pair in order.
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = thread::spawn(move || {
            let mut bodies = Vec::new();
            for (status, body) in responses {
                let Ok(mut request) = server.recv() else {
                    break;
                };
                let mut received = String::new();
                let _ = request.as_reader().read_to_string(&mut received);
                bodies.push(received);
                let _ = request.respond(Response::from_string(body).with_status_code(status));
            }
            bodies
        });
        Self {
            url: format!("http://{addr}"),
            handle,
        }
    }

    /// Waits for the script to finish and returns the request bodies.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

/// Returns a local port on which nothing is listening.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
