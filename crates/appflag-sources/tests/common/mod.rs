// crates/appflag-sources/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for appflag-sources tests.
// Purpose: Provide scripted local HTTP servers and agent file layouts.
// Dependencies: tiny_http, tempfile
// ============================================================================

//! ## Overview
//! Provides a scripted `tiny_http` server that answers a fixed sequence of
//! responses and records every request it saw, plus agent layout builders.

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

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::thread::JoinHandle;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Scripted Server
// ============================================================================

/// Canned response served by [`ScriptedServer`].
pub struct CannedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Extra response headers.
    pub headers: Vec<(String, String)>,
}

impl CannedResponse {
    /// Creates a response with the status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Request observed by [`ScriptedServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path and query.
    pub url: String,
    /// Request body.
    pub body: String,
}

/// Local server answering a fixed sequence of responses.
pub struct ScriptedServer {
    /// Base URL of the server.
    pub url: String,
    /// Handle returning the recorded requests.
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl ScriptedServer {
    /// Starts a server that answers each response in order, then stops.
    pub fn start(responses: Vec<CannedResponse>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for canned in responses {
                let Ok(mut request) = server.recv() else {
                    break;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });
                let mut response =
                    Response::from_string(canned.body).with_status_code(canned.status);
                for (name, value) in canned.headers {
                    response.add_header(
                        Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap(),
                    );
                }
                let _ = request.respond(response);
            }
            recorded
        });
        Self {
            url: format!("http://{addr}"),
            handle,
        }
    }

    /// Waits for the script to finish and returns the recorded requests.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}

/// Returns a base URL on which nothing is listening.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ============================================================================
// SECTION: Agent Layout
// ============================================================================

/// Writes a document into the agent layout and returns its path.
pub fn write_layout_document(
    root: &Path,
    application: &str,
    environment: &str,
    profile: &str,
    contents: &str,
) -> PathBuf {
    let dir = root.join("configs").join(application).join(environment).join(profile);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    fs::write(&path, contents).unwrap();
    path
}

/// Rich-schema document with a role-targeted boolean flag.
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
