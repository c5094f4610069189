// crates/appflag-sources/src/http.rs
// ============================================================================
// Module: appflag HTTP Helpers
// Description: Shared blocking HTTP client construction and bounded reads.
// Purpose: Keep timeouts, redirect policy, and body limits consistent.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! Outbound requests from every source go through a client built here:
//! redirects are disabled and response bodies are read under a hard cap.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("appflag/", env!("CARGO_PKG_VERSION"));

/// Default cap on configuration payload sizes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a blocking client with the given timeout and no redirects.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, String> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(Policy::none())
        .build()
        .map_err(|err| format!("http client build failed: {err}"))
}

/// Reads the response body while enforcing a byte limit.
pub(crate) fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, String> {
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err("http response exceeds size limit".to_string());
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| format!("failed to read response: {err}"))?;
    if buf.len() > max_bytes {
        return Err("http response exceeds size limit".to_string());
    }
    Ok(buf)
}

/// Returns a response header as an owned string when present and valid UTF-8.
pub(crate) fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
