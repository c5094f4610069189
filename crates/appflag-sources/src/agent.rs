// crates/appflag-sources/src/agent.rs
// ============================================================================
// Module: appflag Agent Source
// Description: Local file and sidecar agent configuration source.
// Purpose: Serve configuration from the agent file layout and delegate
//          evaluation to a co-located sidecar when it is reachable.
// Dependencies: appflag-core, reqwest, serde, serde_json, time
// ============================================================================

//! ## Overview
//! [`AgentSource`] reads documents from
//! `{agent_root}/configs/{application}/{environment}/{profile}/config.json`
//! (or an explicit override path) and, when a configured sidecar passes its
//! liveness probe, forwards single-flag evaluations to
//! `POST {sidecar}/evaluate`.
//! Invariants:
//! - A missing configuration file is reported as not found, never as I/O.
//! - Delegation happens only after a successful probe; a probe verdict is
//!   reused for `probe_reuse_ms`.
//! - A sidecar that fails the probe or refuses the evaluation request falls
//!   back to local evaluation of the same file.
//! - Sidecar answers with an error status are surfaced, not masked.
//! - Metadata is read from `version.txt` and `metadata.json` beside the file;
//!   last-modified falls back to the file mtime in RFC 3339.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use appflag_core::ConfigurationDocument;
use appflag_core::ConfigurationSource;
use appflag_core::ConfigurationTarget;
use appflag_core::FlagEvaluationRequest;
use appflag_core::Resolution;
use appflag_core::SourceCapabilities;
use appflag_core::SourceError;
use appflag_core::SourceType;
use appflag_core::evaluate_document;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::http::DEFAULT_MAX_RESPONSE_BYTES;
use crate::http::build_client;
use crate::http::read_response_limited;
use crate::metadata::LoadMetadata;
use crate::metadata::MetadataSlot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default agent installation root.
pub const DEFAULT_AGENT_ROOT: &str = "/opt/appconfig-agent";

/// File name of a configuration document within its profile directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Optional plain-text version marker beside the document.
pub const VERSION_FILE_NAME: &str = "version.txt";

/// Optional JSON metadata beside the document.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Maximum size of metadata files.
const MAX_METADATA_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`AgentSource`].
///
/// # Invariants
/// - `sidecar_url`, when set, is an absolute http(s) base URL.
/// - Timeouts bound each request individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSourceConfig {
    /// Root of the agent file layout.
    pub agent_root: PathBuf,
    /// Explicit document path overriding the layout.
    pub config_path: Option<PathBuf>,
    /// Sidecar base URL; `None` disables delegation.
    pub sidecar_url: Option<String>,
    /// Liveness probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Evaluation request timeout in milliseconds.
    pub evaluation_timeout_ms: u64,
    /// How long a probe verdict is reused before probing again.
    pub probe_reuse_ms: u64,
    /// Maximum accepted document size in bytes.
    pub max_document_bytes: usize,
}

impl Default for AgentSourceConfig {
    fn default() -> Self {
        Self {
            agent_root: PathBuf::from(DEFAULT_AGENT_ROOT),
            config_path: None,
            sidecar_url: None,
            probe_timeout_ms: 1_000,
            evaluation_timeout_ms: 5_000,
            probe_reuse_ms: 5_000,
            max_document_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Returns the layout path of a target's document under `agent_root`.
#[must_use]
pub fn layout_path(agent_root: &Path, target: &ConfigurationTarget) -> PathBuf {
    agent_root
        .join("configs")
        .join(&target.application)
        .join(&target.environment)
        .join(&target.profile)
        .join(CONFIG_FILE_NAME)
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Agent configuration source.
///
/// # Invariants
/// - Capabilities are constant: polling and webhooks supported.
pub struct AgentSource {
    /// Source configuration.
    config: AgentSourceConfig,
    /// Sidecar base URL and client, when delegation is enabled.
    sidecar: Option<Sidecar>,
    /// Metadata of the latest successful load.
    metadata: MetadataSlot,
}

/// Sidecar endpoint handle.
struct Sidecar {
    /// Parsed base URL, probed for liveness.
    base: Url,
    /// Evaluation endpoint below the base URL.
    evaluate: Url,
    /// Client shared by probe and evaluation requests.
    client: Client,
    /// Most recent probe verdict.
    liveness: Mutex<Option<Liveness>>,
}

/// Probe verdict and when it was taken.
#[derive(Clone, Copy)]
struct Liveness {
    /// Probe time.
    checked_at: Instant,
    /// Whether the sidecar answered with a success status.
    alive: bool,
}

impl AgentSource {
    /// Capabilities shared by every agent source.
    pub const CAPABILITIES: SourceCapabilities = SourceCapabilities {
        supports_polling: true,
        supports_webhooks: true,
    };

    /// Creates an agent source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Sidecar`] when the sidecar URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: AgentSourceConfig) -> Result<Self, SourceError> {
        let sidecar = match &config.sidecar_url {
            None => None,
            Some(raw) => {
                let base = Url::parse(raw)
                    .map_err(|err| SourceError::Sidecar(format!("invalid sidecar url: {err}")))?;
                if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
                    return Err(SourceError::Sidecar(format!(
                        "sidecar url must be an http(s) base url: {raw}"
                    )));
                }
                let timeout = Duration::from_millis(
                    config.probe_timeout_ms.max(config.evaluation_timeout_ms),
                );
                let client = build_client(timeout).map_err(SourceError::Sidecar)?;
                let mut evaluate = base.clone();
                evaluate
                    .path_segments_mut()
                    .map_err(|()| SourceError::Sidecar(format!("invalid sidecar url: {raw}")))?
                    .pop_if_empty()
                    .push("evaluate");
                Some(Sidecar {
                    base,
                    evaluate,
                    client,
                    liveness: Mutex::new(None),
                })
            }
        };
        Ok(Self {
            config,
            sidecar,
            metadata: MetadataSlot::default(),
        })
    }

    /// Returns the document path used for the target.
    #[must_use]
    pub fn document_path(&self, target: &ConfigurationTarget) -> PathBuf {
        self.config
            .config_path
            .clone()
            .unwrap_or_else(|| layout_path(&self.config.agent_root, target))
    }

    /// Reads and parses the document for the target without touching metadata.
    fn read_document(&self, path: &Path) -> Result<ConfigurationDocument, SourceError> {
        let bytes = read_file_limited(path, self.config.max_document_bytes)?;
        Ok(ConfigurationDocument::from_slice(&bytes)?)
    }

    /// Probes the sidecar base URL and records the verdict.
    fn probe_sidecar(&self, sidecar: &Sidecar) -> bool {
        let alive = sidecar
            .client
            .get(sidecar.base.as_str())
            .timeout(Duration::from_millis(self.config.probe_timeout_ms))
            .send()
            .is_ok_and(|response| response.status().is_success());
        if let Ok(mut slot) = sidecar.liveness.lock() {
            *slot = Some(Liveness {
                checked_at: Instant::now(),
                alive,
            });
        }
        alive
    }

    /// Returns the sidecar when it is configured and considered alive.
    fn live_sidecar(&self) -> Option<&Sidecar> {
        let sidecar = self.sidecar.as_ref()?;
        let reuse = Duration::from_millis(self.config.probe_reuse_ms);
        let recent = sidecar
            .liveness
            .lock()
            .ok()
            .and_then(|slot| *slot)
            .filter(|liveness| liveness.checked_at.elapsed() < reuse);
        let alive = match recent {
            Some(liveness) => liveness.alive,
            None => self.probe_sidecar(sidecar),
        };
        alive.then_some(sidecar)
    }

    /// Sends the request to the sidecar.
    ///
    /// Returns `Ok(None)` when the sidecar could not be reached.
    fn evaluate_remote(
        &self,
        sidecar: &Sidecar,
        request: &FlagEvaluationRequest,
    ) -> Result<Option<Resolution>, SourceError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| SourceError::Sidecar(format!("request encoding failed: {err}")))?;
        let sent = sidecar
            .client
            .post(sidecar.evaluate.as_str())
            .timeout(Duration::from_millis(self.config.evaluation_timeout_ms))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send();
        let Ok(mut response) = sent else {
            if let Ok(mut slot) = sidecar.liveness.lock() {
                *slot = None;
            }
            return Ok(None);
        };
        let status = response.status();
        let payload = read_response_limited(&mut response, self.config.max_document_bytes)
            .map_err(SourceError::Sidecar)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<SidecarError>(&payload)
                .map_or_else(|_| format!("status {}", status.as_u16()), |body| body.error);
            return Err(SourceError::Sidecar(message));
        }
        serde_json::from_slice::<Resolution>(&payload)
            .map(Some)
            .map_err(|err| SourceError::Sidecar(format!("invalid sidecar response: {err}")))
    }

    /// Evaluates the request against the local document.
    fn evaluate_local(&self, request: &FlagEvaluationRequest) -> Result<Resolution, SourceError> {
        let target = request.target();
        let document = self.read_document(&self.document_path(&target))?;
        Ok(evaluate_document(
            &document,
            &request.flag_key,
            &request.context,
            &request.default_value,
        ))
    }
}

impl ConfigurationSource for AgentSource {
    fn source_type(&self) -> SourceType {
        SourceType::Agent
    }

    fn capabilities(&self) -> SourceCapabilities {
        Self::CAPABILITIES
    }

    fn load_configuration(
        &self,
        target: &ConfigurationTarget,
    ) -> Result<ConfigurationDocument, SourceError> {
        let path = self.document_path(target);
        let document = self.read_document(&path)?;
        self.metadata.record(read_metadata(&path, &document))?;
        Ok(document)
    }

    fn is_available(&self, target: &ConfigurationTarget) -> bool {
        match &self.sidecar {
            Some(sidecar) => self.probe_sidecar(sidecar),
            None => self.document_path(target).is_file(),
        }
    }

    fn configuration_version(&self) -> Option<String> {
        self.metadata.version()
    }

    fn last_modified(&self) -> Option<String> {
        self.metadata.last_modified()
    }

    fn supports_source_evaluation(&self) -> bool {
        self.live_sidecar().is_some()
    }

    fn evaluate_flag(&self, request: &FlagEvaluationRequest) -> Result<Resolution, SourceError> {
        if let Some(sidecar) = self.live_sidecar()
            && let Some(resolution) = self.evaluate_remote(sidecar, request)?
        {
            return Ok(resolution);
        }
        self.evaluate_local(request)
    }
}

// ============================================================================
// SECTION: Files
// ============================================================================

/// Error body returned by the sidecar.
#[derive(Deserialize)]
struct SidecarError {
    /// Error message.
    error: String,
}

/// Optional metadata file contents.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataFile {
    /// Version marker.
    #[serde(default)]
    version: Option<String>,
    /// Last-modified marker.
    #[serde(default)]
    last_modified: Option<String>,
}

/// Reads a file while enforcing a byte limit.
fn read_file_limited(path: &Path, max_bytes: usize) -> Result<Vec<u8>, SourceError> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SourceError::ConfigurationNotFound(path.display().to_string()),
        _ => SourceError::Io(format!("{}: {err}", path.display())),
    })?;
    let limit = u64::try_from(max_bytes)
        .map_err(|_| SourceError::Io("file size limit exceeds u64".to_string()))?;
    let mut buf = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| SourceError::Io(format!("{}: {err}", path.display())))?;
    if buf.len() > max_bytes {
        return Err(SourceError::Io(format!("{} exceeds size limit", path.display())));
    }
    Ok(buf)
}

/// Collects version and last-modified markers for a loaded document.
fn read_metadata(path: &Path, document: &ConfigurationDocument) -> LoadMetadata {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file = read_file_limited(&dir.join(METADATA_FILE_NAME), MAX_METADATA_BYTES)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<MetadataFile>(&bytes).ok());
    let (file_version, file_modified) =
        file.map_or((None, None), |file| (file.version, file.last_modified));
    let version = read_file_limited(&dir.join(VERSION_FILE_NAME), MAX_METADATA_BYTES)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .or(file_version)
        .or_else(|| document.declared_version().map(str::to_string));
    let last_modified = file_modified.or_else(|| file_mtime(path));
    LoadMetadata {
        version,
        last_modified,
    }
}

/// Returns the file modification time in RFC 3339, when available.
fn file_mtime(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    OffsetDateTime::from(modified).format(&Rfc3339).ok()
}
