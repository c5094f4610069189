// crates/appflag-provider/src/logging.rs
// ============================================================================
// Module: appflag Tracing Logger
// Description: FlagLogger implementation backed by the tracing crate.
// Purpose: Route pipeline log records into the host's tracing subscriber.
// Dependencies: appflag-core, tracing
// ============================================================================

//! ## Overview
//! [`TracingLogger`] emits one `tracing` event per record under the `appflag`
//! target. Structured fields are rendered as `key=value` pairs in a single
//! `fields` attribute because tracing field names are static.

// ============================================================================
// SECTION: Imports
// ============================================================================

use appflag_core::FlagLogger;
use appflag_core::LogLevel;

// ============================================================================
// SECTION: Logger
// ============================================================================

/// Logger that forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl FlagLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: &[(&str, &str)]) {
        let fields = render_fields(fields);
        match level {
            LogLevel::Debug => tracing::debug!(target: "appflag", fields = %fields, "{message}"),
            LogLevel::Info => tracing::info!(target: "appflag", fields = %fields, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "appflag", fields = %fields, "{message}"),
            LogLevel::Error => tracing::error!(target: "appflag", fields = %fields, "{message}"),
        }
    }
}

/// Renders fields as space-separated `key=value` pairs.
fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    //! Field rendering tests.

    use super::render_fields;

    /// Tests that fields keep their order and empty input renders empty.
    #[test]
    fn fields_render_in_order() {
        let rendered = render_fields(&[("flag_key", "beta"), ("error", "boom")]);
        assert_eq!(rendered, "flag_key=beta error=boom");
        assert_eq!(render_fields(&[]), "");
    }
}
