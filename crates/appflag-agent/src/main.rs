// crates/appflag-agent/src/main.rs
// ============================================================================
// Module: appflag Agent Entry Point
// Description: Command-line launcher for the sidecar agent.
// Purpose: Parse listener settings, install logging, and serve requests.
// Dependencies: appflag-agent, appflag-sources, clap, tracing-subscriber
// ============================================================================

//! ## Overview
//! Every flag can also be set through the environment (`AGENT_HOST`,
//! `AGENT_PORT`, `AGENT_PATH`). Log verbosity follows `RUST_LOG` and
//! defaults to `info`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use appflag_agent::AgentError;
use appflag_agent::AgentServer;
use appflag_sources::agent::DEFAULT_AGENT_ROOT;
use clap::Parser;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Sidecar agent command line.
#[derive(Parser, Debug)]
#[command(name = "appflag-agent", version, about = "Serve flag evaluations from local files")]
struct Cli {
    /// Listen address.
    #[arg(long, env = "AGENT_HOST", default_value = "0.0.0.0")]
    host: String,
    /// Listen port.
    #[arg(long, env = "AGENT_PORT", default_value_t = 2772)]
    port: u16,
    /// Root of the configuration file layout.
    #[arg(long = "agent-path", env = "AGENT_PATH", default_value = DEFAULT_AGENT_ROOT)]
    agent_path: PathBuf,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Installs logging and runs the agent.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(target: "appflag_agent", error = %err, "agent stopped");
            ExitCode::FAILURE
        }
    }
}

/// Binds the listener and serves until shutdown.
fn run(cli: &Cli) -> Result<(), AgentError> {
    let agent = AgentServer::new(cli.agent_path.clone())?;
    let server = AgentServer::bind(&cli.host, cli.port)?;
    tracing::info!(
        target: "appflag_agent",
        host = %cli.host,
        port = cli.port,
        agent_path = %agent.agent_root().display(),
        "agent listening"
    );
    agent.serve(&server);
    Ok(())
}
