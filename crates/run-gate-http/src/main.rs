// crates/run-gate-http/src/main.rs
// ============================================================================
// Module: Run Gate Server Binary
// Description: Config loading, logging setup, and server startup.
// Purpose: Host the gateway over HTTP with tracing enabled.
// Dependencies: run-gate-config, run-gate-http, tokio, tower-http, tracing
// ============================================================================

//! ## Overview
//! The binary is the only place that touches the process environment: it
//! loads configuration (optional TOML file named by `RUN_GATE_CONFIG`, then
//! environment overrides), initializes tracing, builds the durable store
//! and the pipeline, and serves the router.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;
use std::path::Path;

use run_gate_config::GatewayConfig;
use run_gate_http::build_router;
use run_gate_http::build_state;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Loads config, builds the gateway, and serves until shutdown.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    info!(
        environment = config.environment.as_str(),
        execution_mode = config.execution_mode().as_str(),
        store = %config.store.path.display(),
        "run gate starting"
    );

    let state = build_state(&config)?;
    let router = build_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    info!(bind_addr = %config.server.bind_addr, "run gate listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Loads the optional config file, then applies environment overrides.
fn load_config() -> Result<GatewayConfig, Box<dyn Error>> {
    let base = match std::env::var("RUN_GATE_CONFIG") {
        Ok(path) => GatewayConfig::load(Path::new(&path))?,
        Err(_) => GatewayConfig::default(),
    };
    let config = base.with_env_overrides(|var| std::env::var(var).ok())?;
    Ok(config)
}
