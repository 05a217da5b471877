// crates/run-gate-http/src/lib.rs
// ============================================================================
// Module: Run Gate HTTP
// Description: Axum transport surface for the run gateway.
// Purpose: Expose the admission pipeline over HTTP with telemetry hooks.
// Dependencies: axum, run-gate-config, run-gate-core, run-gate-store-sqlite
// ============================================================================

//! ## Overview
//! The HTTP crate owns the outward surface: `POST /ai/run` in front of the
//! core pipeline, the explicit stub boundaries (`/copilot/act`,
//! `/webhooks/transcripcion`), and the liveness probe. Error detail is
//! gated by the configured environment: production callers receive generic
//! messages while full detail goes to the server log.

pub mod server;
pub mod telemetry;

pub use crate::server::AppState;
pub use crate::server::SystemClock;
pub use crate::server::build_router;
pub use crate::server::build_state;
