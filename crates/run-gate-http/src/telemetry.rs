// crates/run-gate-http/src/telemetry.rs
// ============================================================================
// Module: Gateway Telemetry
// Description: Observability hooks for the HTTP surface.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for gateway request
//! counters and latency histograms. It is intentionally dependency-light so
//! deployments can plug in Prometheus or OpenTelemetry without redesign.
//! Labels must never carry request payloads; the redaction guarantees of
//! the core do not extend to metric labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for gateway request histograms.
pub const GATEWAY_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Gateway endpoint classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEndpoint {
    /// `POST /ai/run`.
    AiRun,
    /// `POST /copilot/act` (stub boundary).
    CopilotAct,
    /// `POST /webhooks/transcripcion` (stub boundary).
    TranscriptionWebhook,
    /// `GET /health`.
    Health,
}

impl GatewayEndpoint {
    /// Returns a stable label for the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AiRun => "ai/run",
            Self::CopilotAct => "copilot/act",
            Self::TranscriptionWebhook => "webhooks/transcripcion",
            Self::Health => "health",
        }
    }
}

/// Gateway request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// Successful request.
    Ok,
    /// Failed or refused request.
    Error,
}

impl GatewayOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Gateway request metric event payload.
///
/// # Invariants
/// - `error_kind` is `None` for successful requests.
#[derive(Debug, Clone)]
pub struct GatewayMetricEvent {
    /// Endpoint that served the request.
    pub endpoint: GatewayEndpoint,
    /// Request outcome.
    pub outcome: GatewayOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Normalized error kind label, when failed.
    pub error_kind: Option<&'static str>,
}

// ============================================================================
// SECTION: Metrics Interface
// ============================================================================

/// Gateway metrics sink.
pub trait GatewayMetrics: Send + Sync {
    /// Records one request event.
    fn record_request(&self, event: GatewayMetricEvent);

    /// Records one request latency observation.
    fn record_latency(&self, event: GatewayMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGatewayMetrics;

impl GatewayMetrics for NoopGatewayMetrics {
    fn record_request(&self, _event: GatewayMetricEvent) {}

    fn record_latency(&self, _event: GatewayMetricEvent, _latency: Duration) {}
}
