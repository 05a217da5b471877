// crates/run-gate-http/src/server/mod.rs
// ============================================================================
// Module: Gateway HTTP Server
// Description: Axum routes, handlers, and status mapping for the gateway.
// Purpose: Serve /ai/run plus the stub boundaries and the liveness probe.
// Dependencies: axum, run-gate-config, run-gate-core, run-gate-store-sqlite,
//               serde, tokio, tracing
// ============================================================================

//! ## Overview
//! Each inbound request is handled by an independent worker; the pipeline
//! itself is synchronous (the store round-trips are blocking) and runs on
//! the blocking pool. Handlers map pipeline outcomes onto the HTTP
//! contract:
//!
//! - 200 success with `{status, result, meta}`
//! - 400 invalid input with per-field diagnostics
//! - 402 budget denial with the full decision payload
//! - 501 live mode requested (explicit, never silently mocked)
//! - 504 deadline refusal
//! - 500 persistence/unexpected, generic in production builds
//!
//! Free text is redacted before the core logs or stores it; handlers must
//! not log request bodies.

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use run_gate_config::Environment;
use run_gate_config::GatewayConfig;
use run_gate_core::BudgetDecision;
use run_gate_core::BudgetGuard;
use run_gate_core::Clock;
use run_gate_core::CostStore;
use run_gate_core::ExecutionMode;
use run_gate_core::FieldViolation;
use run_gate_core::FixedBudgetPolicyResolver;
use run_gate_core::GatewayError;
use run_gate_core::MockSynthesizer;
use run_gate_core::RawRunRequest;
use run_gate_core::RedactionPipeline;
use run_gate_core::RunGateway;
use run_gate_core::RunMeta;
use run_gate_core::RunStore;
use run_gate_core::Timestamp;
use run_gate_core::ToolResult;
use run_gate_store_sqlite::SqliteGatewayStore;
use serde::Serialize;
use tracing::error;
use tracing::info;

use crate::telemetry::GatewayEndpoint;
use crate::telemetry::GatewayMetricEvent;
use crate::telemetry::GatewayMetrics;
use crate::telemetry::GatewayOutcome;
use crate::telemetry::NoopGatewayMetrics;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Wall-clock time source injected into the core at the host boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Timestamp::from_unix_millis(millis)
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared server state.
pub struct AppState {
    /// The admission-and-execution pipeline.
    pub gateway: Arc<RunGateway>,
    /// Deployment environment gating error detail.
    pub environment: Environment,
    /// Execution mode echoed by the liveness probe.
    pub execution_mode: ExecutionMode,
    /// Embeddings dimension echoed by the liveness probe.
    pub embeddings_dimension: usize,
    /// Metrics sink.
    pub metrics: Arc<dyn GatewayMetrics>,
}

/// Builds server state from config over the durable store.
///
/// # Errors
///
/// Returns an error string suitable for startup logging when the store or
/// sanitizer cannot be constructed.
pub fn build_state(config: &GatewayConfig) -> Result<Arc<AppState>, String> {
    let store = Arc::new(
        SqliteGatewayStore::new(&config.store)
            .map_err(|err| format!("store initialization failed: {err}"))?,
    );
    let sanitizer = RedactionPipeline::standard()
        .map_err(|err| format!("sanitizer initialization failed: {err}"))?;
    let guard = BudgetGuard::new(
        Arc::clone(&store) as Arc<dyn CostStore>,
        Arc::new(FixedBudgetPolicyResolver::new(config.budget_policy())),
    );
    let gateway = RunGateway::new(
        Arc::clone(&store) as Arc<dyn RunStore>,
        Arc::clone(&store) as Arc<dyn CostStore>,
        guard,
        Arc::new(MockSynthesizer::new(config.execution_mode())),
        sanitizer,
        Arc::new(SystemClock),
    );
    Ok(Arc::new(AppState {
        gateway: Arc::new(gateway),
        environment: config.environment,
        execution_mode: config.execution_mode(),
        embeddings_dimension: config.embeddings_dimension,
        metrics: Arc::new(NoopGatewayMetrics),
    }))
}

/// Builds the gateway router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ai/run", post(handle_ai_run))
        .route("/copilot/act", post(handle_copilot_act))
        .route("/webhooks/transcripcion", post(handle_transcription_webhook))
        .route("/health", get(handle_health))
        .with_state(state)
}

// ============================================================================
// SECTION: Response Bodies
// ============================================================================

/// Successful run response body.
#[derive(Debug, Serialize)]
pub struct RunOkBody {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Tool result snapshot.
    pub result: ToolResult,
    /// Execution metadata.
    pub meta: RunMeta,
}

/// Validation failure body with per-field diagnostics.
#[derive(Debug, Serialize)]
pub struct InvalidInputBody {
    /// Always `"invalid_input"`.
    pub error: &'static str,
    /// Every violated field.
    pub violations: Vec<FieldViolation>,
}

/// Budget denial body carrying the full decision.
#[derive(Debug, Serialize)]
pub struct BudgetDeniedBody {
    /// Stable deny reason label.
    pub error: &'static str,
    /// The admission decision, including usage and headroom.
    pub decision: BudgetDecision,
}

/// Generic error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error label.
    pub error: &'static str,
    /// Optional detail (development builds only for 5xx).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Deployment environment label.
    pub environment: &'static str,
    /// Execution mode label.
    pub execution_mode: &'static str,
    /// Embeddings dimension in effect.
    pub embeddings_dimension: usize,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST /ai/run`: the full admission-and-execution pipeline.
pub async fn handle_ai_run(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawRunRequest>,
) -> Response {
    let started = Instant::now();
    let gateway = Arc::clone(&state.gateway);
    let joined = tokio::task::spawn_blocking(move || gateway.execute(raw)).await;
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(join_error) => {
            error!(detail = %join_error, "run pipeline worker failed");
            Err(GatewayError::Unexpected("pipeline worker failed".to_string()))
        }
    };
    let (response, error_kind) = match outcome {
        Ok(outcome) => {
            info!(
                tool = outcome.record.tool.as_str(),
                replayed = outcome.replayed,
                latency_ms = outcome.record.latency_ms,
                "run completed"
            );
            let body = RunOkBody {
                status: "ok",
                result: outcome.record.result.clone(),
                meta: outcome.meta(),
            };
            ((StatusCode::OK, Json(body)).into_response(), None)
        }
        Err(err) => map_gateway_error(&err, state.environment),
    };
    record(&state, GatewayEndpoint::AiRun, &response, error_kind, started.elapsed());
    response
}

/// Handles `POST /copilot/act`: explicit stub boundary.
pub async fn handle_copilot_act(State(state): State<Arc<AppState>>) -> Response {
    let response = (
        StatusCode::NOT_IMPLEMENTED,
        Json(ErrorBody { error: "not_enabled", message: None }),
    )
        .into_response();
    record(&state, GatewayEndpoint::CopilotAct, &response, Some("not_enabled"), Duration::ZERO);
    response
}

/// Handles `POST /webhooks/transcripcion`: explicit stub boundary.
pub async fn handle_transcription_webhook(State(state): State<Arc<AppState>>) -> Response {
    let response =
        (StatusCode::ACCEPTED, Json(serde_json::json!({ "accepted": true }))).into_response();
    record(&state, GatewayEndpoint::TranscriptionWebhook, &response, None, Duration::ZERO);
    response
}

/// Handles `GET /health`: liveness plus feature-flag echo.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    let body = HealthBody {
        status: "ok",
        environment: state.environment.as_str(),
        execution_mode: state.execution_mode.as_str(),
        embeddings_dimension: state.embeddings_dimension,
    };
    let response = (StatusCode::OK, Json(body)).into_response();
    record(&state, GatewayEndpoint::Health, &response, None, Duration::ZERO);
    response
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Maps a pipeline error onto the HTTP contract.
///
/// Full detail is logged server-side for 5xx failures; the caller receives
/// detail only in development builds.
fn map_gateway_error(err: &GatewayError, environment: Environment) -> (Response, Option<&'static str>) {
    match err {
        GatewayError::InvalidInput(errors) => {
            let body = InvalidInputBody {
                error: "invalid_input",
                violations: errors.violations.clone(),
            };
            ((StatusCode::BAD_REQUEST, Json(body)).into_response(), Some("invalid_input"))
        }
        GatewayError::BudgetDenied(decision) => {
            let body = BudgetDeniedBody { error: decision.reason_label(), decision: *decision };
            ((StatusCode::PAYMENT_REQUIRED, Json(body)).into_response(), Some("budget_denied"))
        }
        GatewayError::NotImplemented => {
            let body = ErrorBody { error: "not_implemented", message: None };
            ((StatusCode::NOT_IMPLEMENTED, Json(body)).into_response(), Some("not_implemented"))
        }
        GatewayError::DeadlineExceeded { required_ms, allowed_ms } => {
            let body = ErrorBody {
                error: "deadline_exceeded",
                message: Some(format!("needs {required_ms} ms, allowed {allowed_ms} ms")),
            };
            ((StatusCode::GATEWAY_TIMEOUT, Json(body)).into_response(), Some("deadline_exceeded"))
        }
        GatewayError::Persistence(detail) => {
            error!(detail = %detail, "run discarded: persistence failure");
            let body = ErrorBody {
                error: "internal_error",
                message: development_detail(environment, detail.to_string()),
            };
            ((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(), Some("persistence"))
        }
        GatewayError::Unexpected(detail) => {
            error!(detail = %detail, "run failed unexpectedly");
            let body = ErrorBody {
                error: "internal_error",
                message: development_detail(environment, detail.clone()),
            };
            ((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(), Some("unexpected"))
        }
    }
}

/// Returns failure detail only for development builds.
fn development_detail(environment: Environment, detail: String) -> Option<String> {
    match environment {
        Environment::Development => Some(detail),
        Environment::Production => None,
    }
}

/// Records request and latency telemetry for one response.
fn record(
    state: &AppState,
    endpoint: GatewayEndpoint,
    response: &Response,
    error_kind: Option<&'static str>,
    latency: Duration,
) {
    let outcome = if response.status().is_success() {
        GatewayOutcome::Ok
    } else {
        GatewayOutcome::Error
    };
    let event = GatewayMetricEvent {
        endpoint,
        outcome,
        status: response.status().as_u16(),
        error_kind,
    };
    state.metrics.record_request(event.clone());
    state.metrics.record_latency(event, latency);
}
