// crates/run-gate-http/src/server/tests.rs
// ============================================================================
// Module: Gateway Server Unit Tests
// Description: Handler behavior and status mapping with in-memory fixtures.
// Purpose: Validate the HTTP contract without binding a socket.
// Dependencies: run-gate-http
// ============================================================================

//! ## Overview
//! Invokes the handlers directly with in-memory fixtures and asserts the
//! documented status codes and body shapes, including the stub boundaries
//! and the environment-gated error detail.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and fixtures are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use run_gate_config::Environment;
use run_gate_core::BudgetGuard;
use run_gate_core::BudgetPolicy;
use run_gate_core::CostStore;
use run_gate_core::ExecutionMode;
use run_gate_core::FixedBudgetPolicyResolver;
use run_gate_core::GatewayError;
use run_gate_core::InMemoryCostStore;
use run_gate_core::InMemoryRunStore;
use run_gate_core::MockSynthesizer;
use run_gate_core::RawRunContext;
use run_gate_core::RawRunPolicy;
use run_gate_core::RawRunRequest;
use run_gate_core::RedactionPipeline;
use run_gate_core::RunGateway;
use run_gate_core::RunStore;
use run_gate_core::StoreError;
use serde_json::Value;

use super::AppState;
use super::SystemClock;
use super::handle_ai_run;
use super::handle_copilot_act;
use super::handle_health;
use super::handle_transcription_webhook;
use super::map_gateway_error;
use crate::telemetry::NoopGatewayMetrics;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const KEY: &str = "0c5bafa3-88a1-4b49-9b67-3f33df3bd0ef";

fn test_state(mode: ExecutionMode, environment: Environment) -> Arc<AppState> {
    let runs = Arc::new(InMemoryRunStore::new());
    let costs = Arc::new(InMemoryCostStore::new());
    let guard = BudgetGuard::new(
        Arc::clone(&costs) as Arc<dyn CostStore>,
        Arc::new(FixedBudgetPolicyResolver::new(BudgetPolicy::default())),
    );
    let gateway = RunGateway::new(
        runs as Arc<dyn RunStore>,
        costs as Arc<dyn CostStore>,
        guard,
        Arc::new(MockSynthesizer::new(mode)),
        RedactionPipeline::standard().expect("standard rules compile"),
        Arc::new(SystemClock),
    );
    Arc::new(AppState {
        gateway: Arc::new(gateway),
        environment,
        execution_mode: mode,
        embeddings_dimension: 768,
        metrics: Arc::new(NoopGatewayMetrics),
    })
}

fn raw_request(tool: &str, key: &str) -> RawRunRequest {
    RawRunRequest {
        tool: Some(tool.to_string()),
        input: None,
        context: Some(RawRunContext {
            tenant_id: Some("tenant-andes".to_string()),
            ..RawRunContext::default()
        }),
        policy: None,
        idempotency_key: Some(key.to_string()),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}

// ============================================================================
// SECTION: Run Endpoint
// ============================================================================

#[tokio::test]
async fn run_succeeds_with_result_and_meta() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let response = handle_ai_run(
        State(Arc::clone(&state)),
        axum::Json(raw_request("analyze_session", KEY)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["meta"]["provider"], "mock");
    assert_eq!(body["meta"]["costCents"], 0);
    assert_eq!(body["result"]["kind"], "analyze_session");
}

#[tokio::test]
async fn run_replays_identical_body_for_the_same_key() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let first = handle_ai_run(
        State(Arc::clone(&state)),
        axum::Json(raw_request("analyze_session", KEY)),
    )
    .await;
    let second = handle_ai_run(
        State(Arc::clone(&state)),
        axum::Json(raw_request("analyze_session", KEY)),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    let second_body = body_json(second).await;
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn run_rejects_invalid_input_with_diagnostics() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let response = handle_ai_run(
        State(Arc::clone(&state)),
        axum::Json(raw_request("analyze_session", "not-a-uuid")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_input");
    assert_eq!(body["violations"][0]["field"], "idempotencyKey");
}

#[tokio::test]
async fn run_denies_over_budget_with_decision_payload() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let mut raw = raw_request("analyze_session", KEY);
    raw.policy = Some(RawRunPolicy { budget_cents: Some(10_001), ..RawRunPolicy::default() });
    let response = handle_ai_run(State(Arc::clone(&state)), axum::Json(raw)).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "monthly_budget_exceeded");
    assert_eq!(body["decision"]["remainingCents"], 10_000);
}

#[tokio::test]
async fn run_refuses_live_mode_explicitly() {
    let state = test_state(ExecutionMode::Live, Environment::Development);
    let response = handle_ai_run(
        State(Arc::clone(&state)),
        axum::Json(raw_request("analyze_session", KEY)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_implemented");
}

#[tokio::test]
async fn run_refuses_unmeetable_deadline() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let mut raw = raw_request("analyze_session", KEY);
    raw.policy = Some(RawRunPolicy { max_latency_ms: Some(10), ..RawRunPolicy::default() });
    let response = handle_ai_run(State(Arc::clone(&state)), axum::Json(raw)).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "deadline_exceeded");
}

// ============================================================================
// SECTION: Stub Boundaries and Health
// ============================================================================

#[tokio::test]
async fn copilot_act_is_an_explicit_stub() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let response = handle_copilot_act(State(state)).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_enabled");
}

#[tokio::test]
async fn transcription_webhook_always_accepts() {
    let state = test_state(ExecutionMode::Mock, Environment::Development);
    let response = handle_transcription_webhook(State(state)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], true);
}

#[tokio::test]
async fn health_echoes_feature_flags() {
    let state = test_state(ExecutionMode::Live, Environment::Production);
    let response = handle_health(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["executionMode"], "live");
    assert_eq!(body["environment"], "production");
    assert_eq!(body["embeddingsDimension"], 768);
}

// ============================================================================
// SECTION: Error Detail Gating
// ============================================================================

#[test]
fn persistence_detail_is_hidden_in_production() {
    let err = GatewayError::Persistence(StoreError::Db("disk full".to_string()));
    let (response, kind) = map_gateway_error(&err, Environment::Production);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(kind, Some("persistence"));
}

#[tokio::test]
async fn persistence_detail_is_returned_in_development() {
    let err = GatewayError::Persistence(StoreError::Db("disk full".to_string()));
    let (response, _) = map_gateway_error(&err, Environment::Development);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body["message"].as_str().expect("detail present").contains("disk full"));
}

#[tokio::test]
async fn persistence_body_omits_message_in_production() {
    let err = GatewayError::Persistence(StoreError::Db("disk full".to_string()));
    let (response, _) = map_gateway_error(&err, Environment::Production);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("message").is_none());
}
