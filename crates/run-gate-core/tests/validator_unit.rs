// crates/run-gate-core/tests/validator_unit.rs
// ============================================================================
// Module: Validator Unit Tests
// Description: Structural and semantic validation of inbound run requests.
// Purpose: Validate the closed tool enumeration, key syntax, and field
//          diagnostics collection.
// ============================================================================

//! ## Overview
//! Exercises the validation stage in isolation: closed-enum rejection,
//! canonical-UUID enforcement, numeric range checks, language defaulting,
//! and exhaustive (not first-failure) violation collection.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::KEY_A;
use common::raw_request;
use run_gate_core::RawRunPolicy;
use run_gate_core::RawRunRequest;
use run_gate_core::RawToolInput;
use run_gate_core::ToolKind;
use run_gate_core::ViolationCode;
use run_gate_core::validate_run_request;

// ============================================================================
// SECTION: Acceptance
// ============================================================================

#[test]
fn accepts_minimal_valid_request() {
    let request = validate_run_request(raw_request("analyze_session", KEY_A))
        .expect("minimal request valid");
    assert_eq!(request.tool, ToolKind::AnalyzeSession);
    assert_eq!(request.idempotency_key.as_str(), KEY_A);
    assert!(!request.policy.allow_paid);
}

#[test]
fn defaults_language_to_spanish() {
    let mut raw = raw_request("rag_query", KEY_A);
    raw.input = Some(RawToolInput { query: Some("registro".to_string()), ..RawToolInput::default() });
    let request = validate_run_request(raw).expect("request valid");
    assert_eq!(request.input.language, "es");
}

#[test]
fn keeps_explicit_language() {
    let mut raw = raw_request("rag_query", KEY_A);
    raw.input = Some(RawToolInput { language: Some("pt".to_string()), ..RawToolInput::default() });
    let request = validate_run_request(raw).expect("request valid");
    assert_eq!(request.input.language, "pt");
}

#[test]
fn accepts_every_tool_label() {
    for tool in ToolKind::ALL {
        let request = validate_run_request(raw_request(tool.as_str(), KEY_A))
            .expect("known tool label valid");
        assert_eq!(request.tool, tool);
    }
}

// ============================================================================
// SECTION: Rejection
// ============================================================================

#[test]
fn rejects_unknown_tool() {
    let errors = validate_run_request(raw_request("mind_reader", KEY_A))
        .expect_err("unknown tool rejected");
    assert_eq!(errors.violations.len(), 1);
    assert_eq!(errors.violations[0].field, "tool");
    assert_eq!(errors.violations[0].code, ViolationCode::UnknownValue);
}

#[test]
fn rejects_non_uuid_idempotency_key() {
    let errors = validate_run_request(raw_request("analyze_session", "not-a-uuid"))
        .expect_err("malformed key rejected");
    assert_eq!(errors.violations[0].field, "idempotencyKey");
    assert_eq!(errors.violations[0].code, ViolationCode::Malformed);
}

#[test]
fn rejects_empty_tenant() {
    let mut raw = raw_request("analyze_session", KEY_A);
    if let Some(context) = raw.context.as_mut() {
        context.tenant_id = Some(String::new());
    }
    let errors = validate_run_request(raw).expect_err("empty tenant rejected");
    assert_eq!(errors.violations[0].field, "context.tenantId");
    assert_eq!(errors.violations[0].code, ViolationCode::Empty);
}

#[test]
fn rejects_non_positive_deadline_and_negative_budget() {
    let mut raw = raw_request("analyze_session", KEY_A);
    raw.policy = Some(RawRunPolicy {
        max_latency_ms: Some(0),
        budget_cents: Some(-5),
        ..RawRunPolicy::default()
    });
    let errors = validate_run_request(raw).expect_err("range violations rejected");
    let fields: Vec<&str> =
        errors.violations.iter().map(|violation| violation.field.as_str()).collect();
    assert_eq!(fields, vec!["policy.maxLatencyMs", "policy.budgetCents"]);
    assert!(
        errors.violations.iter().all(|violation| violation.code == ViolationCode::OutOfRange)
    );
}

#[test]
fn collects_every_violation_in_one_pass() {
    let raw = RawRunRequest::default();
    let errors = validate_run_request(raw).expect_err("empty request rejected");
    let fields: Vec<&str> =
        errors.violations.iter().map(|violation| violation.field.as_str()).collect();
    assert_eq!(fields, vec!["tool", "idempotencyKey", "context"]);
}

#[test]
fn rejects_unknown_provider_and_region_labels() {
    let mut raw = raw_request("analyze_session", KEY_A);
    raw.policy = Some(RawRunPolicy {
        prefer_provider: Some("acme".to_string()),
        region: Some("moon".to_string()),
        ..RawRunPolicy::default()
    });
    let errors = validate_run_request(raw).expect_err("unknown labels rejected");
    let fields: Vec<&str> =
        errors.violations.iter().map(|violation| violation.field.as_str()).collect();
    assert_eq!(fields, vec!["policy.preferProvider", "policy.region"]);
}
