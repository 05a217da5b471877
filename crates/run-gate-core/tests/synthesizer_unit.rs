// crates/run-gate-core/tests/synthesizer_unit.rs
// ============================================================================
// Module: Synthesizer Unit Tests
// Description: Mock dispatch determinism and contract self-validation.
// Purpose: Validate that every tool's mock satisfies its own contract and
//          that mode and deadline refusals are explicit.
// ============================================================================

//! ## Overview
//! Drives the mock dispatcher for every tool in the closed enumeration:
//! results must pass their own contract checks, dispatch must be
//! deterministic, live mode must refuse explicitly, and unmeetable
//! deadlines must be refused rather than ignored.

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
use run_gate_core::ExecutionMode;
use run_gate_core::MockSynthesizer;
use run_gate_core::Provider;
use run_gate_core::SynthesisError;
use run_gate_core::ToolDispatcher;
use run_gate_core::ToolKind;
use run_gate_core::ToolResult;
use run_gate_core::validate_run_request;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn request_for(tool: ToolKind) -> run_gate_core::RunRequest {
    validate_run_request(raw_request(tool.as_str(), KEY_A)).expect("request valid")
}

// ============================================================================
// SECTION: Contract Self-Validation
// ============================================================================

#[test]
fn every_tools_mock_satisfies_its_own_contract() {
    let synthesizer = MockSynthesizer::new(ExecutionMode::Mock);
    for tool in ToolKind::ALL {
        let synthesized = synthesizer.dispatch(&request_for(tool)).expect("mock dispatch");
        synthesized.result.validate().expect("mock satisfies its contract");
        assert_eq!(synthesized.provider, Provider::Mock);
        assert_eq!(synthesized.cost_cents, 0);
        assert_eq!(synthesized.model, "run-gate-mock-1");
    }
}

#[test]
fn analyze_session_mock_carries_bounded_confidence_and_evidence() {
    let synthesizer = MockSynthesizer::new(ExecutionMode::Mock);
    let synthesized =
        synthesizer.dispatch(&request_for(ToolKind::AnalyzeSession)).expect("mock dispatch");
    let ToolResult::AnalyzeSession(result) = synthesized.result else {
        panic!("wrong result variant");
    };
    assert!(result.summary.chars().count() >= 20);
    let profile = result.suggested_profile.expect("profile present");
    assert!((0.0..=1.0).contains(&profile.confidence));
    assert!(!result.insights.is_empty());
    for insight in &result.insights {
        // u64 fields cannot be negative; pin the expected window shape too.
        assert!(insight.evidence.end_ms >= insight.evidence.start_ms);
    }
}

#[test]
fn dispatch_is_deterministic_for_identical_requests() {
    let synthesizer = MockSynthesizer::new(ExecutionMode::Mock);
    let first = synthesizer.dispatch(&request_for(ToolKind::RagQuery)).expect("mock dispatch");
    let second = synthesizer.dispatch(&request_for(ToolKind::RagQuery)).expect("mock dispatch");
    assert_eq!(first, second);
}

// ============================================================================
// SECTION: Refusals
// ============================================================================

#[test]
fn live_mode_returns_not_implemented() {
    let synthesizer = MockSynthesizer::new(ExecutionMode::Live);
    let err = synthesizer
        .dispatch(&request_for(ToolKind::AnalyzeSession))
        .expect_err("live mode refused");
    assert_eq!(err, SynthesisError::NotImplemented);
}

#[test]
fn deadline_below_simulated_latency_is_refused() {
    let synthesizer = MockSynthesizer::new(ExecutionMode::Mock);
    let mut request = request_for(ToolKind::TranscribeAudio);
    request.policy.max_latency_ms = Some(100);
    let err = synthesizer.dispatch(&request).expect_err("deadline refused");
    assert_eq!(err, SynthesisError::DeadlineExceeded { required_ms: 420, allowed_ms: 100 });
}
