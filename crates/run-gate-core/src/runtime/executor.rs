// crates/run-gate-core/src/runtime/executor.rs
// ============================================================================
// Module: Run Gateway Executor
// Description: Sequential admission-and-execution pipeline per request.
// Purpose: Validate, replay, admit, redact, synthesize, and record one run.
// Dependencies: crate::core, crate::interfaces, crate::runtime, thiserror
// ============================================================================

//! ## Overview
//! One executor instance serves all requests; each request flows through
//! the stages strictly in order: validation, idempotent replay, budget
//! admission, redaction, synthesis, run recording, cost recording. No stage
//! starts before the previous stage's store round-trip resolves.
//!
//! Idempotent at-most-one-result is durable because the run store enforces
//! key uniqueness at insert: a losing concurrent writer observes the
//! duplicate-key failure, re-reads the winner's record, and returns it as a
//! replay instead of erroring or double-recording.
//!
//! A result whose run record or cost entry cannot be written is discarded
//! rather than returned: a completed run without a durable audit trail
//! would desynchronize replay and budget accounting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::budget::BudgetDecision;
use crate::core::identifiers::RunId;
use crate::core::record::CostEntry;
use crate::core::record::CostMeta;
use crate::core::record::RunMeta;
use crate::core::record::RunRecord;
use crate::core::record::RunStatus;
use crate::core::request::RunRequest;
use crate::core::result::ToolResult;
use crate::core::sanitize::RedactionPipeline;
use crate::core::validate::RawRunRequest;
use crate::core::validate::ValidationErrors;
use crate::core::validate::validate_run_request;
use crate::interfaces::Clock;
use crate::interfaces::CostStore;
use crate::interfaces::RunStore;
use crate::interfaces::StoreError;
use crate::runtime::guard::BudgetGuard;
use crate::runtime::synthesizer::SynthesisError;
use crate::runtime::synthesizer::ToolDispatcher;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway pipeline errors.
///
/// Idempotent replay is deliberately absent: a duplicate run is a resolved
/// outcome, not an error.
///
/// # Invariants
/// - Variants are stable for transport-layer status mapping.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request failed validation; every violated field is enumerated.
    #[error("{0}")]
    InvalidInput(ValidationErrors),
    /// Budget admission denied (including fail-closed check failures).
    #[error("budget denied: {}", .0.reason_label())]
    BudgetDenied(BudgetDecision),
    /// Live execution requested but not implemented.
    #[error("live execution is not implemented")]
    NotImplemented,
    /// The dispatcher cannot meet the caller's deadline.
    #[error("deadline exceeded: needs {required_ms} ms, allowed {allowed_ms} ms")]
    DeadlineExceeded {
        /// Latency the dispatcher would need, in milliseconds.
        required_ms: u64,
        /// Deadline the caller allowed, in milliseconds.
        allowed_ms: u64,
    },
    /// A run record or cost entry write failed; the result was discarded.
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
    /// Catch-all for faults with no actionable structure for the caller.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Successful pipeline outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The persisted (or replayed) run record.
    pub record: RunRecord,
    /// Whether the outcome was served from a prior record.
    pub replayed: bool,
}

impl RunOutcome {
    /// Returns the result snapshot.
    #[must_use]
    pub const fn result(&self) -> &ToolResult {
        &self.record.result
    }

    /// Returns the caller-facing metadata.
    #[must_use]
    pub fn meta(&self) -> RunMeta {
        self.record.meta()
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Admission-and-execution gateway pipeline.
pub struct RunGateway {
    /// Append-only run record store.
    runs: Arc<dyn RunStore>,
    /// Append-only spend ledger.
    costs: Arc<dyn CostStore>,
    /// Budget admission guard.
    guard: BudgetGuard,
    /// Tool dispatch seam.
    dispatcher: Arc<dyn ToolDispatcher>,
    /// PII redaction pipeline.
    sanitizer: RedactionPipeline,
    /// Host-supplied time source.
    clock: Arc<dyn Clock>,
}

impl RunGateway {
    /// Creates a gateway over the given collaborators.
    #[must_use]
    pub fn new(
        runs: Arc<dyn RunStore>,
        costs: Arc<dyn CostStore>,
        guard: BudgetGuard,
        dispatcher: Arc<dyn ToolDispatcher>,
        sanitizer: RedactionPipeline,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { runs, costs, guard, dispatcher, sanitizer, clock }
    }

    /// Executes one inbound run request through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for every terminal failure; an idempotent
    /// replay is a success carrying `replayed = true`.
    pub fn execute(&self, raw: RawRunRequest) -> Result<RunOutcome, GatewayError> {
        let request = validate_run_request(raw).map_err(GatewayError::InvalidInput)?;

        if let Some(existing) = self
            .runs
            .find_by_idempotency_key(&request.idempotency_key)
            .map_err(|err| GatewayError::Unexpected(format!("idempotency lookup failed: {err}")))?
        {
            return Ok(RunOutcome { record: existing, replayed: true });
        }

        let now = self.clock.now();
        let estimate = request.policy.budget_cents.unwrap_or(0);
        let decision = self.guard.check(&request.context.tenant_id, estimate, now);
        if !decision.allowed {
            return Err(GatewayError::BudgetDenied(decision));
        }

        let request = self.redact_request(request);

        let synthesized = self.dispatcher.dispatch(&request).map_err(|err| match err {
            SynthesisError::NotImplemented => GatewayError::NotImplemented,
            SynthesisError::DeadlineExceeded { required_ms, allowed_ms } => {
                GatewayError::DeadlineExceeded { required_ms, allowed_ms }
            }
            SynthesisError::Contract(violation) => {
                GatewayError::Unexpected(format!("mock contract violation: {violation}"))
            }
        })?;

        let record = RunRecord {
            id: RunId::generate(),
            tenant_id: request.context.tenant_id.clone(),
            user_id: request.context.user_id.clone(),
            tool: request.tool,
            provider: synthesized.provider,
            model: synthesized.model,
            latency_ms: synthesized.latency_ms,
            cost_cents: synthesized.cost_cents,
            status: RunStatus::Completed,
            input: request.input.clone(),
            result: synthesized.result,
            idempotency_key: request.idempotency_key.clone(),
            created_at: now,
        };

        match self.runs.insert_run(&record) {
            Ok(()) => {}
            Err(StoreError::DuplicateIdempotencyKey) => {
                return self.reconcile_duplicate(&record);
            }
            Err(err) => return Err(GatewayError::Persistence(err)),
        }

        let entry = CostEntry {
            tenant_id: record.tenant_id.clone(),
            provider: record.provider,
            cost_cents: record.cost_cents,
            meta: CostMeta { run_id: record.id.clone(), tool: record.tool },
            created_at: now,
        };
        self.costs.append_cost(&entry).map_err(GatewayError::Persistence)?;

        Ok(RunOutcome { record, replayed: false })
    }

    /// Redacts every free-text input field destined for storage or logs.
    fn redact_request(&self, mut request: RunRequest) -> RunRequest {
        request.input.transcript = request.input.transcript.map(|text| self.redact_field(text));
        request.input.text = request.input.text.map(|text| self.redact_field(text));
        request.input.query = request.input.query.map(|text| self.redact_field(text));
        request
    }

    /// Redacts one field, gated by the cheap pattern pre-check.
    fn redact_field(&self, text: String) -> String {
        if self.sanitizer.contains_pii(&text) {
            self.sanitizer.redact(&text).redacted
        } else {
            text
        }
    }

    /// Resolves a lost insert race: the winner's record is the outcome.
    fn reconcile_duplicate(&self, loser: &RunRecord) -> Result<RunOutcome, GatewayError> {
        match self.runs.find_by_idempotency_key(&loser.idempotency_key) {
            Ok(Some(winner)) => Ok(RunOutcome { record: winner, replayed: true }),
            Ok(None) => Err(GatewayError::Persistence(StoreError::Invalid(
                "idempotency conflict without stored record".to_string(),
            ))),
            Err(err) => Err(GatewayError::Persistence(err)),
        }
    }
}
