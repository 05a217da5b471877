// crates/run-gate-core/src/lib.rs
// ============================================================================
// Module: Run Gate Core
// Description: Domain model and admission pipeline for AI tool runs.
// Purpose: Provide validation, idempotency, budget, redaction, and synthesis
//          logic behind the run gateway, independent of any transport or store.
// Dependencies: regex, serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! Run Gate admits and executes AI tool runs for a research-operations
//! platform. The core owns the request pipeline (validation, idempotent
//! replay, budget admission, PII redaction, result synthesis, and immutable
//! run/cost recording) against backend-agnostic store interfaces.
//!
//! The core never reads wall-clock time or process environment directly;
//! hosts inject a [`Clock`] and an [`ExecutionMode`] at construction time so
//! every stage is deterministic under test.

pub mod core;
pub mod interfaces;
pub mod runtime;

pub use crate::core::budget::BudgetDecision;
pub use crate::core::budget::BudgetDenyReason;
pub use crate::core::budget::BudgetPolicy;
pub use crate::core::budget::DEFAULT_DAILY_BUDGET_CENTS;
pub use crate::core::budget::DEFAULT_MONTHLY_BUDGET_CENTS;
pub use crate::core::identifiers::CatalogEntryId;
pub use crate::core::identifiers::IdempotencyKey;
pub use crate::core::identifiers::IdempotencyKeyError;
pub use crate::core::identifiers::InvestigationId;
pub use crate::core::identifiers::ParticipantId;
pub use crate::core::identifiers::RunId;
pub use crate::core::identifiers::SessionId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::identifiers::TranscriptId;
pub use crate::core::identifiers::UserId;
pub use crate::core::record::CostEntry;
pub use crate::core::record::CostMeta;
pub use crate::core::record::Provider;
pub use crate::core::record::RunMeta;
pub use crate::core::record::RunRecord;
pub use crate::core::record::RunStatus;
pub use crate::core::request::PreferredProvider;
pub use crate::core::request::Region;
pub use crate::core::request::RunContext;
pub use crate::core::request::RunPolicy;
pub use crate::core::request::RunRequest;
pub use crate::core::request::ToolInput;
pub use crate::core::request::ToolKind;
pub use crate::core::result::AnalyzeSessionResult;
pub use crate::core::result::ContractViolation;
pub use crate::core::result::EvidenceRef;
pub use crate::core::result::GenerateProfileResult;
pub use crate::core::result::Insight;
pub use crate::core::result::PainPoint;
pub use crate::core::result::RagQueryResult;
pub use crate::core::result::RagSource;
pub use crate::core::result::SuggestedProfile;
pub use crate::core::result::SummarizeInvestigationResult;
pub use crate::core::result::ToolResult;
pub use crate::core::result::TranscribeAudioResult;
pub use crate::core::result::TranscriptSegment;
pub use crate::core::sanitize::RedactionPipeline;
pub use crate::core::sanitize::RedactionRule;
pub use crate::core::sanitize::SanitizationReport;
pub use crate::core::sanitize::SanitizerError;
pub use crate::core::time::Timestamp;
pub use crate::core::time::TimestampRangeError;
pub use crate::core::validate::FieldViolation;
pub use crate::core::validate::RawRunContext;
pub use crate::core::validate::RawRunPolicy;
pub use crate::core::validate::RawRunRequest;
pub use crate::core::validate::RawToolInput;
pub use crate::core::validate::ValidationErrors;
pub use crate::core::validate::ViolationCode;
pub use crate::core::validate::validate_run_request;
pub use crate::interfaces::BudgetPolicyResolver;
pub use crate::interfaces::Clock;
pub use crate::interfaces::CostStore;
pub use crate::interfaces::FixedBudgetPolicyResolver;
pub use crate::interfaces::InMemoryCostStore;
pub use crate::interfaces::InMemoryRunStore;
pub use crate::interfaces::ManualClock;
pub use crate::interfaces::RunStore;
pub use crate::interfaces::StoreError;
pub use crate::runtime::executor::GatewayError;
pub use crate::runtime::executor::RunGateway;
pub use crate::runtime::executor::RunOutcome;
pub use crate::runtime::guard::BudgetGuard;
pub use crate::runtime::synthesizer::ExecutionMode;
pub use crate::runtime::synthesizer::MockSynthesizer;
pub use crate::runtime::synthesizer::SynthesisError;
pub use crate::runtime::synthesizer::SynthesizedRun;
pub use crate::runtime::synthesizer::ToolDispatcher;
