// crates/run-gate-core/src/core/request.rs
// ============================================================================
// Module: Run Request Model
// Description: Typed run requests against the closed tool enumeration.
// Purpose: Capture tool, input, context, and policy for one admission attempt.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`RunRequest`] is the validated, ephemeral form of one inbound run
//! attempt. It is never persisted as-is: the executor snapshots its redacted
//! input into the run record instead. The tool enumeration is closed: adding
//! a tool is a compile-time-exhaustive change, not a runtime default branch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CatalogEntryId;
use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::InvestigationId;
use crate::core::identifiers::ParticipantId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default input language when the request omits one.
pub const DEFAULT_LANGUAGE: &str = "es";

// ============================================================================
// SECTION: Tool Enumeration
// ============================================================================

/// Closed enumeration of executable AI tools.
///
/// # Invariants
/// - Variants are stable for serialization and dispatch.
/// - Matches over this enum are exhaustive; there is no fallthrough case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Analyze one research session transcript.
    AnalyzeSession,
    /// Transcribe a session audio recording.
    TranscribeAudio,
    /// Summarize an investigation across sessions.
    SummarizeInvestigation,
    /// Generate a participant profile draft.
    GenerateProfile,
    /// Answer a retrieval-augmented query over tenant documents.
    RagQuery,
}

impl ToolKind {
    /// All tools, in stable order.
    pub const ALL: [Self; 5] = [
        Self::AnalyzeSession,
        Self::TranscribeAudio,
        Self::SummarizeInvestigation,
        Self::GenerateProfile,
        Self::RagQuery,
    ];

    /// Returns the stable wire label for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnalyzeSession => "analyze_session",
            Self::TranscribeAudio => "transcribe_audio",
            Self::SummarizeInvestigation => "summarize_investigation",
            Self::GenerateProfile => "generate_profile",
            Self::RagQuery => "rag_query",
        }
    }

    /// Parses a wire label into a tool (returns `None` for unknown labels).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == label)
    }
}

// ============================================================================
// SECTION: Policy Enumerations
// ============================================================================

/// Model providers a caller may express a preference for.
///
/// # Invariants
/// - Variants are stable for serialization; preference is advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredProvider {
    /// Prefer OpenAI-hosted models.
    Openai,
    /// Prefer Anthropic-hosted models.
    Anthropic,
    /// Prefer Google-hosted models.
    Google,
}

impl PreferredProvider {
    /// Returns the stable wire label for the provider preference.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Parses a wire label into a preference (returns `None` when unknown).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        [Self::Openai, Self::Anthropic, Self::Google]
            .into_iter()
            .find(|provider| provider.as_str() == label)
    }
}

/// Data-residency regions a caller may pin execution to.
///
/// # Invariants
/// - Variants are stable for serialization; residency is advisory today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// European Union.
    Eu,
    /// United States.
    Us,
    /// Latin America.
    Latam,
}

impl Region {
    /// Returns the stable wire label for the region.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eu => "eu",
            Self::Us => "us",
            Self::Latam => "latam",
        }
    }

    /// Parses a wire label into a region (returns `None` when unknown).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        [Self::Eu, Self::Us, Self::Latam].into_iter().find(|region| region.as_str() == label)
    }
}

// ============================================================================
// SECTION: Request Components
// ============================================================================

/// Tool-specific input payload.
///
/// # Invariants
/// - Free-text fields (`transcript`, `text`, `query`) are redacted before
///   the request reaches synthesis, storage, or logs.
/// - `language` always carries a value; validation applies the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInput {
    /// Session transcript text, when the tool consumes one.
    pub transcript: Option<String>,
    /// Generic free text, when the tool consumes one.
    pub text: Option<String>,
    /// Retrieval query text, when the tool consumes one.
    pub query: Option<String>,
    /// Audio object URL, when the tool consumes one.
    pub audio_url: Option<String>,
    /// Input language code.
    pub language: String,
}

/// Tenant-scoped execution context for a run.
///
/// # Invariants
/// - `tenant_id` is non-empty; validation enforces this at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    /// Tenant identifier (required).
    pub tenant_id: TenantId,
    /// Requesting user, when the platform forwards one.
    pub user_id: Option<UserId>,
    /// Investigation scope, when applicable.
    pub investigation_id: Option<InvestigationId>,
    /// Session scope, when applicable.
    pub session_id: Option<SessionId>,
    /// Participant scope, when applicable.
    pub participant_id: Option<ParticipantId>,
    /// Pain-category catalog entries in scope for the run.
    pub dolor_catalog_ids: Vec<CatalogEntryId>,
    /// Need-category catalog entries in scope for the run.
    pub need_catalog_ids: Vec<CatalogEntryId>,
}

/// Caller execution policy for a run.
///
/// # Invariants
/// - `max_latency_ms`, when present, is strictly positive.
/// - `budget_cents`, when present, is the admission estimate for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPolicy {
    /// Whether paid providers may be used.
    pub allow_paid: bool,
    /// Advisory provider preference.
    pub prefer_provider: Option<PreferredProvider>,
    /// Deadline for synthesis, in milliseconds.
    pub max_latency_ms: Option<u64>,
    /// Estimated spend for budget admission, in cents.
    pub budget_cents: Option<u64>,
    /// Advisory data-residency region.
    pub region: Option<Region>,
}

/// Validated, ephemeral run request.
///
/// # Invariants
/// - Produced only by [`crate::core::validate::validate_run_request`].
/// - Never persisted as-is; the executor snapshots redacted input instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Tool to execute.
    pub tool: ToolKind,
    /// Tool-specific input.
    pub input: ToolInput,
    /// Tenant-scoped context.
    pub context: RunContext,
    /// Caller execution policy.
    pub policy: RunPolicy,
    /// Client-issued idempotency token.
    pub idempotency_key: IdempotencyKey,
}
