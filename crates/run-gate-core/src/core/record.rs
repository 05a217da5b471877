// crates/run-gate-core/src/core/record.rs
// ============================================================================
// Module: Run Records and Cost Entries
// Description: Append-only persisted records for completed runs and spend.
// Purpose: Capture the immutable audit trail consumed by replay and budgets.
// Dependencies: crate::core::{identifiers, request, result, time}, serde
// ============================================================================

//! ## Overview
//! A [`RunRecord`] is written exactly once per logically-distinct run and is
//! never mutated or deleted; it is read again only to serve idempotent
//! replay. A [`CostEntry`] is appended once per completed run and is summed
//! over calendar windows by the budget guard. Corrections are new rows,
//! never updates, so windowed sums stay computable from an immutable ledger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::request::ToolInput;
use crate::core::request::ToolKind;
use crate::core::result::ToolResult;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Execution provider recorded on runs and cost entries.
///
/// # Invariants
/// - Variants are stable for serialization and ledger labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Deterministic in-process mock.
    Mock,
    /// OpenAI-hosted execution.
    Openai,
    /// Anthropic-hosted execution.
    Anthropic,
    /// Google-hosted execution.
    Google,
}

impl Provider {
    /// Returns the stable ledger label for the provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Parses a ledger label into a provider (returns `None` when unknown).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        [Self::Mock, Self::Openai, Self::Anthropic, Self::Google]
            .into_iter()
            .find(|provider| provider.as_str() == label)
    }
}

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Terminal status of a recorded run.
///
/// # Invariants
/// - Variants are stable for serialization.
/// - Only completed runs are recorded today; failed synthesis never reaches
///   the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run completed and its result was persisted.
    Completed,
    /// Run failed after admission (reserved for live dispatch).
    Failed,
}

impl RunStatus {
    /// Returns the stable wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a wire label into a status (returns `None` when unknown).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        [Self::Completed, Self::Failed].into_iter().find(|status| status.as_str() == label)
    }
}

// ============================================================================
// SECTION: Run Meta
// ============================================================================

/// Execution metadata returned to callers and replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    /// Provider that executed the run.
    pub provider: Provider,
    /// Model label reported by the provider.
    pub model: String,
    /// Observed (or simulated) execution latency in milliseconds.
    pub latency_ms: u64,
    /// Actual cost charged, in cents.
    pub cost_cents: u64,
}

// ============================================================================
// SECTION: Run Record
// ============================================================================

/// Immutable record of one completed run.
///
/// # Invariants
/// - Created exactly once per logically-distinct run; never mutated.
/// - `idempotency_key` is unique across all records forever.
/// - `input` is the redacted snapshot; raw text never reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Run identifier.
    pub id: RunId,
    /// Tenant that owns the run.
    pub tenant_id: TenantId,
    /// Requesting user, when known.
    pub user_id: Option<UserId>,
    /// Tool that was executed.
    pub tool: ToolKind,
    /// Provider that executed the run.
    pub provider: Provider,
    /// Model label reported by the provider.
    pub model: String,
    /// Execution latency in milliseconds.
    pub latency_ms: u64,
    /// Actual cost charged, in cents.
    pub cost_cents: u64,
    /// Terminal run status.
    pub status: RunStatus,
    /// Redacted input snapshot.
    pub input: ToolInput,
    /// Result snapshot.
    pub result: ToolResult,
    /// Client-issued idempotency token (unique).
    pub idempotency_key: IdempotencyKey,
    /// Record creation time.
    pub created_at: Timestamp,
}

impl RunRecord {
    /// Assembles the caller-facing metadata for this record.
    #[must_use]
    pub fn meta(&self) -> RunMeta {
        RunMeta {
            provider: self.provider,
            model: self.model.clone(),
            latency_ms: self.latency_ms,
            cost_cents: self.cost_cents,
        }
    }
}

// ============================================================================
// SECTION: Cost Entry
// ============================================================================

/// Structured metadata attached to a cost entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMeta {
    /// Run the entry accounts for.
    pub run_id: RunId,
    /// Tool that was executed.
    pub tool: ToolKind,
}

/// Immutable spend ledger entry, one per completed run.
///
/// # Invariants
/// - Never mutated; windowed sums rely on append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntry {
    /// Tenant charged for the run.
    pub tenant_id: TenantId,
    /// Provider that executed the run.
    pub provider: Provider,
    /// Cost charged, in cents.
    pub cost_cents: u64,
    /// Structured entry metadata.
    pub meta: CostMeta,
    /// Entry creation time.
    pub created_at: Timestamp,
}
