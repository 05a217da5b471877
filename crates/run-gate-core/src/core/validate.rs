// crates/run-gate-core/src/core/validate.rs
// ============================================================================
// Module: Request Validation
// Description: Structural and semantic validation of inbound run requests.
// Purpose: Turn a permissive wire mirror into a typed RunRequest, or report
//          every violated field at once.
// Dependencies: crate::core::{identifiers, request}, serde, thiserror
// ============================================================================

//! ## Overview
//! The raw mirror accepts whatever shape the caller sent; validation then
//! enumerates every violation instead of stopping at the first, so a client
//! can fix its request in one round trip. This stage performs no store
//! access and has no side effects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::CatalogEntryId;
use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::InvestigationId;
use crate::core::identifiers::ParticipantId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::request::DEFAULT_LANGUAGE;
use crate::core::request::PreferredProvider;
use crate::core::request::Region;
use crate::core::request::RunContext;
use crate::core::request::RunPolicy;
use crate::core::request::RunRequest;
use crate::core::request::ToolInput;
use crate::core::request::ToolKind;

// ============================================================================
// SECTION: Raw Wire Mirror
// ============================================================================

/// Permissive mirror of the inbound request body.
///
/// # Invariants
/// - Every field is optional; nothing is rejected at deserialization time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunRequest {
    /// Requested tool label.
    #[serde(default)]
    pub tool: Option<String>,
    /// Tool input payload.
    #[serde(default)]
    pub input: Option<RawToolInput>,
    /// Execution context.
    #[serde(default)]
    pub context: Option<RawRunContext>,
    /// Execution policy.
    #[serde(default)]
    pub policy: Option<RawRunPolicy>,
    /// Idempotency token.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Permissive mirror of the tool input payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToolInput {
    /// Session transcript text.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Generic free text.
    #[serde(default)]
    pub text: Option<String>,
    /// Retrieval query text.
    #[serde(default)]
    pub query: Option<String>,
    /// Audio object URL.
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Input language code.
    #[serde(default)]
    pub language: Option<String>,
}

/// Permissive mirror of the execution context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunContext {
    /// Tenant identifier.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Requesting user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Investigation scope.
    #[serde(default)]
    pub investigation_id: Option<String>,
    /// Session scope.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Participant scope.
    #[serde(default)]
    pub participant_id: Option<String>,
    /// Pain-category catalog entries.
    #[serde(default)]
    pub dolor_catalog_ids: Option<Vec<String>>,
    /// Need-category catalog entries.
    #[serde(default)]
    pub need_catalog_ids: Option<Vec<String>>,
}

/// Permissive mirror of the execution policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunPolicy {
    /// Whether paid providers may be used.
    #[serde(default)]
    pub allow_paid: Option<bool>,
    /// Advisory provider preference label.
    #[serde(default)]
    pub prefer_provider: Option<String>,
    /// Deadline for synthesis, in milliseconds (signed to detect negatives).
    #[serde(default)]
    pub max_latency_ms: Option<i64>,
    /// Estimated spend in cents (signed to detect negatives).
    #[serde(default)]
    pub budget_cents: Option<i64>,
    /// Advisory region label.
    #[serde(default)]
    pub region: Option<String>,
}

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Violation classification for one field.
///
/// # Invariants
/// - Variants are stable for client-facing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// Required field is absent.
    Missing,
    /// Field is present but empty.
    Empty,
    /// Field value is not one of the accepted labels.
    UnknownValue,
    /// Numeric field is outside its accepted range.
    OutOfRange,
    /// Field does not parse in its required textual form.
    Malformed,
}

impl ViolationCode {
    /// Returns the stable label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Empty => "empty",
            Self::UnknownValue => "unknown_value",
            Self::OutOfRange => "out_of_range",
            Self::Malformed => "malformed",
        }
    }
}

/// One violated field with its classification and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path of the violated field.
    pub field: String,
    /// Violation classification.
    pub code: ViolationCode,
    /// Human-readable detail.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self { field: field.into(), code, message: message.into() }
    }
}

/// Every violation found in one request, in field order.
///
/// # Invariants
/// - Always non-empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid input: {} field violation(s)", .violations.len())]
pub struct ValidationErrors {
    /// Violations in discovery order.
    pub violations: Vec<FieldViolation>,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a raw request into a typed [`RunRequest`].
///
/// Collects every violated field; the request reaches neither the store nor
/// any later stage on failure.
///
/// # Errors
///
/// Returns [`ValidationErrors`] enumerating all violated fields.
pub fn validate_run_request(raw: RawRunRequest) -> Result<RunRequest, ValidationErrors> {
    let mut violations = Vec::new();

    let tool = validate_tool(raw.tool.as_deref(), &mut violations);
    let idempotency_key = validate_idempotency_key(raw.idempotency_key.as_deref(), &mut violations);
    let context = validate_context(raw.context, &mut violations);
    let policy = validate_policy(raw.policy, &mut violations);
    let input = build_input(raw.input);

    if !violations.is_empty() {
        return Err(ValidationErrors { violations });
    }
    match (tool, idempotency_key, context, policy) {
        (Some(tool), Some(idempotency_key), Some(context), Some(policy)) => {
            Ok(RunRequest { tool, input, context, policy, idempotency_key })
        }
        // Unreachable: each None pushed a violation above.
        _ => Err(ValidationErrors {
            violations: vec![FieldViolation::new(
                "request",
                ViolationCode::Malformed,
                "request could not be assembled",
            )],
        }),
    }
}

/// Validates the tool label against the closed enumeration.
fn validate_tool(raw: Option<&str>, violations: &mut Vec<FieldViolation>) -> Option<ToolKind> {
    match raw {
        None => {
            violations.push(FieldViolation::new(
                "tool",
                ViolationCode::Missing,
                "tool is required",
            ));
            None
        }
        Some(label) => match ToolKind::parse_label(label) {
            Some(tool) => Some(tool),
            None => {
                violations.push(FieldViolation::new(
                    "tool",
                    ViolationCode::UnknownValue,
                    format!("unknown tool: {label}"),
                ));
                None
            }
        },
    }
}

/// Validates the idempotency token's canonical UUID form.
fn validate_idempotency_key(
    raw: Option<&str>,
    violations: &mut Vec<FieldViolation>,
) -> Option<IdempotencyKey> {
    match raw {
        None => {
            violations.push(FieldViolation::new(
                "idempotencyKey",
                ViolationCode::Missing,
                "idempotencyKey is required",
            ));
            None
        }
        Some(token) => match IdempotencyKey::parse(token) {
            Ok(key) => Some(key),
            Err(err) => {
                violations.push(FieldViolation::new(
                    "idempotencyKey",
                    ViolationCode::Malformed,
                    format!("idempotencyKey must be a canonical uuid ({})", err.label()),
                ));
                None
            }
        },
    }
}

/// Validates the execution context, requiring a non-empty tenant.
fn validate_context(
    raw: Option<RawRunContext>,
    violations: &mut Vec<FieldViolation>,
) -> Option<RunContext> {
    let Some(raw) = raw else {
        violations.push(FieldViolation::new(
            "context",
            ViolationCode::Missing,
            "context is required",
        ));
        return None;
    };
    let tenant_id = match raw.tenant_id.as_deref() {
        None => {
            violations.push(FieldViolation::new(
                "context.tenantId",
                ViolationCode::Missing,
                "context.tenantId is required",
            ));
            None
        }
        Some("") => {
            violations.push(FieldViolation::new(
                "context.tenantId",
                ViolationCode::Empty,
                "context.tenantId must be non-empty",
            ));
            None
        }
        Some(id) => Some(TenantId::new(id)),
    }?;
    Some(RunContext {
        tenant_id,
        user_id: raw.user_id.map(UserId::new),
        investigation_id: raw.investigation_id.map(InvestigationId::new),
        session_id: raw.session_id.map(SessionId::new),
        participant_id: raw.participant_id.map(ParticipantId::new),
        dolor_catalog_ids: into_catalog_ids(raw.dolor_catalog_ids),
        need_catalog_ids: into_catalog_ids(raw.need_catalog_ids),
    })
}

/// Converts an optional raw id list into catalog entries.
fn into_catalog_ids(raw: Option<Vec<String>>) -> Vec<CatalogEntryId> {
    raw.unwrap_or_default().into_iter().map(CatalogEntryId::new).collect()
}

/// Validates the execution policy's labels and numeric ranges.
fn validate_policy(
    raw: Option<RawRunPolicy>,
    violations: &mut Vec<FieldViolation>,
) -> Option<RunPolicy> {
    let raw = raw.unwrap_or_default();
    let before = violations.len();

    let prefer_provider = raw.prefer_provider.as_deref().and_then(|label| {
        let parsed = PreferredProvider::parse_label(label);
        if parsed.is_none() {
            violations.push(FieldViolation::new(
                "policy.preferProvider",
                ViolationCode::UnknownValue,
                format!("unknown provider: {label}"),
            ));
        }
        parsed
    });
    let region = raw.region.as_deref().and_then(|label| {
        let parsed = Region::parse_label(label);
        if parsed.is_none() {
            violations.push(FieldViolation::new(
                "policy.region",
                ViolationCode::UnknownValue,
                format!("unknown region: {label}"),
            ));
        }
        parsed
    });
    let max_latency_ms = raw.max_latency_ms.and_then(|value| {
        if value <= 0 {
            violations.push(FieldViolation::new(
                "policy.maxLatencyMs",
                ViolationCode::OutOfRange,
                "policy.maxLatencyMs must be strictly positive",
            ));
            None
        } else {
            u64::try_from(value).ok()
        }
    });
    let budget_cents = raw.budget_cents.and_then(|value| {
        if value < 0 {
            violations.push(FieldViolation::new(
                "policy.budgetCents",
                ViolationCode::OutOfRange,
                "policy.budgetCents must be non-negative",
            ));
            None
        } else {
            u64::try_from(value).ok()
        }
    });

    if violations.len() > before {
        return None;
    }
    Some(RunPolicy {
        allow_paid: raw.allow_paid.unwrap_or(false),
        prefer_provider,
        max_latency_ms,
        budget_cents,
        region,
    })
}

/// Builds the typed input, applying the language default.
fn build_input(raw: Option<RawToolInput>) -> ToolInput {
    let raw = raw.unwrap_or_default();
    let language = match raw.language {
        Some(language) if !language.is_empty() => language,
        _ => DEFAULT_LANGUAGE.to_string(),
    };
    ToolInput {
        transcript: raw.transcript,
        text: raw.text,
        query: raw.query,
        audio_url: raw.audio_url,
        language,
    }
}
