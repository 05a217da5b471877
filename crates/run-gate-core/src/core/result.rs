// crates/run-gate-core/src/core/result.rs
// ============================================================================
// Module: Tool Result Contracts
// Description: Per-tool result types with self-validation contracts.
// Purpose: Give every tool a typed result case checked before it ships.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! Each tool in the closed enumeration carries its own result case, so the
//! synthesizer's output is a compile-time-exhaustive tagged union rather
//! than loose JSON. Every case exposes a contract check; the mock
//! synthesizer self-validates against it before returning, so contract
//! drift between mock and schema surfaces immediately instead of shipping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::CatalogEntryId;
use crate::core::identifiers::TranscriptId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum character count for tool summaries.
pub const MIN_SUMMARY_CHARS: usize = 20;

// ============================================================================
// SECTION: Contract Violations
// ============================================================================

/// Result contract violations detected at self-validation.
///
/// # Invariants
/// - Variants are stable for diagnostics; messages avoid embedding payloads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// Summary is shorter than the contract minimum.
    #[error("summary too short: {actual} chars (min {min})")]
    SummaryTooShort {
        /// Contract minimum length.
        min: usize,
        /// Actual summary length.
        actual: usize,
    },
    /// Confidence or relevance score outside [0, 1].
    #[error("score out of range: {value}")]
    ScoreOutOfRange {
        /// Offending score value.
        value: f64,
    },
    /// A text field that must be non-empty was empty.
    #[error("empty text in {field}")]
    EmptyText {
        /// Field that was empty.
        field: &'static str,
    },
}

// ============================================================================
// SECTION: Evidence
// ============================================================================

/// Reference into a transcript backing an insight or pain point.
///
/// # Invariants
/// - `start_ms` and `end_ms` are non-negative by construction.
/// - `start_ms` before `end_ms` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Transcript the evidence points into.
    pub transcript_id: TranscriptId,
    /// Evidence window start, in milliseconds.
    pub start_ms: u64,
    /// Evidence window end, in milliseconds.
    pub end_ms: u64,
}

// ============================================================================
// SECTION: Analyze Session
// ============================================================================

/// One insight extracted from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Insight statement.
    pub text: String,
    /// Evidence backing the insight.
    pub evidence: EvidenceRef,
}

/// One pain point ("dolor") extracted from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainPoint {
    /// Pain-category catalog entry.
    pub category_id: CatalogEntryId,
    /// Evidence backing the pain point.
    pub evidence: EvidenceRef,
}

/// Suggested participant profile derived from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedProfile {
    /// Profile name.
    pub name: String,
    /// Profile trait labels.
    pub traits: Vec<String>,
    /// Model confidence in [0, 1].
    pub confidence: f64,
}

/// Result of analyzing one session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSessionResult {
    /// Session summary.
    pub summary: String,
    /// Extracted insights.
    pub insights: Vec<Insight>,
    /// Extracted pain points.
    pub dolores: Vec<PainPoint>,
    /// Optional suggested profile.
    pub suggested_profile: Option<SuggestedProfile>,
}

impl AnalyzeSessionResult {
    /// Checks this result against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        validate_summary(&self.summary)?;
        for insight in &self.insights {
            if insight.text.is_empty() {
                return Err(ContractViolation::EmptyText { field: "insight.text" });
            }
        }
        if let Some(profile) = &self.suggested_profile {
            validate_score(profile.confidence)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Transcribe Audio
// ============================================================================

/// One transcript segment.
///
/// # Invariants
/// - `start_ms` and `end_ms` are non-negative by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment start, in milliseconds.
    pub start_ms: u64,
    /// Segment end, in milliseconds.
    pub end_ms: u64,
    /// Speaker label.
    pub speaker: String,
    /// Segment text.
    pub text: String,
}

/// Result of transcribing a session audio recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeAudioResult {
    /// Ordered transcript segments.
    pub segments: Vec<TranscriptSegment>,
    /// Detected language code.
    pub language: String,
    /// Total audio duration, in milliseconds.
    pub duration_ms: u64,
}

impl TranscribeAudioResult {
    /// Checks this result against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        for segment in &self.segments {
            if segment.text.is_empty() {
                return Err(ContractViolation::EmptyText { field: "segment.text" });
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Summarize Investigation
// ============================================================================

/// Result of summarizing an investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInvestigationResult {
    /// Investigation summary.
    pub summary: String,
    /// Key findings across sessions.
    pub key_findings: Vec<String>,
}

impl SummarizeInvestigationResult {
    /// Checks this result against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        validate_summary(&self.summary)?;
        for finding in &self.key_findings {
            if finding.is_empty() {
                return Err(ContractViolation::EmptyText { field: "key_findings" });
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Generate Profile
// ============================================================================

/// Result of generating a participant profile draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateProfileResult {
    /// Profile name.
    pub name: String,
    /// Profile trait labels.
    pub traits: Vec<String>,
    /// Model confidence in [0, 1].
    pub confidence: f64,
}

impl GenerateProfileResult {
    /// Checks this result against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.name.is_empty() {
            return Err(ContractViolation::EmptyText { field: "name" });
        }
        validate_score(self.confidence)
    }
}

// ============================================================================
// SECTION: RAG Query
// ============================================================================

/// One retrieval source backing a RAG answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSource {
    /// Document identifier.
    pub document_id: String,
    /// Relevance score in [0, 1].
    pub score: f64,
}

/// Result of a retrieval-augmented query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagQueryResult {
    /// Synthesized answer.
    pub answer: String,
    /// Retrieval sources, most relevant first.
    pub sources: Vec<RagSource>,
}

impl RagQueryResult {
    /// Checks this result against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.answer.is_empty() {
            return Err(ContractViolation::EmptyText { field: "answer" });
        }
        for source in &self.sources {
            validate_score(source.score)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tagged Union
// ============================================================================

/// Result of one tool execution, tagged by tool.
///
/// # Invariants
/// - Variants correspond 1:1 to [`crate::core::request::ToolKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolResult {
    /// Session analysis result.
    AnalyzeSession(AnalyzeSessionResult),
    /// Audio transcription result.
    TranscribeAudio(TranscribeAudioResult),
    /// Investigation summary result.
    SummarizeInvestigation(SummarizeInvestigationResult),
    /// Profile generation result.
    GenerateProfile(GenerateProfileResult),
    /// RAG query result.
    RagQuery(RagQueryResult),
}

impl ToolResult {
    /// Checks the carried result against its tool's contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            Self::AnalyzeSession(result) => result.validate(),
            Self::TranscribeAudio(result) => result.validate(),
            Self::SummarizeInvestigation(result) => result.validate(),
            Self::GenerateProfile(result) => result.validate(),
            Self::RagQuery(result) => result.validate(),
        }
    }
}

// ============================================================================
// SECTION: Shared Checks
// ============================================================================

/// Checks the shared summary-length contract.
fn validate_summary(summary: &str) -> Result<(), ContractViolation> {
    let actual = summary.chars().count();
    if actual < MIN_SUMMARY_CHARS {
        return Err(ContractViolation::SummaryTooShort { min: MIN_SUMMARY_CHARS, actual });
    }
    Ok(())
}

/// Checks that a confidence or relevance score lies in [0, 1].
fn validate_score(value: f64) -> Result<(), ContractViolation> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ContractViolation::ScoreOutOfRange { value });
    }
    Ok(())
}
