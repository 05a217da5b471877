// crates/run-gate-core/src/runtime/synthesizer.rs
// ============================================================================
// Module: Result Synthesizer
// Description: Tool dispatch seam with a deterministic mock implementation.
// Purpose: Produce tool results in mock mode; refuse explicitly in live mode.
// Dependencies: crate::core::{identifiers, record, request, result}, thiserror
// ============================================================================

//! ## Overview
//! The dispatcher trait is the seam where a real provider-routing
//! implementation (with per-provider retries and latency/cost accounting)
//! plugs in later without touching upstream stages. Today the only
//! implementation is the mock synthesizer: deterministic per-tool results,
//! self-validated against each tool's result contract before they leave
//! this module, so contract drift is caught at the source instead of
//! shipping silently.
//!
//! Execution mode is injected at construction; business logic never reads
//! the process environment. Live mode refuses with an explicit signal and
//! never degrades to the mock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::CatalogEntryId;
use crate::core::identifiers::TranscriptId;
use crate::core::record::Provider;
use crate::core::request::RunRequest;
use crate::core::request::ToolKind;
use crate::core::result::AnalyzeSessionResult;
use crate::core::result::ContractViolation;
use crate::core::result::EvidenceRef;
use crate::core::result::GenerateProfileResult;
use crate::core::result::Insight;
use crate::core::result::PainPoint;
use crate::core::result::RagQueryResult;
use crate::core::result::RagSource;
use crate::core::result::SuggestedProfile;
use crate::core::result::SummarizeInvestigationResult;
use crate::core::result::ToolResult;
use crate::core::result::TranscribeAudioResult;
use crate::core::result::TranscriptSegment;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Model label reported by the mock synthesizer.
pub const MOCK_MODEL: &str = "run-gate-mock-1";

/// Transcript label used when the request carries no session scope.
const FALLBACK_TRANSCRIPT: &str = "sesion-demo";

/// Pain-category label used when the request carries no catalog scope.
const FALLBACK_DOLOR_CATEGORY: &str = "dolor-generico";

// ============================================================================
// SECTION: Execution Mode
// ============================================================================

/// Execution mode injected into the dispatcher at construction time.
///
/// # Invariants
/// - Variants are stable for configuration and health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Synthesize deterministic mock results.
    Mock,
    /// Dispatch to real providers (not implemented in this version).
    Live,
}

impl ExecutionMode {
    /// Returns the stable label for the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Synthesis errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    /// Live execution was requested but is not implemented.
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
    /// The synthesized result violated its own contract.
    #[error("synthesized result violated its contract: {0}")]
    Contract(#[from] ContractViolation),
}

// ============================================================================
// SECTION: Dispatch Seam
// ============================================================================

/// One synthesized execution, before recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedRun {
    /// Tool result, already contract-validated.
    pub result: ToolResult,
    /// Provider that executed the run.
    pub provider: Provider,
    /// Model label reported by the provider.
    pub model: String,
    /// Execution latency in milliseconds.
    pub latency_ms: u64,
    /// Actual cost charged, in cents.
    pub cost_cents: u64,
}

/// Tool dispatch seam.
///
/// The caller's deadline travels inside the request policy; implementations
/// must refuse (not degrade) when they cannot meet it.
pub trait ToolDispatcher: Send + Sync {
    /// Executes the requested tool.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError`] when execution is refused or the result
    /// fails its contract.
    fn dispatch(&self, request: &RunRequest) -> Result<SynthesizedRun, SynthesisError>;
}

// ============================================================================
// SECTION: Mock Synthesizer
// ============================================================================

/// Deterministic mock dispatcher.
///
/// # Invariants
/// - Identical requests synthesize identical results.
/// - Mock executions cost zero cents.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    /// Injected execution mode.
    mode: ExecutionMode,
}

impl MockSynthesizer {
    /// Creates a synthesizer operating in `mode`.
    #[must_use]
    pub const fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    /// Deterministic simulated latency per tool, in milliseconds.
    #[must_use]
    pub const fn simulated_latency_ms(tool: ToolKind) -> u64 {
        match tool {
            ToolKind::AnalyzeSession => 180,
            ToolKind::TranscribeAudio => 420,
            ToolKind::SummarizeInvestigation => 150,
            ToolKind::GenerateProfile => 120,
            ToolKind::RagQuery => 90,
        }
    }

    /// Builds the mock result for `request`.
    fn build_result(request: &RunRequest) -> ToolResult {
        match request.tool {
            ToolKind::AnalyzeSession => ToolResult::AnalyzeSession(analyze_session(request)),
            ToolKind::TranscribeAudio => ToolResult::TranscribeAudio(transcribe_audio(request)),
            ToolKind::SummarizeInvestigation => {
                ToolResult::SummarizeInvestigation(summarize_investigation())
            }
            ToolKind::GenerateProfile => ToolResult::GenerateProfile(generate_profile()),
            ToolKind::RagQuery => ToolResult::RagQuery(rag_query(request)),
        }
    }
}

impl ToolDispatcher for MockSynthesizer {
    fn dispatch(&self, request: &RunRequest) -> Result<SynthesizedRun, SynthesisError> {
        if self.mode == ExecutionMode::Live {
            return Err(SynthesisError::NotImplemented);
        }
        let latency_ms = Self::simulated_latency_ms(request.tool);
        if let Some(allowed_ms) = request.policy.max_latency_ms
            && latency_ms > allowed_ms
        {
            return Err(SynthesisError::DeadlineExceeded { required_ms: latency_ms, allowed_ms });
        }
        let result = Self::build_result(request);
        result.validate()?;
        Ok(SynthesizedRun {
            result,
            provider: Provider::Mock,
            model: MOCK_MODEL.to_string(),
            latency_ms,
            cost_cents: 0,
        })
    }
}

// ============================================================================
// SECTION: Mock Builders
// ============================================================================

/// Transcript reference derived from the request's session scope.
fn transcript_for(request: &RunRequest) -> TranscriptId {
    request
        .context
        .session_id
        .as_ref()
        .map_or_else(|| TranscriptId::new(FALLBACK_TRANSCRIPT), |id| TranscriptId::new(id.as_str()))
}

/// Builds the session-analysis mock.
fn analyze_session(request: &RunRequest) -> AnalyzeSessionResult {
    let transcript_id = transcript_for(request);
    let category_id = request
        .context
        .dolor_catalog_ids
        .first()
        .cloned()
        .unwrap_or_else(|| CatalogEntryId::new(FALLBACK_DOLOR_CATEGORY));
    AnalyzeSessionResult {
        summary: "Resumen preliminar de la sesión: la persona participante describe fricciones \
                  recurrentes al completar el registro y valora la claridad del acompañamiento."
            .to_string(),
        insights: vec![
            Insight {
                text: "El registro se percibe largo y repetitivo.".to_string(),
                evidence: EvidenceRef {
                    transcript_id: transcript_id.clone(),
                    start_ms: 12_000,
                    end_ms: 24_500,
                },
            },
            Insight {
                text: "La confirmación por correo genera confianza.".to_string(),
                evidence: EvidenceRef {
                    transcript_id: transcript_id.clone(),
                    start_ms: 31_200,
                    end_ms: 39_800,
                },
            },
        ],
        dolores: vec![PainPoint {
            category_id,
            evidence: EvidenceRef { transcript_id, start_ms: 12_000, end_ms: 24_500 },
        }],
        suggested_profile: Some(SuggestedProfile {
            name: "Perfil exploratorio".to_string(),
            traits: vec!["metódico".to_string(), "desconfiado del registro".to_string()],
            confidence: 0.62,
        }),
    }
}

/// Builds the transcription mock.
fn transcribe_audio(request: &RunRequest) -> TranscribeAudioResult {
    TranscribeAudioResult {
        segments: vec![
            TranscriptSegment {
                start_ms: 0,
                end_ms: 8_400,
                speaker: "moderadora".to_string(),
                text: "Gracias por acompañarnos hoy.".to_string(),
            },
            TranscriptSegment {
                start_ms: 8_400,
                end_ms: 21_700,
                speaker: "participante".to_string(),
                text: "Encantada, cuéntame por dónde empezamos.".to_string(),
            },
        ],
        language: request.input.language.clone(),
        duration_ms: 21_700,
    }
}

/// Builds the investigation-summary mock.
fn summarize_investigation() -> SummarizeInvestigationResult {
    SummarizeInvestigationResult {
        summary: "Síntesis de la investigación: las sesiones coinciden en fricciones de registro \
                  y en una valoración positiva del seguimiento posterior."
            .to_string(),
        key_findings: vec![
            "El registro concentra la mayor parte de los abandonos.".to_string(),
            "El seguimiento por correo retiene a participantes indecisos.".to_string(),
            "Las sesiones cortas producen respuestas más concretas.".to_string(),
        ],
    }
}

/// Builds the profile-generation mock.
fn generate_profile() -> GenerateProfileResult {
    GenerateProfileResult {
        name: "Perfil exploratorio".to_string(),
        traits: vec![
            "primera experiencia con la plataforma".to_string(),
            "prefiere instrucciones paso a paso".to_string(),
        ],
        confidence: 0.58,
    }
}

/// Builds the RAG-query mock.
fn rag_query(request: &RunRequest) -> RagQueryResult {
    let topic = request.input.query.clone().unwrap_or_else(|| "la consulta".to_string());
    RagQueryResult {
        answer: format!(
            "Sobre {topic}: la evidencia disponible apunta a fricciones de registro documentadas \
             en las sesiones más recientes."
        ),
        sources: vec![
            RagSource { document_id: "doc-registro-01".to_string(), score: 0.83 },
            RagSource { document_id: "doc-seguimiento-02".to_string(), score: 0.61 },
        ],
    }
}
