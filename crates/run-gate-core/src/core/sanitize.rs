// crates/run-gate-core/src/core/sanitize.rs
// ============================================================================
// Module: PII Redaction Pipeline
// Description: Ordered regex substitution over free text before persistence.
// Purpose: Mask personally identifiable information in stored and logged text.
// Dependencies: regex, thiserror
// ============================================================================

//! ## Overview
//! Every free-text field destined for storage or logs passes through the
//! redaction pipeline. Rules run in a fixed, explicit order, more specific
//! shapes before looser numeric ones: a phone fragment or card group
//! re-matched by a later numeric rule would double-mask. The order is
//! data, not code: deployments may supply their own rule list, and the
//! standard order is pinned by property tests.
//!
//! Redaction here is defense in depth, not certified anonymization.
//! Residual leakage through unmodeled formats is expected and acceptable
//! for this layer's stated purpose.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sanitizer construction errors.
#[derive(Debug, Clone, Error)]
pub enum SanitizerError {
    /// A rule pattern failed to compile.
    #[error("invalid redaction pattern for rule {rule}: {message}")]
    InvalidPattern {
        /// Rule whose pattern failed.
        rule: String,
        /// Compiler message.
        message: String,
    },
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One named redaction rule: a compiled pattern and its mask token.
///
/// # Invariants
/// - Mask tokens contain no digits or `@`, so no rule can re-match a mask
///   emitted by an earlier rule.
#[derive(Debug, Clone)]
pub struct RedactionRule {
    /// Stable rule name for diagnostics.
    name: String,
    /// Compiled match pattern.
    pattern: Regex,
    /// Mask token substituted for each match.
    mask: &'static str,
}

impl RedactionRule {
    /// Compiles a redaction rule.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizerError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn compile(
        name: impl Into<String>,
        pattern: &str,
        mask: &'static str,
    ) -> Result<Self, SanitizerError> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|err| SanitizerError::InvalidPattern {
            rule: name.clone(),
            message: err.to_string(),
        })?;
        Ok(Self { name, pattern, mask })
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the mask token.
    #[must_use]
    pub const fn mask(&self) -> &'static str {
        self.mask
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of one redaction pass.
///
/// # Invariants
/// - Never persisted on its own; only `redacted` propagates downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationReport {
    /// Character count of the original text.
    pub original_chars: usize,
    /// Redacted text.
    pub redacted: String,
    /// Number of masked matches across all rules.
    pub masked: usize,
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Ordered PII redaction pipeline.
///
/// # Invariants
/// - Rules apply in list order; order is load-bearing for overlapping
///   numeric shapes.
#[derive(Debug, Clone)]
pub struct RedactionPipeline {
    /// Rules in application order.
    rules: Vec<RedactionRule>,
}

impl RedactionPipeline {
    /// Builds the standard pipeline: email, phone (local then
    /// international), card, identity number, street address, postal code.
    ///
    /// Under this order a bare 6-digit sequence is masked by the identity
    /// rule before the postal rule can see it; the postal rule is retained
    /// for deployments that re-pin the order.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizerError`] when a standard pattern fails to compile.
    pub fn standard() -> Result<Self, SanitizerError> {
        Ok(Self::with_rules(vec![
            RedactionRule::compile(
                "email",
                r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
                "[EMAIL]",
            )?,
            RedactionRule::compile(
                "phone_local",
                r"(?:\+|00|\b)\d{1,3}[ .-]\d{3}[ .-]\d{3,4}\b",
                "[PHONE]",
            )?,
            RedactionRule::compile("phone_intl", r"\+\d{8,14}\b", "[PHONE]")?,
            RedactionRule::compile(
                "card",
                r"\b\d{4}[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b",
                "[CARD]",
            )?,
            RedactionRule::compile("id_number", r"\b\d{6,10}\b", "[ID_NUMBER]")?,
            RedactionRule::compile(
                "address",
                r"(?i)\b(?:calle|avenida|av|pasaje|psje|carrera)\.?\s+(?:[0-9A-Za-zÁÉÍÓÚÜÑáéíóúüñ]+\s+){0,3}\d{1,5}\s*,?\s*(?:depto|dpto|apto|of|oficina|casa)\.?\s*\w{1,6}",
                "[ADDRESS]",
            )?,
            RedactionRule::compile("postal_code", r"\b\d{6}\b", "[POSTAL_CODE]")?,
        ]))
    }

    /// Builds a pipeline from an explicit ordered rule list.
    #[must_use]
    pub const fn with_rules(rules: Vec<RedactionRule>) -> Self {
        Self { rules }
    }

    /// Returns the rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Redacts PII from `text`, preserving all unmatched characters.
    #[must_use]
    pub fn redact(&self, text: &str) -> SanitizationReport {
        let original_chars = text.chars().count();
        let mut redacted = text.to_string();
        let mut masked = 0;
        for rule in &self.rules {
            let matches = rule.pattern.find_iter(&redacted).count();
            if matches == 0 {
                continue;
            }
            masked += matches;
            redacted = rule.pattern.replace_all(&redacted, rule.mask).into_owned();
        }
        SanitizationReport { original_chars, redacted, masked }
    }

    /// Cheap pre-check reusing the same patterns, for gating verbose
    /// diagnostics without running the full substitution.
    #[must_use]
    pub fn contains_pii(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(text))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions are permitted.")]
mod tests {
    use super::*;

    fn pipeline() -> RedactionPipeline {
        RedactionPipeline::standard().expect("standard rules compile")
    }

    #[test]
    fn masks_email_preserving_surroundings() {
        let report = pipeline().redact("contact a@b.com");
        assert_eq!(report.redacted, "contact [EMAIL]");
        assert_eq!(report.masked, 1);
        assert_eq!(report.original_chars, 15);
    }

    #[test]
    fn masks_card_before_identity_rule() {
        let report = pipeline().redact("pago con 4111 1111 1111 1111 ayer");
        assert_eq!(report.redacted, "pago con [CARD] ayer");
    }

    #[test]
    fn masks_bare_identity_number() {
        let report = pipeline().redact("rut 12345678 registrado");
        assert_eq!(report.redacted, "rut [ID_NUMBER] registrado");
    }

    #[test]
    fn contains_pii_agrees_with_redaction() {
        let p = pipeline();
        assert!(p.contains_pii("llámame al +56 912 3456"));
        assert!(!p.contains_pii("sin datos personales aquí"));
    }
}
