// crates/run-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Run Gate Identifiers
// Description: Canonical opaque identifiers for tenants, runs, and catalog refs.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Run Gate.
//! Most identifiers are opaque strings that serialize transparently on the
//! wire. The idempotency key is the exception: it enforces the canonical
//! UUID textual form at its parse boundary, because replay-at-most-once
//! hinges on every writer agreeing on one spelling of the same token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Opaque Identifier Types
// ============================================================================

/// Declares an opaque string identifier with stable wire form.
macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_id! {
    /// Tenant identifier: the billing and isolation unit for budget windows.
    TenantId
}

opaque_id! {
    /// User identifier within a tenant.
    UserId
}

opaque_id! {
    /// Investigation identifier referenced by run context.
    InvestigationId
}

opaque_id! {
    /// Research session identifier referenced by run context.
    SessionId
}

opaque_id! {
    /// Participant identifier referenced by run context.
    ParticipantId
}

opaque_id! {
    /// Catalog entry identifier (pain categories, need categories).
    CatalogEntryId
}

opaque_id! {
    /// Transcript identifier referenced by result evidence.
    TranscriptId
}

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Run identifier assigned to each persisted run record.
///
/// # Invariants
/// - Opaque UTF-8 string; generated values are UUID v4 hyphenated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a run identifier from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().as_hyphenated().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Idempotency Key
// ============================================================================

/// Typed rejection reason for invalid idempotency keys.
///
/// # Invariants
/// - Variants are stable for validation diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdempotencyKeyError {
    /// Input is not a syntactically valid UUID.
    #[error("idempotency key is not a valid uuid")]
    Malformed,
    /// Input parses as a UUID but is not in canonical hyphenated form.
    #[error("idempotency key is not in canonical hyphenated form")]
    NonCanonical,
}

impl IdempotencyKeyError {
    /// Returns a stable label for this rejection reason.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::NonCanonical => "non_canonical",
        }
    }
}

/// Client-issued idempotency token in canonical UUID textual form.
///
/// # Invariants
/// - Always stored in lowercase hyphenated (8-4-4-4-12) form.
/// - Unique per completed run forever; the run store enforces uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Parses a raw token, accepting uppercase hex but requiring the
    /// hyphenated layout.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyKeyError`] when the token is malformed or not in
    /// canonical hyphenated form.
    pub fn parse(raw: &str) -> Result<Self, IdempotencyKeyError> {
        let parsed = Uuid::parse_str(raw).map_err(|_| IdempotencyKeyError::Malformed)?;
        let canonical = parsed.as_hyphenated().to_string();
        if !canonical.eq_ignore_ascii_case(raw) {
            return Err(IdempotencyKeyError::NonCanonical);
        }
        Ok(Self(canonical))
    }

    /// Returns the canonical key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions are permitted.")]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_accepts_canonical_form() {
        let key = IdempotencyKey::parse("0c5bafa3-88a1-4b49-9b67-3f33df3bd0ef")
            .expect("canonical key accepted");
        assert_eq!(key.as_str(), "0c5bafa3-88a1-4b49-9b67-3f33df3bd0ef");
    }

    #[test]
    fn idempotency_key_lowercases_uppercase_input() {
        let key = IdempotencyKey::parse("0C5BAFA3-88A1-4B49-9B67-3F33DF3BD0EF")
            .expect("uppercase key accepted");
        assert_eq!(key.as_str(), "0c5bafa3-88a1-4b49-9b67-3f33df3bd0ef");
    }

    #[test]
    fn idempotency_key_rejects_garbage() {
        assert_eq!(IdempotencyKey::parse("not-a-uuid"), Err(IdempotencyKeyError::Malformed));
    }

    #[test]
    fn idempotency_key_rejects_unhyphenated_form() {
        assert_eq!(
            IdempotencyKey::parse("0c5bafa388a14b499b673f33df3bd0ef"),
            Err(IdempotencyKeyError::NonCanonical)
        );
    }
}
