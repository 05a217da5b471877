// crates/run-gate-core/src/core/budget.rs
// ============================================================================
// Module: Budget Model
// Description: Per-tenant budget policy and admission decisions.
// Purpose: Represent window budgets and allow/deny outcomes with headroom.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Budget admission is approximate by design: two concurrent requests from
//! the same tenant may both pass before either's cost entry becomes visible.
//! What is not negotiable is the failure direction: an infrastructure error
//! during the check must read as a denial, never as unmetered spend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Budget Policy
// ============================================================================

/// Default monthly budget, in cents.
pub const DEFAULT_MONTHLY_BUDGET_CENTS: u64 = 10_000;
/// Default daily budget, in cents.
pub const DEFAULT_DAILY_BUDGET_CENTS: u64 = 1_000;

/// Per-tenant spend limits over calendar windows.
///
/// # Invariants
/// - Resolved per tenant through
///   [`crate::interfaces::BudgetPolicyResolver`]; never inlined in stage
///   logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPolicy {
    /// Spend limit for the current UTC month, in cents.
    pub monthly_budget_cents: u64,
    /// Spend limit for the current UTC day, in cents.
    pub daily_budget_cents: u64,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            monthly_budget_cents: DEFAULT_MONTHLY_BUDGET_CENTS,
            daily_budget_cents: DEFAULT_DAILY_BUDGET_CENTS,
        }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Reasons a budget check denies admission.
///
/// # Invariants
/// - Variants are stable for serialization and audit labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetDenyReason {
    /// Monthly window spend plus estimate exceeds the monthly budget.
    MonthlyBudgetExceeded,
    /// Daily window spend plus estimate exceeds the daily budget.
    DailyBudgetExceeded,
    /// The underlying spend query failed; the guard fails closed.
    BudgetCheckFailed,
}

impl BudgetDenyReason {
    /// Returns the stable label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MonthlyBudgetExceeded => "monthly_budget_exceeded",
            Self::DailyBudgetExceeded => "daily_budget_exceeded",
            Self::BudgetCheckFailed => "budget_check_failed",
        }
    }
}

/// Outcome of one budget admission check.
///
/// # Invariants
/// - `allowed` is the authoritative decision.
/// - `remaining_cents` is `budget_cents - usage_cents`, saturating at zero;
///   the estimate does not reduce reported headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDecision {
    /// Whether admission is allowed.
    pub allowed: bool,
    /// Deny reason when admission is refused.
    pub reason: Option<BudgetDenyReason>,
    /// Spend already accrued in the decisive window, in cents.
    pub usage_cents: u64,
    /// Budget of the decisive window, in cents.
    pub budget_cents: u64,
    /// Remaining headroom in the decisive window, in cents.
    pub remaining_cents: u64,
}

impl BudgetDecision {
    /// Builds an allow decision reporting monthly usage and headroom.
    #[must_use]
    pub const fn allow(usage_cents: u64, budget_cents: u64) -> Self {
        Self {
            allowed: true,
            reason: None,
            usage_cents,
            budget_cents,
            remaining_cents: budget_cents.saturating_sub(usage_cents),
        }
    }

    /// Builds a deny decision for an exceeded window.
    #[must_use]
    pub const fn deny(reason: BudgetDenyReason, usage_cents: u64, budget_cents: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            usage_cents,
            budget_cents,
            remaining_cents: budget_cents.saturating_sub(usage_cents),
        }
    }

    /// Builds the fail-closed decision for a failed spend query.
    #[must_use]
    pub const fn check_failed() -> Self {
        Self {
            allowed: false,
            reason: Some(BudgetDenyReason::BudgetCheckFailed),
            usage_cents: 0,
            budget_cents: 0,
            remaining_cents: 0,
        }
    }

    /// Returns the stable label of the deny reason, if any.
    #[must_use]
    pub const fn reason_label(&self) -> &'static str {
        match self.reason {
            Some(reason) => reason.as_str(),
            None => "allowed",
        }
    }
}
