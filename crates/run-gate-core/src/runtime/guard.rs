// crates/run-gate-core/src/runtime/guard.rs
// ============================================================================
// Module: Budget Guard
// Description: Windowed spend admission over the cost ledger.
// Purpose: Approve or deny a run against monthly and daily tenant budgets.
// Dependencies: crate::core::{budget, identifiers, time}, crate::interfaces
// ============================================================================

//! ## Overview
//! The guard sums a tenant's ledger over the current UTC month, then the
//! current UTC day, and denies when either window's spend plus the estimate
//! exceeds its budget. Monthly precedence is deliberate: the reported
//! reason names the window actually exceeded.
//!
//! Any failure along the way (policy resolution, window arithmetic, or the
//! ledger sum itself) produces a `budget_check_failed` denial. An
//! infrastructure fault must never translate into unmetered spend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::budget::BudgetDecision;
use crate::core::budget::BudgetDenyReason;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::BudgetPolicyResolver;
use crate::interfaces::CostStore;

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Budget admission guard over the cost ledger.
pub struct BudgetGuard {
    /// Spend ledger to sum over windows.
    costs: Arc<dyn CostStore>,
    /// Per-tenant policy resolution.
    policies: Arc<dyn BudgetPolicyResolver>,
}

impl BudgetGuard {
    /// Creates a guard over the given ledger and policy resolver.
    #[must_use]
    pub fn new(costs: Arc<dyn CostStore>, policies: Arc<dyn BudgetPolicyResolver>) -> Self {
        Self { costs, policies }
    }

    /// Checks whether `tenant_id` may spend `estimated_cost_cents` now.
    ///
    /// Never returns an error: every failure path is folded into a
    /// fail-closed denial.
    #[must_use]
    pub fn check(
        &self,
        tenant_id: &TenantId,
        estimated_cost_cents: u64,
        now: Timestamp,
    ) -> BudgetDecision {
        let Ok(policy) = self.policies.resolve(tenant_id) else {
            return BudgetDecision::check_failed();
        };

        let Ok(month_start) = now.start_of_utc_month() else {
            return BudgetDecision::check_failed();
        };
        let Ok(monthly_usage) = self.costs.sum_cents_since(tenant_id, month_start) else {
            return BudgetDecision::check_failed();
        };
        if monthly_usage.saturating_add(estimated_cost_cents) > policy.monthly_budget_cents {
            return BudgetDecision::deny(
                BudgetDenyReason::MonthlyBudgetExceeded,
                monthly_usage,
                policy.monthly_budget_cents,
            );
        }

        let Ok(day_start) = now.start_of_utc_day() else {
            return BudgetDecision::check_failed();
        };
        let Ok(daily_usage) = self.costs.sum_cents_since(tenant_id, day_start) else {
            return BudgetDecision::check_failed();
        };
        if daily_usage.saturating_add(estimated_cost_cents) > policy.daily_budget_cents {
            return BudgetDecision::deny(
                BudgetDenyReason::DailyBudgetExceeded,
                daily_usage,
                policy.daily_budget_cents,
            );
        }

        BudgetDecision::allow(monthly_usage, policy.monthly_budget_cents)
    }
}
