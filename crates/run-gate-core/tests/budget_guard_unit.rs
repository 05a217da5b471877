// crates/run-gate-core/tests/budget_guard_unit.rs
// ============================================================================
// Module: Budget Guard Unit Tests
// Description: Windowed admission over the in-memory cost ledger.
// Purpose: Validate window precedence, headroom reporting, boundary
//          inclusion, and fail-closed behavior.
// ============================================================================

//! ## Overview
//! Exercises the budget guard against a seeded ledger: monthly/daily
//! precedence, exact headroom arithmetic, calendar-window boundaries, and
//! the fail-closed denial when the ledger itself is unavailable.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use common::FailingCostStore;
use common::TENANT;
use common::now;
use common::seed_cost;
use run_gate_core::BudgetDenyReason;
use run_gate_core::BudgetGuard;
use run_gate_core::BudgetPolicy;
use run_gate_core::CostStore;
use run_gate_core::FixedBudgetPolicyResolver;
use run_gate_core::InMemoryCostStore;
use run_gate_core::TenantId;
use run_gate_core::Timestamp;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn guard_over(costs: Arc<dyn CostStore>, policy: BudgetPolicy) -> BudgetGuard {
    BudgetGuard::new(costs, Arc::new(FixedBudgetPolicyResolver::new(policy)))
}

fn tenant() -> TenantId {
    TenantId::new(TENANT)
}

/// One hour before the pinned test instant (same UTC day).
fn earlier_today() -> Timestamp {
    Timestamp::from_unix_millis(now().as_unix_millis() - 3_600_000)
}

/// Ten days before the pinned test instant (same UTC month, previous day).
fn earlier_this_month() -> Timestamp {
    Timestamp::from_unix_millis(now().as_unix_millis() - 10 * 86_400_000)
}

/// Forty days before the pinned test instant (previous UTC month).
fn last_month() -> Timestamp {
    Timestamp::from_unix_millis(now().as_unix_millis() - 40 * 86_400_000)
}

// ============================================================================
// SECTION: Monotonicity
// ============================================================================

#[test]
fn denies_estimate_over_monthly_budget_with_zero_usage() {
    let costs = Arc::new(InMemoryCostStore::new());
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&tenant(), 10_001, now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(BudgetDenyReason::MonthlyBudgetExceeded));
    assert_eq!(decision.remaining_cents, 10_000);
}

#[test]
fn allows_estimate_within_monthly_budget() {
    let costs = Arc::new(InMemoryCostStore::new());
    let guard = guard_over(
        costs,
        BudgetPolicy { monthly_budget_cents: 10_000, daily_budget_cents: 10_000 },
    );
    let decision = guard.check(&tenant(), 9_999, now());
    assert!(decision.allowed);
    assert_eq!(decision.usage_cents, 0);
    assert_eq!(decision.budget_cents, 10_000);
    assert_eq!(decision.remaining_cents, 10_000);
}

// ============================================================================
// SECTION: Window Precedence
// ============================================================================

#[test]
fn daily_window_alone_is_sufficient_to_deny() {
    let costs = Arc::new(InMemoryCostStore::new());
    seed_cost(&costs, 950, earlier_today());
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&tenant(), 100, now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(BudgetDenyReason::DailyBudgetExceeded));
    assert_eq!(decision.usage_cents, 950);
    assert_eq!(decision.budget_cents, 1_000);
    assert_eq!(decision.remaining_cents, 50);
}

#[test]
fn monthly_window_alone_is_sufficient_to_deny() {
    let costs = Arc::new(InMemoryCostStore::new());
    // Spread across the month so the daily window stays clear.
    seed_cost(&costs, 9_950, earlier_this_month());
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&tenant(), 100, now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(BudgetDenyReason::MonthlyBudgetExceeded));
    assert_eq!(decision.remaining_cents, 50);
}

#[test]
fn previous_month_spend_is_excluded() {
    let costs = Arc::new(InMemoryCostStore::new());
    seed_cost(&costs, 9_999, last_month());
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&tenant(), 500, now());
    assert!(decision.allowed);
    assert_eq!(decision.usage_cents, 0);
}

#[test]
fn entry_at_month_start_is_included() {
    let costs = Arc::new(InMemoryCostStore::new());
    let month_start = now().start_of_utc_month().expect("in range");
    seed_cost(&costs, 9_950, month_start);
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&tenant(), 100, now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(BudgetDenyReason::MonthlyBudgetExceeded));
}

#[test]
fn other_tenant_spend_is_invisible() {
    let costs = Arc::new(InMemoryCostStore::new());
    seed_cost(&costs, 950, earlier_today());
    let guard = guard_over(costs, BudgetPolicy::default());
    let decision = guard.check(&TenantId::new("tenant-otro"), 100, now());
    assert!(decision.allowed);
}

// ============================================================================
// SECTION: Fail Closed
// ============================================================================

#[test]
fn ledger_failure_denies_with_budget_check_failed() {
    let guard = guard_over(Arc::new(FailingCostStore), BudgetPolicy::default());
    let decision = guard.check(&tenant(), 1, now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(BudgetDenyReason::BudgetCheckFailed));
}
