// crates/run-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared builders and store doubles for core pipeline tests.
// Purpose: Keep executor, guard, and validator tests on one fixture set.
// Dependencies: run-gate-core
// ============================================================================

//! ## Overview
//! Request builders, a pinned test clock, and store doubles (failing and
//! racing variants) shared across the core test binaries.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Fixtures are shared across test binaries; not all are used by each."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use run_gate_core::BudgetGuard;
use run_gate_core::BudgetPolicy;
use run_gate_core::CostEntry;
use run_gate_core::CostMeta;
use run_gate_core::CostStore;
use run_gate_core::ExecutionMode;
use run_gate_core::FixedBudgetPolicyResolver;
use run_gate_core::IdempotencyKey;
use run_gate_core::InMemoryCostStore;
use run_gate_core::InMemoryRunStore;
use run_gate_core::ManualClock;
use run_gate_core::MockSynthesizer;
use run_gate_core::Provider;
use run_gate_core::RawRunContext;
use run_gate_core::RawRunPolicy;
use run_gate_core::RawRunRequest;
use run_gate_core::RedactionPipeline;
use run_gate_core::RunGateway;
use run_gate_core::RunId;
use run_gate_core::RunRecord;
use run_gate_core::RunStore;
use run_gate_core::StoreError;
use run_gate_core::TenantId;
use run_gate_core::Timestamp;
use run_gate_core::ToolKind;

/// Pinned test instant: 2026-03-17T15:42:11.500Z.
pub const NOW_MILLIS: i64 = 1_773_762_131_500;

/// A canonical idempotency key used across scenarios.
pub const KEY_A: &str = "0c5bafa3-88a1-4b49-9b67-3f33df3bd0ef";

/// A second canonical idempotency key.
pub const KEY_B: &str = "7d9e2c41-5b0a-4f8e-a1c2-9d3f4e5a6b7c";

/// Default test tenant.
pub const TENANT: &str = "tenant-andes";

/// Returns the pinned test instant.
pub fn now() -> Timestamp {
    Timestamp::from_unix_millis(NOW_MILLIS)
}

/// Builds a raw request for `tool` with the default tenant.
pub fn raw_request(tool: &str, key: &str) -> RawRunRequest {
    RawRunRequest {
        tool: Some(tool.to_string()),
        input: None,
        context: Some(RawRunContext {
            tenant_id: Some(TENANT.to_string()),
            ..RawRunContext::default()
        }),
        policy: None,
        idempotency_key: Some(key.to_string()),
    }
}

/// Builds a raw request carrying an admission estimate in cents.
pub fn raw_request_with_estimate(tool: &str, key: &str, estimate_cents: i64) -> RawRunRequest {
    let mut raw = raw_request(tool, key);
    raw.policy =
        Some(RawRunPolicy { budget_cents: Some(estimate_cents), ..RawRunPolicy::default() });
    raw
}

/// Appends a zero-meta cost entry for the default tenant.
pub fn seed_cost(costs: &InMemoryCostStore, cents: u64, at: Timestamp) {
    costs
        .append_cost(&CostEntry {
            tenant_id: TenantId::new(TENANT),
            provider: Provider::Mock,
            cost_cents: cents,
            meta: CostMeta { run_id: RunId::generate(), tool: ToolKind::AnalyzeSession },
            created_at: at,
        })
        .expect("seed cost entry");
}

/// Bundled gateway fixture with handles to its collaborators.
pub struct GatewayFixture {
    /// The gateway under test.
    pub gateway: RunGateway,
    /// Shared run store handle.
    pub runs: Arc<InMemoryRunStore>,
    /// Shared cost ledger handle.
    pub costs: Arc<InMemoryCostStore>,
    /// Shared clock handle.
    pub clock: Arc<ManualClock>,
}

/// Builds a gateway over in-memory stores with the default policy.
pub fn gateway(mode: ExecutionMode) -> GatewayFixture {
    gateway_with_policy(mode, BudgetPolicy::default())
}

/// Builds a gateway over in-memory stores with an explicit budget policy.
pub fn gateway_with_policy(mode: ExecutionMode, policy: BudgetPolicy) -> GatewayFixture {
    let runs = Arc::new(InMemoryRunStore::new());
    let costs = Arc::new(InMemoryCostStore::new());
    let clock = Arc::new(ManualClock::new(now()));
    let guard = BudgetGuard::new(
        Arc::clone(&costs) as Arc<dyn CostStore>,
        Arc::new(FixedBudgetPolicyResolver::new(policy)),
    );
    let gateway = RunGateway::new(
        Arc::clone(&runs) as Arc<dyn RunStore>,
        Arc::clone(&costs) as Arc<dyn CostStore>,
        guard,
        Arc::new(MockSynthesizer::new(mode)),
        RedactionPipeline::standard().expect("standard rules compile"),
        Arc::clone(&clock) as Arc<dyn run_gate_core::Clock>,
    );
    GatewayFixture { gateway, runs, costs, clock }
}

/// Builds a gateway over explicit store doubles with the default policy.
pub fn gateway_over(
    runs: Arc<dyn RunStore>,
    costs: Arc<dyn CostStore>,
    mode: ExecutionMode,
) -> RunGateway {
    let guard = BudgetGuard::new(
        Arc::clone(&costs),
        Arc::new(FixedBudgetPolicyResolver::new(BudgetPolicy::default())),
    );
    RunGateway::new(
        runs,
        costs,
        guard,
        Arc::new(MockSynthesizer::new(mode)),
        RedactionPipeline::standard().expect("standard rules compile"),
        Arc::new(ManualClock::new(now())),
    )
}

/// Cost store whose sum query always fails.
#[derive(Debug, Default)]
pub struct FailingCostStore;

impl CostStore for FailingCostStore {
    fn append_cost(&self, _entry: &CostEntry) -> Result<(), StoreError> {
        Err(StoreError::Db("ledger unavailable".to_string()))
    }

    fn sum_cents_since(&self, _tenant_id: &TenantId, _since: Timestamp) -> Result<u64, StoreError> {
        Err(StoreError::Db("ledger unavailable".to_string()))
    }
}

/// Cost store whose sums succeed (zero spend) but whose appends fail.
#[derive(Debug, Default)]
pub struct AppendFailingCostStore;

impl CostStore for AppendFailingCostStore {
    fn append_cost(&self, _entry: &CostEntry) -> Result<(), StoreError> {
        Err(StoreError::Db("ledger write refused".to_string()))
    }

    fn sum_cents_since(&self, _tenant_id: &TenantId, _since: Timestamp) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Run store that counts lookups and reports "absent" on the first one,
/// simulating the losing side of a concurrent same-key race.
pub struct RacingRunStore {
    /// Backing store holding the winner's record.
    pub inner: InMemoryRunStore,
    /// Number of lookups observed.
    pub lookups: AtomicUsize,
}

impl RacingRunStore {
    /// Creates the store pre-seeded with the winner's record.
    pub fn seeded_with(winner: &RunRecord) -> Self {
        let inner = InMemoryRunStore::new();
        inner.insert_run(winner).expect("seed winner record");
        Self { inner, lookups: AtomicUsize::new(0) }
    }
}

impl RunStore for RacingRunStore {
    fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(None);
        }
        self.inner.find_by_idempotency_key(key)
    }

    fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.inner.insert_run(record)
    }
}

/// Run store whose writes always fail without a key conflict.
#[derive(Debug, Default)]
pub struct WriteFailingRunStore;

impl RunStore for WriteFailingRunStore {
    fn find_by_idempotency_key(
        &self,
        _key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError> {
        Ok(None)
    }

    fn insert_run(&self, _record: &RunRecord) -> Result<(), StoreError> {
        Err(StoreError::Db("runs table unavailable".to_string()))
    }
}

/// Run store that panics on any access; proves a stage was never reached.
#[derive(Debug, Default)]
pub struct UnreachableRunStore;

impl RunStore for UnreachableRunStore {
    fn find_by_idempotency_key(
        &self,
        _key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError> {
        panic!("run store must not be reached");
    }

    fn insert_run(&self, _record: &RunRecord) -> Result<(), StoreError> {
        panic!("run store must not be reached");
    }
}
