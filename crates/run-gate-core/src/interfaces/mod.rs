// crates/run-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Run Gate Interfaces
// Description: Backend-agnostic interfaces for storage, time, and policy.
// Purpose: Define the contract surfaces the runtime pipeline depends on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Run Gate integrates with its persistent store and
//! host environment without embedding backend specifics. Implementations
//! must be deterministic for identical inputs and fail closed on missing or
//! invalid data. In-memory implementations live here for tests and
//! fixtures; the durable implementations live in the SQLite store crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use thiserror::Error;

use crate::core::budget::BudgetPolicy;
use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::TenantId;
use crate::core::record::CostEntry;
use crate::core::record::RunRecord;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Store errors shared by all backends.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid embedding record payloads.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Store engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Record serialization error.
    #[error("store serialization error: {0}")]
    Serialization(String),
    /// Insert collided with an existing idempotency key.
    #[error("duplicate idempotency key")]
    DuplicateIdempotencyKey,
    /// Invalid stored data.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// Append-only store of completed run records.
///
/// # Invariants
/// - `insert_run` enforces idempotency-key uniqueness and surfaces
///   collisions as [`StoreError::DuplicateIdempotencyKey`].
/// - Records are never mutated or deleted.
pub trait RunStore: Send + Sync {
    /// Looks up a prior completed run by idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError>;

    /// Inserts one run record, failing on idempotency-key collision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateIdempotencyKey`] on collision, other
    /// [`StoreError`] variants on infrastructure failure.
    fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Cost Store
// ============================================================================

/// Append-only spend ledger with time-windowed sums.
///
/// # Invariants
/// - Entries are never mutated or deleted.
/// - `sum_cents_since` includes entries created exactly at `since`.
pub trait CostStore: Send + Sync {
    /// Appends one cost entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails.
    fn append_cost(&self, entry: &CostEntry) -> Result<(), StoreError>;

    /// Sums a tenant's spend in cents for entries created at or after
    /// `since`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the sum query fails; the budget guard
    /// treats that as a fail-closed denial.
    fn sum_cents_since(&self, tenant_id: &TenantId, since: Timestamp) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Host-supplied time source.
///
/// The core never reads wall-clock time directly; hosts inject a clock so
/// budget windows and record timestamps are replayable under test.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Manually-driven clock for tests and fixtures.
#[derive(Debug)]
pub struct ManualClock {
    /// Current instant in unix milliseconds.
    now_millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock pinned at `now`.
    #[must_use]
    pub const fn new(now: Timestamp) -> Self {
        Self { now_millis: AtomicI64::new(now.as_unix_millis()) }
    }

    /// Re-pins the clock at `now`.
    pub fn set(&self, now: Timestamp) {
        self.now_millis.store(now.as_unix_millis(), Ordering::SeqCst);
    }

    /// Advances the clock by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.now_millis.load(Ordering::SeqCst))
    }
}

// ============================================================================
// SECTION: Budget Policy Resolution
// ============================================================================

/// Per-tenant budget policy resolution.
///
/// # Invariants
/// - Resolution must be deterministic for identical inputs.
/// - A resolution failure is treated as a fail-closed budget denial.
pub trait BudgetPolicyResolver: Send + Sync {
    /// Resolves the budget policy for `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the policy cannot be resolved.
    fn resolve(&self, tenant_id: &TenantId) -> Result<BudgetPolicy, StoreError>;
}

/// Resolver returning one fixed policy for every tenant.
#[derive(Debug, Clone)]
pub struct FixedBudgetPolicyResolver {
    /// Policy applied to all tenants.
    policy: BudgetPolicy,
}

impl FixedBudgetPolicyResolver {
    /// Creates a resolver with the given policy.
    #[must_use]
    pub const fn new(policy: BudgetPolicy) -> Self {
        Self { policy }
    }
}

impl BudgetPolicyResolver for FixedBudgetPolicyResolver {
    fn resolve(&self, _tenant_id: &TenantId) -> Result<BudgetPolicy, StoreError> {
        Ok(self.policy)
    }
}

// ============================================================================
// SECTION: In-Memory Stores
// ============================================================================

/// In-memory run store for tests and fixtures.
///
/// # Invariants
/// - Enforces idempotency-key uniqueness like the durable store.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    /// Stored records in insertion order.
    records: Mutex<Vec<RunRecord>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the store mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Returns whether the store is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Locks the record vector, mapping poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<RunRecord>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::Db("run store mutex poisoned".to_string()))
    }
}

impl RunStore for InMemoryRunStore {
    fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError> {
        Ok(self.lock()?.iter().find(|record| record.idempotency_key == *key).cloned())
    }

    fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        if records.iter().any(|existing| existing.idempotency_key == record.idempotency_key) {
            return Err(StoreError::DuplicateIdempotencyKey);
        }
        records.push(record.clone());
        Ok(())
    }
}

/// In-memory cost ledger for tests and fixtures.
#[derive(Debug, Default)]
pub struct InMemoryCostStore {
    /// Stored entries in insertion order.
    entries: Mutex<Vec<CostEntry>>,
}

impl InMemoryCostStore {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the ledger mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Returns whether the ledger is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the ledger mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Locks the entry vector, mapping poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<CostEntry>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Db("cost ledger mutex poisoned".to_string()))
    }
}

impl CostStore for InMemoryCostStore {
    fn append_cost(&self, entry: &CostEntry) -> Result<(), StoreError> {
        self.lock()?.push(entry.clone());
        Ok(())
    }

    fn sum_cents_since(&self, tenant_id: &TenantId, since: Timestamp) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|entry| entry.tenant_id == *tenant_id && entry.created_at >= since)
            .fold(0_u64, |acc, entry| acc.saturating_add(entry.cost_cents)))
    }
}
