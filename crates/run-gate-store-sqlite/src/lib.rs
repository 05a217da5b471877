// crates/run-gate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Run Gate SQLite Store
// Description: Durable RunStore and CostStore backed by SQLite WAL.
// Purpose: Persist immutable run records and cost entries for replay and
//          budget windows.
// Dependencies: run-gate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Durable implementations of the core store interfaces over one SQLite
//! database: an append-only `runs` table with a unique idempotency-key
//! constraint, and an append-only `costs` table with time-windowed sums by
//! tenant. Neither table has an UPDATE or DELETE path.

mod store;

pub use crate::store::SCHEMA_VERSION;
pub use crate::store::SqliteGatewayStore;
pub use crate::store::SqliteJournalMode;
pub use crate::store::SqliteStoreConfig;
pub use crate::store::SqliteStoreError;
pub use crate::store::SqliteSyncMode;
