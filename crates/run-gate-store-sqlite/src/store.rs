// crates/run-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Gateway Store
// Description: Durable run records and cost ledger backed by SQLite WAL.
// Purpose: Enforce idempotency-key uniqueness at the write and serve
//          windowed spend sums from an immutable ledger.
// Dependencies: run-gate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! One SQLite database holds two append-only tables. The `runs` table
//! carries a UNIQUE constraint on the idempotency key: a losing concurrent
//! writer's insert fails on constraint violation and is surfaced as a typed
//! duplicate error so the executor can reconcile to the winner's record.
//! The `costs` table is summed by tenant over half-open windows keyed on
//! `created_at`.
//!
//! Connection access is serialized through a mutex; WAL journaling with a
//! busy timeout covers concurrent readers in other processes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use run_gate_core::CostEntry;
use run_gate_core::CostMeta;
use run_gate_core::CostStore;
use run_gate_core::IdempotencyKey;
use run_gate_core::Provider;
use run_gate_core::RunId;
use run_gate_core::RunRecord;
use run_gate_core::RunStatus;
use run_gate_core::RunStore;
use run_gate_core::StoreError;
use run_gate_core::TenantId;
use run_gate_core::Timestamp;
use run_gate_core::ToolKind;
use run_gate_core::UserId;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// SQLite schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// SQLite journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to SQLite `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the SQLite pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// SQLite sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to SQLite `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the SQLite pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the SQLite gateway store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// SQLite journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// SQLite sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default pragmas.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for SQLite connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// SQLite store errors.
///
/// # Invariants
/// - Error messages avoid embedding record payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// SQLite engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Record serialization error.
    #[error("sqlite store serialization error: {0}")]
    Serialization(String),
    /// Insert collided with an existing idempotency key.
    #[error("sqlite store conflict: duplicate idempotency key")]
    DuplicateIdempotencyKey,
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version found in `store_meta`.
        found: i64,
        /// Version this build expects.
        expected: i64,
    },
    /// Invalid stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Serialization(message) => Self::Serialization(message),
            SqliteStoreError::DuplicateIdempotencyKey => Self::DuplicateIdempotencyKey,
            SqliteStoreError::VersionMismatch { found, expected } => {
                Self::Invalid(format!("schema version mismatch: found {found}, expected {expected}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed run record store and cost ledger.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Both tables are append-only; no UPDATE or DELETE statement exists in
///   this module.
#[derive(Clone)]
pub struct SqliteGatewayStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteGatewayStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGatewayStore").finish_non_exhaustive()
    }
}

impl SqliteGatewayStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened, the
    /// pragmas cannot be applied, or the schema version mismatches.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let mut connection =
            Connection::open(&config.path).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Locks the connection, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("store mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Applies journal, sync, and busy-timeout pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "synchronous", config.sync_mode.pragma_value())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the SQLite schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS runs (
                    id TEXT NOT NULL PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    user_id TEXT,
                    tool TEXT NOT NULL,
                    provider TEXT NOT NULL,
                    model TEXT NOT NULL,
                    latency_ms INTEGER NOT NULL,
                    cost_cents INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    input_json BLOB NOT NULL,
                    result_json BLOB NOT NULL,
                    idempotency_key TEXT NOT NULL UNIQUE,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_runs_tenant_created
                    ON runs (tenant_id, created_at);
                CREATE TABLE IF NOT EXISTS costs (
                    tenant_id TEXT NOT NULL,
                    provider TEXT NOT NULL,
                    cost_cents INTEGER NOT NULL,
                    meta_json BLOB NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_costs_tenant_created
                    ON costs (tenant_id, created_at);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch { found, expected: SCHEMA_VERSION });
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Converts a u64 counter into the i64 SQLite domain.
fn to_db_i64(value: u64, field: &'static str) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("{field} exceeds i64 range")))
}

/// Converts an i64 column back into the u64 counter domain.
fn from_db_i64(value: i64, field: &'static str) -> Result<u64, SqliteStoreError> {
    u64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("{field} is negative in store")))
}

/// Parses a stable label column through `parse`.
fn parse_label_column<T>(
    label: &str,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, SqliteStoreError> {
    parse(label)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("unknown {field} label in store")))
}

/// Flat row shape read back from the `runs` table.
struct RunRow {
    /// `id` column.
    id: String,
    /// `tenant_id` column.
    tenant_id: String,
    /// `user_id` column.
    user_id: Option<String>,
    /// `tool` column.
    tool: String,
    /// `provider` column.
    provider: String,
    /// `model` column.
    model: String,
    /// `latency_ms` column.
    latency_ms: i64,
    /// `cost_cents` column.
    cost_cents: i64,
    /// `status` column.
    status: String,
    /// `input_json` column.
    input_json: Vec<u8>,
    /// `result_json` column.
    result_json: Vec<u8>,
    /// `idempotency_key` column.
    idempotency_key: String,
    /// `created_at` column.
    created_at: i64,
}

/// Rebuilds a typed record from a stored row.
fn record_from_row(row: RunRow) -> Result<RunRecord, SqliteStoreError> {
    let input = serde_json::from_slice(&row.input_json)
        .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?;
    let result = serde_json::from_slice(&row.result_json)
        .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?;
    let idempotency_key = IdempotencyKey::parse(&row.idempotency_key)
        .map_err(|err| SqliteStoreError::Invalid(format!("stored idempotency key: {err}")))?;
    Ok(RunRecord {
        id: RunId::new(row.id),
        tenant_id: TenantId::new(row.tenant_id),
        user_id: row.user_id.map(UserId::new),
        tool: parse_label_column(&row.tool, "tool", ToolKind::parse_label)?,
        provider: parse_label_column(&row.provider, "provider", Provider::parse_label)?,
        model: row.model,
        latency_ms: from_db_i64(row.latency_ms, "latency_ms")?,
        cost_cents: from_db_i64(row.cost_cents, "cost_cents")?,
        status: parse_label_column(&row.status, "status", RunStatus::parse_label)?,
        input,
        result,
        idempotency_key,
        created_at: Timestamp::from_unix_millis(row.created_at),
    })
}

// ============================================================================
// SECTION: Run Store
// ============================================================================

impl SqliteGatewayStore {
    /// Looks up a run record by idempotency key.
    fn find_run(&self, key: &IdempotencyKey) -> Result<Option<RunRecord>, SqliteStoreError> {
        let connection = self.lock()?;
        let row = connection
            .query_row(
                "SELECT id, tenant_id, user_id, tool, provider, model, latency_ms, cost_cents,
                        status, input_json, result_json, idempotency_key, created_at
                 FROM runs WHERE idempotency_key = ?1",
                params![key.as_str()],
                |row| {
                    Ok(RunRow {
                        id: row.get(0)?,
                        tenant_id: row.get(1)?,
                        user_id: row.get(2)?,
                        tool: row.get(3)?,
                        provider: row.get(4)?,
                        model: row.get(5)?,
                        latency_ms: row.get(6)?,
                        cost_cents: row.get(7)?,
                        status: row.get(8)?,
                        input_json: row.get(9)?,
                        result_json: row.get(10)?,
                        idempotency_key: row.get(11)?,
                        created_at: row.get(12)?,
                    })
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        row.map(record_from_row).transpose()
    }

    /// Inserts one run record, surfacing key collisions as typed conflicts.
    fn insert_run_record(&self, record: &RunRecord) -> Result<(), SqliteStoreError> {
        let input_json = serde_json::to_vec(&record.input)
            .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?;
        let result_json = serde_json::to_vec(&record.result)
            .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?;
        let connection = self.lock()?;
        let outcome = connection.execute(
            "INSERT INTO runs (id, tenant_id, user_id, tool, provider, model, latency_ms,
                               cost_cents, status, input_json, result_json, idempotency_key,
                               created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.id.as_str(),
                record.tenant_id.as_str(),
                record.user_id.as_ref().map(|user| user.as_str().to_string()),
                record.tool.as_str(),
                record.provider.as_str(),
                record.model,
                to_db_i64(record.latency_ms, "latency_ms")?,
                to_db_i64(record.cost_cents, "cost_cents")?,
                record.status.as_str(),
                input_json,
                result_json,
                record.idempotency_key.as_str(),
                record.created_at.as_unix_millis(),
            ],
        );
        match outcome {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(SqliteStoreError::DuplicateIdempotencyKey)
            }
            Err(err) => Err(SqliteStoreError::Db(err.to_string())),
        }
    }
}

impl RunStore for SqliteGatewayStore {
    fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<RunRecord>, StoreError> {
        self.find_run(key).map_err(StoreError::from)
    }

    fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.insert_run_record(record).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Cost Store
// ============================================================================

impl SqliteGatewayStore {
    /// Appends one cost entry.
    fn append_cost_entry(&self, entry: &CostEntry) -> Result<(), SqliteStoreError> {
        let meta_json = serde_json::to_vec(&entry.meta)
            .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?;
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO costs (tenant_id, provider, cost_cents, meta_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.tenant_id.as_str(),
                    entry.provider.as_str(),
                    to_db_i64(entry.cost_cents, "cost_cents")?,
                    meta_json,
                    entry.created_at.as_unix_millis(),
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Sums a tenant's spend for entries created at or after `since`.
    fn sum_costs(&self, tenant_id: &TenantId, since: Timestamp) -> Result<u64, SqliteStoreError> {
        let connection = self.lock()?;
        let total: i64 = connection
            .query_row(
                "SELECT COALESCE(SUM(cost_cents), 0) FROM costs
                 WHERE tenant_id = ?1 AND created_at >= ?2",
                params![tenant_id.as_str(), since.as_unix_millis()],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        from_db_i64(total, "cost sum")
    }

    /// Reads the meta of every entry for `tenant_id`, oldest first.
    ///
    /// Diagnostic read used by tests and operational tooling; the ledger
    /// itself stays append-only.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query or deserialization fails.
    pub fn cost_metas(&self, tenant_id: &TenantId) -> Result<Vec<CostMeta>, SqliteStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT meta_json FROM costs WHERE tenant_id = ?1 ORDER BY created_at ASC, rowid ASC",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![tenant_id.as_str()], |row| row.get::<_, Vec<u8>>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut metas = Vec::new();
        for row in rows {
            let bytes = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            metas.push(
                serde_json::from_slice(&bytes)
                    .map_err(|err| SqliteStoreError::Serialization(err.to_string()))?,
            );
        }
        Ok(metas)
    }
}

impl CostStore for SqliteGatewayStore {
    fn append_cost(&self, entry: &CostEntry) -> Result<(), StoreError> {
        self.append_cost_entry(entry).map_err(StoreError::from)
    }

    fn sum_cents_since(&self, tenant_id: &TenantId, since: Timestamp) -> Result<u64, StoreError> {
        self.sum_costs(tenant_id, since).map_err(StoreError::from)
    }
}
