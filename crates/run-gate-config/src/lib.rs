// crates/run-gate-config/src/lib.rs
// ============================================================================
// Module: Run Gate Configuration
// Description: Canonical configuration model, loading, and validation.
// Purpose: Give hosts one validated config value to inject at construction.
// Dependencies: run-gate-core, run-gate-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The gateway host consumes one [`GatewayConfig`]: execution mode, error
//! detail gating, embeddings dimension, store location, bind address, and
//! default budget policy. Configuration is loaded from a TOML document
//! and/or environment overrides supplied by the caller. This crate never
//! reads the process environment itself, so both sources stay testable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;

use run_gate_core::BudgetPolicy;
use run_gate_core::ExecutionMode;
use run_gate_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default embeddings dimension.
pub const DEFAULT_EMBEDDINGS_DIMENSION: usize = 768;

/// Default store path.
pub const DEFAULT_STORE_PATH: &str = "run-gate.db";

/// Default server bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Environment variable prefix shared by all overrides.
const ENV_PREFIX: &str = "RUN_GATE_";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config document could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A config field failed validation.
    #[error("invalid config field {field}: {message}")]
    Invalid {
        /// Offending field path.
        field: &'static str,
        /// Validation detail.
        message: String,
    },
    /// An environment override could not be interpreted.
    #[error("invalid environment override {var}: {message}")]
    InvalidEnv {
        /// Offending variable name.
        var: String,
        /// Interpretation detail.
        message: String,
    },
}

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Deployment environment, gating error detail in responses.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Development: detailed failure messages are returned to callers.
    #[default]
    Development,
    /// Production: callers receive generic failure messages only.
    Production,
}

impl Environment {
    /// Returns the stable label for the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Parses a label into an environment (returns `None` when unknown).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        [Self::Development, Self::Production].into_iter().find(|env| env.as_str() == label)
    }
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// HTTP server section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

/// Returns the default bind address.
fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

/// Budget defaults section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BudgetConfig {
    /// Default monthly budget, in cents.
    #[serde(default = "default_monthly_budget_cents")]
    pub monthly_budget_cents: u64,
    /// Default daily budget, in cents.
    #[serde(default = "default_daily_budget_cents")]
    pub daily_budget_cents: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_budget_cents: default_monthly_budget_cents(),
            daily_budget_cents: default_daily_budget_cents(),
        }
    }
}

/// Returns the default monthly budget in cents.
const fn default_monthly_budget_cents() -> u64 {
    run_gate_core::DEFAULT_MONTHLY_BUDGET_CENTS
}

/// Returns the default daily budget in cents.
const fn default_daily_budget_cents() -> u64 {
    run_gate_core::DEFAULT_DAILY_BUDGET_CENTS
}

// ============================================================================
// SECTION: Gateway Config
// ============================================================================

/// Canonical gateway configuration.
///
/// # Invariants
/// - Values are validated before the config reaches any constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
    /// Whether real provider execution is enabled (live mode).
    #[serde(default)]
    pub execution_enabled: bool,
    /// Embeddings dimension advertised to the platform.
    #[serde(default = "default_embeddings_dimension")]
    pub embeddings_dimension: usize,
    /// Durable store configuration.
    #[serde(default = "default_store_config")]
    pub store: SqliteStoreConfig,
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Default budget policy applied to every tenant.
    #[serde(default)]
    pub budget: BudgetConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            execution_enabled: false,
            embeddings_dimension: default_embeddings_dimension(),
            store: default_store_config(),
            server: ServerConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

/// Returns the default embeddings dimension.
const fn default_embeddings_dimension() -> usize {
    DEFAULT_EMBEDDINGS_DIMENSION
}

/// Returns the default store configuration.
fn default_store_config() -> SqliteStoreConfig {
    SqliteStoreConfig::for_path(DEFAULT_STORE_PATH)
}

impl GatewayConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on read, parse, or validation failure.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_toml_str(&document)
    }

    /// Applies environment overrides through a caller-supplied lookup.
    ///
    /// Recognized variables: `RUN_GATE_ENV`, `RUN_GATE_EXECUTION_ENABLED`,
    /// `RUN_GATE_EMBEDDINGS_DIM`, `RUN_GATE_DB_PATH`, `RUN_GATE_BIND_ADDR`,
    /// `RUN_GATE_MONTHLY_BUDGET_CENTS`, `RUN_GATE_DAILY_BUDGET_CENTS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override fails to parse or the
    /// resulting config fails validation.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup_var(&lookup, "ENV") {
            self.environment = Environment::parse_label(&raw).ok_or_else(|| invalid_env(
                "ENV",
                format!("unknown environment: {raw}"),
            ))?;
        }
        if let Some(raw) = lookup_var(&lookup, "EXECUTION_ENABLED") {
            self.execution_enabled = parse_bool("EXECUTION_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup_var(&lookup, "EMBEDDINGS_DIM") {
            self.embeddings_dimension = raw
                .parse()
                .map_err(|_| invalid_env("EMBEDDINGS_DIM", format!("not an integer: {raw}")))?;
        }
        if let Some(raw) = lookup_var(&lookup, "DB_PATH") {
            self.store.path = raw.into();
        }
        if let Some(raw) = lookup_var(&lookup, "BIND_ADDR") {
            self.server.bind_addr = raw;
        }
        if let Some(raw) = lookup_var(&lookup, "MONTHLY_BUDGET_CENTS") {
            self.budget.monthly_budget_cents = raw.parse().map_err(|_| {
                invalid_env("MONTHLY_BUDGET_CENTS", format!("not an integer: {raw}"))
            })?;
        }
        if let Some(raw) = lookup_var(&lookup, "DAILY_BUDGET_CENTS") {
            self.budget.daily_budget_cents = raw
                .parse()
                .map_err(|_| invalid_env("DAILY_BUDGET_CENTS", format!("not an integer: {raw}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validates every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embeddings_dimension == 0 {
            return Err(ConfigError::Invalid {
                field: "embeddings_dimension",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.path",
                message: "must be non-empty".to_string(),
            });
        }
        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "server.bind_addr",
                message: format!("not a socket address: {}", self.server.bind_addr),
            });
        }
        if self.budget.monthly_budget_cents == 0 {
            return Err(ConfigError::Invalid {
                field: "budget.monthly_budget_cents",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.budget.daily_budget_cents == 0 {
            return Err(ConfigError::Invalid {
                field: "budget.daily_budget_cents",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.budget.daily_budget_cents > self.budget.monthly_budget_cents {
            return Err(ConfigError::Invalid {
                field: "budget.daily_budget_cents",
                message: "must not exceed the monthly budget".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the execution mode implied by the enabled flag.
    #[must_use]
    pub const fn execution_mode(&self) -> ExecutionMode {
        if self.execution_enabled { ExecutionMode::Live } else { ExecutionMode::Mock }
    }

    /// Returns the default budget policy value.
    #[must_use]
    pub const fn budget_policy(&self) -> BudgetPolicy {
        BudgetPolicy {
            monthly_budget_cents: self.budget.monthly_budget_cents,
            daily_budget_cents: self.budget.daily_budget_cents,
        }
    }
}

// ============================================================================
// SECTION: Override Helpers
// ============================================================================

/// Looks up a prefixed override variable.
fn lookup_var(lookup: &impl Fn(&str) -> Option<String>, suffix: &str) -> Option<String> {
    lookup(&format!("{ENV_PREFIX}{suffix}"))
}

/// Builds an invalid-override error with the prefixed variable name.
fn invalid_env(suffix: &str, message: String) -> ConfigError {
    ConfigError::InvalidEnv { var: format!("{ENV_PREFIX}{suffix}"), message }
}

/// Parses a boolean override accepting `true/false/1/0`.
fn parse_bool(suffix: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(invalid_env(suffix, format!("not a boolean: {other}"))),
    }
}
