// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier delivery engines.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use courier_core::{RetryDiscipline, StrategyKind};
use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Remote service connection settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Local durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Foreground retry engine settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Resumable chunked transfer settings.
    #[serde(default)]
    pub resumable: ResumableConfig,

    /// Durable job queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Strategy selection.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Remote service connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the remote service (scheme + host + optional port).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local durable storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding offsets and delivery jobs.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory where chunk files are staged for background transfer.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            staging_dir: default_staging_dir(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "courier.db".to_string()
}

fn default_staging_dir() -> String {
    "courier-staging".to_string()
}

fn default_true() -> bool {
    true
}

/// Foreground retry engine configuration.
///
/// Defaults reproduce the documented discipline constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Discipline used when a submission does not name one.
    #[serde(default = "default_discipline")]
    pub default_discipline: RetryDiscipline,

    /// Exponential backoff: maximum attempts per submission.
    #[serde(default = "default_backoff_max_attempts")]
    pub backoff_max_attempts: u32,

    /// Exponential backoff: upper bound of the computed delay, in seconds.
    #[serde(default = "default_backoff_cap_secs")]
    pub backoff_cap_secs: u64,

    /// Circuit breaker: maximum attempts per submission.
    #[serde(default = "default_circuit_max_attempts")]
    pub circuit_max_attempts: u32,

    /// Circuit breaker: fixed delay between attempts, in milliseconds.
    #[serde(default = "default_circuit_retry_delay_ms")]
    pub circuit_retry_delay_ms: u64,

    /// Consecutive exhausted submissions that open the breaker.
    #[serde(default = "default_circuit_failure_threshold")]
    pub circuit_failure_threshold: u32,

    /// How long the breaker stays open, in seconds.
    #[serde(default = "default_circuit_cooldown_secs")]
    pub circuit_cooldown_secs: u64,

    /// Idempotency-keyed retry: maximum attempts per submission.
    #[serde(default = "default_idempotent_max_attempts")]
    pub idempotent_max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            default_discipline: default_discipline(),
            backoff_max_attempts: default_backoff_max_attempts(),
            backoff_cap_secs: default_backoff_cap_secs(),
            circuit_max_attempts: default_circuit_max_attempts(),
            circuit_retry_delay_ms: default_circuit_retry_delay_ms(),
            circuit_failure_threshold: default_circuit_failure_threshold(),
            circuit_cooldown_secs: default_circuit_cooldown_secs(),
            idempotent_max_attempts: default_idempotent_max_attempts(),
        }
    }
}

impl RetryConfig {
    pub fn circuit_retry_delay(&self) -> Duration {
        Duration::from_millis(self.circuit_retry_delay_ms)
    }

    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_secs(self.circuit_cooldown_secs)
    }
}

fn default_discipline() -> RetryDiscipline {
    RetryDiscipline::ExponentialBackoff
}

fn default_backoff_max_attempts() -> u32 {
    5
}

fn default_backoff_cap_secs() -> u64 {
    8
}

fn default_circuit_max_attempts() -> u32 {
    3
}

fn default_circuit_retry_delay_ms() -> u64 {
    750
}

fn default_circuit_failure_threshold() -> u32 {
    2
}

fn default_circuit_cooldown_secs() -> u64 {
    15
}

fn default_idempotent_max_attempts() -> u32 {
    4
}

/// Resumable chunked transfer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResumableConfig {
    /// Chunk size in bytes (the last chunk may be shorter).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Retries of a single failed chunk before the whole submission aborts.
    #[serde(default = "default_max_chunk_retries")]
    pub max_chunk_retries: u32,

    /// Base pause before a chunk retry; retry `n` waits `n` times this.
    #[serde(default = "default_chunk_retry_delay_ms")]
    pub chunk_retry_delay_ms: u64,
}

impl Default for ResumableConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_chunk_retries: default_max_chunk_retries(),
            chunk_retry_delay_ms: default_chunk_retry_delay_ms(),
        }
    }
}

impl ResumableConfig {
    pub fn chunk_retry_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_retry_delay_ms)
    }
}

fn default_chunk_size() -> usize {
    512 * 1024
}

fn default_max_chunk_retries() -> u32 {
    5
}

fn default_chunk_retry_delay_ms() -> u64 {
    500
}

/// Durable job queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Pause after any failed delivery before the next drain iteration.
    #[serde(default = "default_failure_pause_ms")]
    pub failure_pause_ms: u64,

    /// Start draining automatically when a job is enqueued.
    #[serde(default = "default_true")]
    pub auto_drain: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            failure_pause_ms: default_failure_pause_ms(),
            auto_drain: true,
        }
    }
}

impl QueueConfig {
    pub fn failure_pause(&self) -> Duration {
        Duration::from_millis(self.failure_pause_ms)
    }
}

fn default_failure_pause_ms() -> u64 {
    1500
}

/// Strategy selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Active strategy (level1..level4).
    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }
}

fn default_strategy() -> StrategyKind {
    StrategyKind::Level2
}
