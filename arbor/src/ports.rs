#![deny(clippy::all)]

use async_trait::async_trait;
use shared::{Result, TtlSecs};
use thiserror::Error;

// Ports are the pluggable extension points for external collaborators

/// Port for a networked key-value store (Redis or compatible).
///
/// Implementations report every failure through `shared::Error`; callers
/// decide whether to surface or swallow it.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with an expiry.
    async fn set_ex(&self, key: &str, value: String, ttl: TtlSecs) -> Result<()>;

    /// Delete keys, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// Keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remaining TTL in seconds using the store's conventions
    /// (-1 = no expiry, -2 = key not found).
    async fn ttl(&self, key: &str) -> Result<i64>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()>;

    async fn incr(&self, key: &str) -> Result<i64>;

    async fn decr(&self, key: &str) -> Result<i64>;

    /// Close the connection. Must be safe to call repeatedly.
    async fn quit(&self) -> Result<()>;
}

/// Failures surfaced by the persistence layer, grouped by how they are reported.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Malformed query arguments; carries the engine's diagnostic text.
    #[error("{0}")]
    Validation(String),

    /// The database could not be opened or reached.
    #[error("database initialization failed: {0}")]
    Initialization(String),

    /// The storage engine itself is in an unrecoverable state.
    #[error("storage engine failure: {0}")]
    EngineCritical(String),

    /// A unique index already holds the value.
    #[error("unique constraint failed on the field: `{0}`")]
    UniqueViolation(String),

    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<sled::Error> for RepositoryError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Corruption { .. } | sled::Error::ReportableBug(_) => {
                RepositoryError::EngineCritical(err.to_string())
            }
            other => RepositoryError::Unknown(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Unknown(err.to_string())
    }
}
