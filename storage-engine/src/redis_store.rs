use arbor::ports::KeyValueStore;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, RedisError};
use shared::config::RedisSettings;
use shared::{Error, Result, TtlSecs};
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Redis-backed store sharing one multiplexed connection.
///
/// The connection is opened on first use. Commands run on clones of the
/// `ConnectionManager`, so the mutex only guards connection setup and
/// teardown.
pub struct RedisStore {
    client: Client,
    settings: RedisSettings,
    connection: Mutex<Option<ConnectionManager>>,
    closed: AtomicBool,
}

impl RedisStore {
    pub fn new(settings: RedisSettings) -> Result<Self> {
        let client = Client::open(settings.url()).map_err(map_redis_error)?;

        Ok(Self {
            client,
            settings,
            connection: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_factor(RedisSettings::RETRY_FACTOR_MS)
            .set_exponent_base(RedisSettings::RETRY_EXPONENT_BASE)
            .set_max_delay(RedisSettings::RETRY_MAX_DELAY_MS)
            .set_number_of_retries(RedisSettings::MAX_RETRIES)
            .set_response_timeout(self.settings.response_timeout)
            .set_connection_timeout(self.settings.connection_timeout)
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        let mut guard = self.connection.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }

        let manager = ConnectionManager::new_with_config(self.client.clone(), self.manager_config())
            .await
            .map_err(|e| {
                warn!("Redis connection to {} failed: {}", self.settings.url(), e);
                map_redis_error(e)
            })?;

        // quit() may have run while we were connecting
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        info!("Connected to Redis at {}", self.settings.url());
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

fn map_redis_error(err: RedisError) -> Error {
    if err.code() == Some("WRONGTYPE") {
        return Error::WrongType(err.to_string());
    }
    if err.is_timeout() || err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        return Error::Connection(err.to_string());
    }
    match err.kind() {
        redis::ErrorKind::TypeError => Error::Serialization(err.to_string()),
        redis::ErrorKind::ResponseError if err.to_string().contains("not an integer") => {
            Error::NotAnInteger(err.to_string())
        }
        _ => Error::Internal(err.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: TtlSecs) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.set_ex(key, value, ttl.0).await.map_err(map_redis_error)
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut conn = self.connection().await?;
        conn.del(keys).await.map_err(map_redis_error)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        conn.keys(pattern).await.map_err(map_redis_error)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(key).await.map_err(map_redis_error)
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        conn.ttl(key).await.map_err(map_redis_error)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        conn.hget(key, field).await.map_err(map_redis_error)
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.hset(key, field, value).await.map_err(map_redis_error)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        conn.incr(key, 1).await.map_err(map_redis_error)
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        conn.decr(key, 1).await.map_err(map_redis_error)
    }

    async fn quit(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Dropping the last manager clone closes the socket
        if self.connection.lock().await.take().is_some() {
            info!("Disconnected from Redis at {}", self.settings.url());
        }
        Ok(())
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &self.settings.url())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quit_without_connection_is_idempotent() {
        let store = RedisStore::new(RedisSettings::default()).unwrap();

        store.quit().await.unwrap();
        store.quit().await.unwrap();

        // Closed stores refuse work without touching the network
        assert!(matches!(store.get("anything").await, Err(Error::Closed)));
        assert!(matches!(store.incr("counter").await, Err(Error::Closed)));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let settings = RedisSettings {
            host: "bad host name".to_string(),
            ..RedisSettings::default()
        };
        assert!(RedisStore::new(settings).is_err());
    }
}
