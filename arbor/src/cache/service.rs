use super::outcome::CacheOutcome;
use crate::ports::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::TtlSecs;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::error;

/// Best-effort cache over a key-value store.
///
/// Every operation catches store failures, logs them with the operation and
/// key, and returns a safe default. Values are JSON text in the store.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    default_ttl: TtlSecs,
}

impl CacheService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_default_ttl(store, TtlSecs::default())
    }

    pub fn with_default_ttl(store: Arc<dyn KeyValueStore>, default_ttl: TtlSecs) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> TtlSecs {
        self.default_ttl
    }

    /// Read and decode a value. Missing keys, store failures and undecodable
    /// values all come back as `None`.
    pub async fn get<V: DeserializeOwned>(&self, key: &str) -> CacheOutcome<Option<V>> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<V>(&raw) {
                Ok(value) => CacheOutcome::Hit(Some(value)),
                Err(e) => {
                    error!("Cache get error for key {}: undecodable value: {}", key, e);
                    CacheOutcome::Fallback(None)
                }
            },
            Ok(None) => CacheOutcome::Hit(None),
            Err(e) => {
                error!("Cache get error for key {}: {}", key, e);
                CacheOutcome::Fallback(None)
            }
        }
    }

    pub async fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: TtlSecs,
    ) -> CacheOutcome<bool> {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Cache set error for key {}: {}", key, e);
                return CacheOutcome::Fallback(false);
            }
        };

        match self.store.set_ex(key, raw, ttl).await {
            Ok(()) => CacheOutcome::Hit(true),
            Err(e) => {
                error!("Cache set error for key {}: {}", key, e);
                CacheOutcome::Fallback(false)
            }
        }
    }

    /// `set` with the service's default TTL.
    pub async fn set_default<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> CacheOutcome<bool> {
        self.set(key, value, self.default_ttl).await
    }

    pub async fn delete(&self, key: &str) -> CacheOutcome<bool> {
        match self.store.del(&[key.to_string()]).await {
            Ok(_) => CacheOutcome::Hit(true),
            Err(e) => {
                error!("Cache delete error for key {}: {}", key, e);
                CacheOutcome::Fallback(false)
            }
        }
    }

    /// Delete every key matching a glob pattern, returning how many were removed.
    pub async fn delete_pattern(&self, pattern: &str) -> CacheOutcome<u64> {
        let keys = match self.store.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Cache delete pattern error for {}: {}", pattern, e);
                return CacheOutcome::Fallback(0);
            }
        };

        if keys.is_empty() {
            return CacheOutcome::Hit(0);
        }

        match self.store.del(&keys).await {
            Ok(removed) => CacheOutcome::Hit(removed),
            Err(e) => {
                error!("Cache delete pattern error for {}: {}", pattern, e);
                CacheOutcome::Fallback(0)
            }
        }
    }

    pub async fn exists(&self, key: &str) -> CacheOutcome<bool> {
        match self.store.exists(key).await {
            Ok(found) => CacheOutcome::Hit(found),
            Err(e) => {
                error!("Cache exists check error for key {}: {}", key, e);
                CacheOutcome::Fallback(false)
            }
        }
    }

    /// Remaining seconds to live; -1 when the key has no expiry or does not exist.
    pub async fn ttl(&self, key: &str) -> CacheOutcome<i64> {
        match self.store.ttl(key).await {
            Ok(secs) if secs >= 0 => CacheOutcome::Hit(secs),
            Ok(_) => CacheOutcome::Hit(-1),
            Err(e) => {
                error!("Cache TTL error for key {}: {}", key, e);
                CacheOutcome::Fallback(-1)
            }
        }
    }

    pub async fn hash_set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &V,
    ) -> CacheOutcome<bool> {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Cache hset error for key {}: {}", key, e);
                return CacheOutcome::Fallback(false);
            }
        };

        match self.store.hset(key, field, raw).await {
            Ok(()) => CacheOutcome::Hit(true),
            Err(e) => {
                error!("Cache hset error for key {}: {}", key, e);
                CacheOutcome::Fallback(false)
            }
        }
    }

    pub async fn hash_get<V: DeserializeOwned>(&self, key: &str, field: &str) -> CacheOutcome<Option<V>> {
        match self.store.hget(key, field).await {
            Ok(Some(raw)) => match serde_json::from_str::<V>(&raw) {
                Ok(value) => CacheOutcome::Hit(Some(value)),
                Err(e) => {
                    error!("Cache hget error for key {}: undecodable value: {}", key, e);
                    CacheOutcome::Fallback(None)
                }
            },
            Ok(None) => CacheOutcome::Hit(None),
            Err(e) => {
                error!("Cache hget error for key {}: {}", key, e);
                CacheOutcome::Fallback(None)
            }
        }
    }

    pub async fn increment(&self, key: &str) -> CacheOutcome<i64> {
        match self.store.incr(key).await {
            Ok(value) => CacheOutcome::Hit(value),
            Err(e) => {
                error!("Cache incr error for key {}: {}", key, e);
                CacheOutcome::Fallback(0)
            }
        }
    }

    pub async fn decrement(&self, key: &str) -> CacheOutcome<i64> {
        match self.store.decr(key).await {
            Ok(value) => CacheOutcome::Hit(value),
            Err(e) => {
                error!("Cache decr error for key {}: {}", key, e);
                CacheOutcome::Fallback(0)
            }
        }
    }

    /// Close the underlying connection. Safe to call more than once.
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.quit().await {
            error!("Cache shutdown error: {}", e);
        }
    }
}

impl Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
