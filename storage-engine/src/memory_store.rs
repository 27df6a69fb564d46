use crate::glob;
use arbor::ports::KeyValueStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use shared::{Error, Result, TtlSecs};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Debug)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process key-value store with Redis semantics.
///
/// Used when no Redis server is configured and by tests. Expired keys are
/// dropped lazily on access.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Live entry for a key, evicting it first if it has expired.
    fn live(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let entry = self.entries.get(key)?.clone();
        if entry.is_expired(now) {
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry)
    }

    fn add(&self, key: &str, delta: i64) -> Result<i64> {
        self.ensure_open()?;
        let now = Instant::now();

        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_expired(now) {
                    *entry = Entry {
                        value: Value::Str(delta.to_string()),
                        expires_at: None,
                    };
                    return Ok(delta);
                }

                let current = match &entry.value {
                    Value::Str(raw) => raw
                        .parse::<i64>()
                        .map_err(|_| Error::NotAnInteger(key.to_string()))?,
                    Value::Hash(_) => return Err(Error::WrongType(key.to_string())),
                };
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| Error::NotAnInteger(key.to_string()))?;

                // Counters keep their existing expiry
                entry.value = Value::Str(next.to_string());
                Ok(next)
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    value: Value::Str(delta.to_string()),
                    expires_at: None,
                });
                Ok(delta)
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        match self.live(key) {
            Some(Entry {
                value: Value::Str(raw),
                ..
            }) => Ok(Some(raw)),
            Some(_) => Err(Error::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: TtlSecs) -> Result<()> {
        self.ensure_open()?;
        if ttl.0 == 0 {
            return Err(Error::Internal(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl.0)),
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.ensure_open()?;
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| !entry.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        let matcher = glob::compile(pattern)
            .map_err(|e| Error::Internal(format!("invalid pattern {}: {}", pattern, e)))?;
        let now = Instant::now();

        Ok(self
            .entries
            .iter()
            .filter(|item| !item.value().is_expired(now) && matcher.is_match(item.key()))
            .map(|item| item.key().clone())
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.live(key).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        self.ensure_open()?;
        match self.live(key) {
            None => Ok(-2),
            Some(Entry {
                expires_at: None, ..
            }) => Ok(-1),
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => {
                let remaining = at.saturating_duration_since(Instant::now());
                Ok(((remaining.as_millis() + 500) / 1000) as i64)
            }
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        match self.live(key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(Error::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<()> {
        self.ensure_open()?;
        let now = Instant::now();

        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        if entry.is_expired(now) {
            *entry = Entry {
                value: Value::Hash(HashMap::new()),
                expires_at: None,
            };
        }

        match &mut entry.value {
            Value::Hash(fields) => {
                fields.insert(field.to_string(), value);
                Ok(())
            }
            Value::Str(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.add(key, 1)
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        self.add(key, -1)
    }

    async fn quit(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("In-memory store closed");
        }
        Ok(())
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.entries.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
