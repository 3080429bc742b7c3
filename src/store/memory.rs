use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::value::{self, Value};
use super::{KeyTtl, KvStore};
use crate::error::Result;
use crate::keys::glob_match;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// An in-process [`KvStore`].
///
/// Expiry is measured on [`tokio::time::Instant`], so a test running with a
/// paused clock can move TTLs forward with `tokio::time::advance`. Expired
/// entries are dropped lazily when touched, or eagerly through
/// [`MemoryStore::purge_expired`].
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Runs `f` on the live value at `key` and stores whatever it returns,
    /// keeping the key's expiry. Returning `None` deletes the key.
    async fn mutate<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<Value>) -> Result<(Option<Value>, R)>,
    ) -> Result<R> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let (current, expires_at) = match entries.remove(key) {
            Some(entry) if entry.is_live(now) => (Some(entry.value), entry.expires_at),
            _ => (None, None),
        };
        // put the old entry back if `f` fails
        let backup = current.clone();
        match f(current) {
            Ok((Some(value), out)) => {
                entries.insert(key.to_string(), Entry { value, expires_at });
                Ok(out)
            }
            Ok((None, out)) => Ok(out),
            Err(e) => {
                if let Some(value) = backup {
                    entries.insert(key.to_string(), Entry { value, expires_at });
                }
                Err(e)
            }
        }
    }

    async fn read<R>(&self, key: &str, f: impl FnOnce(Option<&Value>) -> Result<R>) -> Result<R> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let live = entries.get(key).filter(|e| e.is_live(now));
        f(live.map(|e| &e.value))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(key, |v| match v {
            Some(v) => Ok(Some(v.as_str(key)?.to_string())),
            None => Ok(None),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: Value::Str(value.to_string()),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.mutate(key, |current| value::incr(key, current)).await
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.entries.lock().await.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.read(key, |v| Ok(v.is_some())).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some(entry) if entry.is_live(now) => match entry.expires_at {
                Some(at) => KeyTtl::Expires(at - now),
                None => KeyTtl::Persistent,
            },
            _ => KeyTtl::Missing,
        })
    }

    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        self.mutate(key, |current| value::hset(key, current, fields))
            .await
    }

    async fn hset_if_exists(&self, key: &str, fields: &[(&str, String)]) -> Result<bool> {
        self.mutate(key, |current| value::hset_existing(key, current, fields))
            .await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.read(key, |v| value::hash_to_map(key, v)).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.mutate(key, |current| value::sadd(key, current, member))
            .await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        self.mutate(key, |current| value::srem(key, current, member))
            .await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.read(key, |v| value::set_to_vec(key, v)).await
    }

    async fn scard(&self, key: &str) -> Result<usize> {
        self.read(key, |v| v.map_or(Ok(0), |v| v.as_set(key).map(|s| s.len())))
            .await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| e.is_live(now) && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
