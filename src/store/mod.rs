//! The key-value capability the session layer is built on.
//!
//! [`KvStore`] is a deliberately small, Redis-shaped surface: strings,
//! hashes, sets, an atomic counter and per-key expiry. The session layer
//! never talks to a concrete client, it receives a `KvStore` instead, which
//! lets tests run against [`MemoryStore`] and production run against
//! [`SeaOrmStore`] or, with the `redis` feature, [`RedisStore`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod seaorm;
mod value;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use seaorm::SeaOrmStore;

/// Remaining lifetime of a key, as reported by [`KvStore::ttl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or already expired).
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key exists and expires after the given duration.
    Expires(Duration),
}

/// Redis-compatible key-value operations.
///
/// Implementations must hide expired keys from every operation, keep a
/// key's TTL across `hset`, `incr`, `sadd` and `srem`, and delete a set once
/// its last member is removed. Each command is atomic on its key: two
/// concurrent `incr` calls never return the same value.
#[async_trait]
pub trait KvStore: Debug + Send + Sync + 'static {
    /// Returns the string stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a string, replacing any previous value. `ttl = None` leaves the
    /// key without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Stores a string only if `key` is absent. Returns whether it was written.
    async fn set_nx(&self, key: &str, value: &str) -> Result<bool>;

    /// Increments the integer at `key` by one, treating a missing key as 0.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Removes `key`. Returns whether a live key was removed.
    async fn del(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Sets the TTL of an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Merges `fields` into the hash at `key`, creating it if needed.
    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<()>;

    /// Like [`KvStore::hset`], but only when the hash already exists: a
    /// missing or expired key is left absent and `false` is returned.
    async fn hset_if_exists(&self, key: &str, fields: &[(&str, String)]) -> Result<bool>;

    /// Returns every field of the hash at `key`; empty when absent.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Adds `member` to the set at `key`. Returns whether it was new.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    /// Removes `member` from the set at `key`. Returns whether it was present.
    async fn srem(&self, key: &str, member: &str) -> Result<bool>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    async fn scard(&self, key: &str) -> Result<usize>;

    /// Returns every live key matching `pattern`, where `*` matches any run
    /// of characters.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
}
