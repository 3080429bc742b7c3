use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{KeyTtl, KvStore};
use crate::error::{Error, Result};

/// A [`KvStore`] backed by a Redis server.
///
/// Every trait method maps onto the Redis command of the same name, so TTL
/// and type semantics are the server's own. The connection is a
/// [`ConnectionManager`], which reconnects on failure and is cheap to clone.
///
/// ```no_run
/// use seaorm_session_control::{RedisStore, SessionConfig, SessionControl};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisStore::connect("redis://127.0.0.1:6379").await?;
/// let control = SessionControl::new(store, SessionConfig::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Opens a managed connection to the server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        Ok(Self { conn })
    }

    /// Wraps an already established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        let res: redis::RedisResult<()> = match ttl {
            Some(ttl) => conn.set_ex(key, value, whole_seconds(ttl)).await,
            None => conn.set(key, value).await,
        };
        res.map_err(backend)
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.set_nx(key, value).await.map_err(backend)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1_i64).await.map_err(backend)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(backend)?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(backend)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let secs = i64::try_from(whole_seconds(ttl)).map_err(|e| Error::Config(e.to_string()))?;
        conn.expire(key, secs).await.map_err(backend)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.conn.clone();
        let secs: i64 = conn.ttl(key).await.map_err(backend)?;
        Ok(match secs {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            secs => KeyTtl::Expires(Duration::from_secs(secs.max(0).unsigned_abs())),
        })
    }

    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let items: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        conn.hset_multiple(key, items.as_slice())
            .await
            .map_err(backend)
    }

    async fn hset_if_exists(&self, key: &str, fields: &[(&str, String)]) -> Result<bool> {
        if fields.is_empty() {
            return self.exists(key).await;
        }
        let mut conn = self.conn.clone();
        let script = redis::Script::new(HSET_IF_EXISTS);
        let mut invocation = script.key(key);
        for (field, value) in fields {
            invocation.arg(*field).arg(value.as_str());
        }
        let written: i64 = invocation.invoke_async(&mut conn).await.map_err(backend)?;
        Ok(written == 1)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(backend)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await.map_err(backend)?;
        Ok(added > 0)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.srem(key, member).await.map_err(backend)?;
        Ok(removed > 0)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.smembers(key).await.map_err(backend)
    }

    async fn scard(&self, key: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        conn.scard(key).await.map_err(backend)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn.keys(pattern).await.map_err(backend)?;
        keys.sort();
        Ok(keys)
    }
}

const HSET_IF_EXISTS: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
";

fn backend(e: redis::RedisError) -> Error {
    Error::Backend(e.to_string())
}

// Redis TTLs are whole seconds; round up so a key never expires early.
fn whole_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}
