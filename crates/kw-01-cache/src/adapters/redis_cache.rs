//! Redis-backed cache.
//!
//! Values are plain strings under `<key_prefix><key>`. The counter is a Lua
//! script so `INCR` and `EXPIRE` land together on the server.

use crate::domain::{CacheError, CacheResult};
use crate::ports::Cache;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
local ttl = tonumber(ARGV[1])
if ttl > 0 then
    redis.call('EXPIRE', KEYS[1], ttl)
end
return count
"#;

/// [`Cache`] over a shared Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    key_prefix: String,
    increment: Script,
}

impl RedisCache {
    /// Open a managed connection to `url`.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
            increment: Script::new(INCREMENT_SCRIPT),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(self.full_key(key)).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let key = self.full_key(key);
        if ttl_seconds > 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
                .await
                .map_err(backend)
        } else {
            conn.set::<_, _, ()>(key, value).await.map_err(backend)
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.full_key(key)).await.map_err(backend)
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> CacheResult<i64> {
        let mut conn = self.conn.clone();
        let key = self.full_key(key);
        self.increment
            .key(&key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(|err| {
                if err.kind() == redis::ErrorKind::ResponseError {
                    CacheError::InvalidCounter { key: key.clone() }
                } else {
                    backend(err)
                }
            })
    }
}
