//! Key-value cache client.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::error::Result;

/// Narrow view of the key-value cache used by the service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a string value; `Ok(None)` when the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns error on any cache failure other than a missing key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a string value without expiry.
    ///
    /// # Errors
    ///
    /// Returns error if the cache rejects the write.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Liveness probe.
    ///
    /// # Errors
    ///
    /// Returns error if the cache is unreachable.
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed cache.
///
/// The connection manager multiplexes one connection and is cheap to clone,
/// so every call works on its own clone.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the connection fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
