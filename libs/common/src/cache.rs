//! Redis access for short-lived, single-use state
//!
//! The backend keeps nothing durable in Redis. Entries such as the OAuth
//! CSRF/PKCE pair are written with a TTL and read back exactly once through
//! [`RedisPool::take`] or [`RedisPool::take_json`].

use anyhow::{Context, Result};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Configuration for Redis connection
#[derive(Debug, Clone, PartialEq)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    /// Read `REDIS_URL` (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        Ok(RedisConfig { url })
    }
}

/// Cloneable Redis handle; every call opens a multiplexed connection lazily
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Validate the URL. Nothing is dialled until the first command.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .with_context(|| format!("Invalid REDIS_URL {}", config.url))?;
        info!("Redis client configured for {}", config.url);
        Ok(RedisPool { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }

    /// Store a string, expiring after `ttl_seconds` when given
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.connection().await?;
        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        debug!("Stored {} (ttl {:?})", key, ttl_seconds);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    /// `GETDEL`: concurrent readers cannot both observe the value
    pub async fn take(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get_del(key).await?)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, u64>(key).await?;
        Ok(())
    }

    /// Serialize `value` as JSON and store it with a TTL
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to encode cache entry")?;
        self.set(key, &json, Some(ttl_seconds)).await
    }

    /// Consume a JSON entry written by [`RedisPool::set_json`]
    pub async fn take_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.take(key)
            .await?
            .map(|json| serde_json::from_str(&json).context("Corrupt cache entry"))
            .transpose()
    }

    /// `PING`
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
