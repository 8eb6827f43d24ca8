use anyhow::{anyhow, Result};
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use serde::Serialize;
use tracing::debug;

use shared_config::AppConfig;

pub const STATS_CACHE_KEY: &str = "product:stats";
const STATS_TEMP_KEY: &str = "product:stats:temp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDetails {
    pub key: String,
    pub ttl: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The key-value cache the service depends on.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Round trip used for connectivity checks.
    async fn ping(&self) -> Result<()>;

    /// Stores the serialized snapshot under [`STATS_CACHE_KEY`] with an
    /// expiry. Readers of that key never see a partially written value.
    async fn publish_snapshot(&self, payload: &str, ttl_seconds: u64) -> Result<()>;

    async fn describe_keys(&self) -> Result<Vec<KeyDetails>>;
}

pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Creating the pool does not connect; the first command does.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let pool = Config::from_url(config.redis_url.clone())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| anyhow!("Failed to create Redis pool: {}", e))?;

        Ok(Self { pool })
    }

    async fn get_connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow!("Failed to get Redis connection: {}", e))
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn publish_snapshot(&self, payload: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;

        // Write to a temporary key first, then swap it in atomically.
        let _: () = redis::cmd("SET")
            .arg(STATS_TEMP_KEY)
            .arg(payload)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;
        let _: () = redis::cmd("RENAME")
            .arg(STATS_TEMP_KEY)
            .arg(STATS_CACHE_KEY)
            .query_async(&mut conn)
            .await?;

        debug!("Published stats snapshot to {} (ttl {}s)", STATS_CACHE_KEY, ttl_seconds);
        Ok(())
    }

    async fn describe_keys(&self) -> Result<Vec<KeyDetails>> {
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = conn.keys("*").await?;

        let mut details = Vec::with_capacity(keys.len());
        for key in keys {
            let ttl: i64 = conn.ttl(&key).await?;
            let kind: String = redis::cmd("TYPE").arg(&key).query_async(&mut conn).await?;
            details.push(KeyDetails { key, ttl, kind });
        }

        Ok(details)
    }
}
